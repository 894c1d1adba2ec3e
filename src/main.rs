use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use alfred_chat::client::{ChatBackend, HttpChatBackend};
use alfred_chat::config::{Config, Overrides, Settings, ENDPOINT_ENV};
use alfred_chat::{handler, tui, ui, App};

#[derive(Parser)]
#[command(name = "alfred")]
#[command(author, version, about = "Terminal chat client for the Alfred /chat endpoint", long_about = None)]
struct Cli {
    /// Chat endpoint URL (overrides $ALFRED_ENDPOINT and the config file)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Config file to read instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write logs (the terminal is taken by the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Give up on a request after this many seconds (0 = wait forever)
    #[arg(long)]
    timeout: Option<u64>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let overrides = Overrides {
        endpoint: cli.endpoint.clone(),
        request_timeout_secs: cli.timeout,
        log_file: cli.log_file.clone(),
    };
    let settings = config.resolve(&overrides, std::env::var(ENDPOINT_ENV).ok())?;

    init_logging(&settings.log_file, cli.verbose)?;
    info!(
        endpoint = %settings.endpoint,
        timeout = ?settings.request_timeout,
        "starting alfred"
    );

    let backend = build_backend(&settings)?;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &settings, backend).await;
    tui::restore()?;

    if let Err(ref e) = result {
        tracing::error!(error = %e, "exited with error");
    }
    result
}

async fn run(terminal: &mut tui::Tui, settings: &Settings, backend: Arc<dyn ChatBackend>) -> Result<()> {
    let mut events = tui::EventHandler::new();
    let mut app = App::new(settings, backend, events.sender());

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event).await?,
            None => break,
        }
    }

    info!(turns = app.session.transcript().len(), "session ended");
    Ok(())
}

fn build_backend(settings: &Settings) -> Result<Arc<dyn ChatBackend>> {
    let backend = match settings.request_timeout {
        Some(timeout) => HttpChatBackend::with_timeout(&settings.endpoint, timeout)
            .context("building HTTP client")?,
        None => HttpChatBackend::new(&settings.endpoint),
    };
    Ok(Arc::new(backend))
}

fn init_logging(log_file: &Path, verbose: bool) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("opening log file {}", log_file.display()))?;

    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
