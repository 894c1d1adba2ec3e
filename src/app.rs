use std::sync::Arc;

use tokio::sync::mpsc;

use crate::client::ChatBackend;
use crate::config::Settings;
use crate::error::RequestFailure;
use crate::input::InputLine;
use crate::session::ChatSession;
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Browsing the transcript
    Normal,
    /// Typing in the input box
    Editing,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub input: InputLine,
    pub session: ChatSession,
    pub endpoint: String,
    pub animation_frame: u8,
}

impl App {
    pub fn new(
        settings: &Settings,
        backend: Arc<dyn ChatBackend>,
        replies: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let session = ChatSession::new(backend, replies)
            .with_fallback_message(settings.fallback_message.clone());

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            input: InputLine::new(),
            session,
            endpoint: settings.endpoint.clone(),
            animation_frame: 0,
        }
    }

    /// Submit the input box contents (Enter / submit control).
    pub fn submit(&mut self) -> bool {
        self.session.submit_message(&mut self.input)
    }

    /// Input box and submit are disabled while a request is outstanding.
    pub fn input_enabled(&self) -> bool {
        !self.session.is_locked()
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_locked() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Handle the request completion and give focus back to the input box.
    pub fn on_reply(&mut self, outcome: Result<String, RequestFailure>) {
        self.session.settle(outcome);
        self.animation_frame = 0;
        self.input_mode = InputMode::Editing;
    }
}
