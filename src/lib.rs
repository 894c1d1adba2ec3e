pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod input;
pub mod session;
pub mod state;
pub mod tui;
pub mod ui;
pub mod view;

// Re-export main types for convenience
pub use app::{App, InputMode};
pub use client::{ChatBackend, HttpChatBackend};
pub use config::Config;
pub use error::RequestFailure;
pub use session::ChatSession;
pub use state::{LockState, Role, Transcript, Turn};
pub use view::{render_turn, ChatView, RenderedTurn};
