//! Web chat server: session cookie, page rendering and the turn handlers

pub mod chatbot;
pub mod error;
pub mod handlers;
pub mod render;
pub mod server;
pub mod speech;
pub mod state;

pub use chatbot::{ChatSession, TurnOutcome};
pub use error::ApiError;
pub use server::{create_router, run_server, spawn_session_sweeper};
pub use speech::{RecorderSpeech, SpeechError, SpeechInput};
pub use state::AppState;
