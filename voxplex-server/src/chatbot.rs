//! Per-session chat flow: one user turn in, one exchange appended

use std::sync::Arc;
use tracing::{error, info, warn};
use voxplex_core::session::{Notice, Notices, Transcript};
use voxplex_providers::{AnswerProvider, AnswerProviderFactory};

use crate::speech::{SpeechError, SpeechInput};

pub const SPEECH_UNAVAILABLE: &str = "Speech recognition is not available. Please use text input.";
pub const LISTENING: &str = "Listening... Speak now.";

/// What a submitted turn did to the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A user/assistant pair was appended
    Appended,
    /// Empty input; nothing happened
    Ignored,
    /// No answer client is connected for this session
    NotConnected,
    /// Voice input is not offered by this server
    VoiceUnavailable,
    /// Capture or transcription failed; no turn was recorded
    Abandoned,
}

/// State kept for one visitor
#[derive(Default)]
pub struct ChatSession {
    pub transcript: Transcript,
    pub notices: Notices,
    client: Option<Arc<dyn AnswerProvider>>,
}

impl ChatSession {
    /// Whether an answer client has been initialized
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Initialize (or clear) the answer client from a credential.
    ///
    /// A blank key disconnects. A key the factory rejects leaves the
    /// session disconnected and queues the failure once. The transcript
    /// is kept either way.
    pub fn connect(&mut self, factory: &dyn AnswerProviderFactory, api_key: &str) -> bool {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            self.client = None;
            return false;
        }

        match factory.connect(api_key) {
            Ok(client) => {
                info!("Answer client '{}' initialized", client.name());
                self.client = Some(client);
                true
            }
            Err(e) => {
                error!("Failed to initialize answer client: {}", e);
                self.client = None;
                self.notices
                    .push(Notice::error(format!("Failed to initialize chatbot: {}", e)));
                false
            }
        }
    }

    /// Handle typed input
    pub async fn submit_text(&mut self, input: &str) -> TurnOutcome {
        let Some(client) = self.client.clone() else {
            return TurnOutcome::NotConnected;
        };
        if input.trim().is_empty() {
            return TurnOutcome::Ignored;
        }

        let reply = self.generate_response(client.as_ref(), input).await;
        self.transcript.push_exchange(input, reply);
        TurnOutcome::Appended
    }

    /// Handle a voice request
    pub async fn submit_voice(&mut self, speech: Option<&dyn SpeechInput>) -> TurnOutcome {
        let Some(client) = self.client.clone() else {
            return TurnOutcome::NotConnected;
        };
        let Some(speech) = speech else {
            self.notices.push(Notice::warning(SPEECH_UNAVAILABLE));
            return TurnOutcome::VoiceUnavailable;
        };

        self.notices.push(Notice::info(LISTENING));
        let text = match speech.listen().await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                self.notices.push(Notice::error(format!(
                    "Speech recognition error: {}",
                    SpeechError::Unrecognized
                )));
                return TurnOutcome::Abandoned;
            }
            Err(e) => {
                warn!("Voice input failed: {}", e);
                self.notices
                    .push(Notice::error(format!("Speech recognition error: {}", e)));
                return TurnOutcome::Abandoned;
            }
        };

        self.notices.push(Notice::info(format!("You said: {}", text)));
        let reply = self.generate_response(client.as_ref(), &text).await;
        self.transcript.push_exchange(text, reply);
        TurnOutcome::Appended
    }

    /// Ask the provider; a failure becomes an apology carrying the cause
    async fn generate_response(&mut self, client: &dyn AnswerProvider, query: &str) -> String {
        match client.answer(query).await {
            Ok(answer) => answer.to_content(),
            Err(e) => {
                error!("Error generating response: {}", e);
                self.notices
                    .push(Notice::error(format!("Error generating response: {}", e)));
                format!("I'm sorry, I encountered an error: {}", e)
            }
        }
    }
}
