use std::sync::Arc;
use std::time::Duration;
use voxplex_core::config::Config;
use voxplex_core::session::SessionManager;
use voxplex_providers::{AnswerProviderFactory, OpenperplexFactory};

use crate::chatbot::ChatSession;
use crate::speech::{self, SpeechInput};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager<ChatSession>>,
    pub factory: Arc<dyn AnswerProviderFactory>,
    /// `None` when voice input is not offered by this process
    pub speech: Option<Arc<dyn SpeechInput>>,
    pub cookie_name: String,
    pub idle_ttl: Duration,
}

impl AppState {
    pub fn new(
        factory: Arc<dyn AnswerProviderFactory>,
        speech: Option<Arc<dyn SpeechInput>>,
    ) -> Self {
        let defaults = voxplex_core::config::SessionConfig::default();
        Self {
            sessions: Arc::new(SessionManager::new()),
            factory,
            speech,
            cookie_name: defaults.cookie_name,
            idle_ttl: Duration::from_secs(defaults.idle_ttl_secs),
        }
    }

    /// Build the production state: OpenPerplex answers, microphone voice
    pub fn from_config(config: &Config) -> Self {
        let factory = Arc::new(OpenperplexFactory::new(config.search.clone()));
        let speech = speech::from_config(&config.speech);
        Self {
            sessions: Arc::new(SessionManager::with_max_sessions(
                config.session.max_sessions,
            )),
            cookie_name: config.session.cookie_name.clone(),
            idle_ttl: Duration::from_secs(config.session.idle_ttl_secs),
            ..Self::new(factory, speech)
        }
    }

    pub fn voice_available(&self) -> bool {
        self.speech.is_some()
    }
}
