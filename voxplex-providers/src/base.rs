//! Base trait for answer-generation providers

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Error type for provider operations
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// A web source cited by an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub link: String,
}

/// A generated answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The generated answer text
    pub text: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    /// Server-reported processing time in seconds
    #[serde(default)]
    pub response_time: Option<f64>,
}

impl Answer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
            response_time: None,
        }
    }

    /// Render the answer as transcript content, with numbered sources
    pub fn to_content(&self) -> String {
        if self.sources.is_empty() {
            return self.text.clone();
        }

        let mut content = self.text.trim_end().to_string();
        content.push_str("\n\nSources:");
        for (i, source) in self.sources.iter().enumerate() {
            let title = if source.title.trim().is_empty() {
                &source.link
            } else {
                &source.title
            };
            content.push_str(&format!("\n{}. {} ({})", i + 1, title, source.link));
        }
        content
    }
}

/// Trait for answer-generation backends.
///
/// Every call is independent: implementations receive only the current
/// query and never any earlier turns.
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    /// Generate an answer for a single user query
    async fn answer(&self, query: &str) -> ProviderResult<Answer>;

    /// Short provider name for logs
    fn name(&self) -> &str;
}

/// Builds an answer provider from a user-supplied credential
pub trait AnswerProviderFactory: Send + Sync {
    fn connect(&self, api_key: &str) -> ProviderResult<Arc<dyn AnswerProvider>>;
}
