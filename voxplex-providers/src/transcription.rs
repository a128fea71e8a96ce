//! Speech-to-text using a Whisper-compatible transcription API

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};
use voxplex_core::config::SpeechConfig;

/// Transcription errors
#[derive(Error, Debug)]
pub enum TranscriptionError {
    #[error("API key not configured")]
    NoApiKey,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("No audio to transcribe")]
    EmptyAudio,

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {0}")]
    ApiError(String),
}

/// Whisper API response
#[derive(Debug, Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Voice transcription service.
///
/// Defaults to Groq's hosted Whisper; any OpenAI-compatible
/// `audio/transcriptions` endpoint works.
#[derive(Clone)]
pub struct TranscriptionService {
    client: Client,
    api_key: Option<String>,
    api_url: String,
    model: String,
    language: Option<String>,
    timeout: Duration,
}

impl TranscriptionService {
    /// Create a new transcription service against the default endpoint
    pub fn new(api_key: Option<String>) -> Self {
        Self::from_config(&SpeechConfig {
            api_key: api_key.unwrap_or_default(),
            ..SpeechConfig::default()
        })
    }

    /// Create a new transcription service with custom settings
    pub fn with_settings(api_key: Option<String>, api_url: String, model: String) -> Self {
        Self::from_config(&SpeechConfig {
            api_key: api_key.unwrap_or_default(),
            transcription_url: api_url,
            model,
            ..SpeechConfig::default()
        })
    }

    /// Create a transcription service from the speech configuration
    pub fn from_config(config: &SpeechConfig) -> Self {
        let api_key = Some(config.api_key.trim().to_string()).filter(|k| !k.is_empty());
        let language = config
            .language
            .as_ref()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());

        Self {
            client: Client::new(),
            api_key,
            api_url: config.transcription_url.clone(),
            model: config.model.clone(),
            language,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Check if the service is configured
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Transcribe an audio file
    ///
    /// # Supported formats
    ///
    /// - MP3
    /// - WAV
    /// - OGG
    /// - FLAC
    /// - M4A
    pub async fn transcribe<P: AsRef<Path>>(
        &self,
        file_path: P,
    ) -> Result<String, TranscriptionError> {
        if self.api_key.is_none() {
            return Err(TranscriptionError::NoApiKey);
        }

        let path = file_path.as_ref();
        if !path.exists() {
            return Err(TranscriptionError::FileNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        let file_bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        self.transcribe_bytes(file_bytes, file_name).await
    }

    /// Transcribe an in-memory WAV recording
    pub async fn transcribe_wav(&self, wav: Vec<u8>) -> Result<String, TranscriptionError> {
        self.transcribe_bytes(wav, "speech.wav".to_string()).await
    }

    async fn transcribe_bytes(
        &self,
        bytes: Vec<u8>,
        file_name: String,
    ) -> Result<String, TranscriptionError> {
        let api_key = self.api_key.as_ref().ok_or(TranscriptionError::NoApiKey)?;
        if bytes.is_empty() {
            return Err(TranscriptionError::EmptyAudio);
        }

        debug!("Transcribing {} ({} bytes)", file_name, bytes.len());

        let file_part = Part::bytes(bytes).file_name(file_name);
        let mut form = Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "json");
        if let Some(language) = &self.language {
            form = form.text("language", language.clone());
        }

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Transcription failed: {} - {}", status, error_text);
            return Err(TranscriptionError::ApiError(format!(
                "{}: {}",
                status, error_text
            )));
        }

        let data: WhisperResponse = response.json().await?;
        Ok(data.text.trim().to_string())
    }
}

impl Default for TranscriptionService {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_new_service() {
        let service = TranscriptionService::new(Some("test_key".to_string()));
        assert!(service.is_configured());
        assert_eq!(service.model, "whisper-large-v3");
    }

    #[test]
    fn test_new_service_no_key() {
        let service = TranscriptionService::new(None);
        assert!(!service.is_configured());
    }

    #[test]
    fn test_blank_key_is_not_configured() {
        let service = TranscriptionService::new(Some("   ".to_string()));
        assert!(!service.is_configured());
    }

    #[test]
    fn test_with_settings() {
        let service = TranscriptionService::with_settings(
            Some("test_key".to_string()),
            "https://custom.api.com/v1/audio/transcriptions".to_string(),
            "custom-model".to_string(),
        );
        assert!(service.is_configured());
        assert_eq!(
            service.api_url,
            "https://custom.api.com/v1/audio/transcriptions"
        );
        assert_eq!(service.model, "custom-model");
    }

    #[tokio::test]
    async fn test_transcribe_no_api_key() {
        let service = TranscriptionService::new(None);
        let result = service.transcribe("test.wav").await;
        assert!(matches!(result, Err(TranscriptionError::NoApiKey)));
    }

    #[tokio::test]
    async fn test_transcribe_file_not_found() {
        let service = TranscriptionService::new(Some("test_key".to_string()));
        let result = service.transcribe("/nonexistent/file.wav").await;
        assert!(matches!(result, Err(TranscriptionError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_transcribe_empty_audio() {
        let service = TranscriptionService::new(Some("test_key".to_string()));
        let result = service.transcribe_wav(Vec::new()).await;
        assert!(matches!(result, Err(TranscriptionError::EmptyAudio)));
    }

    #[tokio::test]
    async fn test_transcribe_wav_posts_multipart() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/audio/transcriptions")
            .match_header("authorization", "Bearer test_key")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data".to_string()),
            )
            .match_body(Matcher::Regex("whisper-large-v3".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"text":" What is the capital of France? "}"#)
            .create_async()
            .await;

        let service = TranscriptionService::with_settings(
            Some("test_key".to_string()),
            format!("{}/v1/audio/transcriptions", server.url()),
            "whisper-large-v3".to_string(),
        );
        let text = service.transcribe_wav(vec![0u8; 64]).await.unwrap();

        mock.assert_async().await;
        assert_eq!(text, "What is the capital of France?");
    }

    #[tokio::test]
    async fn test_transcribe_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/audio/transcriptions")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let service = TranscriptionService::with_settings(
            Some("test_key".to_string()),
            format!("{}/v1/audio/transcriptions", server.url()),
            "whisper-large-v3".to_string(),
        );
        let err = service.transcribe_wav(vec![1u8; 16]).await.unwrap_err();
        assert!(matches!(err, TranscriptionError::ApiError(_)));
        assert!(err.to_string().contains("upstream exploded"));
    }

    #[test]
    fn test_default() {
        let service = TranscriptionService::default();
        assert_eq!(service.model, "whisper-large-v3");
    }
}
