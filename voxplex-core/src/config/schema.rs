//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for voxplex
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Web server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Answer-generation (search) configuration
    #[serde(default)]
    pub search: SearchConfig,
    /// Voice input configuration
    #[serde(default)]
    pub speech: SpeechConfig,
    /// Session lifecycle configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            overrides: HashMap::new(),
        }
    }
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8501
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Fixed parameters sent with every answer-generation request.
///
/// None of these are derived from the conversation; each request is
/// stateless with respect to earlier turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the OpenPerplex API
    #[serde(default = "default_search_api_base")]
    pub api_base: String,
    /// System instruction sent with every query
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Locale hint (two-letter country code)
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub pro_mode: bool,
    /// Search category (general, news)
    #[serde(default = "default_search_type")]
    pub search_type: String,
    #[serde(default)]
    pub return_images: bool,
    #[serde(default = "default_true")]
    pub return_sources: bool,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_recency_filter")]
    pub recency_filter: String,
    /// Request timeout in seconds
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

fn default_search_api_base() -> String {
    "https://44c57909-d9e2-41cb-9244-9cd4a443cb41.app.bhs.ai.cloud.ovh.net".to_string()
}

fn default_system_prompt() -> String {
    "You are a helpful AI assistant. Provide clear and concise answers.".to_string()
}

fn default_location() -> String {
    "us".to_string()
}

fn default_search_type() -> String {
    "general".to_string()
}

fn default_true() -> bool {
    true
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_recency_filter() -> String {
    "recent".to_string()
}

fn default_search_timeout() -> u64 {
    120
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_base: default_search_api_base(),
            system_prompt: default_system_prompt(),
            location: default_location(),
            pro_mode: false,
            search_type: default_search_type(),
            return_images: false,
            return_sources: true,
            temperature: default_temperature(),
            top_p: default_top_p(),
            recency_filter: default_recency_filter(),
            timeout_secs: default_search_timeout(),
        }
    }
}

/// Voice input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Offer voice input when a microphone and a transcription key exist
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Input device name substring; empty selects the default device
    #[serde(default)]
    pub device: String,
    /// Whisper-compatible transcription endpoint
    #[serde(default = "default_transcription_url")]
    pub transcription_url: String,
    #[serde(default = "default_transcription_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    /// Optional ISO-639-1 language hint for the transcription service
    #[serde(default)]
    pub language: Option<String>,
    /// Ambient-noise calibration window in seconds
    #[serde(default = "default_calibration_secs")]
    pub calibration_secs: f32,
    /// Starting energy threshold (RMS over 16-bit samples)
    #[serde(default = "default_energy_threshold")]
    pub energy_threshold: f32,
    #[serde(default = "default_true")]
    pub dynamic_energy_threshold: bool,
    /// Seconds of non-speaking audio that end a phrase
    #[serde(default = "default_pause_threshold")]
    pub pause_threshold: f32,
    /// Minimum seconds of speech for a phrase to count
    #[serde(default = "default_phrase_threshold")]
    pub phrase_threshold: f32,
    /// Seconds of silence kept on both sides of a phrase
    #[serde(default = "default_non_speaking_duration")]
    pub non_speaking_duration: f32,
    /// Give up when no speech starts within this many seconds
    #[serde(default = "default_listen_timeout")]
    pub listen_timeout_secs: f32,
    /// Stop recording a phrase after this many seconds
    #[serde(default = "default_phrase_time_limit")]
    pub phrase_time_limit_secs: f32,
    /// Transcription request timeout in seconds
    #[serde(default = "default_transcription_timeout")]
    pub timeout_secs: u64,
}

fn default_transcription_url() -> String {
    "https://api.groq.com/openai/v1/audio/transcriptions".to_string()
}

fn default_transcription_model() -> String {
    "whisper-large-v3".to_string()
}

fn default_calibration_secs() -> f32 {
    1.0
}

fn default_energy_threshold() -> f32 {
    300.0
}

fn default_pause_threshold() -> f32 {
    0.8
}

fn default_phrase_threshold() -> f32 {
    0.3
}

fn default_non_speaking_duration() -> f32 {
    0.5
}

fn default_listen_timeout() -> f32 {
    10.0
}

fn default_phrase_time_limit() -> f32 {
    30.0
}

fn default_transcription_timeout() -> u64 {
    60
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            device: String::new(),
            transcription_url: default_transcription_url(),
            model: default_transcription_model(),
            api_key: String::new(),
            language: None,
            calibration_secs: default_calibration_secs(),
            energy_threshold: default_energy_threshold(),
            dynamic_energy_threshold: true,
            pause_threshold: default_pause_threshold(),
            phrase_threshold: default_phrase_threshold(),
            non_speaking_duration: default_non_speaking_duration(),
            listen_timeout_secs: default_listen_timeout(),
            phrase_time_limit_secs: default_phrase_time_limit(),
            timeout_secs: default_transcription_timeout(),
        }
    }
}

/// Session lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sessions idle for longer than this are dropped
    #[serde(default = "default_idle_ttl")]
    pub idle_ttl_secs: u64,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Live sessions kept at once; the least recently seen is dropped first
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_idle_ttl() -> u64 {
    3600
}

fn default_max_sessions() -> usize {
    10_000
}

fn default_cookie_name() -> String {
    "voxplex_session".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: default_idle_ttl(),
            cookie_name: default_cookie_name(),
            max_sessions: default_max_sessions(),
        }
    }
}
