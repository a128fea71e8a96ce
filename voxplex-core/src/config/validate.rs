//! Configuration validation rules.

use super::schema::Config;

/// Upper bound for the speech timing settings measured in seconds
const MAX_SPEECH_SECS: f32 = 3600.0;

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push("server.host must not be empty".to_string());
    }

    let search = &config.search;
    if search.api_base.trim().is_empty() {
        errors.push("search.api_base must not be empty".to_string());
    }
    if search.system_prompt.trim().is_empty() {
        errors.push("search.system_prompt must not be empty".to_string());
    }
    if search.location.len() != 2 || !search.location.chars().all(|c| c.is_ascii_lowercase()) {
        errors.push("search.location must be a two-letter lowercase country code".to_string());
    }
    if !matches!(search.search_type.as_str(), "general" | "news") {
        errors.push("search.search_type must be one of: general, news".to_string());
    }
    if !(0.0..=1.0).contains(&search.temperature) {
        errors.push("search.temperature must be in [0.0, 1.0]".to_string());
    }
    if !(0.0..=1.0).contains(&search.top_p) {
        errors.push("search.top_p must be in [0.0, 1.0]".to_string());
    }
    if search.recency_filter.trim().is_empty() {
        errors.push("search.recency_filter must not be empty".to_string());
    }
    if search.timeout_secs == 0 {
        errors.push("search.timeout_secs must be > 0".to_string());
    }

    let speech = &config.speech;
    if speech.enabled {
        if speech.transcription_url.trim().is_empty() {
            errors.push(
                "speech.transcription_url is required when speech is enabled".to_string(),
            );
        }
        if speech.model.trim().is_empty() {
            errors.push("speech.model is required when speech is enabled".to_string());
        }
    }
    // (name, value, measured in seconds)
    let positive = [
        ("speech.calibration_secs", speech.calibration_secs, true),
        ("speech.energy_threshold", speech.energy_threshold, false),
        ("speech.pause_threshold", speech.pause_threshold, true),
        ("speech.phrase_threshold", speech.phrase_threshold, true),
        ("speech.non_speaking_duration", speech.non_speaking_duration, true),
        ("speech.listen_timeout_secs", speech.listen_timeout_secs, true),
        ("speech.phrase_time_limit_secs", speech.phrase_time_limit_secs, true),
    ];
    for (name, value, is_secs) in positive {
        if !value.is_finite() || value <= 0.0 {
            errors.push(format!("{} must be a finite number > 0", name));
        } else if is_secs && value > MAX_SPEECH_SECS {
            errors.push(format!("{} must not exceed {} seconds", name, MAX_SPEECH_SECS));
        }
    }
    if speech.non_speaking_duration > speech.pause_threshold {
        errors.push(
            "speech.non_speaking_duration must not exceed speech.pause_threshold".to_string(),
        );
    }
    if speech.timeout_secs == 0 {
        errors.push("speech.timeout_secs must be > 0".to_string());
    }

    if config.session.idle_ttl_secs == 0 {
        errors.push("session.idle_ttl_secs must be > 0".to_string());
    }
    if config.session.max_sessions == 0 {
        errors.push("session.max_sessions must be > 0".to_string());
    }
    let cookie = &config.session.cookie_name;
    if cookie.is_empty() || !cookie.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        errors.push("session.cookie_name must be a non-empty token".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
