//! OpenPerplex custom-search client

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use voxplex_core::config::SearchConfig;

use crate::base::{
    Answer, AnswerProvider, AnswerProviderFactory, ProviderError, ProviderResult, Source,
};

/// OpenPerplex custom_search request body
#[derive(Debug, Serialize)]
struct CustomSearchRequest<'a> {
    system_prompt: &'a str,
    user_prompt: &'a str,
    location: &'a str,
    pro_mode: bool,
    search_type: &'a str,
    return_images: bool,
    return_sources: bool,
    temperature: f32,
    top_p: f32,
    recency_filter: &'a str,
}

/// Success body. Only `llm_response` is required; the other fields are
/// read leniently and dropped when their shape is unexpected.
#[derive(Debug, Deserialize)]
struct CustomSearchResponse {
    #[serde(default)]
    llm_response: Option<Value>,
    #[serde(default)]
    sources: Option<Value>,
    #[serde(default)]
    response_time: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "url")]
    link: Option<String>,
}

/// Client for the OpenPerplex API, bound to one API key
pub struct OpenperplexClient {
    client: Client,
    endpoint: String,
    settings: SearchConfig,
}

impl OpenperplexClient {
    /// Create a client for the given API key.
    ///
    /// Fails when the key is blank or cannot be sent as a header value.
    pub fn new(api_key: &str, settings: SearchConfig) -> ProviderResult<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ProviderError::ConfigError("API key is required".to_string()));
        }

        let mut key_value = HeaderValue::from_str(api_key).map_err(|_| {
            ProviderError::ConfigError(
                "API key contains characters that are not allowed in a request header".to_string(),
            )
        })?;
        key_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("X-API-Key", key_value);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        let endpoint = format!("{}/custom_search", settings.api_base.trim_end_matches('/'));

        Ok(Self {
            client,
            endpoint,
            settings,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run a custom search with the configured fixed parameters
    pub async fn custom_search(&self, user_prompt: &str) -> ProviderResult<Answer> {
        let s = &self.settings;
        let request = CustomSearchRequest {
            system_prompt: &s.system_prompt,
            user_prompt,
            location: &s.location,
            pro_mode: s.pro_mode,
            search_type: &s.search_type,
            return_images: s.return_images,
            return_sources: s.return_sources,
            temperature: s.temperature,
            top_p: s.top_p,
            recency_filter: &s.recency_filter,
        };

        debug!("OpenPerplex request to {}", self.endpoint);
        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_detail(&body)
                .or_else(|| status.canonical_reason().map(ToString::to_string))
                .unwrap_or_else(|| "Unknown error".to_string());
            warn!("OpenPerplex request failed: {} - {}", status, message);
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        parse_answer(&body)
    }
}

#[async_trait]
impl AnswerProvider for OpenperplexClient {
    async fn answer(&self, query: &str) -> ProviderResult<Answer> {
        self.custom_search(query).await
    }

    fn name(&self) -> &str {
        "openperplex"
    }
}

/// Builds [`OpenperplexClient`]s sharing one set of search parameters
#[derive(Debug, Clone)]
pub struct OpenperplexFactory {
    settings: SearchConfig,
}

impl OpenperplexFactory {
    pub fn new(settings: SearchConfig) -> Self {
        Self { settings }
    }
}

impl AnswerProviderFactory for OpenperplexFactory {
    fn connect(&self, api_key: &str) -> ProviderResult<Arc<dyn AnswerProvider>> {
        let client = OpenperplexClient::new(api_key, self.settings.clone())?;
        Ok(Arc::new(client))
    }
}

/// Extract the API's `detail` message from an error body
fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Validate and convert a success body.
///
/// A body without a non-empty textual `llm_response` is rejected rather
/// than displayed as-is.
fn parse_answer(body: &str) -> ProviderResult<Answer> {
    let value: Value = serde_json::from_str(body)?;
    if !value.is_object() {
        return Err(ProviderError::InvalidResponse(
            "expected a JSON object".to_string(),
        ));
    }

    let parsed: CustomSearchResponse = serde_json::from_value(value)?;
    let text = match parsed.llm_response {
        Some(Value::String(text)) if !text.trim().is_empty() => text,
        Some(Value::String(_)) => {
            return Err(ProviderError::InvalidResponse(
                "llm_response is empty".to_string(),
            ))
        }
        Some(_) => {
            return Err(ProviderError::InvalidResponse(
                "llm_response is not text".to_string(),
            ))
        }
        None => {
            return Err(ProviderError::InvalidResponse(
                "missing llm_response".to_string(),
            ))
        }
    };

    let sources = match parsed.sources {
        Some(Value::Array(items)) => items.into_iter().filter_map(parse_source).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            warn!("Ignoring sources of unexpected shape: {}", other);
            Vec::new()
        }
    };

    Ok(Answer {
        text,
        sources,
        response_time: parsed.response_time.as_ref().and_then(Value::as_f64),
    })
}

/// A source is either an object with a link or a bare URL string
fn parse_source(item: Value) -> Option<Source> {
    let raw = match item {
        Value::String(link) => RawSource {
            title: None,
            link: Some(link),
        },
        Value::Object(_) => serde_json::from_value(item).ok()?,
        _ => return None,
    };
    let link = raw.link.filter(|l| !l.trim().is_empty())?;
    Some(Source {
        title: raw.title.unwrap_or_default(),
        link,
    })
}
