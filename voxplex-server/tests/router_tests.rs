//! Router tests: drive the full axum app with in-process requests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use serde_json::Value;
use tower::ServiceExt;

use voxplex_core::config::SearchConfig;
use voxplex_providers::{
    Answer, AnswerProvider, AnswerProviderFactory, OpenperplexFactory, ProviderError,
    ProviderResult,
};
use voxplex_server::{create_router, AppState, SpeechError, SpeechInput};

// =============================================================================
// Helpers
// =============================================================================

struct StubProvider;

#[async_trait]
impl AnswerProvider for StubProvider {
    async fn answer(&self, query: &str) -> ProviderResult<Answer> {
        if query.contains("fail") {
            return Err(ProviderError::InvalidResponse(
                "missing llm_response".to_string(),
            ));
        }
        Ok(Answer::new(format!("Answer to: {}", query)))
    }

    fn name(&self) -> &str {
        "stub"
    }
}

struct StubFactory;

impl AnswerProviderFactory for StubFactory {
    fn connect(&self, api_key: &str) -> ProviderResult<Arc<dyn AnswerProvider>> {
        if api_key == "bad" {
            return Err(ProviderError::ConfigError("invalid API key".to_string()));
        }
        Ok(Arc::new(StubProvider))
    }
}

struct StubSpeech(Option<&'static str>);

#[async_trait]
impl SpeechInput for StubSpeech {
    async fn listen(&self) -> Result<String, SpeechError> {
        self.0.map(ToString::to_string).ok_or(SpeechError::Unrecognized)
    }
}

fn make_app(speech: Option<Arc<dyn SpeechInput>>) -> axum::Router {
    create_router(AppState::new(Arc::new(StubFactory), speech))
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::post(uri).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// The `name=value` part of the Set-Cookie header, if any
fn issued_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(ToString::to_string)
}

async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

/// Open a session and connect it with `key`; returns the session cookie
async fn connected_session(app: &axum::Router, key: &str) -> String {
    let response = app.clone().oneshot(get("/", None)).await.unwrap();
    let cookie = issued_cookie(&response).expect("session cookie");

    let response = app
        .clone()
        .oneshot(post_form("/credential", Some(&cookie), &format!("api_key={}", key)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    cookie
}

// =============================================================================
// Page and session
// =============================================================================

#[tokio::test]
async fn test_health() {
    let response = make_app(None)
        .oneshot(get("/api/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_first_visit_issues_cookie_and_asks_for_key() {
    let response = make_app(None).oneshot(get("/", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("voxplex_session="));
    assert!(set_cookie.contains("HttpOnly"));

    let html = body_string(response).await;
    assert!(html.contains("OpenPerplex Chatbot"));
    assert!(html.contains("type=\"password\""));
    assert!(!html.contains("Chat History"));
}

#[tokio::test]
async fn test_unknown_session_id_is_not_adopted() {
    let app = make_app(None);
    let forged = "voxplex_session=0123456789abcdef0123456789abcdef";

    let response = app.oneshot(get("/", Some(forged))).await.unwrap();

    let issued = issued_cookie(&response).expect("fresh cookie");
    assert_ne!(issued, forged);
}

#[tokio::test]
async fn test_transcript_requires_session() {
    let response = make_app(None)
        .oneshot(get("/api/transcript", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "not_found");
}

// =============================================================================
// Text turns
// =============================================================================

#[tokio::test]
async fn test_text_turns_are_recorded_in_order() {
    let app = make_app(None);
    let cookie = connected_session(&app, "good").await;

    for message in ["first+question", "second+question"] {
        let response = app
            .clone()
            .oneshot(post_form("/chat", Some(&cookie), &format!("message={}", message)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    let response = app
        .clone()
        .oneshot(get("/api/transcript", Some(&cookie)))
        .await
        .unwrap();
    let turns = body_json(response).await;
    let turns = turns.as_array().unwrap();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[0]["role"], "user");
    assert_eq!(turns[0]["content"], "first question");
    assert_eq!(turns[1]["role"], "assistant");
    assert_eq!(turns[1]["content"], "Answer to: first question");
    assert_eq!(turns[2]["content"], "second question");

    let html = body_string(app.oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(html.contains("Chat History"));
    let first = html.find("first question").unwrap();
    let second = html.find("second question").unwrap();
    assert!(first < second);
}

#[tokio::test]
async fn test_empty_message_changes_nothing() {
    let app = make_app(None);
    let cookie = connected_session(&app, "good").await;

    app.clone()
        .oneshot(post_form("/chat", Some(&cookie), "message=+++"))
        .await
        .unwrap();

    let status = body_json(
        app.oneshot(get("/api/status", Some(&cookie)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status["connected"], true);
    assert_eq!(status["turns"], 0);
}

#[tokio::test]
async fn test_answer_failure_records_apology() {
    let app = make_app(None);
    let cookie = connected_session(&app, "good").await;

    app.clone()
        .oneshot(post_form("/chat", Some(&cookie), "message=please+fail"))
        .await
        .unwrap();

    let turns = body_json(
        app.clone()
            .oneshot(get("/api/transcript", Some(&cookie)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(turns.as_array().unwrap().len(), 2);
    let reply = turns[1]["content"].as_str().unwrap();
    assert!(reply.starts_with("I'm sorry, I encountered an error:"));
    assert!(reply.contains("missing llm_response"));

    let html = body_string(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(html.contains("Error generating response:"));

    // Notices are shown once.
    let html = body_string(app.oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(!html.contains("Error generating response:"));
}

#[tokio::test]
async fn test_chat_without_key_is_ignored() {
    let app = make_app(None);
    let response = app.clone().oneshot(get("/", None)).await.unwrap();
    let cookie = issued_cookie(&response).unwrap();

    app.clone()
        .oneshot(post_form("/chat", Some(&cookie), "message=hello"))
        .await
        .unwrap();

    let status = body_json(app.oneshot(get("/api/status", Some(&cookie))).await.unwrap()).await;
    assert_eq!(status["connected"], false);
    assert_eq!(status["turns"], 0);
}

// =============================================================================
// Credential
// =============================================================================

#[tokio::test]
async fn test_rejected_key_shows_error_and_hides_chat() {
    let app = make_app(None);
    let cookie = connected_session(&app, "bad").await;

    let html = body_string(app.oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(html.contains("Failed to initialize chatbot: "));
    assert!(!html.contains("action=\"/chat\""));
}

#[tokio::test]
async fn test_clearing_key_keeps_transcript() {
    let app = make_app(None);
    let cookie = connected_session(&app, "good").await;
    app.clone()
        .oneshot(post_form("/chat", Some(&cookie), "message=hello"))
        .await
        .unwrap();

    app.clone()
        .oneshot(post_form("/credential", Some(&cookie), "api_key="))
        .await
        .unwrap();
    let status = body_json(
        app.clone()
            .oneshot(get("/api/status", Some(&cookie)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status["connected"], false);
    assert_eq!(status["turns"], 2);
}

// =============================================================================
// Voice
// =============================================================================

#[tokio::test]
async fn test_voice_unavailable() {
    let app = make_app(None);
    let cookie = connected_session(&app, "good").await;

    let html = body_string(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(!html.contains("Start Voice Input"));
    assert!(html.contains("Speech recognition is not available."));

    let response = app
        .clone()
        .oneshot(post_form("/voice", Some(&cookie), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let html = body_string(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(html.contains("Speech recognition is not available. Please use text input."));
    let status = body_json(app.oneshot(get("/api/status", Some(&cookie))).await.unwrap()).await;
    assert_eq!(status["voice_available"], false);
    assert_eq!(status["turns"], 0);
}

#[tokio::test]
async fn test_voice_turn_is_recorded() {
    let app = make_app(Some(Arc::new(StubSpeech(Some("What is Rust?")))));
    let cookie = connected_session(&app, "good").await;

    let html = body_string(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(html.contains("Start Voice Input"));

    app.clone()
        .oneshot(post_form("/voice", Some(&cookie), ""))
        .await
        .unwrap();

    let html = body_string(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    let listening = html.find("Listening... Speak now.").unwrap();
    let heard = html.find("You said: What is Rust?").unwrap();
    assert!(listening < heard);
    assert!(html.contains("Answer to: What is Rust?"));
}

#[tokio::test]
async fn test_voice_failure_records_nothing() {
    let app = make_app(Some(Arc::new(StubSpeech(None))));
    let cookie = connected_session(&app, "good").await;

    app.clone()
        .oneshot(post_form("/voice", Some(&cookie), ""))
        .await
        .unwrap();

    let html = body_string(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(html.contains("Speech recognition error: "));
    let status = body_json(app.oneshot(get("/api/status", Some(&cookie))).await.unwrap()).await;
    assert_eq!(status["turns"], 0);
}

// =============================================================================
// End to end against a mock answer API
// =============================================================================

#[tokio::test]
async fn test_openperplex_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/custom_search")
        .match_header("x-api-key", "op-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"llm_response":"Paris is the capital of France.","sources":[{"title":"Paris","link":"https://example.com/paris"}]}"#,
        )
        .create_async()
        .await;

    let factory = OpenperplexFactory::new(SearchConfig {
        api_base: server.url(),
        ..SearchConfig::default()
    });
    let app = create_router(AppState::new(Arc::new(factory), None));
    let cookie = connected_session(&app, "op-key").await;

    app.clone()
        .oneshot(post_form(
            "/chat",
            Some(&cookie),
            "message=What+is+the+capital+of+France%3F",
        ))
        .await
        .unwrap();

    mock.assert_async().await;
    let turns = body_json(app.oneshot(get("/api/transcript", Some(&cookie))).await.unwrap()).await;
    assert_eq!(turns[0]["content"], "What is the capital of France?");
    let reply = turns[1]["content"].as_str().unwrap();
    assert!(reply.starts_with("Paris is the capital of France."));
    assert!(reply.contains("1. Paris (https://example.com/paris)"));
}
