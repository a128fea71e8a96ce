use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use voxplex_core::session::{SessionManager, SharedSession, Turn};

use crate::chatbot::ChatSession;
use crate::error::ApiError;
use crate::render::{render_page, PageView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CredentialForm {
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub connected: bool,
    pub voice_available: bool,
    pub turns: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// A session resolved for one request
struct Resolved {
    session: SharedSession<ChatSession>,
    /// Set when the session was just created and the cookie must be issued
    new_id: Option<String>,
}

/// Extract the session id from the request cookies, if it is well formed
fn cookie_session_id(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, id)| id.trim().to_string())
        .filter(|id| id.len() == 32 && id.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Look up the caller's existing session without creating one
fn existing_session(state: &AppState, headers: &HeaderMap) -> Option<SharedSession<ChatSession>> {
    let id = cookie_session_id(headers, &state.cookie_name)?;
    state.sessions.get(&id)
}

/// Find the caller's session, or start a fresh one under a new id.
///
/// Ids that are not known to this process are never adopted.
fn resolve_session(state: &AppState, headers: &HeaderMap) -> Resolved {
    if let Some(id) = cookie_session_id(headers, &state.cookie_name) {
        if state.sessions.get(&id).is_some() {
            let (session, _) = state.sessions.get_or_create(&id);
            return Resolved {
                session,
                new_id: None,
            };
        }
    }

    let id = SessionManager::<ChatSession>::new_id();
    let (session, _) = state.sessions.get_or_create(&id);
    debug!("Started session {}", id);
    Resolved {
        session,
        new_id: Some(id),
    }
}

fn with_cookie(state: &AppState, new_id: Option<String>, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    if let Some(id) = new_id {
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", state.cookie_name, id);
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

/// GET / - render the page from session state
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let resolved = resolve_session(&state, &headers);
    let mut session = resolved.session.lock().await;
    let notices = session.notices.drain();
    let html = render_page(&PageView {
        connected: session.is_connected(),
        voice_available: state.voice_available(),
        notices: &notices,
        turns: session.transcript.turns(),
    });
    drop(session);

    with_cookie(&state, resolved.new_id, Html(html))
}

/// POST /credential - connect or disconnect the answer client
pub async fn submit_credential(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<CredentialForm>,
) -> Response {
    let resolved = resolve_session(&state, &headers);
    resolved
        .session
        .lock()
        .await
        .connect(state.factory.as_ref(), &form.api_key);

    with_cookie(&state, resolved.new_id, Redirect::to("/"))
}

/// POST /chat - one typed turn
pub async fn submit_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ChatForm>,
) -> Response {
    let resolved = resolve_session(&state, &headers);
    let outcome = resolved.session.lock().await.submit_text(&form.message).await;
    debug!("Text turn: {:?}", outcome);

    with_cookie(&state, resolved.new_id, Redirect::to("/"))
}

/// POST /voice - one spoken turn
pub async fn submit_voice(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let resolved = resolve_session(&state, &headers);
    let outcome = resolved
        .session
        .lock()
        .await
        .submit_voice(state.speech.as_deref())
        .await;
    debug!("Voice turn: {:?}", outcome);

    with_cookie(&state, resolved.new_id, Redirect::to("/"))
}

/// GET /api/transcript
pub async fn get_transcript(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Turn>>, ApiError> {
    let session = existing_session(&state, &headers)
        .ok_or_else(|| ApiError::NotFound("No active session".to_string()))?;
    let turns = session.lock().await.transcript.turns().to_vec();
    Ok(Json(turns))
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>, headers: HeaderMap) -> Json<StatusResponse> {
    let (connected, turns) = match existing_session(&state, &headers) {
        Some(session) => {
            let session = session.lock().await;
            (session.is_connected(), session.transcript.len())
        }
        None => (false, 0),
    };

    Json(StatusResponse {
        connected,
        voice_available: state.voice_available(),
        turns,
    })
}

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
