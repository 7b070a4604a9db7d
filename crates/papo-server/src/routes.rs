use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::error;

use papo_core::{ChatError, ChatResult, Session};
use papo_types::api::{JoinRequest, MessagesQuery, PostMessageRequest, PostMessageResponse};

use crate::AppState;
use crate::error::ApiError;

/// Header carrying the caller's participant name.
pub const USER_HEADER: &str = "user";

/// Names may be non-ASCII, so the raw bytes are decoded as UTF-8.
fn caller(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_HEADER)
        .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
        .map(str::to_string)
}

/// Runs a session call on the blocking pool; the store may block on I/O.
async fn run<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Session) -> ChatResult<T> + Send + 'static,
    T: Send + 'static,
{
    let session = state.session.clone();
    let result = tokio::task::spawn_blocking(move || f(&session))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?;
    Ok(result?)
}

pub async fn join(
    State(state): State<AppState>,
    Json(req): Json<JoinRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let participant = run(&state, move |s| s.join(&req.name)).await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

pub async fn list_participants(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let participants = run(&state, |s| s.list_participants()).await?;
    Ok(Json(participants))
}

pub async fn heartbeat(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = caller(&headers).ok_or_else(|| ChatError::NotFound("no user given".into()))?;
    run(&state, move |s| s.heartbeat(&user)).await?;
    Ok(StatusCode::OK)
}

pub async fn post_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PostMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let from = caller(&headers).ok_or_else(|| ChatError::Forbidden("no user given".into()))?;
    let id = run(&state, move |s| s.post_message(&from, &req.to, &req.text, &req.kind)).await?;
    Ok((StatusCode::CREATED, Json(PostMessageResponse { id })))
}

pub async fn list_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MessagesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user = caller(&headers);
    let messages = run(&state, move |s| s.list_messages(user.as_deref(), query.limit.as_deref())).await?;
    Ok(Json(messages))
}
