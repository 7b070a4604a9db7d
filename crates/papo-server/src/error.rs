use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::warn;

use papo_core::ChatError;
use papo_types::api::ErrorResponse;

#[derive(Debug)]
pub enum ApiError {
    Chat(ChatError),
    /// The blocking task running the operation panicked or was cancelled.
    Internal,
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        ApiError::Chat(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Chat(e) => match e {
                ChatError::InvalidName(_) | ChatError::InvalidMessage(_) | ChatError::InvalidQuery(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                ChatError::AlreadyExists(_) => StatusCode::CONFLICT,
                ChatError::NotFound(_) => StatusCode::NOT_FOUND,
                ChatError::Forbidden(_) => StatusCode::FORBIDDEN,
                ChatError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            ApiError::Chat(ChatError::StoreUnavailable(e)) => {
                warn!("Store unavailable: {}", e);
                "store unavailable".to_string()
            }
            ApiError::Chat(e) => e.to_string(),
            ApiError::Internal => "internal error".to_string(),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}
