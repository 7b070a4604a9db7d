use serde::{Deserialize, Serialize};

use crate::models::MessageId;

// -- Participants --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinRequest {
    pub name: String,
}

// -- Messages --

/// Body of `POST /messages`. The sender comes from the `User` header.
/// `type` is kept raw so the session layer decides what is a valid kind.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostMessageRequest {
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostMessageResponse {
    pub id: MessageId,
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    /// Raw so that non-numeric values reach validation instead of being
    /// rejected by the extractor.
    pub limit: Option<String>,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
