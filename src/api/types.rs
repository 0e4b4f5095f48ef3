use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Message, PlanStatus, SearchHit};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

// --- Session endpoints ---

#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionBody<'a> {
    pub email: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionResponse {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteSessionBody<'a> {
    pub email: &'a str,
    pub session_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteSessionResponse {
    #[serde(default)]
    pub success: bool,
}

// --- Chat endpoints ---

#[derive(Debug, Clone, Deserialize)]
pub struct MessagesEnvelope {
    #[serde(default)]
    pub data: Vec<Message>,
}

/// Body of `POST /chat`. The user identity travels as `email`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRequest {
    pub session_id: String,
    pub email: String,
    pub query_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryResponse {
    pub response_id: String,
    #[serde(default)]
    pub response_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryEnvelope {
    pub data: Option<QueryResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

// --- Profile ---

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub subscribed_plan_status: Option<PlanStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}
