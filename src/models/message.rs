use serde::{Deserialize, Serialize};

/// `response_id` assigned to the apology bubble shown when a submission fails.
pub const ERROR_RESPONSE_ID: &str = "error";

/// One question/answer exchange in a chat session.
///
/// An empty `response_id` marks an optimistic entry that the server has not
/// confirmed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub response_id: String,
    #[serde(default)]
    pub query_text: String,
    #[serde(default)]
    pub response_text: String,
}

impl Message {
    pub fn pending(query_text: impl Into<String>) -> Self {
        Self {
            response_id: String::new(),
            query_text: query_text.into(),
            response_text: String::new(),
        }
    }

    pub fn confirmed(
        response_id: impl Into<String>,
        query_text: impl Into<String>,
        response_text: impl Into<String>,
    ) -> Self {
        Self {
            response_id: response_id.into(),
            query_text: query_text.into(),
            response_text: response_text.into(),
        }
    }

    pub fn failed(query_text: impl Into<String>) -> Self {
        Self {
            response_id: ERROR_RESPONSE_ID.to_string(),
            query_text: query_text.into(),
            response_text: crate::config::APOLOGY_TEXT.to_string(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.response_id.is_empty()
    }

    pub fn is_error(&self) -> bool {
        self.response_id == ERROR_RESPONSE_ID
    }
}
