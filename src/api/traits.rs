use async_trait::async_trait;

use super::types::{ApiError, Profile, QueryRequest, QueryResponse};
use crate::models::{Identity, Message, SearchHit, SessionBuckets};

/// Remote chat service: sessions, history, queries and search.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn create_session(&self, identity: &Identity) -> Result<String, ApiError>;

    async fn list_sessions(&self, identity: &Identity) -> Result<SessionBuckets, ApiError>;

    async fn delete_session(&self, identity: &Identity, session_id: &str)
        -> Result<bool, ApiError>;

    async fn fetch_messages(
        &self,
        identity: &Identity,
        session_id: &str,
    ) -> Result<Vec<Message>, ApiError>;

    async fn submit_query(
        &self,
        identity: &Identity,
        request: QueryRequest,
    ) -> Result<QueryResponse, ApiError>;

    async fn search(&self, identity: &Identity, query: &str) -> Result<Vec<SearchHit>, ApiError>;

    async fn fetch_profile(&self, token: &str) -> Result<Profile, ApiError>;
}
