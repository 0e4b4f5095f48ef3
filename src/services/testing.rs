//! In-memory `ChatBackend` shared by the controller and app tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::api::{ApiError, ChatBackend, Profile, QueryRequest, QueryResponse};
use crate::models::{Identity, Message, SearchHit, Session, SessionBuckets};

#[derive(Default)]
pub struct FakeBackend {
    pub create_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
    pub fail_create: bool,
    pub fail_submit: bool,
    pub delete_result: Option<bool>,
    pub history: Mutex<HashMap<String, Vec<Message>>>,
    pub submit_gate: Option<Arc<Notify>>,
    pub create_gate: Option<Arc<Notify>>,
    pub fetch_gates: HashMap<String, Arc<Notify>>,
}

impl FakeBackend {
    pub fn with_history(self, session_id: &str, messages: Vec<Message>) -> Self {
        self.history.lock().unwrap().insert(session_id.to_string(), messages);
        self
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn create_session(&self, _identity: &Identity) -> Result<String, ApiError> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.create_gate {
            gate.notified().await;
        }
        if self.fail_create {
            return Err(ApiError::NetworkError("connection refused".to_string()));
        }
        Ok(format!("session-{}", n + 1))
    }

    async fn list_sessions(&self, _identity: &Identity) -> Result<SessionBuckets, ApiError> {
        let today = self.history.lock().unwrap()
            .keys()
            .map(|id| Session {
                session_id: id.clone(),
                title: format!("Chat {}", id),
            })
            .collect();
        Ok(SessionBuckets {
            today,
            ..Default::default()
        })
    }

    async fn delete_session(
        &self,
        _identity: &Identity,
        session_id: &str,
    ) -> Result<bool, ApiError> {
        match self.delete_result {
            Some(ok) => {
                if ok {
                    self.history.lock().unwrap().remove(session_id);
                }
                Ok(ok)
            }
            None => Err(ApiError::RequestFailed("HTTP 500: boom".to_string())),
        }
    }

    async fn fetch_messages(
        &self,
        _identity: &Identity,
        session_id: &str,
    ) -> Result<Vec<Message>, ApiError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = self.fetch_gates.get(session_id) {
            gate.notified().await;
        }
        Ok(self.history.lock().unwrap()
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn submit_query(
        &self,
        _identity: &Identity,
        request: QueryRequest,
    ) -> Result<QueryResponse, ApiError> {
        let n = self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.submit_gate {
            gate.notified().await;
        }
        if self.fail_submit {
            return Err(ApiError::RequestFailed("HTTP 502: Request failed".to_string()));
        }
        let response_id = format!("r{}", n + 1);
        let answer = format!("answer to {}", request.query_text);
        self.history.lock().unwrap()
            .entry(request.session_id)
            .or_default()
            .push(Message::confirmed(
                response_id.clone(),
                request.query_text,
                answer.clone(),
            ));
        Ok(QueryResponse {
            response_id,
            response_text: answer,
        })
    }

    async fn search(
        &self,
        _identity: &Identity,
        query: &str,
    ) -> Result<Vec<SearchHit>, ApiError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![SearchHit {
            session_id: "s1".to_string(),
            title: format!("About {}", query),
        }])
    }

    async fn fetch_profile(&self, _token: &str) -> Result<Profile, ApiError> {
        Ok(Profile {
            email: None,
            subscribed_plan_status: None,
        })
    }
}

pub fn paid_user() -> Identity {
    Identity::new("coach@example.com", "token").with_plan("pro")
}
