use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::api::{ApiError, ChatBackend, QueryRequest};
use crate::models::{Identity, Message, SearchHit, SessionBuckets, Topic};
use crate::services::conversation::{Action, ConversationState, Phase};
use crate::services::location::Location;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Please login to continue")]
    Unauthenticated,

    #[error("Please upgrade your plan to continue")]
    SubscriptionRequired,

    #[error(transparent)]
    NetworkOrServer(#[from] ApiError),

    #[error("Message is empty")]
    EmptyQuery,

    #[error("A message is already being sent")]
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Where the user is sent when the chat surface cannot serve them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SignIn,
    PlanSelection,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::SignIn => "/login",
            Route::PlanSelection => "/#membership",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Notice { level: NoticeLevel, text: String },
    Redirect(Route),
    LocationChanged(Location),
    SessionsUpdated,
    MessagesChanged,
}

/// Owns the conversation for one user: the active session, its messages and
/// the submission in flight. Every network result is tagged with the session
/// it was started for and dropped if the user has moved on.
pub struct ChatController {
    backend: Arc<dyn ChatBackend>,
    identity: Option<Identity>,
    state: Mutex<ConversationState>,
    sessions: Mutex<SessionBuckets>,
    location: Mutex<Location>,
    events: mpsc::UnboundedSender<UiEvent>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChatController {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        identity: Option<Identity>,
        location: Location,
        events: mpsc::UnboundedSender<UiEvent>,
    ) -> Self {
        Self {
            backend,
            identity,
            state: Mutex::new(ConversationState::default()),
            sessions: Mutex::new(SessionBuckets::default()),
            location: Mutex::new(location),
            events,
        }
    }

    // --- Snapshots ---

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn messages(&self) -> Vec<Message> {
        lock(&self.state).messages.clone()
    }

    pub fn active_session_id(&self) -> Option<String> {
        lock(&self.state).active_session_id.clone()
    }

    pub fn phase(&self) -> Phase {
        lock(&self.state).phase
    }

    pub fn is_submitting(&self) -> bool {
        lock(&self.state).is_submitting()
    }

    pub fn sessions(&self) -> SessionBuckets {
        lock(&self.sessions).clone()
    }

    pub fn location(&self) -> Location {
        lock(&self.location).clone()
    }

    pub fn draft(&self) -> String {
        lock(&self.state).draft.clone()
    }

    // --- Plumbing ---

    fn emit(&self, event: UiEvent) {
        // The receiver going away only means nobody is rendering anymore.
        let _ = self.events.send(event);
    }

    fn notify(&self, level: NoticeLevel, text: impl Into<String>) {
        self.emit(UiEvent::Notice {
            level,
            text: text.into(),
        });
    }

    fn apply(&self, action: Action) -> bool {
        let touches_messages = !matches!(action, Action::DraftChanged(_));
        let applied = lock(&self.state).reduce(action);
        if applied && touches_messages {
            self.emit(UiEvent::MessagesChanged);
        }
        applied
    }

    fn publish_location(&self, session_id: Option<&str>) {
        let next = {
            let mut location = lock(&self.location);
            let next = location.with_session(session_id);
            if *location == next {
                return;
            }
            *location = next.clone();
            next
        };
        self.emit(UiEvent::LocationChanged(next));
    }

    fn require_identity(&self) -> Result<&Identity, ChatError> {
        match &self.identity {
            Some(identity) => Ok(identity),
            None => {
                self.notify(NoticeLevel::Warning, ChatError::Unauthenticated.to_string());
                self.emit(UiEvent::Redirect(Route::SignIn));
                Err(ChatError::Unauthenticated)
            }
        }
    }

    fn require_chat_access(&self) -> Result<&Identity, ChatError> {
        let identity = self.require_identity()?;
        if !identity.can_chat() {
            self.notify(
                NoticeLevel::Warning,
                ChatError::SubscriptionRequired.to_string(),
            );
            self.emit(UiEvent::Redirect(Route::PlanSelection));
            return Err(ChatError::SubscriptionRequired);
        }
        Ok(identity)
    }

    // --- Operations ---

    /// Return the active session, creating one when there is none.
    ///
    /// If the user selects another session while the new one is being
    /// created, the selection stays active and the created id is still
    /// returned so a submission in flight can be delivered to it.
    pub async fn ensure_session(&self) -> Result<String, ChatError> {
        let identity = self.require_chat_access()?;

        if let Some(id) = self.active_session_id() {
            return Ok(id);
        }

        match self.backend.create_session(identity).await {
            Ok(session_id) => {
                tracing::info!(session_id = %session_id, "Created chat session");
                if self.apply(Action::SessionEstablished {
                    session_id: session_id.clone(),
                }) {
                    self.publish_location(Some(&session_id));
                } else {
                    tracing::debug!(
                        session_id = %session_id,
                        "Created session is no longer wanted"
                    );
                }
                self.refresh_sessions().await;
                Ok(session_id)
            }
            Err(e) => {
                tracing::error!("Failed to create session: {}", e);
                self.notify(NoticeLevel::Error, format!("Failed to create session: {}", e));
                Err(ChatError::NetworkOrServer(e))
            }
        }
    }

    /// Send `text` to the coach. A call made while another submission is in
    /// flight returns `ChatError::Busy` without touching state or network.
    pub async fn submit_message(&self, text: &str) -> Result<(), ChatError> {
        let query = text.trim().to_string();
        if query.is_empty() {
            return Err(ChatError::EmptyQuery);
        }
        let identity = self.require_chat_access()?;

        if !self.apply(Action::SubmitStarted {
            query: query.clone(),
        }) {
            tracing::debug!("Submission ignored, another one is in flight");
            return Err(ChatError::Busy);
        }

        let request_id = Uuid::new_v4();
        let session_id = match self.ensure_session().await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(%request_id, "Submission aborted without a session: {}", e);
                self.apply(Action::SubmitAborted);
                return Err(e);
            }
        };

        tracing::info!(%request_id, session_id = %session_id, "Submitting query");
        let request = QueryRequest {
            session_id: session_id.clone(),
            email: identity.email.clone(),
            query_text: query.clone(),
        };

        match self.backend.submit_query(identity, request).await {
            Ok(response) => {
                tracing::info!(
                    %request_id,
                    response_id = %response.response_id,
                    "Received response"
                );
                let message =
                    Message::confirmed(response.response_id, query, response.response_text);
                if !self.apply(Action::ResponseReceived {
                    session_id: session_id.clone(),
                    message,
                }) {
                    tracing::debug!(%request_id, "Discarded response for inactive session");
                }
                self.load_history(&session_id).await;
                self.refresh_sessions().await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(%request_id, "Chat request failed: {}", e);
                self.apply(Action::ResponseFailed { session_id, query });
                Err(ChatError::NetworkOrServer(e))
            }
        }
    }

    /// Merge server history for `session_id` into the conversation.
    pub fn reconcile(&self, session_id: &str, server_messages: Vec<Message>) -> bool {
        self.apply(Action::HistoryLoaded {
            session_id: session_id.to_string(),
            messages: server_messages,
        })
    }

    async fn load_history(&self, session_id: &str) {
        let Some(identity) = &self.identity else {
            return;
        };

        match self.backend.fetch_messages(identity, session_id).await {
            Ok(messages) => {
                if !self.reconcile(session_id, messages) {
                    tracing::debug!(session_id, "Discarded history for inactive session");
                }
            }
            Err(e) => {
                tracing::error!(session_id, "Failed to load messages: {}", e);
                self.notify(NoticeLevel::Error, format!("Failed to load messages: {}", e));
            }
        }
    }

    /// Refetch history for whatever session is active.
    pub async fn refresh_history(&self) {
        if let Some(session_id) = self.active_session_id() {
            self.load_history(&session_id).await;
        }
    }

    pub async fn refresh_sessions(&self) {
        let Some(identity) = &self.identity else {
            return;
        };

        match self.backend.list_sessions(identity).await {
            Ok(buckets) => {
                *lock(&self.sessions) = buckets;
                self.emit(UiEvent::SessionsUpdated);
            }
            Err(e) => {
                tracing::error!("Failed to load sessions: {}", e);
                self.notify(NoticeLevel::Error, format!("Failed to load sessions: {}", e));
            }
        }
    }

    pub async fn select_session(&self, session_id: &str) {
        self.apply(Action::SessionSelected {
            session_id: session_id.to_string(),
        });
        self.publish_location(Some(session_id));
        self.load_history(session_id).await;
    }

    pub async fn start_new_session(&self) -> Result<String, ChatError> {
        self.apply(Action::NewSessionRequested);
        self.publish_location(None);

        let session_id = self.ensure_session().await?;
        if self.active_session_id().as_deref() == Some(session_id.as_str()) {
            self.notify(NoticeLevel::Success, "Started a new chat session");
        }
        Ok(session_id)
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), ChatError> {
        let identity = self.require_identity()?;

        match self.backend.delete_session(identity, session_id).await {
            Ok(true) => {
                tracing::info!(session_id, "Deleted chat session");
                self.notify(NoticeLevel::Info, "Conversation deleted");
                if self.apply(Action::SessionDeleted {
                    session_id: session_id.to_string(),
                }) {
                    self.publish_location(None);
                }
                self.refresh_sessions().await;
                Ok(())
            }
            Ok(false) => {
                tracing::warn!(session_id, "Server declined to delete session");
                let e = ApiError::RequestFailed("Session was not deleted".to_string());
                self.notify(NoticeLevel::Error, format!("Failed to delete session: {}", e));
                Err(ChatError::NetworkOrServer(e))
            }
            Err(e) => {
                tracing::error!(session_id, "Failed to delete session: {}", e);
                self.notify(NoticeLevel::Error, format!("Failed to delete session: {}", e));
                Err(ChatError::NetworkOrServer(e))
            }
        }
    }

    /// Search past conversations. Blank queries never reach the network.
    pub async fn search(&self, query: &str) -> Vec<SearchHit> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let Ok(identity) = self.require_identity() else {
            return Vec::new();
        };

        match self.backend.search(identity, query).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::error!("Search failed: {}", e);
                self.notify(NoticeLevel::Error, format!("Search failed: {}", e));
                Vec::new()
            }
        }
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.apply(Action::DraftChanged(text.into()));
    }

    pub fn apply_topic(&self, topic: Topic) {
        self.set_draft(topic.prompt());
    }

    /// Reopen the session carried by `location`, if any.
    pub async fn restore(&self, location: &Location) {
        if let Some(session_id) = location.session_id() {
            self.select_session(&session_id).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::Ordering;

    use tokio::sync::Notify;

    use super::*;
    use crate::services::testing::{paid_user, FakeBackend};


    fn controller(
        backend: Arc<FakeBackend>,
        identity: Option<Identity>,
    ) -> (ChatController, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let location = Location::parse("http://localhost:3000/football-ai").unwrap();
        (ChatController::new(backend, identity, location, tx), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<UiEvent>) -> Vec<UiEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_first_message_creates_session_and_confirms() {
        let backend = Arc::new(FakeBackend::default());
        let (ctrl, mut rx) = controller(backend.clone(), Some(paid_user()));

        ctrl.submit_message("  hello ").await.unwrap();

        assert_eq!(backend.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.submit_calls.load(Ordering::SeqCst), 1);
        assert_eq!(ctrl.active_session_id().as_deref(), Some("session-1"));
        assert_eq!(
            ctrl.messages(),
            vec![Message::confirmed("r1", "hello", "answer to hello")]
        );
        assert_eq!(ctrl.phase(), Phase::Idle);
        assert_eq!(ctrl.location().session_id().as_deref(), Some("session-1"));
        assert!(ctrl.sessions().find("session-1").is_some());

        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, UiEvent::LocationChanged(l) if l.session_id().as_deref() == Some("session-1"))));
        assert!(events.contains(&UiEvent::SessionsUpdated));
    }

    #[tokio::test]
    async fn test_existing_session_is_reused() {
        let backend = Arc::new(FakeBackend::default());
        let (ctrl, _rx) = controller(backend.clone(), Some(paid_user()));

        let first = ctrl.ensure_session().await.unwrap();
        let second = ctrl.ensure_session().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_submit_while_in_flight_is_ignored() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(FakeBackend {
            submit_gate: Some(gate.clone()),
            ..Default::default()
        });
        let (ctrl, _rx) = controller(backend.clone(), Some(paid_user()));

        let first = ctrl.submit_message("first");
        let second = async {
            // first is now parked inside submit_query
            tokio::task::yield_now().await;
            assert!(ctrl.is_submitting());
            let messages_before = ctrl.messages();
            let result = ctrl.submit_message("second").await;
            assert_eq!(ctrl.messages(), messages_before);
            gate.notify_one();
            result
        };

        let (first, second) = tokio::join!(first, second);
        assert!(first.is_ok());
        assert!(matches!(second, Err(ChatError::Busy)));
        assert_eq!(backend.submit_calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(ctrl.messages().len(), 1);
        assert_eq!(ctrl.messages()[0].query_text, "first");
    }

    #[tokio::test]
    async fn test_failed_submission_shows_apology() {
        let backend = Arc::new(FakeBackend {
            fail_submit: true,
            ..Default::default()
        });
        let (ctrl, _rx) = controller(backend.clone(), Some(paid_user()));

        let result = ctrl.submit_message("hello").await;
        assert!(matches!(result, Err(ChatError::NetworkOrServer(_))));

        let messages = ctrl.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_error());
        assert_eq!(messages[0].response_text, crate::config::APOLOGY_TEXT);
        assert_eq!(ctrl.phase(), Phase::Error);
        assert_eq!(backend.submit_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_session_creation_failure_aborts_submission() {
        let backend = Arc::new(FakeBackend {
            fail_create: true,
            ..Default::default()
        });
        let (ctrl, mut rx) = controller(backend.clone(), Some(paid_user()));

        let result = ctrl.submit_message("hello").await;
        assert!(matches!(result, Err(ChatError::NetworkOrServer(_))));
        assert!(ctrl.messages().is_empty());
        assert!(ctrl.active_session_id().is_none());
        assert!(!ctrl.is_submitting());
        assert_eq!(backend.submit_calls.load(Ordering::SeqCst), 0);

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            UiEvent::Notice {
                level: NoticeLevel::Error,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn test_unauthenticated_redirects_to_sign_in() {
        let backend = Arc::new(FakeBackend::default());
        let (ctrl, mut rx) = controller(backend.clone(), None);

        let result = ctrl.submit_message("hello").await;
        assert!(matches!(result, Err(ChatError::Unauthenticated)));
        assert!(ctrl.messages().is_empty());
        assert_eq!(backend.create_calls.load(Ordering::SeqCst), 0);
        assert!(drain(&mut rx).contains(&UiEvent::Redirect(Route::SignIn)));
    }

    #[tokio::test]
    async fn test_free_plan_redirects_to_plan_selection() {
        let backend = Arc::new(FakeBackend::default());
        let identity = Identity::new("coach@example.com", "token").with_plan("free");
        let (ctrl, mut rx) = controller(backend.clone(), Some(identity));

        assert!(matches!(
            ctrl.start_new_session().await,
            Err(ChatError::SubscriptionRequired)
        ));
        assert!(matches!(
            ctrl.submit_message("hello").await,
            Err(ChatError::SubscriptionRequired)
        ));
        assert_eq!(backend.create_calls.load(Ordering::SeqCst), 0);
        assert!(drain(&mut rx).contains(&UiEvent::Redirect(Route::PlanSelection)));
    }

    #[tokio::test]
    async fn test_select_session_loads_history() {
        let backend = Arc::new(FakeBackend::default().with_history(
            "s1",
            vec![
                Message::confirmed("a", "q1", "r1"),
                Message::confirmed("a", "q1", "r1"),
                Message::confirmed("b", "q2", "r2"),
            ],
        ));
        let (ctrl, _rx) = controller(backend, Some(paid_user()));

        ctrl.select_session("s1").await;
        let ids: Vec<String> = ctrl.messages().into_iter().map(|m| m.response_id).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(ctrl.location().session_id().as_deref(), Some("s1"));
    }

    #[tokio::test]
    async fn test_stale_history_fetch_is_discarded() {
        let gate = Arc::new(Notify::new());
        let mut fetch_gates = HashMap::new();
        fetch_gates.insert("s1".to_string(), gate.clone());
        let backend = Arc::new(
            FakeBackend {
                fetch_gates,
                ..Default::default()
            }
            .with_history("s1", vec![Message::confirmed("one", "q", "from s1")])
            .with_history("s2", vec![Message::confirmed("two", "q", "from s2")]),
        );
        let (ctrl, _rx) = controller(backend, Some(paid_user()));

        tokio::join!(ctrl.select_session("s1"), async {
            tokio::task::yield_now().await;
            ctrl.select_session("s2").await;
            gate.notify_one();
        });

        assert_eq!(ctrl.active_session_id().as_deref(), Some("s2"));
        assert_eq!(
            ctrl.messages(),
            vec![Message::confirmed("two", "q", "from s2")]
        );
    }

    #[tokio::test]
    async fn test_response_after_switch_does_not_leak() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(
            FakeBackend {
                submit_gate: Some(gate.clone()),
                ..Default::default()
            }
            .with_history("s2", vec![Message::confirmed("x", "other", "other answer")]),
        );
        let (ctrl, _rx) = controller(backend, Some(paid_user()));
        ctrl.select_session("s1").await;

        let (result, _) = tokio::join!(ctrl.submit_message("hello"), async {
            tokio::task::yield_now().await;
            ctrl.select_session("s2").await;
            gate.notify_one();
        });

        assert!(result.is_ok());
        assert_eq!(ctrl.active_session_id().as_deref(), Some("s2"));
        assert_eq!(
            ctrl.messages(),
            vec![Message::confirmed("x", "other", "other answer")]
        );
        assert!(!ctrl.is_submitting());
    }

    #[tokio::test]
    async fn test_selection_during_session_creation_is_kept() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(
            FakeBackend {
                create_gate: Some(gate.clone()),
                ..Default::default()
            }
            .with_history("s2", vec![Message::confirmed("x", "other", "other answer")]),
        );
        let (ctrl, _rx) = controller(backend.clone(), Some(paid_user()));

        let (result, _) = tokio::join!(ctrl.submit_message("hello"), async {
            // submit is now parked inside create_session
            tokio::task::yield_now().await;
            ctrl.select_session("s2").await;
            gate.notify_one();
        });

        assert!(result.is_ok());
        assert_eq!(ctrl.active_session_id().as_deref(), Some("s2"));
        assert_eq!(ctrl.location().session_id().as_deref(), Some("s2"));
        assert_eq!(
            ctrl.messages(),
            vec![Message::confirmed("x", "other", "other answer")]
        );
        assert!(!ctrl.is_submitting());

        // the question still reached the session created for it
        assert_eq!(backend.submit_calls.load(Ordering::SeqCst), 1);
        let delivered = lock(&backend.history).get("session-1").cloned().unwrap();
        assert_eq!(delivered[0].query_text, "hello");
    }

    #[tokio::test]
    async fn test_new_session_clears_conversation() {
        let backend = Arc::new(
            FakeBackend::default().with_history("s1", vec![Message::confirmed("a", "q", "r")]),
        );
        let (ctrl, mut rx) = controller(backend.clone(), Some(paid_user()));
        ctrl.select_session("s1").await;
        assert_eq!(ctrl.messages().len(), 1);

        let id = ctrl.start_new_session().await.unwrap();
        assert_eq!(id, "session-1");
        assert!(ctrl.messages().is_empty());
        assert_eq!(ctrl.location().session_id().as_deref(), Some("session-1"));
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            UiEvent::Notice {
                level: NoticeLevel::Success,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn test_deleting_active_session_resets_view() {
        let backend = Arc::new(
            FakeBackend {
                delete_result: Some(true),
                ..Default::default()
            }
            .with_history("s1", vec![Message::confirmed("a", "q", "r")])
            .with_history("s2", vec![]),
        );
        let (ctrl, _rx) = controller(backend, Some(paid_user()));
        ctrl.select_session("s1").await;

        ctrl.delete_session("s2").await.unwrap();
        assert_eq!(ctrl.active_session_id().as_deref(), Some("s1"));
        assert_eq!(ctrl.messages().len(), 1);

        ctrl.delete_session("s1").await.unwrap();
        assert!(ctrl.active_session_id().is_none());
        assert!(ctrl.messages().is_empty());
        assert_eq!(ctrl.location().session_id(), None);
        assert!(ctrl.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_state() {
        let backend = Arc::new(
            FakeBackend::default().with_history("s1", vec![Message::confirmed("a", "q", "r")]),
        );
        let (ctrl, mut rx) = controller(backend, Some(paid_user()));
        ctrl.select_session("s1").await;

        assert!(ctrl.delete_session("s1").await.is_err());
        assert_eq!(ctrl.active_session_id().as_deref(), Some("s1"));
        assert_eq!(ctrl.messages().len(), 1);
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            UiEvent::Notice {
                level: NoticeLevel::Error,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn test_blank_search_skips_network() {
        let backend = Arc::new(FakeBackend::default());
        let (ctrl, _rx) = controller(backend.clone(), Some(paid_user()));

        assert!(ctrl.search("   ").await.is_empty());
        assert_eq!(backend.search_calls.load(Ordering::SeqCst), 0);

        let hits = ctrl.search("sprints").await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "About sprints");
    }

    #[tokio::test]
    async fn test_topic_fills_draft_and_submits() {
        let backend = Arc::new(FakeBackend::default());
        let (ctrl, _rx) = controller(backend, Some(paid_user()));

        ctrl.apply_topic(Topic::Strength);
        assert_eq!(ctrl.draft(), "Tell me about ai strength");

        ctrl.submit_message(&ctrl.draft()).await.unwrap();
        assert!(ctrl.draft().is_empty());
        assert_eq!(ctrl.messages()[0].query_text, "Tell me about ai strength");
    }

    #[tokio::test]
    async fn test_restore_from_location() {
        let backend = Arc::new(
            FakeBackend::default().with_history("s9", vec![Message::confirmed("a", "q", "r")]),
        );
        let (ctrl, _rx) = controller(backend, Some(paid_user()));

        let location = Location::parse("http://localhost:3000/football-ai?session_id=s9").unwrap();
        ctrl.restore(&location).await;
        assert_eq!(ctrl.active_session_id().as_deref(), Some("s9"));
        assert_eq!(ctrl.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_submit_is_rejected() {
        let backend = Arc::new(FakeBackend::default());
        let (ctrl, _rx) = controller(backend.clone(), Some(paid_user()));

        assert!(matches!(
            ctrl.submit_message("   ").await,
            Err(ChatError::EmptyQuery)
        ));
        assert!(ctrl.messages().is_empty());
        assert_eq!(backend.create_calls.load(Ordering::SeqCst), 0);
    }
}
