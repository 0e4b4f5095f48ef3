use crate::models::Message;
use crate::services::reconcile::reconcile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting,
    Error,
}

/// Every mutation of the conversation goes through `ConversationState::reduce`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    DraftChanged(String),
    SubmitStarted { query: String },
    SessionEstablished { session_id: String },
    /// No session could be provisioned for the submission in flight.
    SubmitAborted,
    ResponseReceived { session_id: String, message: Message },
    ResponseFailed { session_id: String, query: String },
    HistoryLoaded { session_id: String, messages: Vec<Message> },
    SessionSelected { session_id: String },
    NewSessionRequested,
    SessionDeleted { session_id: String },
}

#[derive(Debug, Clone)]
pub struct ConversationState {
    pub active_session_id: Option<String>,
    pub messages: Vec<Message>,
    pub phase: Phase,
    pub draft: String,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            active_session_id: None,
            messages: Vec::new(),
            phase: Phase::Idle,
            draft: String::new(),
        }
    }
}

impl ConversationState {
    pub fn is_submitting(&self) -> bool {
        self.phase == Phase::Submitting
    }

    fn is_active(&self, session_id: &str) -> bool {
        self.active_session_id.as_deref() == Some(session_id)
    }

    /// Replace the pending entry for `query`, falling back to the last
    /// pending entry. Appends when nothing is pending.
    fn settle_pending(&mut self, query: &str, message: Message) {
        let idx = self
            .messages
            .iter()
            .position(|m| m.is_pending() && m.query_text == query)
            .or_else(|| self.messages.iter().rposition(|m| m.is_pending()));

        match idx {
            Some(i) => self.messages[i] = message,
            None => self.messages.push(message),
        }
    }

    /// Apply `action`. Returns `false` when the action was rejected or did not
    /// apply to the active session.
    pub fn reduce(&mut self, action: Action) -> bool {
        match action {
            Action::DraftChanged(text) => {
                self.draft = text;
                true
            }
            Action::SubmitStarted { query } => {
                if self.is_submitting() {
                    return false;
                }
                self.phase = Phase::Submitting;
                self.messages.push(Message::pending(query));
                self.draft.clear();
                true
            }
            Action::SessionEstablished { session_id } => {
                // The user picked a session while this one was being created.
                if self.active_session_id.is_some() {
                    return false;
                }
                self.active_session_id = Some(session_id);
                true
            }
            Action::SubmitAborted => {
                if let Some(i) = self.messages.iter().rposition(|m| m.is_pending()) {
                    self.messages.remove(i);
                }
                self.phase = Phase::Error;
                true
            }
            Action::ResponseReceived {
                session_id,
                message,
            } => {
                self.phase = Phase::Idle;
                if !self.is_active(&session_id) {
                    return false;
                }
                let query = message.query_text.clone();
                self.settle_pending(&query, message);
                true
            }
            Action::ResponseFailed { session_id, query } => {
                self.phase = Phase::Error;
                if !self.is_active(&session_id) {
                    return false;
                }
                self.settle_pending(&query, Message::failed(query.as_str()));
                true
            }
            Action::HistoryLoaded {
                session_id,
                messages,
            } => {
                if !self.is_active(&session_id) {
                    return false;
                }
                self.messages = reconcile(&self.messages, &messages);
                true
            }
            Action::SessionSelected { session_id } => {
                if !self.is_active(&session_id) {
                    self.messages.clear();
                }
                self.active_session_id = Some(session_id);
                true
            }
            Action::NewSessionRequested => {
                self.messages.clear();
                self.active_session_id = None;
                true
            }
            Action::SessionDeleted { session_id } => {
                if !self.is_active(&session_id) {
                    return false;
                }
                self.messages.clear();
                self.active_session_id = None;
                true
            }
        }
    }
}
