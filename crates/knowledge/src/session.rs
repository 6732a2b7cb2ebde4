//! Conversation state carried between turns.

use chrono::{DateTime, Utc};
use liftrag_llm::MetadataFilter;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// State the pipeline reads and writes across turns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    last_filter: Option<MetadataFilter>,
    session_id: Option<String>,
}

impl SessionState {
    /// Most recent non-empty filter, used when a turn identifies no elevator.
    pub fn last_filter(&self) -> Option<&MetadataFilter> {
        self.last_filter.as_ref()
    }

    /// Generation service session from the previous turn.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn set_last_filter(&mut self, filter: MetadataFilter) {
        self.last_filter = Some(filter);
    }

    pub fn set_session_id(&mut self, session_id: impl Into<String>) {
        self.session_id = Some(session_id.into());
    }

    pub fn reset(&mut self) {
        self.last_filter = None;
        self.session_id = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One displayed message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    pub at: DateTime<Utc>,
}

/// A single user's conversation: pipeline state plus the transcript.
///
/// The transcript is for display only and never sent to the model.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    id: Uuid,
    started_at: DateTime<Utc>,
    state: SessionState,
    transcript: Vec<ChatTurn>,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationContext {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            state: SessionState::default(),
            transcript: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(ChatRole::User, content.into());
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(ChatRole::Assistant, content.into());
    }

    fn push(&mut self, role: ChatRole, content: String) {
        self.transcript.push(ChatTurn {
            role,
            content,
            at: Utc::now(),
        });
    }

    /// Start over with a fresh id, empty state and no transcript.
    pub fn reset(&mut self) {
        tracing::debug!("Resetting conversation {}", self.id);
        *self = Self::new();
    }
}
