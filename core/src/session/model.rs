//! Session model definitions

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::Event;

/// Conversation state for one application/user pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub app_name: String,
    pub user_id: String,
    #[serde(default)]
    pub state: HashMap<String, serde_json::Value>,
    /// Stored (non-partial) events, oldest first
    #[serde(default)]
    pub events: Vec<Event>,
    pub created_at: DateTime<Utc>,
    pub last_update_time: DateTime<Utc>,
}

impl Session {
    /// Create an empty session with a fresh ID
    pub fn new(app_name: impl Into<String>, user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            app_name: app_name.into(),
            user_id: user_id.into(),
            state: HashMap::new(),
            events: Vec::new(),
            created_at: now,
            last_update_time: now,
        }
    }

    /// Set the session ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the initial state
    pub fn with_state(mut self, state: HashMap<String, serde_json::Value>) -> Self {
        self.state = state;
        self
    }

    /// Lookup key of the session
    pub fn key(&self) -> SessionKey {
        SessionKey::new(&self.app_name, &self.user_id, &self.id)
    }
}

/// Request to create a session
#[derive(Debug, Clone, Default)]
pub struct CreateSessionRequest {
    pub app_name: String,
    pub user_id: String,
    /// Caller-chosen ID; a fresh UUID is used when absent
    pub session_id: Option<String>,
    pub state: HashMap<String, serde_json::Value>,
}

impl CreateSessionRequest {
    pub fn new(app_name: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// Request a specific session ID
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Seed a state value
    pub fn with_state(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.state.insert(key.into(), value);
        self
    }
}

/// Full address of a session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(app_name: &str, user_id: &str, session_id: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.app_name, self.user_id, self.session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let session = Session::new("Google Search_agent", "user1234");
        assert!(Uuid::parse_str(&session.id).is_ok());
        assert!(session.events.is_empty());
        assert!(session.state.is_empty());
        assert_eq!(session.created_at, session.last_update_time);
    }

    #[test]
    fn test_session_key_display() {
        let session = Session::new("app", "user").with_id("abc");
        assert_eq!(session.key().to_string(), "app/user/abc");
    }
}
