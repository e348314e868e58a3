//! In-memory session storage
//!
//! Sessions live for the lifetime of the process.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use super::model::{CreateSessionRequest, Session, SessionKey};
use super::repository::SessionService;
use crate::event::Event;
use crate::{Error, Result};

/// Session store backed by a map
#[derive(Default)]
pub struct InMemorySessionService {
    sessions: RwLock<HashMap<SessionKey, Session>>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions across all apps and users
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionService for InMemorySessionService {
    async fn create(&self, request: CreateSessionRequest) -> Result<Session> {
        if request.app_name.trim().is_empty() {
            return Err(Error::InvalidInput("app_name must not be empty".into()));
        }
        if request.user_id.trim().is_empty() {
            return Err(Error::InvalidInput("user_id must not be empty".into()));
        }

        let mut session =
            Session::new(&request.app_name, &request.user_id).with_state(request.state);
        if let Some(id) = request.session_id {
            session = session.with_id(id);
        }

        let key = session.key();
        {
            let mut sessions = self.sessions.write().await;
            if sessions.contains_key(&key) {
                return Err(Error::SessionExists(key.to_string()));
            }
            sessions.insert(key.clone(), session.clone());
        }

        debug!("Created session {}", key);
        Ok(session)
    }

    async fn get(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(&SessionKey::new(app_name, user_id, session_id))
            .cloned())
    }

    async fn list(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>> {
        let sessions = self.sessions.read().await;
        let mut found: Vec<Session> = sessions
            .values()
            .filter(|s| s.app_name == app_name && s.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn delete(&self, app_name: &str, user_id: &str, session_id: &str) -> Result<bool> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions
            .remove(&SessionKey::new(app_name, user_id, session_id))
            .is_some())
    }

    async fn append_event(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
        event: Event,
    ) -> Result<()> {
        let key = SessionKey::new(app_name, user_id, session_id);
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&key)
            .ok_or_else(|| Error::SessionNotFound(key.to_string()))?;

        if event.partial {
            return Ok(());
        }

        for (k, v) in &event.actions.state_delta {
            session.state.insert(k.clone(), v.clone());
        }
        session.last_update_time = Utc::now();
        session.events.push(event);
        Ok(())
    }
}
