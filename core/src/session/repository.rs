//! Session service trait
//!
//! Defines the interface for session storage operations.

use async_trait::async_trait;

use super::model::{CreateSessionRequest, Session};
use crate::event::Event;
use crate::Result;

/// Storage interface for conversation sessions
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Create a new session
    async fn create(&self, request: CreateSessionRequest) -> Result<Session>;

    /// Get a session by its full address
    async fn get(&self, app_name: &str, user_id: &str, session_id: &str)
        -> Result<Option<Session>>;

    /// List the sessions of one user, newest first
    async fn list(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>>;

    /// Delete a session
    async fn delete(&self, app_name: &str, user_id: &str, session_id: &str) -> Result<bool>;

    /// Record an event in a session
    ///
    /// Partial events are not stored.
    async fn append_event(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
        event: Event,
    ) -> Result<()>;
}
