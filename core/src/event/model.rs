//! Event model definitions

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::{Content, Part};

/// Author name used for events carrying the user's message
pub const USER_AUTHOR: &str = "user";

/// A web source the model grounded its answer on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub uri: String,
    pub title: Option<String>,
}

/// Search grounding attached to a model response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundingMetadata {
    /// Queries the model issued to the search backend
    #[serde(default)]
    pub web_search_queries: Vec<String>,
    /// Sources backing the answer, in the order returned
    #[serde(default)]
    pub sources: Vec<GroundingSource>,
}

impl GroundingMetadata {
    pub fn is_empty(&self) -> bool {
        self.web_search_queries.is_empty() && self.sources.is_empty()
    }
}

/// Token accounting for a model response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub prompt_tokens: u32,
    pub candidate_tokens: u32,
    pub total_tokens: u32,
}

/// Side effects requested by an event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventActions {
    /// Keys merged into the session state when the event is stored
    #[serde(default)]
    pub state_delta: HashMap<String, serde_json::Value>,
}

/// A unit of streamed output from a turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event ID
    pub id: Uuid,

    /// Invocation (turn) this event belongs to
    pub invocation_id: Uuid,

    /// `"user"` or the name of the agent that produced the event
    pub author: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,

    /// More fragments of the same response follow
    pub partial: bool,

    /// Last event of the agent's turn
    pub turn_complete: bool,

    /// Message payload
    pub content: Option<Content>,

    /// Reason the model stopped generating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,

    /// Search grounding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grounding: Option<GroundingMetadata>,

    /// Token usage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageMetadata>,

    #[serde(default)]
    pub actions: EventActions,
}

impl Event {
    /// Create an empty, non-partial event
    pub fn new(invocation_id: Uuid, author: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            invocation_id,
            author: author.into(),
            timestamp: Utc::now(),
            partial: false,
            turn_complete: false,
            content: None,
            finish_reason: None,
            grounding: None,
            usage: None,
            actions: EventActions::default(),
        }
    }

    /// Create the event recording a user message
    pub fn user_message(invocation_id: Uuid, content: Content) -> Self {
        Self::new(invocation_id, USER_AUTHOR).with_content(content)
    }

    /// Set the content
    pub fn with_content(mut self, content: Content) -> Self {
        self.content = Some(content);
        self
    }

    /// Set the partial flag
    pub fn with_partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    /// Mark the event as the end of the turn
    pub fn with_turn_complete(mut self, turn_complete: bool) -> Self {
        self.turn_complete = turn_complete;
        self
    }

    /// Add a state update
    pub fn with_state(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.actions.state_delta.insert(key.into(), value);
        self
    }

    /// Check whether the event was authored by the user
    pub fn is_user(&self) -> bool {
        self.author == USER_AUTHOR
    }

    /// Content parts, empty when the event carries no content
    pub fn parts(&self) -> &[Part] {
        self.content
            .as_ref()
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }

    /// Concatenated text of the event's content
    pub fn text(&self) -> String {
        self.content.as_ref().map(Content::text).unwrap_or_default()
    }
}
