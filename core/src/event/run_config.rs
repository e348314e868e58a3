//! Run configuration

use serde::{Deserialize, Serialize};

/// How the agent delivers its response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamingMode {
    /// One event with the whole response
    None,
    /// Incremental partial events followed by one aggregated final event
    Sse,
}

impl Default for StreamingMode {
    fn default() -> Self {
        Self::None
    }
}

/// Per-turn run configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub streaming_mode: StreamingMode,
}

impl RunConfig {
    /// Configuration for server-sent-event streaming
    pub fn sse() -> Self {
        Self {
            streaming_mode: StreamingMode::Sse,
        }
    }

    /// Check whether partial events are requested
    pub fn is_streaming(&self) -> bool {
        self.streaming_mode == StreamingMode::Sse
    }
}
