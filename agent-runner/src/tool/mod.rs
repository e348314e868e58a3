//! Agent tools
//!
//! A tool contributes a capability to the model request. Built-in provider
//! tools such as web search run on the model side; the agent only declares
//! them.

use crate::error::Result;
use crate::llm::LlmRequest;

mod google_search;

pub use google_search::GoogleSearch;

/// A capability an agent may use while answering
pub trait Tool: Send + Sync {
    /// Unique name within an agent
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Add the tool's declaration to an outgoing request
    fn process_request(&self, request: &mut LlmRequest) -> Result<()>;
}
