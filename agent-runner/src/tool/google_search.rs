//! Google Search grounding tool

use serde_json::json;
use tracing::debug;

use super::Tool;
use crate::error::Result;
use crate::llm::LlmRequest;

/// Lets the model search the web with Google and ground its answer on the
/// results. The search itself runs inside the Gemini API.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleSearch;

impl GoogleSearch {
    pub fn new() -> Self {
        Self
    }

    /// Gemini 1.x models only understand the older retrieval declaration
    fn declaration_key(model: &str) -> &'static str {
        if model.starts_with("gemini-1") {
            "googleSearchRetrieval"
        } else {
            "googleSearch"
        }
    }
}

impl Tool for GoogleSearch {
    fn name(&self) -> &str {
        "google_search"
    }

    fn description(&self) -> &str {
        "Search the web with Google for current information"
    }

    fn process_request(&self, request: &mut LlmRequest) -> Result<()> {
        let key = Self::declaration_key(&request.model);
        if request.tools.iter().any(|t| t.get(key).is_some()) {
            return Ok(());
        }

        debug!("Declaring {} for model {}", key, request.model);
        request.add_tool(json!({ key: {} }));
        Ok(())
    }
}
