//! Model clients
//!
//! A [`Model`] turns an [`LlmRequest`] into either one whole response or a
//! stream of incremental responses.

use async_trait::async_trait;
use sa_core::{Content, GroundingMetadata, UsageMetadata};
use serde::Serialize;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::Result;

mod gemini;
#[cfg(test)]
pub(crate) mod mock;
mod sse;

pub use gemini::GeminiModel;
pub use sse::SseDecoder;

/// Capacity of the channel behind a [`ModelStream`]
pub(crate) const STREAM_BUFFER: usize = 64;

/// Incremental model responses, in arrival order
pub type ModelStream = ReceiverStream<Result<LlmResponse>>;

/// Sampling parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerateConfig {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.max_output_tokens.is_none()
    }
}

/// A request to a model
#[derive(Debug, Clone, Default)]
pub struct LlmRequest {
    /// Name of the model the request is built for
    pub model: String,
    /// Conversation so far, oldest first
    pub contents: Vec<Content>,
    /// Instruction sent ahead of the conversation
    pub system_instruction: Option<String>,
    /// Provider tool declarations, in tool order
    pub tools: Vec<serde_json::Value>,
    pub config: GenerateConfig,
}

impl LlmRequest {
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            contents,
            ..Default::default()
        }
    }

    /// Append a provider tool declaration
    pub fn add_tool(&mut self, declaration: serde_json::Value) {
        self.tools.push(declaration);
    }
}

/// One (possibly incremental) response from a model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmResponse {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
    pub grounding: Option<GroundingMetadata>,
    pub usage: Option<UsageMetadata>,
}

impl LlmResponse {
    /// Response carrying only text
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Some(Content::model_text(text)),
            ..Default::default()
        }
    }
}

/// A language model backend
#[async_trait]
pub trait Model: Send + Sync {
    /// Model name
    fn name(&self) -> &str;

    /// Generate one whole response
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse>;

    /// Generate a response as a stream of incremental chunks
    ///
    /// Errors before the first chunk are returned directly; later errors are
    /// items of the stream.
    async fn generate_stream(&self, request: LlmRequest) -> Result<ModelStream>;
}
