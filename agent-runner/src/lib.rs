//! Agent Runner - model-backed agents and the turns they take
//!
//! This crate provides the Gemini model client, agent tools, the
//! [`LlmAgent`] and the [`Runner`] that streams a turn's events to the
//! console.

mod agent;
mod error;
mod llm;
mod printer;
mod runner;
mod stream;
mod tool;

pub use agent::{Agent, InvocationContext, LlmAgent, LlmAgentConfig};
pub use error::{Result, RunnerError};
pub use llm::{GeminiModel, GenerateConfig, LlmRequest, LlmResponse, Model, ModelStream, SseDecoder};
pub use printer::{print_turn, TurnSummary};
pub use runner::{Runner, RunnerConfig};
pub use stream::EventStream;
pub use tool::{GoogleSearch, Tool};
