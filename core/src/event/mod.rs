//! Event module
//!
//! Units of streamed agent output and the configuration of a run.

mod model;
mod run_config;

pub use model::*;
pub use run_config::{RunConfig, StreamingMode};
