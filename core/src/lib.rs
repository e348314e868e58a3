//! Core library for the search agent
//!
//! This crate contains the domain types shared by the runner and the binary:
//! - Configuration loading
//! - Conversation content and events
//! - Session storage

pub mod config;
pub mod content;
pub mod error;
pub mod event;
pub mod session;

pub use config::Settings;
pub use content::{Content, Part, Role};
pub use error::Error;
pub use event::{Event, EventActions, GroundingMetadata, RunConfig, StreamingMode, UsageMetadata};
pub use session::{CreateSessionRequest, InMemorySessionService, Session, SessionService};

pub type Result<T> = std::result::Result<T, Error>;
