//! Session module
//!
//! Conversation state scoped to one application/user pair.

mod memory_store;
mod model;
mod repository;

pub use memory_store::InMemorySessionService;
pub use model::*;
pub use repository::SessionService;
