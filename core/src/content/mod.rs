//! Content module
//!
//! Messages exchanged between the user and the model.

mod model;

pub use model::*;
