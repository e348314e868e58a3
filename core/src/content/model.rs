//! Content model definitions

use serde::{Deserialize, Serialize};

/// Author role of a piece of content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Default for Role {
    fn default() -> Self {
        Self::Model
    }
}

/// A single part of a message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Set when the part carries the model's reasoning rather than its answer
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub thought: bool,
}

impl Part {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            thought: false,
        }
    }

    /// Text of the part, or an empty string for non-text parts
    pub fn as_text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

/// A message: a role plus an ordered list of parts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Create content with the given role and no parts
    pub fn new(role: Role) -> Self {
        Self {
            role,
            parts: Vec::new(),
        }
    }

    /// Create a single-part user message
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User).with_part(Part::text(text))
    }

    /// Create a single-part model message
    pub fn model_text(text: impl Into<String>) -> Self {
        Self::new(Role::Model).with_part(Part::text(text))
    }

    /// Append a part
    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Concatenated text of all non-thought parts
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter(|p| !p.thought)
            .map(Part::as_text)
            .collect()
    }

    /// Check whether any part carries text
    pub fn has_text(&self) -> bool {
        self.parts.iter().any(|p| !p.as_text().is_empty())
    }
}
