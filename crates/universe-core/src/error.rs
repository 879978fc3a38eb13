//! Validation errors raised while loading, checking or serializing a turn.

/// The single failure class of the engine.
///
/// Raised synchronously whenever an entity's attributes break its component
/// contract. The message is shown to callers verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ValidationError {}

pub type Result<T, E = ValidationError> = std::result::Result<T, E>;
