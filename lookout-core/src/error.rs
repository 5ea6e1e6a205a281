//! Error types for registry and control-plane operations.

use thiserror::Error;

/// Errors from metrics-registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The named adapter was never seeded into the registry.
    #[error("Unknown adapter: {0}")]
    UnknownAdapter(String),
}

impl RegistryError {
    pub fn unknown_adapter(name: impl Into<String>) -> Self {
        Self::UnknownAdapter(name.into())
    }
}

/// Errors from control-plane command parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// The requested action is not part of the control vocabulary.
    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

impl ControlError {
    pub fn unknown_action(action: impl Into<String>) -> Self {
        Self::UnknownAction(action.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_the_offender() {
        let err = RegistryError::unknown_adapter("mystery");
        assert_eq!(err.to_string(), "Unknown adapter: mystery");

        let err = ControlError::unknown_action("pause");
        assert_eq!(err.to_string(), "Unknown action: pause");
    }
}
