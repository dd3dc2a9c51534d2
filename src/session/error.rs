//! Session Errors
//!
//! Failures reported by the host session ports.

use thiserror::Error;

use super::VariableId;

/// Errors a host session can report when the engine reads its state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Session state is not populated yet (logging in, loading a region)
    #[error("session state is not available yet")]
    NotReady,

    /// The variable id does not exist in this session
    #[error("unknown session variable {0}")]
    UnknownVariable(VariableId),

    /// The dialog options widget could not be read
    #[error("dialog options are not readable")]
    DialogUnavailable,
}

impl SessionError {
    /// Transient errors clear up on their own; everything else is a
    /// configuration problem in the quest data.
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionError::NotReady | SessionError::DialogUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(SessionError::NotReady.is_transient());
        assert!(SessionError::DialogUnavailable.is_transient());
        assert!(!SessionError::UnknownVariable(12).is_transient());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            SessionError::UnknownVariable(542).to_string(),
            "unknown session variable 542"
        );
    }
}
