//! Unified error type for the Vigil meta-crate.

use vigil_coordinator::{CoordinatorError, NavError};
use vigil_session::SessionError;

/// Top-level error that wraps all crate-specific errors.
///
/// When embedding the `vigil` meta-crate, application glue deals with
/// this single type instead of importing errors from each sub-crate; the
/// `#[from]` conversions let `?` lift sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum VigilError {
    /// An auth-layer error (sign-out, gateway unavailable).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A routing-layer error (push, refresh).
    #[error(transparent)]
    Nav(#[from] NavError),

    /// A coordinator-layer error (decision without an open modal).
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    /// The monitor task has shut down; the handle is inert.
    #[error("session monitor is not running")]
    MonitorClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_session_error() {
        let err = SessionError::SignOutFailed("gone".into());
        let vigil_err: VigilError = err.into();
        assert!(matches!(vigil_err, VigilError::Session(_)));
        assert!(vigil_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_nav_error() {
        let err = NavError::RefreshFailed("nope".into());
        let vigil_err: VigilError = err.into();
        assert!(matches!(vigil_err, VigilError::Nav(_)));
    }

    #[test]
    fn test_from_coordinator_error() {
        let err = CoordinatorError::NoModalOpen;
        let vigil_err: VigilError = err.into();
        assert!(matches!(vigil_err, VigilError::Coordinator(_)));
    }

    #[test]
    fn test_monitor_closed_message() {
        assert_eq!(
            VigilError::MonitorClosed.to_string(),
            "session monitor is not running"
        );
    }
}
