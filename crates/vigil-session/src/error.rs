//! Error types for the session layer.

/// Errors that can occur at the auth-layer boundary.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The sign-out request was rejected or the provider was unreachable.
    /// Recovery continues regardless — clearing local state is the goal.
    #[error("sign-out failed: {0}")]
    SignOutFailed(String),

    /// The auth provider could not be reached for a session read.
    #[error("auth gateway unavailable: {0}")]
    GatewayUnavailable(String),
}
