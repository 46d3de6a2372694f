//! The routing-layer seam.
//!
//! Like the auth gateway, the router is a capability handed to the
//! subsystem rather than an ambient global: the coordinator asks it for
//! the current path and tells it to navigate or soft-refresh, and a test
//! hands in a recording mock instead of a browser.

/// Errors from the routing layer. Recovery treats navigation as
/// best-effort, so these surface in logs, not in control flow.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    /// A hard navigation was rejected or failed.
    #[error("navigation to {0} failed: {1}")]
    PushFailed(String, String),

    /// A soft refresh of the current view failed.
    #[error("refresh failed: {0}")]
    RefreshFailed(String),
}

/// Read and drive the current navigation location.
pub trait Router: Send + Sync + 'static {
    /// The current path, including any locale prefix (`/en/coaching`).
    fn current_path(&self) -> String;

    /// Navigates to a new path.
    fn push(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<(), NavError>> + Send;

    /// Soft-refreshes the current view so server-rendered content
    /// re-renders against the current (possibly now-anonymous) session.
    fn refresh(
        &self,
    ) -> impl std::future::Future<Output = Result<(), NavError>> + Send;
}
