//! Error types for the coordinator layer.

/// Errors that can occur when driving the coordinator.
///
/// Note the asymmetry with the event path: trigger handling never fails
/// (events are discarded or absorbed), only *misuse* of the decision API
/// does.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// A decision arrived while no modal was open. Usually a stale UI
    /// callback racing a resolution that already happened.
    #[error("no expiration modal is open")]
    NoModalOpen,
}
