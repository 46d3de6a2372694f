//! The auth-layer seam: how the subsystem talks to the platform's auth
//! provider.
//!
//! Vigil doesn't implement authentication itself — that's the platform's
//! job (or its auth provider's: NextAuth-style token rotation, OIDC,
//! custom JWT, whatever). Vigil defines the [`AuthGateway`] trait: read
//! the current session, request a sign-out. You implement it against your
//! auth layer and hand it to the monitor as an explicit capability.
//!
//! Passing the gateway in (rather than reaching for an ambient global)
//! keeps the coordinator deterministic under test: a mock gateway records
//! calls, no real tokens involved.

use crate::{SessionError, SessionSnapshot};

// ---------------------------------------------------------------------------
// SignOutOptions
// ---------------------------------------------------------------------------

/// Options for a sign-out request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignOutOptions {
    /// Whether the auth layer itself should navigate after clearing the
    /// session. The coordinator always passes `false` and performs any
    /// navigation through the routing layer, so local state is cleared
    /// before the page moves.
    pub redirect: bool,
}

impl Default for SignOutOptions {
    fn default() -> Self {
        Self { redirect: false }
    }
}

// ---------------------------------------------------------------------------
// AuthGateway
// ---------------------------------------------------------------------------

/// Read access to the cached session plus the ability to destroy it.
///
/// # Contract
///
/// - [`session`](Self::session) re-validates on demand: implementations
///   are expected to refresh/refetch if their cache is stale, and to set
///   the snapshot's error tag when a background refresh has failed.
/// - [`sign_out`](Self::sign_out) must be idempotent — signing out while
///   already signed out is a successful no-op. Callers treat failures as
///   best-effort anyway (local state still gets cleared).
///
/// # Example
///
/// ```rust
/// use vigil_session::{AuthGateway, SessionError, SessionSnapshot, SignOutOptions};
///
/// /// A gateway that is always signed out. Useful as a placeholder in
/// /// previews and tests.
/// struct AnonymousGateway;
///
/// impl AuthGateway for AnonymousGateway {
///     async fn session(&self) -> SessionSnapshot {
///         SessionSnapshot::unauthenticated()
///     }
///
///     async fn sign_out(
///         &self,
///         _options: SignOutOptions,
///     ) -> Result<(), SessionError> {
///         Ok(())
///     }
/// }
/// ```
pub trait AuthGateway: Send + Sync + 'static {
    /// Returns the current session snapshot, re-validating if needed.
    fn session(
        &self,
    ) -> impl std::future::Future<Output = SessionSnapshot> + Send;

    /// Destroys the local session.
    ///
    /// # Errors
    /// [`SessionError::SignOutFailed`] when the provider call failed.
    /// The local cache is still expected to be cleared — the error exists
    /// for logging, not for control flow.
    fn sign_out(
        &self,
        options: SignOutOptions,
    ) -> impl std::future::Future<Output = Result<(), SessionError>> + Send;
}
