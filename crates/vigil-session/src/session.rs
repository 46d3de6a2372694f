//! Snapshot types: the locally cached view of the authentication state.
//!
//! A "snapshot" is what the client currently believes about the session.
//! It tracks:
//! - WHO is signed in (an opaque user identifier)
//! - WHAT state the session is in (loading, authenticated, unauthenticated)
//! - WHEN the token expires (absolute wall-clock time)
//! - WHETHER a background refresh already failed (the error tag)
//!
//! The belief can diverge from the server's: a refresh-token rotation
//! failure, revocation, or clock skew can invalidate the token remotely
//! while the local expiry still looks fine. Detecting that divergence is
//! the whole point of the subsystem built on top of these types.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// AuthStatus
// ---------------------------------------------------------------------------

/// The coarse lifecycle state of the locally cached session.
///
/// ```text
///   Loading ──(resolved)──→ Authenticated ──(sign-out / expiry)──→ Unauthenticated
///                                ↑                                      │
///                                └──────────────(sign-in)───────────────┘
/// ```
///
/// - **Loading**: the auth layer hasn't answered yet (first render,
///   hydration). No expiration decision can be made in this state.
/// - **Authenticated**: a token is cached and locally considered valid.
/// - **Unauthenticated**: no session, or it was explicitly destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    Loading,
    Authenticated,
    Unauthenticated,
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => write!(f, "loading"),
            Self::Authenticated => write!(f, "authenticated"),
            Self::Unauthenticated => write!(f, "unauthenticated"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionErrorTag
// ---------------------------------------------------------------------------

/// Error tag set on a snapshot by the auth layer when a background token
/// refresh failed.
///
/// A tagged snapshot still reports `Authenticated` — the old token is
/// still cached — but the server will reject it. Consumers treat the tag
/// as a remote-divergence signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionErrorTag {
    /// The refresh-token rotation failed; the access token will not be
    /// renewed and the server side may already consider it dead.
    RefreshFailed,
}

impl fmt::Display for SessionErrorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RefreshFailed => write!(f, "RefreshFailed"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionSnapshot
// ---------------------------------------------------------------------------

/// The client's current belief about the session.
///
/// Produced by the platform's auth layer on demand and on every session
/// change. The reconciliation subsystem only reads snapshots; it never
/// constructs one outside of tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Coarse lifecycle state.
    pub status: AuthStatus,

    /// Opaque identifier of the signed-in user. `None` unless
    /// authenticated.
    pub user: Option<String>,

    /// Absolute expiry of the cached token. `None` unless authenticated.
    pub expires_at: Option<SystemTime>,

    /// Set when a background refresh attempt failed (see
    /// [`SessionErrorTag`]).
    pub error: Option<SessionErrorTag>,
}

impl SessionSnapshot {
    /// A snapshot for the not-yet-resolved state.
    pub fn loading() -> Self {
        Self {
            status: AuthStatus::Loading,
            user: None,
            expires_at: None,
            error: None,
        }
    }

    /// A snapshot for a signed-in user with a known token expiry.
    pub fn authenticated(user: impl Into<String>, expires_at: SystemTime) -> Self {
        Self {
            status: AuthStatus::Authenticated,
            user: Some(user.into()),
            expires_at: Some(expires_at),
            error: None,
        }
    }

    /// A snapshot for the signed-out state.
    pub fn unauthenticated() -> Self {
        Self {
            status: AuthStatus::Unauthenticated,
            user: None,
            expires_at: None,
            error: None,
        }
    }

    /// Marks the snapshot with a refresh-failure tag.
    pub fn with_error(mut self, tag: SessionErrorTag) -> Self {
        self.error = Some(tag);
        self
    }

    /// Whether the local cache currently holds a token.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.status, AuthStatus::Authenticated)
    }

    /// Whether the auth layer already knows the token cannot be renewed.
    ///
    /// Invariant: only meaningful while `is_authenticated()` — the tag is
    /// cleared together with the session on sign-out.
    pub fn has_refresh_failure(&self) -> bool {
        self.error.is_some()
    }
}

// =========================================================================
// Tests
// =========================================================================
