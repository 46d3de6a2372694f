//! State machine types: triggers, states, decisions, outcomes.

use std::fmt;

use vigil_routes::RouteTier;

// ---------------------------------------------------------------------------
// ExpirationTrigger
// ---------------------------------------------------------------------------

/// An ephemeral expiration signal. Carries no persistent state; consumed
/// immediately by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirationTrigger {
    /// The local clock says the token expires within the lead time.
    NearExpiry,
    /// The local clock says the token is already past its expiry.
    AlreadyExpired,
    /// The server rejected the token even though the local clock still
    /// considered it valid.
    RemoteUnauthorized,
}

impl ExpirationTrigger {
    /// Whether this trigger evidences client/server divergence (a token
    /// the local clock trusted but the server refused).
    pub fn is_divergence(&self) -> bool {
        matches!(self, Self::RemoteUnauthorized)
    }
}

impl fmt::Display for ExpirationTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NearExpiry => write!(f, "near-expiry"),
            Self::AlreadyExpired => write!(f, "already-expired"),
            Self::RemoteUnauthorized => write!(f, "remote-unauthorized"),
        }
    }
}

// ---------------------------------------------------------------------------
// ModalPrompt
// ---------------------------------------------------------------------------

/// Everything the UI needs to phrase the expiration modal.
///
/// Captured at open time: the route the user was on (also the post-login
/// return target) and the trigger that opened the modal. The tier decides
/// the framing — "log back in" on protected pages, "continue as visitor
/// or log back in" on mixed ones.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalPrompt {
    /// Trust tier of the route at the moment the modal opened.
    pub tier: RouteTier,
    /// Path at the moment the modal opened.
    pub path: String,
    /// The event that opened the modal.
    pub trigger: ExpirationTrigger,
    /// Whether the modal offers "continue as visitor" (mixed tier only).
    pub offers_anonymous: bool,
}

// ---------------------------------------------------------------------------
// CoordinatorState
// ---------------------------------------------------------------------------

/// The coordinator's state machine.
///
/// ```text
///   Idle ──(trigger on mixed/protected)──→ ModalOpen
///    ↑                                        │ (further triggers: no-op)
///    └──────────(decision resolved)───────────┘
/// ```
///
/// `ModalOpen` doubles as the mutex substitute: it is checked
/// synchronously before any await, so a second trigger can never open a
/// second modal while a sign-out from the first is still in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorState {
    Idle,
    ModalOpen(ModalPrompt),
}

impl CoordinatorState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_modal_open(&self) -> bool {
        matches!(self, Self::ModalOpen(_))
    }
}

// ---------------------------------------------------------------------------
// TriggerDisposition
// ---------------------------------------------------------------------------

/// What the coordinator did with one trigger event.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerDisposition {
    /// The current route is purely-public; the event was discarded.
    SuppressedPublic,
    /// The modal opened (transition `Idle → ModalOpen`).
    Opened(ModalPrompt),
    /// A modal was already open; the event was a no-op.
    AlreadyOpen,
}

// ---------------------------------------------------------------------------
// ModalDecision
// ---------------------------------------------------------------------------

/// The user's answer to the expiration modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalDecision {
    /// Re-authenticate: sign out the stale session, then go to the login
    /// page with the current path as the return target.
    ///
    /// `discard_confirmed` acknowledges that unsaved edits will be lost.
    /// While the unsaved-work guard reports dirty state, the transition
    /// is blocked until the user confirms the discard.
    StayLoggedIn { discard_confirmed: bool },

    /// Close the modal without re-authenticating. What happens next
    /// depends on the route tier (forced home vs. anonymous continue).
    Dismiss,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// How a decision was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Stay-logged-in was blocked by unsaved edits; the modal stays open
    /// and nothing was cleared or signed out yet.
    BlockedOnUnsavedWork,

    /// Signed out and navigated to the login page; `return_to` is the
    /// preserved pre-expiration path.
    ReAuthenticate { return_to: String },

    /// Dismissed on a protected page: signed out and navigated home.
    ForcedHome,

    /// Dismissed on a mixed page: signed out in place and soft-refreshed
    /// so the page re-renders in its anonymous form.
    ContinueAnonymously,
}

// =========================================================================
// Tests
// =========================================================================
