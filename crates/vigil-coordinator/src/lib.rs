//! The expiration coordinator for Vigil.
//!
//! Two independent triggers — the local expiry clock and the remote
//! error interceptor — feed into one decision point. This crate is that
//! decision point:
//!
//! 1. **State machine** — `Idle ⇄ ModalOpen`, at most one modal ever
//!    ([`ExpirationCoordinator`], [`CoordinatorState`])
//! 2. **Route policy application** — purely-public pages discard events,
//!    mixed pages may continue anonymously, protected pages force a
//!    choice
//! 3. **Recovery execution** — sign-out / navigate / refresh against the
//!    auth and routing capabilities, best-effort and idempotent
//! 4. **Unsaved work** — the ambient dirty-state guard that can block a
//!    forced logout ([`UnsavedWorkGuard`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Monitor (above)      ← owns the timers and the feed, forwards events
//!     ↕
//! Coordinator (this crate)  ← decides and executes
//!     ↕
//! AuthGateway / Router (below)  ← platform capabilities, passed in
//! ```

mod coordinator;
mod error;
mod guard;
mod router;
mod state;

pub use coordinator::{
    CoordinatorMetrics, ExpirationCoordinator, RecoveryPaths,
};
pub use error::CoordinatorError;
pub use guard::UnsavedWorkGuard;
pub use router::{NavError, Router};
pub use state::{
    CoordinatorState, ExpirationTrigger, ModalDecision, ModalPrompt,
    Resolution, TriggerDisposition,
};
