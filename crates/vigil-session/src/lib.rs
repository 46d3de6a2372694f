//! Session state types and the auth-layer contract for Vigil.
//!
//! This crate defines WHAT the reconciliation subsystem knows about the
//! user's authentication state:
//!
//! 1. **Snapshots** — the locally cached view of the session
//!    ([`SessionSnapshot`], [`AuthStatus`])
//! 2. **The auth boundary** — the capability the platform's auth layer
//!    hands to the subsystem ([`AuthGateway`] trait)
//!
//! # How it fits in the stack
//!
//! ```text
//! Monitor / Coordinator (above)  ← reads snapshots, requests sign-out
//!     ↕
//! Session Layer (this crate)  ← snapshot types and the gateway seam
//!     ↕
//! Platform auth provider (below)  ← owns tokens, refresh, sign-in
//! ```
//!
//! The subsystem never mutates a session directly. It only reads
//! snapshots and asks the gateway to sign out.

mod error;
mod gateway;
mod session;

pub use error::SessionError;
pub use gateway::{AuthGateway, SignOutOptions};
pub use session::{AuthStatus, SessionErrorTag, SessionSnapshot};
