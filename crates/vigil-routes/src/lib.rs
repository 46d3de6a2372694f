//! Route sensitivity classification for Vigil.
//!
//! Every path in the application falls into exactly one of three trust
//! tiers, which drive two independent decisions downstream:
//!
//! - whether an expiration modal should appear at all (never on
//!   purely-public pages), and
//! - whether the user may dismiss it and keep browsing anonymously
//!   (mixed pages) or must choose between re-authenticating and being
//!   sent home (protected pages).
//!
//! Classification is a pure function of the path — no I/O, no state.
//! The prefix lists themselves are product data, not engineering
//! invariants, so they live in a serde-loadable [`RoutePolicy`] rather
//! than in code; the compiled-in default is only the curated starting
//! point.

mod classifier;
mod tier;

pub use classifier::{RouteClassifier, RoutePolicy};
pub use tier::RouteTier;
