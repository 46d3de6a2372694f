//! The three trust tiers a route can belong to.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How strongly a page depends on authentication state.
///
/// The tiers are mutually exclusive and, with the classifier's matching
/// order, total over all paths:
///
/// ```text
/// PurelyPublic ─ content identical regardless of auth (legal pages, about)
/// Mixed        ─ public but personalized when signed in (catalog, coaching)
/// Protected    ─ requires authentication (workspace, checkout)
/// ```
///
/// Unmatched paths are `Protected`. Failing toward the sensitive tier
/// can only ever show an extra modal; failing toward `PurelyPublic`
/// would silently hide a real expiration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteTier {
    PurelyPublic,
    Mixed,
    Protected,
}

impl RouteTier {
    /// Whether expiration events on this tier are discarded outright.
    pub fn suppresses_modal(&self) -> bool {
        matches!(self, Self::PurelyPublic)
    }

    /// Whether dismissing the modal may continue the visit anonymously.
    pub fn allows_anonymous(&self) -> bool {
        matches!(self, Self::Mixed)
    }

    /// Whether the page cannot be shown without a valid session.
    pub fn requires_reauth(&self) -> bool {
        matches!(self, Self::Protected)
    }
}

impl fmt::Display for RouteTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PurelyPublic => write!(f, "purely-public"),
            Self::Mixed => write!(f, "mixed"),
            Self::Protected => write!(f, "protected"),
        }
    }
}
