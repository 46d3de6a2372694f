//! Auth-rejection classification.
//!
//! Decides whether a failed call means "the server no longer accepts the
//! token". The stakes are asymmetric: a false negative just means the
//! user sees stale data until the next signal; a false positive forces a
//! logout. So the match is deliberately narrow — explicit auth codes,
//! 401/403, or a message that unambiguously talks about token validity.

use crate::RpcError;

/// Message fragments that indicate an expired or rejected token.
///
/// Matched case-insensitively as substrings. Every entry names the
/// credential itself (token/jwt/session) — generic words like "expired"
/// alone are NOT enough.
const AUTH_MESSAGE_PATTERNS: &[&str] = &[
    "jwt expired",
    "token expired",
    "token is expired",
    "token has expired",
    "invalid token",
    "invalid jwt",
    "session expired",
    "session has expired",
    "not authenticated",
];

/// Returns `true` if the error means the server rejected the caller's
/// credentials.
///
/// Checks, in order:
/// 1. an explicit unauthorized/forbidden error code,
/// 2. HTTP status 401 or 403,
/// 3. a token-expiry/invalidity message pattern.
pub fn is_auth_rejection(error: &RpcError) -> bool {
    if error.code.is_some_and(|c| c.is_auth_code()) {
        return true;
    }

    if matches!(error.http_status, Some(401 | 403)) {
        return true;
    }

    let message = error.message.to_ascii_lowercase();
    AUTH_MESSAGE_PATTERNS
        .iter()
        .any(|pattern| message.contains(pattern))
}

// =========================================================================
// Tests
// =========================================================================
