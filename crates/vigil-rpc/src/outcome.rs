//! Outcome types: what a completed RPC call looks like from the outside.
//!
//! These mirror the error shape the application's RPC layer produces
//! (a machine-readable code, an HTTP status where one exists, and a
//! human-readable message), so the classifier can match on whatever
//! subset happens to be present.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RequestKind
// ---------------------------------------------------------------------------

/// Whether the completed call was a read or a write.
///
/// Auth rejections are classified the same way for both; the kind exists
/// so logs can tell a failing background refetch from a failing save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Query,
    Mutation,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Mutation => write!(f, "mutation"),
        }
    }
}

// ---------------------------------------------------------------------------
// RpcErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable error codes used by the RPC layer.
///
/// `#[serde(other)]` folds codes this crate doesn't know about into
/// [`Unknown`](Self::Unknown) instead of failing deserialization — the
/// RPC layer is free to grow new codes without breaking the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcErrorCode {
    Unauthorized,
    Forbidden,
    BadRequest,
    NotFound,
    Timeout,
    InternalServerError,
    #[serde(other)]
    Unknown,
}

impl RpcErrorCode {
    /// Whether this code on its own means the server rejected the caller's
    /// credentials.
    pub fn is_auth_code(self) -> bool {
        matches!(self, Self::Unauthorized | Self::Forbidden)
    }
}

// ---------------------------------------------------------------------------
// RpcError
// ---------------------------------------------------------------------------

/// A failure reported by the RPC layer for one call.
///
/// All three fields are best-effort: a transport-level failure may carry
/// only a message, a well-formed API rejection carries all three.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("rpc error ({code:?}, http {http_status:?}): {message}")]
pub struct RpcError {
    /// Machine-readable code, when the RPC layer produced one.
    pub code: Option<RpcErrorCode>,

    /// HTTP status of the underlying response, when one was observed.
    pub http_status: Option<u16>,

    /// Human-readable message. Always present, possibly vague.
    pub message: String,
}

impl RpcError {
    /// An error carrying only a message (transport-level failure).
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            code: None,
            http_status: None,
            message: message.into(),
        }
    }

    /// A fully formed API rejection.
    pub fn with_code(
        code: RpcErrorCode,
        http_status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: Some(code),
            http_status: Some(http_status),
            message: message.into(),
        }
    }

    /// Extracts an `RpcError` from a raw JSON error body.
    ///
    /// The RPC layer reports errors as `{ "code": "...", "httpStatus": n,
    /// "message": "..." }`, but glue code often only has the body as a
    /// `serde_json::Value`. Missing or malformed fields degrade to
    /// `None`; classification downstream copes with partial errors.
    pub fn from_json(body: &serde_json::Value) -> Self {
        let code = body
            .get("code")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok());
        let http_status = body
            .get("httpStatus")
            .and_then(serde_json::Value::as_u64)
            .and_then(|n| u16::try_from(n).ok());
        let message = body
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self {
            code,
            http_status,
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// QueryOutcome
// ---------------------------------------------------------------------------

/// One completed query or mutation, as published into the outcome feed.
///
/// `error: None` is a success. Successes travel through the feed too —
/// consumers other than the interceptor (devtools, logging) care about
/// them, and the bus is cheap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    /// Read or write.
    pub kind: RequestKind,

    /// The procedure path, e.g. `courses.list` or `enrollment.create`.
    pub path: String,

    /// The failure, if the call failed.
    pub error: Option<RpcError>,
}

impl QueryOutcome {
    /// A successful completion.
    pub fn success(kind: RequestKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            error: None,
        }
    }

    /// A failed completion.
    pub fn failure(
        kind: RequestKind,
        path: impl Into<String>,
        error: RpcError,
    ) -> Self {
        Self {
            kind,
            path: path.into(),
            error: Some(error),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&RpcErrorCode::Unauthorized).unwrap();
        assert_eq!(json, "\"UNAUTHORIZED\"");

        let json = serde_json::to_string(&RpcErrorCode::InternalServerError).unwrap();
        assert_eq!(json, "\"INTERNAL_SERVER_ERROR\"");
    }

    #[test]
    fn test_unknown_code_folds_to_unknown() {
        // A code added server-side after this crate shipped must not
        // break feed deserialization.
        let code: RpcErrorCode =
            serde_json::from_str("\"PAYLOAD_TOO_LARGE\"").unwrap();
        assert_eq!(code, RpcErrorCode::Unknown);
    }

    #[test]
    fn test_is_auth_code() {
        assert!(RpcErrorCode::Unauthorized.is_auth_code());
        assert!(RpcErrorCode::Forbidden.is_auth_code());
        assert!(!RpcErrorCode::NotFound.is_auth_code());
        assert!(!RpcErrorCode::Unknown.is_auth_code());
    }

    #[test]
    fn test_outcome_round_trip() {
        let outcome = QueryOutcome::failure(
            RequestKind::Mutation,
            "enrollment.create",
            RpcError::with_code(RpcErrorCode::Unauthorized, 401, "jwt expired"),
        );
        let bytes = serde_json::to_vec(&outcome).unwrap();
        let decoded: QueryOutcome = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(outcome, decoded);
    }

    #[test]
    fn test_success_has_no_error() {
        let outcome = QueryOutcome::success(RequestKind::Query, "courses.list");
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_rpc_error_display_includes_message() {
        let err = RpcError::message_only("connection reset");
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_from_json_full_body() {
        let body = serde_json::json!({
            "code": "UNAUTHORIZED",
            "httpStatus": 401,
            "message": "jwt expired",
        });
        let err = RpcError::from_json(&body);
        assert_eq!(err.code, Some(RpcErrorCode::Unauthorized));
        assert_eq!(err.http_status, Some(401));
        assert_eq!(err.message, "jwt expired");
    }

    #[test]
    fn test_from_json_partial_body_degrades_to_none() {
        let body = serde_json::json!({ "message": "boom" });
        let err = RpcError::from_json(&body);
        assert_eq!(err.code, None);
        assert_eq!(err.http_status, None);
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn test_from_json_garbage_body_yields_empty_error() {
        let body = serde_json::json!(["not", "an", "object"]);
        let err = RpcError::from_json(&body);
        assert_eq!(err.code, None);
        assert_eq!(err.http_status, None);
        assert!(err.message.is_empty());
    }
}
