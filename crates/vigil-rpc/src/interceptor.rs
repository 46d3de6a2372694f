//! The remote-error interceptor: one latched rejection per session.
//!
//! Ten concurrent requests failing with 401 at the same instant is one
//! piece of news, not ten. The latch makes sure the subsystem hears it
//! once; it re-opens only when a fresh sign-in replaces the session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{OutcomeBus, OutcomeStream, QueryOutcome, RpcError, is_auth_rejection};

// ---------------------------------------------------------------------------
// UnauthorizedLatch
// ---------------------------------------------------------------------------

/// One-shot flag preventing duplicate remote-unauthorized emissions.
///
/// Cheap to clone; all clones share the same flag, so the monitor can
/// reset the latch while the interceptor owns the trip side.
#[derive(Debug, Clone, Default)]
pub struct UnauthorizedLatch {
    tripped: Arc<AtomicBool>,
}

impl UnauthorizedLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trips the latch. Returns `true` only for the first call since the
    /// last reset — the one caller that gets to emit.
    pub fn trip(&self) -> bool {
        !self.tripped.swap(true, Ordering::SeqCst)
    }

    /// Re-opens the latch. Called when a new successful sign-in occurs.
    pub fn reset(&self) {
        self.tripped.store(false, Ordering::SeqCst);
    }

    /// Whether the latch has fired since the last reset.
    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// RemoteRejection
// ---------------------------------------------------------------------------

/// The single latched signal: the server rejected our token.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRejection {
    /// The procedure whose failure tripped the latch.
    pub path: String,
    /// The error as the RPC layer reported it, kept for diagnosis of
    /// refresh-rotation bugs.
    pub error: RpcError,
}

// ---------------------------------------------------------------------------
// RemoteErrorInterceptor
// ---------------------------------------------------------------------------

/// Consumes the outcome feed and yields at most one [`RemoteRejection`]
/// per authenticated session.
///
/// Sits inside the monitor's `tokio::select!` loop:
///
/// ```ignore
/// loop {
///     tokio::select! {
///         rejection = interceptor.next_rejection() => { /* open modal */ }
///         // ... timer, poll, commands ...
///     }
/// }
/// ```
pub struct RemoteErrorInterceptor {
    outcomes: OutcomeStream,
    latch: UnauthorizedLatch,
}

impl RemoteErrorInterceptor {
    /// Subscribes to the bus with a fresh latch.
    pub fn new(bus: &OutcomeBus) -> Self {
        Self::with_latch(bus, UnauthorizedLatch::new())
    }

    /// Subscribes to the bus sharing an externally held latch.
    pub fn with_latch(bus: &OutcomeBus, latch: UnauthorizedLatch) -> Self {
        Self {
            outcomes: bus.subscribe(),
            latch,
        }
    }

    /// A clone of the shared latch, for resetting on sign-in.
    pub fn latch(&self) -> UnauthorizedLatch {
        self.latch.clone()
    }

    /// Waits for the next auth rejection that passes the latch.
    ///
    /// Successes and non-auth failures are consumed silently. Once the
    /// feed closes this pends forever, so a `select!` loop keeps
    /// servicing its other branches.
    pub async fn next_rejection(&mut self) -> RemoteRejection {
        loop {
            let Some(outcome) = self.outcomes.next().await else {
                // Feed closed — nothing further will ever arrive.
                std::future::pending::<()>().await;
                unreachable!()
            };

            if let Some(rejection) = self.inspect(outcome) {
                return rejection;
            }
        }
    }

    /// Classifies one outcome; returns the rejection if it passes the
    /// latch.
    fn inspect(&self, outcome: QueryOutcome) -> Option<RemoteRejection> {
        let error = outcome.error?;

        if !is_auth_rejection(&error) {
            return None;
        }

        if !self.latch.trip() {
            tracing::debug!(
                path = %outcome.path,
                "auth rejection suppressed, latch already tripped"
            );
            return None;
        }

        tracing::warn!(
            path = %outcome.path,
            error = %error,
            "remote auth rejection while local session looked valid"
        );

        Some(RemoteRejection {
            path: outcome.path,
            error,
        })
    }
}

// =========================================================================
// Tests
// =========================================================================
