//! Clock resources for Vigil: the one-shot expiry timer and the periodic
//! re-validation poll.
//!
//! Both are explicit resources with arm/cancel lifecycles, owned by the
//! session monitor and driven from its `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         fire = timer.wait() => { /* near-expiry or already-expired */ }
//!         n = poll.wait_for_check() => { /* re-validate the session */ }
//!         // ... commands, outcome feed ...
//!     }
//! }
//! ```
//!
//! An unarmed timer and a paused or stopped poll pend forever, so the
//! select! loop keeps servicing its other branches.
//!
//! # Generations
//!
//! A timer armed for one session must never be mistaken for a fire
//! belonging to the next. Every `schedule` bumps a generation counter
//! and the fire carries the generation it was armed with; consumers
//! discard fires whose generation no longer matches.

use std::time::{Duration, SystemTime};

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Timing configuration for the clock resources.
#[derive(Debug, Clone)]
pub struct ClockConfig {
    /// How far before the known token expiry the near-expiry warning
    /// fires. Default: 30 seconds.
    pub lead_time: Duration,

    /// Lower bound on any armed delay, so an expiry just inside the lead
    /// window still produces a strictly positive timer. Default: 1 second.
    pub min_delay: Duration,

    /// Cadence of the background session re-validation poll.
    /// Default: 5 minutes.
    pub poll_interval: Duration,

    /// Random jitter (0–max ms) added to the *first* poll deadline so
    /// many tabs opened together don't re-validate in lockstep.
    pub poll_jitter_ms: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            lead_time: Duration::from_secs(30),
            min_delay: Duration::from_secs(1),
            poll_interval: Duration::from_secs(5 * 60),
            poll_jitter_ms: 1_500,
        }
    }
}

impl ClockConfig {
    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`ExpiryTimer::new`] and
    /// [`RevalidationPoll::new`]. Rules:
    /// - `min_delay` must be non-zero (a zero floor defeats its purpose).
    /// - `poll_interval` must be non-zero.
    pub fn validated(mut self) -> Self {
        if self.min_delay.is_zero() {
            warn!("min_delay of zero — clamping to 1s");
            self.min_delay = Duration::from_secs(1);
        }
        if self.poll_interval.is_zero() {
            warn!("poll_interval of zero — using default");
            self.poll_interval = Duration::from_secs(5 * 60);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// ExpiryFire
// ---------------------------------------------------------------------------

/// Which flavor of expiry event a timer fire represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryKind {
    /// The token is still valid but will expire within the lead time.
    NearExpiry,
    /// The token was already past its expiry when `schedule` ran.
    AlreadyExpired,
}

/// A single timer fire, tagged with the generation it was armed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryFire {
    pub kind: ExpiryKind,
    pub generation: u64,
}

// ---------------------------------------------------------------------------
// ExpiryTimer
// ---------------------------------------------------------------------------

/// One-shot timer predicting the locally known token expiry.
///
/// `schedule` arms it, a later `schedule` re-arms it (the previous
/// deadline is discarded — at most one fire is ever observed for two
/// consecutive schedules), `cancel` disarms it. The timer emits events
/// only; route policy and modal behavior are someone else's decision.
pub struct ExpiryTimer {
    config: ClockConfig,
    deadline: Option<(TokioInstant, ExpiryKind)>,
    generation: u64,
}

impl ExpiryTimer {
    pub fn new(config: ClockConfig) -> Self {
        Self {
            config: config.validated(),
            deadline: None,
            generation: 0,
        }
    }

    /// Arms the timer for the given absolute expiry and returns the new
    /// generation.
    ///
    /// - Expiry in the past (or now): due immediately, tagged
    ///   [`ExpiryKind::AlreadyExpired`]. The fire happens on the next
    ///   `wait`, never after a negative delay.
    /// - Otherwise: due at `max(until_expiry - lead_time, min_delay)`
    ///   from now, tagged [`ExpiryKind::NearExpiry`].
    pub fn schedule(&mut self, expires_at: SystemTime) -> u64 {
        self.generation += 1;

        let (delay, kind) = match expires_at.duration_since(SystemTime::now()) {
            Ok(until) if !until.is_zero() => {
                let delay = until
                    .saturating_sub(self.config.lead_time)
                    .max(self.config.min_delay);
                (delay, ExpiryKind::NearExpiry)
            }
            _ => (Duration::ZERO, ExpiryKind::AlreadyExpired),
        };

        self.deadline = Some((TokioInstant::now() + delay, kind));

        debug!(
            generation = self.generation,
            delay_ms = delay.as_millis() as u64,
            kind = ?kind,
            "expiry timer armed"
        );
        self.generation
    }

    /// Disarms the timer. Idempotent.
    pub fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            debug!(generation = self.generation, "expiry timer cancelled");
        }
    }

    /// Whether a deadline is currently armed.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// The generation of the most recent `schedule`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Waits for the armed deadline. Pends forever while unarmed.
    ///
    /// One-shot: the timer disarms itself on fire.
    pub async fn wait(&mut self) -> ExpiryFire {
        let Some((deadline, kind)) = self.deadline else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(deadline).await;
        self.deadline = None;

        debug!(generation = self.generation, kind = ?kind, "expiry timer fired");
        ExpiryFire {
            kind,
            generation: self.generation,
        }
    }
}

// ---------------------------------------------------------------------------
// RevalidationPoll
// ---------------------------------------------------------------------------

/// Minutes-scale re-validation cadence, visibility-aware.
///
/// The monitor starts the poll while a session is live and stops it on
/// sign-out. Independently, the poll pauses while the tab is hidden and,
/// on becoming visible again, fires an immediate check before returning
/// to the regular cadence — a hidden tab does no work, and a refocused
/// one doesn't sit on a stale session for up to a full interval.
pub struct RevalidationPoll {
    interval: Duration,
    jitter_ms: u64,
    next: Option<TokioInstant>,
    paused: bool,
    checks: u64,
}

impl RevalidationPoll {
    /// Creates a stopped poll. Call [`start`](Self::start) once a
    /// session exists.
    pub fn new(config: ClockConfig) -> Self {
        let config = config.validated();
        Self {
            interval: config.poll_interval,
            jitter_ms: config.poll_jitter_ms,
            next: None,
            paused: false,
            checks: 0,
        }
    }

    /// Arms the poll one interval from now, plus first-deadline jitter.
    /// Idempotent while already running.
    pub fn start(&mut self) {
        if self.next.is_some() {
            return;
        }
        let jitter = if self.jitter_ms > 0 {
            Duration::from_millis(rand::rng().random_range(0..self.jitter_ms))
        } else {
            Duration::ZERO
        };
        self.next = Some(TokioInstant::now() + self.interval + jitter);
        debug!(interval_s = self.interval.as_secs(), "re-validation poll started");
    }

    /// Disarms the poll entirely (sign-out, teardown). Idempotent.
    pub fn stop(&mut self) {
        if self.next.take().is_some() {
            debug!(checks = self.checks, "re-validation poll stopped");
        }
    }

    /// Suspends checks while the document is hidden. Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!("re-validation poll paused");
        }
    }

    /// Resumes after a pause. If the poll is running, the next check is
    /// due immediately — the tab may have been hidden across an expiry.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if self.next.is_some() {
                self.next = Some(TokioInstant::now());
            }
            debug!("re-validation poll resumed, immediate check scheduled");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the poll is armed (started and not stopped).
    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    /// Checks performed so far.
    pub fn checks(&self) -> u64 {
        self.checks
    }

    /// Waits until the next check is due and returns its ordinal.
    /// Pends forever while paused or stopped.
    pub async fn wait_for_check(&mut self) -> u64 {
        let Some(next) = self.next.filter(|_| !self.paused) else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(next).await;
        self.checks += 1;
        self.next = Some(TokioInstant::now() + self.interval);

        debug!(check = self.checks, "re-validation check due");
        self.checks
    }
}
