//! The session monitor: an actor tying all the pieces together.
//!
//! One monitor per mounted application shell. It owns the expiry timer,
//! the re-validation poll, the interceptor's feed subscription, and the
//! coordinator, and it processes exactly one wake source at a time —
//! which is what makes the coordinator's synchronous state check a real
//! mutual exclusion.
//!
//! The outside world talks to it through a [`MonitorHandle`]:
//!
//! ```text
//! auth layer ──session_changed──┐
//! RPC error path ──trigger_expiration──┤
//! visibility events ──set_hidden──┼──→ SessionMonitor ──→ watch<ModalState>
//! modal UI ──decide──┘                 (timer, poll, interceptor,
//!                                       coordinator inside)
//! ```

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use vigil_clock::{ClockConfig, ExpiryFire, ExpiryKind, ExpiryTimer, RevalidationPoll};
use vigil_coordinator::{
    CoordinatorError, ExpirationCoordinator, ExpirationTrigger, ModalDecision,
    ModalPrompt, RecoveryPaths, Resolution, Router, TriggerDisposition,
    UnsavedWorkGuard,
};
use vigil_routes::{RouteClassifier, RoutePolicy};
use vigil_rpc::{OutcomeBus, RemoteErrorInterceptor, UnauthorizedLatch};
use vigil_session::{AuthGateway, AuthStatus, SessionSnapshot};

use crate::VigilError;

/// Command channel size for the monitor actor.
const COMMAND_CHANNEL_SIZE: usize = 64;

// ---------------------------------------------------------------------------
// MonitorConfig
// ---------------------------------------------------------------------------

/// Configuration for a mounted monitor.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Locale prefix of the current shell (`en`, `de`). Decides where
    /// recovery navigations land (`/{locale}/auth/login`, `/{locale}/`)
    /// and is stripped by the route classifier.
    pub locale: String,

    /// Timer and poll cadence.
    pub clock: ClockConfig,

    /// Route trust-tier policy.
    pub routes: RoutePolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            locale: "en".into(),
            clock: ClockConfig::default(),
            routes: RoutePolicy::default(),
        }
    }
}

impl MonitorConfig {
    /// Default config under the given locale.
    pub fn for_locale(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// ModalState
// ---------------------------------------------------------------------------

/// What the expiration modal should currently show. Published through a
/// `watch` channel; the visual modal itself is a design-system concern.
#[derive(Debug, Clone, PartialEq)]
pub enum ModalState {
    Closed,
    Open(ModalPrompt),
}

impl ModalState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Commands sent to the monitor actor through its channel.
enum MonitorCommand {
    /// An expiration trigger injected from application code (the RPC
    /// error path, typically).
    Trigger(ExpirationTrigger),

    /// The user answered the modal.
    Decision {
        decision: ModalDecision,
        reply: oneshot::Sender<Result<Resolution, CoordinatorError>>,
    },

    /// The auth layer replaced or refreshed the session.
    SessionChanged(SessionSnapshot),

    /// The document became hidden or visible.
    Visibility { hidden: bool },

    /// Stop the monitor.
    Shutdown,
}

// ---------------------------------------------------------------------------
// MonitorHandle
// ---------------------------------------------------------------------------

/// Handle to a running monitor. Cheap to clone; inject it anywhere.
///
/// Every method degrades to a no-op once the monitor has shut down —
/// callers sprinkled through the application never have to care whether
/// the monitor is mounted.
#[derive(Clone)]
pub struct MonitorHandle {
    commands: mpsc::Sender<MonitorCommand>,
    modal: watch::Receiver<ModalState>,
}

impl MonitorHandle {
    /// Fires a remote-unauthorized expiration trigger.
    ///
    /// Returns `false` (a no-op) when the monitor isn't running. Safe to
    /// call from a burst of failing requests — the coordinator absorbs
    /// duplicates while the modal is open.
    pub fn trigger_expiration(&self) -> bool {
        self.commands
            .try_send(MonitorCommand::Trigger(
                ExpirationTrigger::RemoteUnauthorized,
            ))
            .is_ok()
    }

    /// Forwards a session change from the auth layer.
    /// Returns `false` when the monitor isn't running.
    pub fn session_changed(&self, snapshot: SessionSnapshot) -> bool {
        self.commands
            .try_send(MonitorCommand::SessionChanged(snapshot))
            .is_ok()
    }

    /// Forwards a document visibility change.
    /// Returns `false` when the monitor isn't running.
    pub fn set_hidden(&self, hidden: bool) -> bool {
        self.commands
            .try_send(MonitorCommand::Visibility { hidden })
            .is_ok()
    }

    /// Applies the user's modal decision and waits for the resolution.
    ///
    /// # Errors
    /// - [`VigilError::MonitorClosed`] when the monitor has shut down.
    /// - [`VigilError::Coordinator`] when no modal was open (stale UI
    ///   callback).
    pub async fn decide(
        &self,
        decision: ModalDecision,
    ) -> Result<Resolution, VigilError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(MonitorCommand::Decision {
                decision,
                reply: reply_tx,
            })
            .await
            .map_err(|_| VigilError::MonitorClosed)?;
        let result = reply_rx.await.map_err(|_| VigilError::MonitorClosed)?;
        Ok(result?)
    }

    /// Tells the monitor to stop. Idempotent.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(MonitorCommand::Shutdown).await;
    }

    /// Whether the monitor task is still running.
    pub fn is_mounted(&self) -> bool {
        !self.commands.is_closed()
    }

    /// A receiver for the modal presentation state. The UI renders
    /// whatever this currently holds.
    pub fn modal_state(&self) -> watch::Receiver<ModalState> {
        self.modal.clone()
    }
}

// ---------------------------------------------------------------------------
// SessionMonitor
// ---------------------------------------------------------------------------

/// Which wake source fired in one loop iteration. Resolved first, acted
/// on second, so every reaction runs with exclusive access to the state.
enum Wake {
    Command(Option<MonitorCommand>),
    ExpiryFire(ExpiryFire),
    RemoteRejection,
    RevalidationDue,
}

/// The monitor actor. Created and spawned via [`SessionMonitor::spawn`];
/// everything after that goes through the [`MonitorHandle`].
pub struct SessionMonitor<G: AuthGateway, R: Router> {
    coordinator: ExpirationCoordinator<G, R>,
    gateway: Arc<G>,
    timer: ExpiryTimer,
    poll: RevalidationPoll,
    interceptor: RemoteErrorInterceptor,
    latch: UnauthorizedLatch,
    last_status: AuthStatus,
    modal_tx: watch::Sender<ModalState>,
    commands: mpsc::Receiver<MonitorCommand>,
}

impl<G: AuthGateway, R: Router> SessionMonitor<G, R> {
    /// Spawns the monitor task and returns its handle.
    ///
    /// The monitor reads the current session once at startup, so a shell
    /// mounted into an already-authenticated page arms its timers
    /// immediately.
    pub fn spawn(
        gateway: Arc<G>,
        router: Arc<R>,
        bus: &OutcomeBus,
        guard: UnsavedWorkGuard,
        config: MonitorConfig,
    ) -> MonitorHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let (modal_tx, modal_rx) = watch::channel(ModalState::Closed);

        let latch = UnauthorizedLatch::new();
        let interceptor = RemoteErrorInterceptor::with_latch(bus, latch.clone());
        let coordinator = ExpirationCoordinator::new(
            Arc::clone(&gateway),
            router,
            RouteClassifier::new(config.routes),
            guard,
            RecoveryPaths::localized(&config.locale),
        );

        let monitor = Self {
            coordinator,
            gateway,
            timer: ExpiryTimer::new(config.clock.clone()),
            poll: RevalidationPoll::new(config.clock),
            interceptor,
            latch,
            last_status: AuthStatus::Loading,
            modal_tx,
            commands: cmd_rx,
        };

        tokio::spawn(monitor.run());

        MonitorHandle {
            commands: cmd_tx,
            modal: modal_rx,
        }
    }

    /// Runs the actor loop until shutdown.
    async fn run(mut self) {
        tracing::debug!("session monitor started");

        let snapshot = self.gateway.session().await;
        self.apply_session(snapshot);

        loop {
            let wake = tokio::select! {
                cmd = self.commands.recv() => Wake::Command(cmd),
                fire = self.timer.wait() => Wake::ExpiryFire(fire),
                _ = self.interceptor.next_rejection() => Wake::RemoteRejection,
                _ = self.poll.wait_for_check() => Wake::RevalidationDue,
            };

            match wake {
                Wake::Command(None) | Wake::Command(Some(MonitorCommand::Shutdown)) => {
                    break;
                }
                Wake::Command(Some(MonitorCommand::Trigger(trigger))) => {
                    self.apply_trigger(trigger);
                }
                Wake::Command(Some(MonitorCommand::SessionChanged(snapshot))) => {
                    self.apply_session(snapshot);
                }
                Wake::Command(Some(MonitorCommand::Visibility { hidden })) => {
                    self.apply_visibility(hidden);
                }
                Wake::Command(Some(MonitorCommand::Decision { decision, reply })) => {
                    let result = self.apply_decision(decision).await;
                    let _ = reply.send(result);
                }
                Wake::ExpiryFire(fire) => self.apply_expiry_fire(fire),
                // Classification, latch, and logging already happened in
                // the interceptor.
                Wake::RemoteRejection => {
                    self.apply_trigger(ExpirationTrigger::RemoteUnauthorized);
                }
                Wake::RevalidationDue => {
                    let snapshot = self.gateway.session().await;
                    self.apply_session(snapshot);
                }
            }
        }

        self.timer.cancel();
        self.poll.stop();
        tracing::debug!("session monitor stopped");
    }

    /// Reconciles clocks and latch against a fresh session snapshot.
    fn apply_session(&mut self, snapshot: SessionSnapshot) {
        match snapshot.status {
            // Nothing to decide until the auth layer answers.
            AuthStatus::Loading => {}

            AuthStatus::Authenticated => {
                if self.last_status != AuthStatus::Authenticated {
                    // Fresh sign-in: the remote latch re-opens.
                    self.latch.reset();
                }
                self.last_status = AuthStatus::Authenticated;

                if let Some(expires_at) = snapshot.expires_at {
                    self.timer.schedule(expires_at);
                }
                self.poll.start();

                if let Some(tag) = snapshot.error {
                    tracing::warn!(
                        %tag,
                        "session snapshot carries a refresh failure, treating as remote divergence"
                    );
                    if self.latch.trip() {
                        self.apply_trigger(ExpirationTrigger::RemoteUnauthorized);
                    }
                }
            }

            AuthStatus::Unauthenticated => {
                self.last_status = AuthStatus::Unauthenticated;
                // The session the clocks were armed for no longer exists.
                self.timer.cancel();
                self.poll.stop();
            }
        }
    }

    /// Maps a timer fire onto a trigger, discarding stale fires.
    fn apply_expiry_fire(&mut self, fire: ExpiryFire) {
        if fire.generation != self.timer.generation() {
            tracing::debug!(
                fired = fire.generation,
                current = self.timer.generation(),
                "stale expiry fire discarded"
            );
            return;
        }
        if self.last_status != AuthStatus::Authenticated {
            tracing::debug!("expiry fire ignored, no authenticated session");
            return;
        }

        let trigger = match fire.kind {
            ExpiryKind::NearExpiry => ExpirationTrigger::NearExpiry,
            ExpiryKind::AlreadyExpired => ExpirationTrigger::AlreadyExpired,
        };
        self.apply_trigger(trigger);
    }

    /// Feeds one trigger into the coordinator and publishes the modal if
    /// it opened.
    fn apply_trigger(&mut self, trigger: ExpirationTrigger) {
        if let TriggerDisposition::Opened(prompt) =
            self.coordinator.handle_trigger(trigger)
        {
            let _ = self.modal_tx.send(ModalState::Open(prompt));
        }
    }

    fn apply_visibility(&mut self, hidden: bool) {
        if hidden {
            self.poll.pause();
        } else {
            // Resuming schedules an immediate re-check: the tab may have
            // been hidden across the expiry.
            self.poll.resume();
        }
    }

    /// Resolves the user's decision and stands the clocks down if the
    /// recovery signed the session out.
    async fn apply_decision(
        &mut self,
        decision: ModalDecision,
    ) -> Result<Resolution, CoordinatorError> {
        let result = self.coordinator.resolve(decision).await;

        if let Ok(resolution) = &result {
            match resolution {
                // Modal stays open until the user confirms the discard.
                Resolution::BlockedOnUnsavedWork => {}
                Resolution::ReAuthenticate { .. }
                | Resolution::ForcedHome
                | Resolution::ContinueAnonymously => {
                    let _ = self.modal_tx.send(ModalState::Closed);
                    self.last_status = AuthStatus::Unauthenticated;
                    self.timer.cancel();
                    self.poll.stop();
                }
            }
        }

        result
    }
}
