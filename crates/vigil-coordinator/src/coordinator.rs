//! The expiration coordinator: the single source of truth for the modal.
//!
//! Two rules shape the implementation:
//!
//! - **State before awaits.** `handle_trigger` is fully synchronous and
//!   `resolve` inspects state before its first suspension point, so on
//!   the monitor's single logical thread the `ModalOpen` state works as
//!   a mutex substitute — no second modal can open while a sign-out from
//!   the first is in flight.
//! - **Recovery never fails upward.** Sign-out and navigation are
//!   best-effort: the user-facing goal (stop showing stale authenticated
//!   UI) is achieved by clearing local state regardless of whether the
//!   server acknowledged anything. Failures are logged and swallowed.

use std::sync::Arc;

use vigil_routes::RouteClassifier;
use vigil_session::{AuthGateway, SignOutOptions};

use crate::{
    CoordinatorError, CoordinatorState, ExpirationTrigger, ModalDecision,
    ModalPrompt, Resolution, Router, TriggerDisposition, UnsavedWorkGuard,
};

// ---------------------------------------------------------------------------
// RecoveryPaths
// ---------------------------------------------------------------------------

/// Where recovery navigations land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryPaths {
    /// Login page; the pre-expiration path is appended as `return_to`.
    pub login: String,
    /// Home route used for the forced logout on protected pages.
    pub home: String,
}

impl Default for RecoveryPaths {
    fn default() -> Self {
        Self {
            login: "/auth/login".into(),
            home: "/".into(),
        }
    }
}

impl RecoveryPaths {
    /// Paths under a locale prefix, e.g. `localized("en")` →
    /// `/en/auth/login` and `/en/`.
    pub fn localized(locale: &str) -> Self {
        Self {
            login: format!("/{locale}/auth/login"),
            home: format!("/{locale}/"),
        }
    }
}

// ---------------------------------------------------------------------------
// CoordinatorMetrics
// ---------------------------------------------------------------------------

/// Counters over the coordinator's lifetime. Cheap enough to keep
/// unconditionally; read via [`ExpirationCoordinator::metrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatorMetrics {
    /// Trigger events received, regardless of disposition.
    pub triggers_observed: u64,
    /// Modals actually opened.
    pub modals_opened: u64,
    /// Triggers discarded because the route was purely-public.
    pub public_suppressions: u64,
    /// Triggers absorbed while a modal was already open.
    pub duplicate_triggers: u64,
    /// Stay-logged-in resolutions (sign-out + login redirect).
    pub reauth_redirects: u64,
    /// Dismissals on protected pages (sign-out + home).
    pub forced_logouts: u64,
    /// Dismissals on mixed pages (sign-out + soft refresh).
    pub anonymous_continues: u64,
}

// ---------------------------------------------------------------------------
// ExpirationCoordinator
// ---------------------------------------------------------------------------

/// Owns the `Idle ⇄ ModalOpen` state machine and executes resolutions
/// against the platform capabilities.
pub struct ExpirationCoordinator<G: AuthGateway, R: Router> {
    state: CoordinatorState,
    classifier: RouteClassifier,
    guard: UnsavedWorkGuard,
    gateway: Arc<G>,
    router: Arc<R>,
    paths: RecoveryPaths,
    metrics: CoordinatorMetrics,
}

impl<G: AuthGateway, R: Router> ExpirationCoordinator<G, R> {
    pub fn new(
        gateway: Arc<G>,
        router: Arc<R>,
        classifier: RouteClassifier,
        guard: UnsavedWorkGuard,
        paths: RecoveryPaths,
    ) -> Self {
        Self {
            state: CoordinatorState::Idle,
            classifier,
            guard,
            gateway,
            router,
            paths,
            metrics: CoordinatorMetrics::default(),
        }
    }

    /// Current state of the machine.
    pub fn state(&self) -> &CoordinatorState {
        &self.state
    }

    /// Lifetime counters.
    pub fn metrics(&self) -> &CoordinatorMetrics {
        &self.metrics
    }

    /// Feeds one expiration event into the machine. Synchronous — the
    /// state and the route are read before anything can interleave.
    ///
    /// Whichever trigger arrives first is authoritative; later ones are
    /// absorbed while the modal is open.
    pub fn handle_trigger(
        &mut self,
        trigger: ExpirationTrigger,
    ) -> TriggerDisposition {
        self.metrics.triggers_observed += 1;

        if self.state.is_modal_open() {
            self.metrics.duplicate_triggers += 1;
            tracing::debug!(%trigger, "expiration trigger absorbed, modal already open");
            return TriggerDisposition::AlreadyOpen;
        }

        let path = self.router.current_path();
        let tier = self.classifier.classify(&path);

        if tier.suppresses_modal() {
            self.metrics.public_suppressions += 1;
            tracing::debug!(%trigger, %path, "expiration trigger discarded on purely-public route");
            return TriggerDisposition::SuppressedPublic;
        }

        let prompt = ModalPrompt {
            tier,
            offers_anonymous: tier.allows_anonymous(),
            path,
            trigger,
        };

        self.metrics.modals_opened += 1;
        tracing::info!(
            %trigger,
            path = %prompt.path,
            tier = %tier,
            "session expiration modal opened"
        );

        self.state = CoordinatorState::ModalOpen(prompt.clone());
        TriggerDisposition::Opened(prompt)
    }

    /// Applies the user's decision to the open modal.
    ///
    /// # Errors
    /// [`CoordinatorError::NoModalOpen`] when no modal is open — a stale
    /// callback, not a recovery failure. Recovery side effects themselves
    /// never error out of this method.
    pub async fn resolve(
        &mut self,
        decision: ModalDecision,
    ) -> Result<Resolution, CoordinatorError> {
        // State is inspected before the first await.
        let CoordinatorState::ModalOpen(prompt) = &self.state else {
            return Err(CoordinatorError::NoModalOpen);
        };
        let prompt = prompt.clone();

        match decision {
            ModalDecision::StayLoggedIn { discard_confirmed } => {
                if self.guard.has_unsaved_changes() && !discard_confirmed {
                    tracing::info!(
                        dirty_fields = self.guard.dirty_count(),
                        "stay-logged-in blocked on unsaved work"
                    );
                    return Ok(Resolution::BlockedOnUnsavedWork);
                }

                // Clear dirty flags before leaving the page, then clear
                // the stale local session before navigating to login.
                self.guard.clear_all();
                self.sign_out_best_effort().await;

                let target =
                    format!("{}?return_to={}", self.paths.login, prompt.path);
                self.push_best_effort(&target).await;

                self.metrics.reauth_redirects += 1;
                self.state = CoordinatorState::Idle;
                tracing::info!(return_to = %prompt.path, "redirected to login for re-authentication");
                Ok(Resolution::ReAuthenticate {
                    return_to: prompt.path,
                })
            }

            ModalDecision::Dismiss => {
                self.sign_out_best_effort().await;

                if prompt.tier.requires_reauth() {
                    // Protected page, no session: the page itself cannot
                    // remain on screen.
                    let home = self.paths.home.clone();
                    self.push_best_effort(&home).await;

                    self.metrics.forced_logouts += 1;
                    self.state = CoordinatorState::Idle;
                    tracing::info!(from = %prompt.path, "dismissed on protected route, forced logout home");
                    Ok(Resolution::ForcedHome)
                } else {
                    // Mixed page: stay put, re-render anonymously.
                    self.refresh_best_effort().await;

                    self.metrics.anonymous_continues += 1;
                    self.state = CoordinatorState::Idle;
                    tracing::info!(path = %prompt.path, "continuing anonymously on mixed route");
                    Ok(Resolution::ContinueAnonymously)
                }
            }
        }
    }

    /// Signs out without redirect. Repeated sign-outs while already
    /// signed out are the gateway's responsibility to absorb; failures
    /// here are logged and swallowed.
    async fn sign_out_best_effort(&self) {
        if let Err(e) = self
            .gateway
            .sign_out(SignOutOptions { redirect: false })
            .await
        {
            tracing::warn!(error = %e, "sign-out failed, continuing recovery");
        }
    }

    async fn push_best_effort(&self, path: &str) {
        if let Err(e) = self.router.push(path).await {
            tracing::warn!(error = %e, "recovery navigation failed");
        }
    }

    async fn refresh_best_effort(&self) {
        if let Err(e) = self.router.refresh().await {
            tracing::warn!(error = %e, "soft refresh failed");
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
