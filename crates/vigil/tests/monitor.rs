//! Integration tests for the session monitor.
//!
//! Wires a real monitor to recording mocks for the auth and routing
//! layers and drives it through the handle, the outcome feed, and the
//! clock. Time-dependent tests use `start_paused` so tokio's clock is
//! deterministic; `SystemTime` expiries are computed once at schedule
//! time, so real-clock skew never matters beyond a few microseconds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use tokio::sync::watch;
use vigil::prelude::*;
use vigil::{ModalState, VigilError};
use vigil_coordinator::NavError;
use vigil_rpc::RpcErrorCode;
use vigil_session::SessionError;

// =========================================================================
// Mocks
// =========================================================================

/// Auth gateway backed by a settable snapshot. Sign-out flips the
/// snapshot to unauthenticated, like a real provider clearing its cache.
struct TestGateway {
    snapshot: Mutex<SessionSnapshot>,
    session_calls: AtomicUsize,
    sign_outs: AtomicUsize,
}

impl TestGateway {
    fn with_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            session_calls: AtomicUsize::new(0),
            sign_outs: AtomicUsize::new(0),
        }
    }

    fn signed_out() -> Self {
        Self::with_snapshot(SessionSnapshot::unauthenticated())
    }

    fn session_calls(&self) -> usize {
        self.session_calls.load(Ordering::SeqCst)
    }

    fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

impl AuthGateway for TestGateway {
    async fn session(&self) -> SessionSnapshot {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot.lock().unwrap().clone()
    }

    async fn sign_out(
        &self,
        _options: SignOutOptions,
    ) -> Result<(), SessionError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        *self.snapshot.lock().unwrap() = SessionSnapshot::unauthenticated();
        Ok(())
    }
}

/// Router pinned to one path, recording navigations and refreshes.
struct TestRouter {
    path: String,
    pushes: Mutex<Vec<String>>,
    refreshes: AtomicUsize,
}

impl TestRouter {
    fn at(path: &str) -> Self {
        Self {
            path: path.to_string(),
            pushes: Mutex::new(Vec::new()),
            refreshes: AtomicUsize::new(0),
        }
    }

    fn pushes(&self) -> Vec<String> {
        self.pushes.lock().unwrap().clone()
    }

    fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl Router for TestRouter {
    fn current_path(&self) -> String {
        self.path.clone()
    }

    async fn push(&self, path: &str) -> Result<(), NavError> {
        self.pushes.lock().unwrap().push(path.to_string());
        Ok(())
    }

    async fn refresh(&self) -> Result<(), NavError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =========================================================================
// Helpers
// =========================================================================

struct TestApp {
    gateway: Arc<TestGateway>,
    router: Arc<TestRouter>,
    guard: UnsavedWorkGuard,
    bus: OutcomeBus,
    handle: vigil::MonitorHandle,
    modal: watch::Receiver<ModalState>,
}

/// Clock config with jitter disabled so paused-time tests are exact.
fn test_clock() -> ClockConfig {
    ClockConfig {
        poll_jitter_ms: 0,
        ..ClockConfig::default()
    }
}

fn mount(path: &str, gateway: TestGateway, clock: ClockConfig) -> TestApp {
    vigil::init_tracing();

    let gateway = Arc::new(gateway);
    let router = Arc::new(TestRouter::at(path));
    let guard = UnsavedWorkGuard::new();
    let bus = OutcomeBus::new();

    let handle = SessionMonitor::spawn(
        Arc::clone(&gateway),
        Arc::clone(&router),
        &bus,
        guard.clone(),
        vigil::MonitorConfig {
            clock,
            ..vigil::MonitorConfig::for_locale("en")
        },
    );
    let modal = handle.modal_state();

    TestApp {
        gateway,
        router,
        guard,
        bus,
        handle,
        modal,
    }
}

fn expiring_in(secs: u64) -> SessionSnapshot {
    SessionSnapshot::authenticated(
        "user-1",
        SystemTime::now() + Duration::from_secs(secs),
    )
}

fn expired_since(secs: u64) -> SessionSnapshot {
    SessionSnapshot::authenticated(
        "user-1",
        SystemTime::now() - Duration::from_secs(secs),
    )
}

fn unauthorized_outcome(path: &str) -> QueryOutcome {
    QueryOutcome::failure(
        RequestKind::Query,
        path,
        RpcError::with_code(RpcErrorCode::Unauthorized, 401, "jwt expired"),
    )
}

/// Waits (in paused time) until the modal state satisfies the predicate.
async fn wait_for_modal(
    rx: &mut watch::Receiver<ModalState>,
    deadline: Duration,
    pred: impl Fn(&ModalState) -> bool,
) -> ModalState {
    let result = tokio::time::timeout(deadline, async {
        loop {
            let current = rx.borrow_and_update().clone();
            if pred(&current) {
                return current;
            }
            rx.changed().await.expect("monitor dropped the modal channel");
        }
    })
    .await;
    result.unwrap_or_else(|_| panic!("modal did not reach expected state"))
}

/// Lets the monitor drain everything currently queued.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

// =========================================================================
// Trigger injection through the handle
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_trigger_expiration_on_protected_route_opens_modal() {
    let mut app =
        mount("/en/workspace/courses", TestGateway::with_snapshot(expiring_in(3600)), test_clock());

    assert!(app.handle.trigger_expiration());

    let state =
        wait_for_modal(&mut app.modal, Duration::from_secs(1), ModalState::is_open).await;
    let ModalState::Open(prompt) = state else { unreachable!() };
    assert_eq!(prompt.tier, RouteTier::Protected);
    assert_eq!(prompt.trigger, ExpirationTrigger::RemoteUnauthorized);
    assert!(!prompt.offers_anonymous);
}

#[tokio::test(start_paused = true)]
async fn test_trigger_on_purely_public_route_is_discarded() {
    let mut app =
        mount("/en/about", TestGateway::with_snapshot(expiring_in(3600)), test_clock());

    app.handle.trigger_expiration();
    settle().await;

    assert!(!app.modal.borrow_and_update().is_open(), "no modal on public routes");
    assert_eq!(app.gateway.sign_outs(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_triggers_keep_single_modal() {
    let mut app =
        mount("/en/workspace/courses", TestGateway::with_snapshot(expiring_in(3600)), test_clock());

    for _ in 0..5 {
        app.handle.trigger_expiration();
    }
    let first =
        wait_for_modal(&mut app.modal, Duration::from_secs(1), ModalState::is_open).await;
    settle().await;

    // Still the same prompt — later triggers were absorbed.
    assert_eq!(*app.modal.borrow_and_update(), first);
}

// =========================================================================
// Decisions
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_dismiss_on_mixed_route_continues_anonymously() {
    let mut app =
        mount("/en/coaching", TestGateway::with_snapshot(expiring_in(3600)), test_clock());

    app.handle.trigger_expiration();
    wait_for_modal(&mut app.modal, Duration::from_secs(1), ModalState::is_open).await;

    let resolution = app.handle.decide(ModalDecision::Dismiss).await.unwrap();

    assert_eq!(resolution, Resolution::ContinueAnonymously);
    assert_eq!(app.gateway.sign_outs(), 1);
    assert_eq!(app.router.refresh_count(), 1);
    assert!(app.router.pushes().is_empty(), "no navigation on mixed dismiss");
    assert!(!app.modal.borrow_and_update().is_open());
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_on_protected_route_forces_home() {
    let mut app =
        mount("/en/workspace/courses", TestGateway::with_snapshot(expiring_in(3600)), test_clock());

    app.handle.trigger_expiration();
    wait_for_modal(&mut app.modal, Duration::from_secs(1), ModalState::is_open).await;

    let resolution = app.handle.decide(ModalDecision::Dismiss).await.unwrap();

    assert_eq!(resolution, Resolution::ForcedHome);
    assert_eq!(app.gateway.sign_outs(), 1);
    assert_eq!(app.router.pushes(), vec!["/en/".to_string()]);
    assert_eq!(app.router.refresh_count(), 0, "no soft refresh on protected dismiss");
}

#[tokio::test(start_paused = true)]
async fn test_stay_logged_in_blocked_until_discard_confirmed() {
    let mut app =
        mount("/en/workspace/courses", TestGateway::with_snapshot(expiring_in(3600)), test_clock());
    app.guard.mark_dirty("course.title");

    app.handle.trigger_expiration();
    wait_for_modal(&mut app.modal, Duration::from_secs(1), ModalState::is_open).await;

    // First attempt without confirming the discard: blocked, nothing
    // cleared, modal still up.
    let blocked = app
        .handle
        .decide(ModalDecision::StayLoggedIn { discard_confirmed: false })
        .await
        .unwrap();
    assert_eq!(blocked, Resolution::BlockedOnUnsavedWork);
    assert!(app.guard.has_unsaved_changes());
    assert_eq!(app.gateway.sign_outs(), 0);
    assert!(app.modal.borrow_and_update().is_open());

    // Confirmed: guard cleared, signed out, login redirect with the
    // original path preserved.
    let resolution = app
        .handle
        .decide(ModalDecision::StayLoggedIn { discard_confirmed: true })
        .await
        .unwrap();
    assert_eq!(
        resolution,
        Resolution::ReAuthenticate { return_to: "/en/workspace/courses".into() }
    );
    assert!(!app.guard.has_unsaved_changes());
    assert_eq!(app.gateway.sign_outs(), 1);
    assert_eq!(
        app.router.pushes(),
        vec!["/en/auth/login?return_to=/en/workspace/courses".to_string()]
    );
    assert!(!app.modal.borrow_and_update().is_open());
}

#[tokio::test(start_paused = true)]
async fn test_decide_without_open_modal_is_a_stale_callback() {
    let app =
        mount("/en/coaching", TestGateway::with_snapshot(expiring_in(3600)), test_clock());
    settle().await;

    let result = app.handle.decide(ModalDecision::Dismiss).await;

    assert!(matches!(result, Err(VigilError::Coordinator(_))));
    assert_eq!(app.gateway.sign_outs(), 0);
}

// =========================================================================
// Clock-driven triggers
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_near_expiry_fires_thirty_seconds_early() {
    // Token expires in 100s; with the 30s lead the modal opens at ~70s.
    let mut app = mount(
        "/en/workspace/courses",
        TestGateway::with_snapshot(expiring_in(100)),
        test_clock(),
    );

    let state =
        wait_for_modal(&mut app.modal, Duration::from_secs(90), ModalState::is_open).await;
    let ModalState::Open(prompt) = state else { unreachable!() };
    assert_eq!(prompt.trigger, ExpirationTrigger::NearExpiry);
}

#[tokio::test(start_paused = true)]
async fn test_already_expired_session_prompts_immediately() {
    let mut app = mount(
        "/en/workspace/courses",
        TestGateway::with_snapshot(expired_since(60)),
        test_clock(),
    );

    let state =
        wait_for_modal(&mut app.modal, Duration::from_secs(1), ModalState::is_open).await;
    let ModalState::Open(prompt) = state else { unreachable!() };
    assert_eq!(prompt.trigger, ExpirationTrigger::AlreadyExpired);
}

#[tokio::test(start_paused = true)]
async fn test_session_replacement_cancels_previous_deadline() {
    // The first session would prompt at ~30s, but a refreshed session
    // arrives first; the old deadline must never fire.
    let mut app = mount(
        "/en/workspace/courses",
        TestGateway::with_snapshot(expiring_in(60)),
        test_clock(),
    );
    settle().await;

    app.handle.session_changed(expiring_in(100_000));
    tokio::time::sleep(Duration::from_secs(200)).await;

    assert!(!app.modal.borrow_and_update().is_open(), "stale deadline fired");
}

#[tokio::test(start_paused = true)]
async fn test_signed_out_session_disarms_the_clock() {
    let mut app = mount(
        "/en/workspace/courses",
        TestGateway::with_snapshot(expiring_in(60)),
        test_clock(),
    );
    settle().await;

    app.handle.session_changed(SessionSnapshot::unauthenticated());
    tokio::time::sleep(Duration::from_secs(200)).await;

    assert!(!app.modal.borrow_and_update().is_open(), "timer must be cancelled on sign-out");
}

#[tokio::test(start_paused = true)]
async fn test_refresh_failure_tag_counts_as_remote_divergence() {
    let mut app = mount(
        "/en/workspace/courses",
        TestGateway::with_snapshot(
            expiring_in(3600).with_error(vigil_session::SessionErrorTag::RefreshFailed),
        ),
        test_clock(),
    );

    let state =
        wait_for_modal(&mut app.modal, Duration::from_secs(1), ModalState::is_open).await;
    let ModalState::Open(prompt) = state else { unreachable!() };
    assert_eq!(prompt.trigger, ExpirationTrigger::RemoteUnauthorized);
}

// =========================================================================
// Feed-driven triggers and the latch
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_unauthorized_burst_from_feed_opens_one_modal() {
    let mut app =
        mount("/en/workspace/courses", TestGateway::with_snapshot(expiring_in(3600)), test_clock());
    settle().await;

    for i in 0..10 {
        app.bus.publish(unauthorized_outcome(&format!("call.{i}")));
    }

    wait_for_modal(&mut app.modal, Duration::from_secs(1), ModalState::is_open).await;

    // Resolve, then verify the latch holds: further 401s from the same
    // (now dead) session do not reopen the modal.
    app.handle.decide(ModalDecision::Dismiss).await.unwrap();
    app.bus.publish(unauthorized_outcome("late.call"));
    settle().await;
    assert!(!app.modal.borrow_and_update().is_open());
}

#[tokio::test(start_paused = true)]
async fn test_latch_reopens_after_fresh_sign_in() {
    let mut app =
        mount("/en/workspace/courses", TestGateway::with_snapshot(expiring_in(3600)), test_clock());
    settle().await;

    // First rejection: modal, dismissed.
    app.bus.publish(unauthorized_outcome("first"));
    wait_for_modal(&mut app.modal, Duration::from_secs(1), ModalState::is_open).await;
    app.handle.decide(ModalDecision::Dismiss).await.unwrap();

    // Fresh sign-in resets the latch; a new rejection prompts again.
    app.handle.session_changed(expiring_in(3600));
    settle().await;
    app.bus.publish(unauthorized_outcome("second"));

    wait_for_modal(&mut app.modal, Duration::from_secs(1), ModalState::is_open).await;
}

#[tokio::test(start_paused = true)]
async fn test_non_auth_failures_from_feed_are_ignored() {
    let mut app =
        mount("/en/workspace/courses", TestGateway::with_snapshot(expiring_in(3600)), test_clock());
    settle().await;

    app.bus.publish(QueryOutcome::failure(
        RequestKind::Query,
        "courses.list",
        RpcError::message_only("connection reset by peer"),
    ));
    settle().await;

    assert!(!app.modal.borrow_and_update().is_open());
}

// =========================================================================
// Re-validation poll and visibility
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_poll_pauses_while_hidden_and_rechecks_on_visible() {
    let clock = ClockConfig {
        poll_interval: Duration::from_secs(60),
        ..test_clock()
    };
    let app = mount(
        "/en/workspace/courses",
        TestGateway::with_snapshot(expiring_in(1_000_000)),
        clock,
    );
    settle().await;
    assert_eq!(app.gateway.session_calls(), 1, "one read at mount");

    // Hidden: ten minutes pass without a single check.
    app.handle.set_hidden(true);
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(app.gateway.session_calls(), 1);

    // Visible again: an immediate re-check fires.
    app.handle.set_hidden(false);
    settle().await;
    assert_eq!(app.gateway.session_calls(), 2);

    // And the regular cadence resumes afterwards.
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(app.gateway.session_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_poll_revalidates_on_interval_while_authenticated() {
    let clock = ClockConfig {
        poll_interval: Duration::from_secs(60),
        ..test_clock()
    };
    let app = mount(
        "/en/workspace/courses",
        TestGateway::with_snapshot(expiring_in(1_000_000)),
        clock,
    );
    settle().await;

    tokio::time::sleep(Duration::from_secs(185)).await;

    // Mount read + three interval checks.
    assert_eq!(app.gateway.session_calls(), 4);
}

// =========================================================================
// Lifecycle
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_trigger_after_shutdown_is_noop() {
    let app =
        mount("/en/workspace/courses", TestGateway::with_snapshot(expiring_in(3600)), test_clock());

    app.handle.shutdown().await;
    settle().await;

    assert!(!app.handle.is_mounted());
    assert!(!app.handle.trigger_expiration(), "unmounted handle is a no-op");
    assert!(matches!(
        app.handle.decide(ModalDecision::Dismiss).await,
        Err(VigilError::MonitorClosed)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_handle_is_mounted_while_running() {
    let app =
        mount("/en/coaching", TestGateway::signed_out(), test_clock());
    settle().await;

    assert!(app.handle.is_mounted());
}

// =========================================================================
// Config loading
// =========================================================================

/// Shape of the application settings file the shell loads at startup.
#[derive(serde::Deserialize)]
struct AppSettings {
    locale: String,
    routes: RoutePolicy,
}

#[tokio::test(start_paused = true)]
async fn test_route_policy_from_settings_json_drives_classification() {
    // Deployments override the curated route lists via config, not code.
    let settings: AppSettings = serde_json::from_str(
        r#"{
            "locale": "de",
            "routes": {
                "locales": ["de"],
                "public_prefixes": ["/hilfe"],
                "mixed_prefixes": ["/kurse"]
            }
        }"#,
    )
    .unwrap();

    vigil::init_tracing();
    let gateway = Arc::new(TestGateway::with_snapshot(expiring_in(3600)));
    let router = Arc::new(TestRouter::at("/de/hilfe"));
    let bus = OutcomeBus::new();
    let handle = SessionMonitor::spawn(
        Arc::clone(&gateway),
        Arc::clone(&router),
        &bus,
        UnsavedWorkGuard::new(),
        vigil::MonitorConfig {
            locale: settings.locale,
            routes: settings.routes,
            clock: test_clock(),
        },
    );
    let mut modal = handle.modal_state();

    // "/de/hilfe" is purely-public under the loaded policy.
    handle.trigger_expiration();
    settle().await;
    assert!(!modal.borrow_and_update().is_open());
}
