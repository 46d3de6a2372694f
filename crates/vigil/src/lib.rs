//! # Vigil
//!
//! Session-expiration reconciliation for server-rendered web frontends.
//!
//! A locally cached authentication token can look valid while the remote
//! API has already rejected it — refresh-rotation failures, revocation,
//! clock skew. Vigil watches both signals (the local expiry clock and
//! the application's RPC failures), decides per route tier whether and
//! how to confront the user, and serializes the recovery (sign out,
//! navigate, refresh) against any unsaved work.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vigil::prelude::*;
//!
//! // Implement AuthGateway and Router for your platform, then:
//! // let bus = OutcomeBus::new();
//! // let guard = UnsavedWorkGuard::new();
//! // let handle = SessionMonitor::spawn(
//! //     Arc::new(my_gateway),
//! //     Arc::new(my_router),
//! //     &bus,
//! //     guard,
//! //     MonitorConfig::for_locale("en"),
//! // );
//! // // render handle.modal_state(); call handle.decide(...) from the UI
//! ```

mod error;
mod monitor;
mod telemetry;

pub use error::VigilError;
pub use monitor::{ModalState, MonitorConfig, MonitorHandle, SessionMonitor};
pub use telemetry::init_tracing;

/// One-stop imports for applications embedding the monitor.
pub mod prelude {
    pub use vigil_clock::ClockConfig;
    pub use vigil_coordinator::{
        ExpirationTrigger, ModalDecision, ModalPrompt, Resolution, Router,
        UnsavedWorkGuard,
    };
    pub use vigil_routes::{RoutePolicy, RouteTier};
    pub use vigil_rpc::{OutcomeBus, QueryOutcome, RequestKind, RpcError};
    pub use vigil_session::{
        AuthGateway, AuthStatus, SessionSnapshot, SignOutOptions,
    };

    pub use crate::{
        ModalState, MonitorConfig, MonitorHandle, SessionMonitor, VigilError,
    };
}
