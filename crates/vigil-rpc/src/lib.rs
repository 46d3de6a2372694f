//! The RPC boundary for Vigil.
//!
//! This crate defines the "language" the subsystem and the application's
//! RPC/query layer speak:
//!
//! - **Outcomes** ([`QueryOutcome`], [`RpcError`]) — one event per
//!   completed query or mutation, success or failure.
//! - **Feed** ([`OutcomeBus`], [`OutcomeStream`]) — a cache-level
//!   broadcast of every completion fired anywhere in the application.
//! - **Detection** ([`is_auth_rejection`], [`UnauthorizedLatch`],
//!   [`RemoteErrorInterceptor`]) — spotting the server rejecting a token
//!   the local clock still considers valid.
//!
//! # Architecture
//!
//! The RPC transport itself (HTTP, batching, retries) lives outside this
//! crate. The application publishes completion events into the bus from
//! wherever its query cache settles them; the interceptor consumes the
//! feed centrally, so a 401 from a request fired in any corner of the UI
//! is caught in one place.
//!
//! ```text
//! query cache (app) → OutcomeBus → RemoteErrorInterceptor → monitor
//! ```

mod bus;
mod classify;
mod interceptor;
mod outcome;

pub use bus::{OutcomeBus, OutcomeStream};
pub use classify::is_auth_rejection;
pub use interceptor::{RemoteErrorInterceptor, RemoteRejection, UnauthorizedLatch};
pub use outcome::{QueryOutcome, RequestKind, RpcError, RpcErrorCode};
