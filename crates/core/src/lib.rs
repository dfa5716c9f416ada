//! Connection-resilience core for an AFK game session.
//!
//! One [`SessionController`] owns one [`Session`] and drives it from a single
//! inbox. Everything that can change the session arrives as a message on that
//! inbox: bridged client events, timer firings, and stop requests.
//!
//! ```text
//! GameClient ──events──► EventBridge ──┐
//! keep-alive interval ─────────────────┼──► inbox ──► SessionController ──► Session
//! reconnect/respawn delay ─────────────┤                 │
//! SessionHandle::stop ─────────────────┘                 ├─► ReconnectPolicy
//!                                                        └─► KeepAliveScheduler
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use afk::{Outcome, SessionController};
//! use afk_runtime::{DriverClient, resolve_driver};
//!
//! let config = Arc::new(config);
//! let client = DriverClient::new(resolve_driver(config.driver.as_ref()));
//! let mut controller = SessionController::new(config, client);
//! let handle = controller.handle();
//! tokio::spawn(async move {
//!     tokio::signal::ctrl_c().await.ok();
//!     handle.stop();
//! });
//! match controller.run().await {
//!     Outcome::Stopped => {}
//!     other => eprintln!("session ended: {other}"),
//! }
//! ```

pub mod bridge;
pub mod classify;
pub mod controller;
pub mod keep_alive;
pub mod policy;
pub mod session;
pub mod timer;

pub use bridge::{ConnectionId, EventBridge};
pub use classify::{FailureKind, classify};
pub use controller::{Outcome, SessionController, SessionHandle};
pub use keep_alive::KeepAliveScheduler;
pub use policy::{Decision, ReconnectPolicy};
pub use session::{PendingKind, PendingTask, Session, Status};
pub use timer::{TaskHandle, TimerToken};
