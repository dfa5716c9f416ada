//! Session state.
//!
//! A [`Session`] is plain data. Only the controller mutates it; everything
//! else reads it through the accessors.

use std::fmt;
use std::sync::Arc;

use afk_protocol::Config;

use crate::timer::TaskHandle;

/// Lifecycle status of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
	Disconnected,
	Connecting,
	Connected,
	Spawned,
	/// Absorbing: no automatic transition leaves this state.
	Terminated,
}

impl Status {
	/// Logged in, with or without an entity in the world.
	pub fn is_online(self) -> bool {
		matches!(self, Status::Connected | Status::Spawned)
	}

	/// A connection exists or is being established.
	pub fn is_live(self) -> bool {
		matches!(self, Status::Connecting | Status::Connected | Status::Spawned)
	}

	pub fn is_terminated(self) -> bool {
		self == Status::Terminated
	}
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Status::Disconnected => "disconnected",
			Status::Connecting => "connecting",
			Status::Connected => "connected",
			Status::Spawned => "spawned",
			Status::Terminated => "terminated",
		})
	}
}

/// What a pending delayed task will do when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
	Reconnect,
	Respawn,
}

/// A scheduled reconnect or respawn.
#[derive(Debug)]
pub struct PendingTask {
	pub kind: PendingKind,
	pub handle: TaskHandle,
}

/// The single tracked connection lifecycle.
///
/// Invariants maintained by the controller:
/// - `keep_alive_timer` is set iff the status is online and keep-alive is enabled
/// - at most one `pending_retry` exists
/// - `Terminated` holds no timers
#[derive(Debug)]
pub struct Session {
	pub(crate) status: Status,
	pub(crate) reconnect_attempts: u32,
	pub(crate) keep_alive_timer: Option<TaskHandle>,
	pub(crate) pending_retry: Option<PendingTask>,
	config: Arc<Config>,
}

impl Session {
	pub fn new(config: Arc<Config>) -> Self {
		Self {
			status: Status::Disconnected,
			reconnect_attempts: 0,
			keep_alive_timer: None,
			pending_retry: None,
			config,
		}
	}

	pub fn status(&self) -> Status {
		self.status
	}

	/// Reconnects scheduled since the last successful login.
	pub fn reconnect_attempts(&self) -> u32 {
		self.reconnect_attempts
	}

	pub fn config(&self) -> &Arc<Config> {
		&self.config
	}

	pub fn has_keep_alive(&self) -> bool {
		self.keep_alive_timer.is_some()
	}

	pub fn pending(&self) -> Option<PendingKind> {
		self.pending_retry.as_ref().map(|pending| pending.kind)
	}

	/// Cancels the pending reconnect or respawn, if any.
	pub(crate) fn cancel_pending(&mut self) -> Option<PendingKind> {
		self.pending_retry.take().map(|pending| {
			let kind = pending.kind;
			pending.handle.cancel();
			kind
		})
	}
}
