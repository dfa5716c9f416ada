//! Anti-idle activity while online.
//!
//! The scheduler arms a periodic task that posts
//! [`Input::KeepAliveTick`](crate::controller::Input) to the controller inbox.
//! The controller checks the tick's token and then calls
//! [`KeepAliveScheduler::tick`], which nudges the player's yaw by
//! [`YAW_STEP`] radians. That is the only side effect of a tick.

use afk_runtime::ClientConnection;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::controller::Input;
use crate::session::Session;
use crate::timer::TaskHandle;

/// Yaw change per keep-alive tick, in radians.
pub const YAW_STEP: f32 = 0.01;

/// Owns the keep-alive timer lifecycle of a session.
#[derive(Debug, Clone)]
pub struct KeepAliveScheduler {
	inbox: mpsc::UnboundedSender<Input>,
}

impl KeepAliveScheduler {
	pub(crate) fn new(inbox: mpsc::UnboundedSender<Input>) -> Self {
		Self { inbox }
	}

	/// Arms the periodic timer, replacing any active one.
	///
	/// Does nothing beyond clearing the old timer when keep-alive is disabled
	/// or the interval is 0.
	/// The first tick fires one interval after arming.
	pub fn start_for(&self, session: &mut Session) {
		self.stop(session);

		let keep_alive = &session.config().keep_alive;
		if !keep_alive.enabled {
			return;
		}
		let period = keep_alive.interval();
		if period.is_zero() {
			warn!(target = "afk.keepalive", "keep-alive interval is 0; keep-alive disabled");
			return;
		}
		let inbox = self.inbox.clone();

		session.keep_alive_timer = Some(TaskHandle::spawn(move |token| async move {
			let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
			ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
			loop {
				ticks.tick().await;
				if inbox.send(Input::KeepAliveTick { token }).is_err() {
					return;
				}
			}
		}));
		debug!(target = "afk.keepalive", interval_ms = period.as_millis() as u64, "keep-alive armed");
	}

	/// Cancels the timer if one is active.
	pub fn stop(&self, session: &mut Session) {
		if let Some(timer) = session.keep_alive_timer.take() {
			timer.cancel();
			debug!(target = "afk.keepalive", "keep-alive stopped");
		}
	}

	/// Performs one anti-idle action. Failures are logged and swallowed.
	pub fn tick(&self, session: &Session, connection: Option<&dyn ClientConnection>) {
		if !session.status().is_online() {
			return;
		}
		let Some(connection) = connection else {
			return;
		};
		let Some(orientation) = connection.orientation() else {
			trace!(target = "afk.keepalive", "no entity yet; skipping tick");
			return;
		};

		match connection.look(orientation.yaw + YAW_STEP, orientation.pitch) {
			Ok(()) => trace!(target = "afk.keepalive", yaw = orientation.yaw + YAW_STEP, "look"),
			Err(e) => warn!(target = "afk.keepalive", error = %e, "keep-alive action failed"),
		}
	}
}
