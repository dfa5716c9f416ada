//! Cancellable background tasks.
//!
//! Every timer the session arms is a spawned task owned by a [`TaskHandle`].
//! The handle carries a process-unique [`TimerToken`]; timer tasks put that
//! token in the message they send, so a message that was already queued when
//! its handle was cancelled can be recognised and discarded.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinHandle;

/// Identifies one armed timer.
pub type TimerToken = u64;

static NEXT_TIMER_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Returns a new process-unique timer token.
pub fn next_timer_token() -> TimerToken {
	NEXT_TIMER_TOKEN.fetch_add(1, Ordering::Relaxed)
}

/// Owner of a spawned task. Dropping or cancelling the handle aborts the task.
#[derive(Debug)]
pub struct TaskHandle {
	token: TimerToken,
	task: JoinHandle<()>,
}

impl TaskHandle {
	/// Spawns `make(token)` on the current runtime.
	pub fn spawn<F, Fut>(make: F) -> Self
	where
		F: FnOnce(TimerToken) -> Fut,
		Fut: Future<Output = ()> + Send + 'static,
	{
		let token = next_timer_token();
		let task = tokio::spawn(make(token));
		Self { token, task }
	}

	pub fn token(&self) -> TimerToken {
		self.token
	}

	/// Whether a message carrying `token` was sent by this task.
	pub fn matches(&self, token: TimerToken) -> bool {
		self.token == token
	}

	/// Aborts the task. Messages it already queued are not recalled.
	pub fn cancel(self) {
		self.task.abort();
	}
}

impl Drop for TaskHandle {
	fn drop(&mut self) {
		self.task.abort();
	}
}
