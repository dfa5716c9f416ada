//! Reconnect decisions.
//!
//! Pure: the policy never arms timers, it only says whether and when.

use std::time::Duration;

use afk_protocol::{ReconnectConfig, RetryLimit};

/// Outcome of consulting the policy after a disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
	/// Reconnect after `delay`; `attempt` is the new attempt counter value.
	Retry { delay: Duration, attempt: u32 },
	/// The retry budget is spent.
	Exhausted { attempts: u32 },
	/// Reconnecting is turned off.
	Disabled,
}

/// Decides whether a disconnected session reconnects.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconnectPolicy;

impl ReconnectPolicy {
	/// `attempts` is the number of reconnects already scheduled since the last login.
	pub fn decide(attempts: u32, config: &ReconnectConfig) -> Decision {
		if !config.enabled {
			return Decision::Disabled;
		}
		let retry = Decision::Retry {
			delay: config.delay(),
			attempt: attempts.saturating_add(1),
		};
		match config.max_retries {
			RetryLimit::Unbounded => retry,
			RetryLimit::Limited(max) if attempts < max => retry,
			RetryLimit::Limited(_) => Decision::Exhausted { attempts },
		}
	}
}
