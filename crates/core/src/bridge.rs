//! Client event forwarding.
//!
//! One bridge task per connection attempt moves events from the client's
//! stream into the controller inbox, tagged with the attempt's
//! [`ConnectionId`]. Order is preserved and nothing is batched or dropped, with
//! one exception: nothing is forwarded after `End`.

use std::sync::atomic::{AtomicU64, Ordering};

use afk_runtime::{ClientEvent, EventStream};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::controller::Input;
use crate::timer::TaskHandle;

/// Identifies one connection attempt.
pub type ConnectionId = u64;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a new process-unique connection id.
pub fn next_connection_id() -> ConnectionId {
	NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Reason attached to the `End` synthesized for a stream that closed silently.
pub const STREAM_CLOSED: &str = "event stream closed";

/// Forwards one connection's events to the controller.
pub struct EventBridge;

impl EventBridge {
	/// Spawns the forwarding task. Dropping the returned handle detaches the bridge.
	pub(crate) fn attach(connection: ConnectionId, events: EventStream, inbox: mpsc::UnboundedSender<Input>) -> TaskHandle {
		TaskHandle::spawn(move |_| forward(connection, events, inbox))
	}
}

async fn forward(connection: ConnectionId, mut events: EventStream, inbox: mpsc::UnboundedSender<Input>) {
	loop {
		let event = match events.recv().await {
			Some(event) => event,
			None => {
				debug!(target = "afk.bridge", connection, "event stream closed without end");
				ClientEvent::End {
					reason: Some(STREAM_CLOSED.to_string()),
				}
			}
		};

		trace!(target = "afk.bridge", connection, event = event.name(), "forward");
		let end = event.is_end();
		if inbox.send(Input::Client { connection, event }).is_err() || end {
			return;
		}
	}
}
