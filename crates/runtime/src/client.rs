//! The game client seam.
//!
//! [`GameClient`] is what a session asks for a new connection. Implementations
//! must return quickly: the handshake itself happens in the background and is
//! reported through the event stream (`Login`, or `Error` followed by `End`).

use afk_protocol::ConnectOptions;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::events::ClientEvent;

/// Ordered event stream of one connection. Closes after the connection ends.
pub type EventStream = mpsc::UnboundedReceiver<ClientEvent>;

/// Player view orientation in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
	pub yaw: f32,
	pub pitch: f32,
}

/// Opens game connections.
pub trait GameClient: Send {
	/// Starts a connection attempt.
	///
	/// # Errors
	///
	/// Returns an error only when the attempt could not be started at all
	/// (for example the driver process failed to spawn). Network and login
	/// failures are reported through the returned event stream instead.
	fn create_connection(&self, options: &ConnectOptions) -> Result<ConnectionParts>;
}

/// Action primitives of a live connection.
///
/// All methods are non-blocking; a request that cannot be delivered is
/// reported as an error.
pub trait ClientConnection: Send {
	/// Name the server knows the player by.
	fn username(&self) -> &str;

	/// Last known orientation, or `None` while the player has no entity.
	fn orientation(&self) -> Option<Orientation>;

	/// Turns the player's head.
	fn look(&self, yaw: f32, pitch: f32) -> Result<()>;

	/// Leaves the death screen.
	fn respawn(&self) -> Result<()>;

	/// Disconnects. The event stream ends with `End` afterwards.
	fn quit(&self) -> Result<()>;
}

/// A freshly created connection: the action handle plus its event stream.
pub struct ConnectionParts {
	pub connection: Box<dyn ClientConnection>,
	pub events: EventStream,
}

impl ConnectionParts {
	pub fn new(connection: Box<dyn ClientConnection>, events: EventStream) -> Self {
		Self { connection, events }
	}
}
