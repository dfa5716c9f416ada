//! Events emitted by a game connection.

use std::fmt;

/// One event from a game connection, in delivery order.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
	/// Login accepted; the session is connected.
	Login,
	/// The player entity entered the world (also after a respawn).
	Spawn,
	/// A chat line from `username`.
	Chat { username: String, message: String },
	/// The connection is gone. Always the last event of a connection.
	End { reason: Option<String> },
	/// A protocol or network error. An `End` follows if the connection dropped.
	Error(ClientError),
	/// The player died and is on the death screen.
	Death,
	/// The server kicked the player. An `End` follows.
	Kicked { reason: String },
	/// Any event kind this version does not know.
	Unknown { name: String },
}

impl ClientEvent {
	/// Event name as used on the wire.
	pub fn name(&self) -> &str {
		match self {
			ClientEvent::Login => "login",
			ClientEvent::Spawn => "spawn",
			ClientEvent::Chat { .. } => "chat",
			ClientEvent::End { .. } => "end",
			ClientEvent::Error(_) => "error",
			ClientEvent::Death => "death",
			ClientEvent::Kicked { .. } => "kicked",
			ClientEvent::Unknown { name } => name,
		}
	}

	pub fn is_end(&self) -> bool {
		matches!(self, ClientEvent::End { .. })
	}
}

/// Error reported by the client, e.g. `connect ECONNREFUSED 127.0.0.1:25565`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
	pub message: String,
	/// System error code when the client has one (`ECONNREFUSED`, `ECONNRESET`, ...).
	pub code: Option<String>,
}

impl ClientError {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			code: None,
		}
	}

	pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			code: Some(code.into()),
		}
	}
}

impl fmt::Display for ClientError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.code {
			Some(code) if !self.message.contains(code.as_str()) => write!(f, "{} ({code})", self.message),
			_ => f.write_str(&self.message),
		}
	}
}
