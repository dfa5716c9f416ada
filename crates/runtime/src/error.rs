//! Error types for the afk runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the afk runtime.
#[derive(Debug, Error)]
pub enum Error {
	/// Failed to launch the driver process.
	#[error("Failed to launch driver: {0}")]
	LaunchFailed(String),

	/// Transport-level error (stdio communication).
	#[error("Transport error: {0}")]
	TransportError(String),

	/// Malformed or oversized frame.
	#[error("Protocol error: {0}")]
	ProtocolError(String),

	/// An action primitive was rejected by the client.
	#[error("{action} failed: {message}")]
	ActionFailed { action: &'static str, message: String },

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns true if the connection behind this error is gone.
	pub fn is_closed(&self) -> bool {
		matches!(self, Error::TransportError(_))
	}
}
