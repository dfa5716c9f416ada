//! Failure classification for client errors and disconnect reasons.
//!
//! Classification only changes how a failure is logged; every failure takes
//! the same reconnect path.

use std::fmt;

use afk_runtime::ClientError;

/// System error codes that mean the server could not be reached.
const CONNECTION_CODES: &[&str] = &[
	"ECONNREFUSED",
	"ECONNRESET",
	"ETIMEDOUT",
	"EHOSTUNREACH",
	"ENETUNREACH",
	"ENOTFOUND",
	"EPIPE",
	"EAI_AGAIN",
];

/// Broad category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
	/// Refused, unreachable, reset or timed out.
	Connection,
	/// Session or credentials rejected.
	Auth,
	Other,
}

impl FailureKind {
	/// Operator-facing hint logged next to the failure.
	pub fn hint(self) -> &'static str {
		match self {
			FailureKind::Connection => "server unavailable, retrying shortly",
			FailureKind::Auth => "invalid session, retrying",
			FailureKind::Other => "unexpected client error",
		}
	}
}

impl fmt::Display for FailureKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			FailureKind::Connection => "connection",
			FailureKind::Auth => "auth",
			FailureKind::Other => "other",
		})
	}
}

/// Classifies a client error by its code, falling back to its message.
pub fn classify(error: &ClientError) -> FailureKind {
	if let Some(code) = error.code.as_deref() {
		if CONNECTION_CODES.contains(&code) {
			return FailureKind::Connection;
		}
	}
	classify_message(&error.message)
}

/// Classifies free text such as a disconnect reason.
pub fn classify_message(message: &str) -> FailureKind {
	let lower = message.to_ascii_lowercase();
	if lower.contains("invalid session") || lower.contains("failed to verify username") || lower.contains("invalid credentials")
	{
		return FailureKind::Auth;
	}
	if CONNECTION_CODES.iter().any(|code| message.contains(code)) {
		return FailureKind::Connection;
	}
	FailureKind::Other
}
