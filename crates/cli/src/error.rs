use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AfkError>;

/// Exit code for configuration problems.
pub const EXIT_CONFIG: i32 = 2;

#[derive(Debug, Error)]
pub enum AfkError {
	#[error("failed to read config {}: {source}", .path.display())]
	ConfigRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse config {}: {source}", .path.display())]
	ConfigParse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid config: {0}")]
	InvalidConfig(String),
}

impl AfkError {
	/// Process exit code for this error.
	pub fn exit_code(&self) -> i32 {
		match self {
			AfkError::ConfigRead { .. } | AfkError::ConfigParse { .. } | AfkError::InvalidConfig(_) => EXIT_CONFIG,
		}
	}
}
