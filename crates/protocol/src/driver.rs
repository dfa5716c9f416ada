//! Frames exchanged with an external driver process.
//!
//! Requests flow from the session to the driver; events flow back. Each frame
//! is a JSON object carried by the runtime's length-prefixed pipe transport.
//!
//! ```text
//! -> {"method":"connect","params":{"host":"localhost","port":25565,...}}
//! <- {"event":"login"}
//! <- {"event":"move","params":{"yaw":1.57,"pitch":0.0}}
//! -> {"method":"look","params":{"yaw":1.58,"pitch":0.0}}
//! <- {"event":"end","params":{"reason":"socketClosed"}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::options::ConnectOptions;

/// Request sent to the driver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum DriverRequest {
	/// Open the game connection. Sent exactly once, first.
	Connect(ConnectOptions),
	/// Set the player's view orientation (radians).
	Look { yaw: f32, pitch: f32 },
	/// Leave the death screen.
	Respawn,
	/// Disconnect cleanly.
	Quit,
}

/// Event emitted by the driver.
///
/// Kept loosely typed so that drivers can add event kinds without breaking
/// older sessions; the runtime maps known names and tolerates the rest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverEvent {
	pub event: String,
	#[serde(default, skip_serializing_if = "Value::is_null")]
	pub params: Value,
}

impl DriverEvent {
	pub fn new(event: impl Into<String>) -> Self {
		Self {
			event: event.into(),
			params: Value::Null,
		}
	}

	pub fn with_params(event: impl Into<String>, params: Value) -> Self {
		Self {
			event: event.into(),
			params,
		}
	}

	/// Returns a string parameter by name.
	pub fn str_param(&self, key: &str) -> Option<&str> {
		self.params.get(key).and_then(Value::as_str)
	}

	/// Returns a numeric parameter by name as `f32`.
	pub fn f32_param(&self, key: &str) -> Option<f32> {
		self.params.get(key).and_then(Value::as_f64).map(|v| v as f32)
	}
}
