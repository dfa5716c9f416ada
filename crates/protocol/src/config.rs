//! Session configuration record.
//!
//! Mirrors the JSON layout of `config.json` (camelCase keys). Sections other
//! than `server` and `bot` are optional and fall back to the defaults below.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default game server port.
pub const DEFAULT_PORT: u16 = 25565;
/// Default keep-alive interval in milliseconds.
pub const DEFAULT_KEEP_ALIVE_INTERVAL_MS: u64 = 30_000;
/// Default delay before a reconnect attempt in milliseconds.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5_000;

/// Top-level configuration record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
	pub server: ServerConfig,
	pub bot: BotConfig,
	#[serde(default)]
	pub forge: ForgeConfig,
	#[serde(default)]
	pub keep_alive: KeepAliveConfig,
	#[serde(default)]
	pub reconnect: ReconnectConfig,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub driver: Option<DriverConfig>,
	/// Older config files list mods at the top level instead of under `forge`.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub mods: Vec<String>,
}

impl Config {
	/// Moves a top-level `mods` list into `forge.mods` when the latter is empty.
	pub fn merge_legacy_mods(&mut self) {
		if self.mods.is_empty() {
			return;
		}
		let legacy = std::mem::take(&mut self.mods);
		if self.forge.mods.is_empty() {
			self.forge.mods = legacy;
		}
	}

	/// Returns `host:port` for log output.
	pub fn server_address(&self) -> String {
		format!("{}:{}", self.server.host, self.server.port)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
	pub host: String,
	#[serde(default = "default_port")]
	pub port: u16,
	/// Protocol version string (e.g. `"1.20.1"`). `None` lets the driver auto-detect.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
	pub username: String,
	#[serde(default)]
	pub auth: AuthMode,
}

/// Account authentication scheme passed through to the client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
	#[default]
	Offline,
	Microsoft,
	Mojang,
}

impl fmt::Display for AuthMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			AuthMode::Offline => "offline",
			AuthMode::Microsoft => "microsoft",
			AuthMode::Mojang => "mojang",
		};
		f.write_str(name)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ForgeConfig {
	#[serde(default)]
	pub enabled: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub version: Option<String>,
	#[serde(default)]
	pub mods: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KeepAliveConfig {
	#[serde(default = "default_true")]
	pub enabled: bool,
	/// Milliseconds between anti-idle actions.
	#[serde(default = "default_keep_alive_interval")]
	pub interval: u64,
}

impl Default for KeepAliveConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			interval: DEFAULT_KEEP_ALIVE_INTERVAL_MS,
		}
	}
}

impl KeepAliveConfig {
	pub fn interval(&self) -> Duration {
		Duration::from_millis(self.interval)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectConfig {
	#[serde(default = "default_true")]
	pub enabled: bool,
	#[serde(default)]
	pub max_retries: RetryLimit,
	/// Milliseconds to wait before each reconnect attempt.
	#[serde(default = "default_reconnect_delay")]
	pub delay: u64,
}

impl Default for ReconnectConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			max_retries: RetryLimit::Unbounded,
			delay: DEFAULT_RECONNECT_DELAY_MS,
		}
	}
}

impl ReconnectConfig {
	pub fn delay(&self) -> Duration {
		Duration::from_millis(self.delay)
	}
}

/// Upper bound on consecutive reconnect attempts.
///
/// Serialized as an integer: `-1` means unbounded, any non-negative value is a
/// limit. Other negative values are rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(try_from = "i64", into = "i64")]
pub enum RetryLimit {
	#[default]
	Unbounded,
	Limited(u32),
}

/// Raised when `maxRetries` is negative but not the `-1` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidRetryLimit(pub i64);

impl fmt::Display for InvalidRetryLimit {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "maxRetries must be -1 (unbounded) or a non-negative integer, got {}", self.0)
	}
}

impl std::error::Error for InvalidRetryLimit {}

impl TryFrom<i64> for RetryLimit {
	type Error = InvalidRetryLimit;

	fn try_from(value: i64) -> Result<Self, Self::Error> {
		match value {
			-1 => Ok(RetryLimit::Unbounded),
			n if n >= 0 => u32::try_from(n).map(RetryLimit::Limited).map_err(|_| InvalidRetryLimit(n)),
			n => Err(InvalidRetryLimit(n)),
		}
	}
}

impl From<RetryLimit> for i64 {
	fn from(limit: RetryLimit) -> Self {
		match limit {
			RetryLimit::Unbounded => -1,
			RetryLimit::Limited(n) => i64::from(n),
		}
	}
}

/// External driver process used to speak the game protocol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriverConfig {
	pub command: String,
	#[serde(default)]
	pub args: Vec<String>,
}

impl Default for DriverConfig {
	fn default() -> Self {
		Self {
			command: "node".to_string(),
			args: vec!["driver.js".to_string()],
		}
	}
}

impl DriverConfig {
	/// Parses a whitespace-separated command line such as `"node driver.js --flag"`.
	pub fn from_command_line(line: &str) -> Option<Self> {
		let mut parts = line.split_whitespace().map(str::to_string);
		let command = parts.next()?;
		Some(Self {
			command,
			args: parts.collect(),
		})
	}
}

fn default_port() -> u16 {
	DEFAULT_PORT
}

fn default_true() -> bool {
	true
}

fn default_keep_alive_interval() -> u64 {
	DEFAULT_KEEP_ALIVE_INTERVAL_MS
}

fn default_reconnect_delay() -> u64 {
	DEFAULT_RECONNECT_DELAY_MS
}
