//! Options for opening one game connection.

use serde::{Deserialize, Serialize};

use crate::config::{AuthMode, Config};
use crate::forge::ForgeHandshake;

/// Everything a game client needs to open a connection.
///
/// Built once per attempt from the [`Config`]; the capability descriptor is
/// only present when Forge emulation is enabled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOptions {
	pub host: String,
	pub port: u16,
	pub username: String,
	pub auth: AuthMode,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub version: Option<String>,
	/// Ask the client not to print protocol errors itself; they still arrive as events.
	#[serde(default)]
	pub hide_errors: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub forge: Option<ForgeHandshake>,
}

impl ConnectOptions {
	pub fn from_config(config: &Config) -> Self {
		let forge = config
			.forge
			.enabled
			.then(|| ForgeHandshake::from_mods(config.forge.mods.as_slice()));

		Self {
			host: config.server.host.clone(),
			port: config.server.port,
			username: config.bot.username.clone(),
			auth: config.bot.auth,
			version: config.server.version.clone(),
			hide_errors: false,
			forge,
		}
	}
}
