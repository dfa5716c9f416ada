//! Forge capability descriptor.
//!
//! Modded servers refuse clients that do not announce a matching mod list
//! during the FML handshake. The descriptor built here is static: one entry
//! per configured mod id with a placeholder version, plus the fixed channel
//! set every FML2 client registers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// FML network protocol revision announced during the handshake.
pub const FML_NETWORK_VERSION: u32 = 2;

/// Channels announced by every FML2 client.
pub const FML_CHANNELS: [&str; 3] = ["minecraft:unregister", "minecraft:register", "fml:handshake"];

/// Version reported for every emulated mod.
pub const PLACEHOLDER_MOD_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ForgeHandshake {
	pub fml_network_version: u32,
	pub channels: Vec<String>,
	pub mods: Vec<ModEntry>,
	pub registries: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModEntry {
	pub modid: String,
	pub version: String,
}

impl ForgeHandshake {
	/// Builds the descriptor for a list of mod ids.
	pub fn from_mods<S: AsRef<str>>(mods: &[S]) -> Self {
		Self {
			fml_network_version: FML_NETWORK_VERSION,
			channels: FML_CHANNELS.iter().map(|c| c.to_string()).collect(),
			mods: mods
				.iter()
				.map(|id| ModEntry {
					modid: id.as_ref().to_string(),
					version: PLACEHOLDER_MOD_VERSION.to_string(),
				})
				.collect(),
			registries: Map::new(),
		}
	}
}
