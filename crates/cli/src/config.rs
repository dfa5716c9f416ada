//! Config file loading and validation.

use std::fs;
use std::path::Path;

use afk_protocol::Config;

use crate::error::{AfkError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Command-line overrides of config file values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
	pub host: Option<String>,
	pub port: Option<u16>,
	pub username: Option<String>,
}

/// Reads, parses, overrides and validates the config at `path`.
pub fn load(path: &Path, overrides: &Overrides) -> Result<Config> {
	let text = fs::read_to_string(path).map_err(|source| AfkError::ConfigRead {
		path: path.to_path_buf(),
		source,
	})?;
	let mut config = parse(path, &text)?;
	apply_overrides(&mut config, overrides);
	validate(&config)?;
	Ok(config)
}

/// Parses config text and folds the legacy top-level `mods` list into `forge.mods`.
pub fn parse(path: &Path, text: &str) -> Result<Config> {
	let mut config: Config = serde_json::from_str(text).map_err(|source| AfkError::ConfigParse {
		path: path.to_path_buf(),
		source,
	})?;
	config.merge_legacy_mods();
	Ok(config)
}

pub fn apply_overrides(config: &mut Config, overrides: &Overrides) {
	if let Some(host) = &overrides.host {
		config.server.host = host.clone();
	}
	if let Some(port) = overrides.port {
		config.server.port = port;
	}
	if let Some(username) = &overrides.username {
		config.bot.username = username.clone();
	}
}

/// Rejects configs the session cannot run with.
///
/// `maxRetries` below `-1` is already rejected while parsing.
pub fn validate(config: &Config) -> Result<()> {
	if config.server.host.trim().is_empty() {
		return Err(invalid("server.host must not be empty"));
	}
	if config.server.port == 0 {
		return Err(invalid("server.port must not be 0"));
	}
	if config.bot.username.trim().is_empty() {
		return Err(invalid("bot.username must not be empty"));
	}
	if config.keep_alive.enabled && config.keep_alive.interval == 0 {
		return Err(invalid("keepAlive.interval must be greater than 0"));
	}
	if let Some(driver) = &config.driver {
		if driver.command.trim().is_empty() {
			return Err(invalid("driver.command must not be empty"));
		}
	}
	if config.forge.mods.iter().any(|modid| modid.trim().is_empty()) {
		return Err(invalid("forge.mods must not contain empty mod ids"));
	}
	Ok(())
}

fn invalid(message: &str) -> AfkError {
	AfkError::InvalidConfig(message.to_string())
}
