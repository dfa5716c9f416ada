//! Wires config, driver, controller and signals together.

use std::sync::Arc;

use afk::{Outcome, SessionController};
use afk_protocol::{Config, DriverConfig};
use afk_runtime::{DriverClient, resolve_driver};
use tracing::{debug, info};

use crate::cli::Cli;
use crate::config;
use crate::error::Result;
use crate::signals;

/// Runs one session to completion.
pub async fn run(cli: &Cli) -> Result<Outcome> {
	let config = config::load(&cli.config, &cli.overrides())?;
	let driver = resolve_driver(config.driver.as_ref());
	log_banner(&config, &driver);

	let client = DriverClient::new(driver);
	let mut controller = SessionController::new(Arc::new(config), client.clone());
	let signals = signals::stop_on_signal(controller.handle());

	let outcome = controller.run().await;
	signals.abort();

	drop(controller);
	client.wait_for_exit().await;
	Ok(outcome)
}

fn log_banner(config: &Config, driver: &DriverConfig) {
	info!(
		target = "afk.cli",
		server = %config.server_address(),
		version = config.server.version.as_deref().unwrap_or("auto"),
		username = %config.bot.username,
		auth = %config.bot.auth,
		forge = config.forge.enabled,
		"starting afk session"
	);
	if config.forge.enabled {
		info!(
			target = "afk.cli",
			forge_version = config.forge.version.as_deref().unwrap_or("unknown"),
			mods = config.forge.mods.len(),
			"forge handshake emulation enabled"
		);
	}
	debug!(target = "afk.cli", command = %driver.command, args = ?driver.args, "driver");
}
