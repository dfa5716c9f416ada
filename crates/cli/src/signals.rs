//! OS signal wiring.

use afk::SessionHandle;
use anyhow::Context;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Requests a session stop on the first shutdown signal.
pub fn stop_on_signal(handle: SessionHandle) -> JoinHandle<()> {
	tokio::spawn(async move {
		match shutdown_signal().await {
			Ok(name) => {
				info!(target = "afk.cli", signal = name, "received signal, shutting down");
				handle.stop();
			}
			Err(e) => warn!(target = "afk.cli", error = %e, "signal handling unavailable"),
		}
	})
}

#[cfg(unix)]
async fn shutdown_signal() -> anyhow::Result<&'static str> {
	use tokio::signal::unix::{SignalKind, signal};

	let mut sigterm = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
	let mut sigint = signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

	tokio::select! {
		_ = sigterm.recv() => Ok("SIGTERM"),
		_ = sigint.recv() => Ok("SIGINT"),
	}
}

#[cfg(not(unix))]
async fn shutdown_signal() -> anyhow::Result<&'static str> {
	tokio::signal::ctrl_c().await.context("Failed to install Ctrl+C handler")?;
	Ok("Ctrl+C")
}
