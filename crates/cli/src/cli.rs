use std::path::PathBuf;

use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::AnsiColor;

use crate::config::{DEFAULT_CONFIG_PATH, Overrides};

/// Keeps a game session alive: reconnects, respawns, and stays active.
#[derive(Parser, Debug)]
#[command(name = "afk")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v debug, -vv trace)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Only log errors
	#[arg(short, long, conflicts_with = "verbose")]
	pub quiet: bool,

	/// Path to the JSON config file
	#[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
	pub config: PathBuf,

	/// Override `server.host`
	#[arg(long, value_name = "HOST")]
	pub host: Option<String>,

	/// Override `server.port`
	#[arg(long, value_name = "PORT")]
	pub port: Option<u16>,

	/// Override `bot.username`
	#[arg(long, value_name = "NAME")]
	pub username: Option<String>,
}

impl Cli {
	pub fn overrides(&self) -> Overrides {
		Overrides {
			host: self.host.clone(),
			port: self.port,
			username: self.username.clone(),
		}
	}
}

fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
}
