//! Shared data types for afk sessions.
//!
//! Nothing in this crate performs I/O. It holds the pieces that cross a
//! boundary:
//!
//! - [`Config`]: the record loaded from `config.json` by the CLI
//! - [`ForgeHandshake`]: the static capability descriptor sent at connection setup
//! - [`ConnectOptions`]: what a game client needs to open one connection
//! - [`DriverRequest`] / [`DriverEvent`]: frames exchanged with an external driver process

pub mod config;
pub mod driver;
pub mod forge;
pub mod options;

pub use config::{
	AuthMode, BotConfig, Config, DriverConfig, ForgeConfig, InvalidRetryLimit, KeepAliveConfig, ReconnectConfig,
	RetryLimit, ServerConfig,
};
pub use driver::{DriverEvent, DriverRequest};
pub use forge::{FML_NETWORK_VERSION, ForgeHandshake, ModEntry};
pub use options::ConnectOptions;
