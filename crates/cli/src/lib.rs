//! Command-line runner for an afk session.
//!
//! Loads and validates the config file, sets up logging, resolves the driver,
//! and runs one [`afk::SessionController`] until it terminates or a shutdown
//! signal arrives.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod signals;
