//! afk runtime - the boundary between a session and the game client
//!
//! The session core never speaks the game protocol itself. It talks to a
//! [`GameClient`], which opens connections and hands back an ordered stream of
//! [`ClientEvent`]s plus a [`ClientConnection`] exposing the few action
//! primitives the core needs.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   afk-core   │  Session state machine
//! └──────┬───────┘
//!        │ GameClient / ClientConnection
//! ┌──────▼───────┐
//! │ afk-runtime  │  This crate
//! │  ┌────────┐  │
//! │  │ Driver │  │  One child process per connection
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Trans  │  │  Length-prefixed JSON over stdio
//! │  └────────┘  │
//! └──────────────┘
//! ```

pub mod client;
pub mod driver;
pub mod error;
pub mod events;
pub mod transport;

pub use client::{ClientConnection, ConnectionParts, EventStream, GameClient, Orientation};
pub use driver::{DRIVER_ENV, DriverClient, DriverConnection, resolve_driver};
pub use error::{Error, Result};
pub use events::{ClientError, ClientEvent};
pub use transport::{PipeTransport, PipeTransportReceiver, PipeTransportSender};
