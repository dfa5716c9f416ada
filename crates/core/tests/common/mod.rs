//! Scripted game client for session tests.
//!
//! [`FakeClient`] records every connection attempt (with its tokio clock
//! time) and every action primitive call, and lets the test push events into
//! any connection's stream by index.

#![allow(dead_code)]

use std::sync::Arc;

use afk_protocol::{AuthMode, BotConfig, Config, ConnectOptions, ServerConfig};
use afk_runtime::{ClientConnection, ClientEvent, ConnectionParts, Error, GameClient, Orientation, Result};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// An action primitive call, tagged with the connection index.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
	Look { connection: usize, yaw: f32, pitch: f32 },
	Respawn { connection: usize },
	Quit { connection: usize },
}

#[derive(Default)]
struct State {
	connects: Vec<Instant>,
	options: Vec<ConnectOptions>,
	senders: Vec<Option<mpsc::UnboundedSender<ClientEvent>>>,
	actions: Vec<Action>,
	launch_failures: usize,
	orientation: Option<Orientation>,
	fail_looks: bool,
	look_calls: usize,
}

#[derive(Clone, Default)]
pub struct FakeClient {
	state: Arc<Mutex<State>>,
}

impl FakeClient {
	pub fn new() -> Self {
		Self::default()
	}

	/// The player entity faces `orientation` from the start.
	pub fn with_orientation(self, yaw: f32, pitch: f32) -> Self {
		self.state.lock().orientation = Some(Orientation { yaw, pitch });
		self
	}

	/// The next `count` connection attempts fail to launch.
	pub fn fail_launches(&self, count: usize) {
		self.state.lock().launch_failures = count;
	}

	pub fn fail_looks(&self, fail: bool) {
		self.state.lock().fail_looks = fail;
	}

	/// Connection attempts so far, including failed launches.
	pub fn connect_count(&self) -> usize {
		self.state.lock().connects.len()
	}

	pub fn connect_times(&self) -> Vec<Instant> {
		self.state.lock().connects.clone()
	}

	pub fn options(&self) -> Vec<ConnectOptions> {
		self.state.lock().options.clone()
	}

	/// Pushes an event into connection `index`'s stream.
	pub fn emit(&self, index: usize, event: ClientEvent) {
		let state = self.state.lock();
		let sender = state.senders[index].as_ref().expect("connection stream closed");
		let _ = sender.send(event);
	}

	/// Pushes an event into the newest connection's stream.
	pub fn emit_latest(&self, event: ClientEvent) {
		let index = self.state.lock().senders.len() - 1;
		self.emit(index, event);
	}

	/// Closes connection `index`'s stream without an `End`.
	pub fn close(&self, index: usize) {
		self.state.lock().senders[index] = None;
	}

	pub fn actions(&self) -> Vec<Action> {
		self.state.lock().actions.clone()
	}

	pub fn respawns(&self) -> usize {
		self.actions()
			.iter()
			.filter(|action| matches!(action, Action::Respawn { .. }))
			.count()
	}

	pub fn looks(&self) -> Vec<(f32, f32)> {
		self.actions()
			.into_iter()
			.filter_map(|action| match action {
				Action::Look { yaw, pitch, .. } => Some((yaw, pitch)),
				_ => None,
			})
			.collect()
	}

	/// `look` calls, including failed ones.
	pub fn look_calls(&self) -> usize {
		self.state.lock().look_calls
	}
}

impl GameClient for FakeClient {
	fn create_connection(&self, options: &ConnectOptions) -> Result<ConnectionParts> {
		let mut state = self.state.lock();
		state.connects.push(Instant::now());
		state.options.push(options.clone());

		if state.launch_failures > 0 {
			state.launch_failures -= 1;
			state.senders.push(None);
			return Err(Error::LaunchFailed("fake: connection refused".to_string()));
		}

		let (tx, rx) = mpsc::unbounded_channel();
		state.senders.push(Some(tx));
		let connection = FakeConnection {
			index: state.senders.len() - 1,
			username: options.username.clone(),
			state: Arc::clone(&self.state),
		};
		Ok(ConnectionParts::new(Box::new(connection), rx))
	}
}

struct FakeConnection {
	index: usize,
	username: String,
	state: Arc<Mutex<State>>,
}

impl ClientConnection for FakeConnection {
	fn username(&self) -> &str {
		&self.username
	}

	fn orientation(&self) -> Option<Orientation> {
		self.state.lock().orientation
	}

	fn look(&self, yaw: f32, pitch: f32) -> Result<()> {
		let mut state = self.state.lock();
		state.look_calls += 1;
		if state.fail_looks {
			return Err(Error::ActionFailed {
				action: "look",
				message: "entity not ready".to_string(),
			});
		}
		state.orientation = Some(Orientation { yaw, pitch });
		state.actions.push(Action::Look {
			connection: self.index,
			yaw,
			pitch,
		});
		Ok(())
	}

	fn respawn(&self) -> Result<()> {
		self.state.lock().actions.push(Action::Respawn { connection: self.index });
		Ok(())
	}

	fn quit(&self) -> Result<()> {
		self.state.lock().actions.push(Action::Quit { connection: self.index });
		Ok(())
	}
}

/// Baseline config: localhost, offline auth, all defaults, adjusted by `edit`.
pub fn config(edit: impl FnOnce(&mut Config)) -> Arc<Config> {
	let mut config = Config {
		server: ServerConfig {
			host: "localhost".to_string(),
			port: 25565,
			version: Some("1.20.1".to_string()),
		},
		bot: BotConfig {
			username: "AFKBot".to_string(),
			auth: AuthMode::Offline,
		},
		forge: Default::default(),
		keep_alive: Default::default(),
		reconnect: Default::default(),
		driver: None,
		mods: Vec::new(),
	};
	edit(&mut config);
	Arc::new(config)
}
