//! The session state machine.
//!
//! [`SessionController`] is a single-threaded actor. Bridged client events,
//! timer firings and stop requests all arrive on one inbox and are handled
//! to completion, one at a time, in arrival order. It is the only code that
//! mutates the [`Session`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use afk_protocol::{Config, ConnectOptions};
use afk_runtime::{ClientConnection, ClientError, ClientEvent, GameClient};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::bridge::{ConnectionId, EventBridge, next_connection_id};
use crate::classify::{FailureKind, classify, classify_message};
use crate::keep_alive::KeepAliveScheduler;
use crate::policy::{Decision, ReconnectPolicy};
use crate::session::{PendingKind, PendingTask, Session, Status};
use crate::timer::{TaskHandle, TimerToken};

/// Delay between a death and the respawn request.
pub const RESPAWN_DELAY: Duration = Duration::from_millis(2000);

/// Inbox message.
#[derive(Debug)]
pub(crate) enum Input {
	Client { connection: ConnectionId, event: ClientEvent },
	KeepAliveTick { token: TimerToken },
	RetryFired { token: TimerToken },
	Stop,
}

/// Why [`SessionController::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
	/// Stopped on request.
	Stopped,
	/// The reconnect budget ran out.
	Exhausted { attempts: u32 },
	/// Disconnected while reconnecting is disabled.
	ReconnectDisabled { reason: String },
}

impl Outcome {
	pub fn is_failure(&self) -> bool {
		!matches!(self, Outcome::Stopped)
	}
}

impl fmt::Display for Outcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Outcome::Stopped => f.write_str("stopped"),
			Outcome::Exhausted { attempts } => write!(f, "gave up after {attempts} reconnect attempts"),
			Outcome::ReconnectDisabled { reason } => write!(f, "disconnected ({reason}) with reconnect disabled"),
		}
	}
}

/// Requests a stop from another task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
	inbox: mpsc::UnboundedSender<Input>,
}

impl SessionHandle {
	/// Queues a stop. Returns `false` if the controller is gone.
	pub fn stop(&self) -> bool {
		self.inbox.send(Input::Stop).is_ok()
	}
}

/// The live connection of the current attempt.
struct Attempt {
	id: ConnectionId,
	connection: Box<dyn ClientConnection>,
	_bridge: TaskHandle,
}

/// Drives one [`Session`] against a [`GameClient`].
pub struct SessionController<C> {
	session: Session,
	client: C,
	keep_alive: KeepAliveScheduler,
	attempt: Option<Attempt>,
	outcome: Option<Outcome>,
	inbox_tx: mpsc::UnboundedSender<Input>,
	inbox_rx: mpsc::UnboundedReceiver<Input>,
}

impl<C: GameClient> SessionController<C> {
	pub fn new(config: Arc<Config>, client: C) -> Self {
		let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
		Self {
			session: Session::new(config),
			client,
			keep_alive: KeepAliveScheduler::new(inbox_tx.clone()),
			attempt: None,
			outcome: None,
			inbox_tx,
			inbox_rx,
		}
	}

	pub fn session(&self) -> &Session {
		&self.session
	}

	pub fn handle(&self) -> SessionHandle {
		SessionHandle {
			inbox: self.inbox_tx.clone(),
		}
	}

	/// Set once the session is terminated.
	pub fn outcome(&self) -> Option<&Outcome> {
		self.outcome.as_ref()
	}

	/// Opens a new connection attempt.
	///
	/// Ignored while an attempt is live. From `Terminated` this begins a fresh
	/// lifecycle with the retry budget reset.
	pub fn start(&mut self) {
		match self.session.status {
			Status::Disconnected => {}
			Status::Terminated => {
				self.session.reconnect_attempts = 0;
				self.outcome = None;
				info!(target = "afk.session", "restarting session");
			}
			status => {
				debug!(target = "afk.session", %status, "start ignored");
				return;
			}
		}
		self.session.cancel_pending();

		let config = Arc::clone(self.session.config());
		let options = ConnectOptions::from_config(&config);
		let id = next_connection_id();
		self.session.status = Status::Connecting;
		info!(
			target = "afk.session",
			connection = id,
			server = %config.server_address(),
			attempt = self.session.reconnect_attempts,
			"connecting"
		);

		match self.client.create_connection(&options) {
			Ok(parts) => {
				let bridge = EventBridge::attach(id, parts.events, self.inbox_tx.clone());
				self.attempt = Some(Attempt {
					id,
					connection: parts.connection,
					_bridge: bridge,
				});
			}
			Err(e) => {
				let failure = ClientError::new(e.to_string());
				log_failure(&failure);
				self.on_end(Some(failure.message));
			}
		}
	}

	/// Cancels all timers, quits the connection and terminates the session.
	/// Calling it again is a no-op.
	pub fn stop(&mut self) {
		if self.session.status.is_terminated() {
			return;
		}
		info!(target = "afk.session", status = %self.session.status, "stopping session");
		if let Some(attempt) = self.attempt.take() {
			if let Err(e) = attempt.connection.quit() {
				debug!(target = "afk.session", error = %e, "quit failed");
			}
		}
		self.terminate(Outcome::Stopped);
	}

	/// Waits for the next inbox message and handles it.
	pub async fn step(&mut self) {
		// The controller holds a sender, so the inbox never closes.
		if let Some(input) = self.inbox_rx.recv().await {
			self.process(input);
		}
	}

	/// Starts the session and handles messages until it terminates.
	pub async fn run(&mut self) -> Outcome {
		self.start();
		while !self.session.status.is_terminated() {
			self.step().await;
		}
		self.outcome.clone().unwrap_or(Outcome::Stopped)
	}

	fn process(&mut self, input: Input) {
		match input {
			Input::Client { connection, event } => self.on_client_event(connection, event),
			Input::KeepAliveTick { token } => self.on_keep_alive_tick(token),
			Input::RetryFired { token } => self.on_retry_fired(token),
			Input::Stop => self.stop(),
		}
	}

	fn on_client_event(&mut self, connection: ConnectionId, event: ClientEvent) {
		if self.attempt.as_ref().map(|attempt| attempt.id) != Some(connection) {
			debug!(
				target = "afk.session",
				connection,
				event = event.name(),
				"dropping event from superseded connection"
			);
			return;
		}

		match event {
			ClientEvent::Login => self.on_login(),
			ClientEvent::Spawn => self.on_spawn(),
			ClientEvent::Death => self.on_death(),
			ClientEvent::End { reason } => self.on_end(reason),
			ClientEvent::Kicked { reason } => {
				warn!(target = "afk.session", %reason, kind = %classify_message(&reason), "kicked");
			}
			ClientEvent::Error(failure) => log_failure(&failure),
			ClientEvent::Chat { username, message } => {
				let own = self.attempt.as_ref().map(|attempt| attempt.connection.username());
				if own != Some(username.as_str()) {
					info!(target = "afk.session", "[{username}]: {message}");
				}
			}
			ClientEvent::Unknown { name } => {
				debug!(target = "afk.session", event = %name, "ignoring unknown event");
			}
		}
	}

	fn on_login(&mut self) {
		if self.session.status != Status::Connecting {
			debug!(target = "afk.session", status = %self.session.status, "unexpected login");
			return;
		}
		self.session.status = Status::Connected;
		self.session.reconnect_attempts = 0;
		let username = self
			.attempt
			.as_ref()
			.map(|attempt| attempt.connection.username().to_string())
			.unwrap_or_default();
		info!(
			target = "afk.session",
			%username,
			server = %self.session.config().server_address(),
			"logged in"
		);
		self.keep_alive.start_for(&mut self.session);
	}

	fn on_spawn(&mut self) {
		match self.session.status {
			Status::Connected => {
				self.session.status = Status::Spawned;
				info!(target = "afk.session", "spawned in world");
			}
			Status::Spawned => debug!(target = "afk.session", "respawned"),
			status => debug!(target = "afk.session", %status, "unexpected spawn"),
		}
	}

	fn on_death(&mut self) {
		if !self.session.status.is_online() {
			return;
		}
		if self.session.pending() == Some(PendingKind::Respawn) {
			debug!(target = "afk.session", "died again; respawn already pending");
			return;
		}
		info!(
			target = "afk.session",
			delay_ms = RESPAWN_DELAY.as_millis() as u64,
			"died; respawning"
		);
		self.schedule(PendingKind::Respawn, RESPAWN_DELAY);
	}

	fn on_end(&mut self, reason: Option<String>) {
		if !self.session.status.is_live() {
			return;
		}
		let reason = reason.unwrap_or_else(|| "unknown".to_string());

		self.keep_alive.stop(&mut self.session);
		self.session.cancel_pending();
		self.attempt = None;
		self.session.status = Status::Disconnected;

		match ReconnectPolicy::decide(self.session.reconnect_attempts, &self.session.config().reconnect) {
			Decision::Retry { delay, attempt } => {
				self.session.reconnect_attempts = attempt;
				info!(
					target = "afk.session",
					%reason,
					attempt,
					delay_ms = delay.as_millis() as u64,
					"disconnected; reconnecting"
				);
				self.schedule(PendingKind::Reconnect, delay);
			}
			Decision::Exhausted { attempts } => {
				error!(
					target = "afk.session",
					%reason,
					attempts,
					"maximum reconnect attempts reached"
				);
				self.terminate(Outcome::Exhausted { attempts });
			}
			Decision::Disabled => {
				warn!(target = "afk.session", %reason, "disconnected; reconnect disabled");
				self.terminate(Outcome::ReconnectDisabled { reason });
			}
		}
	}

	fn on_keep_alive_tick(&mut self, token: TimerToken) {
		let current = self.session.keep_alive_timer.as_ref().is_some_and(|timer| timer.matches(token));
		if !current {
			return;
		}
		let connection = self.attempt.as_ref().map(|attempt| attempt.connection.as_ref());
		self.keep_alive.tick(&self.session, connection);
	}

	fn on_retry_fired(&mut self, token: TimerToken) {
		let current = self
			.session
			.pending_retry
			.as_ref()
			.is_some_and(|pending| pending.handle.matches(token));
		if !current {
			debug!(target = "afk.session", token, "ignoring stale timer");
			return;
		}
		let Some(pending) = self.session.pending_retry.take() else {
			return;
		};

		match pending.kind {
			PendingKind::Reconnect => self.start(),
			PendingKind::Respawn => {
				if !self.session.status.is_online() {
					return;
				}
				if let Some(attempt) = &self.attempt {
					match attempt.connection.respawn() {
						Ok(()) => debug!(target = "afk.session", "respawn requested"),
						Err(e) => warn!(target = "afk.session", error = %e, "respawn failed"),
					}
				}
			}
		}
	}

	fn schedule(&mut self, kind: PendingKind, delay: Duration) {
		self.session.cancel_pending();
		let inbox = self.inbox_tx.clone();
		let handle = TaskHandle::spawn(move |token| async move {
			tokio::time::sleep(delay).await;
			let _ = inbox.send(Input::RetryFired { token });
		});
		self.session.pending_retry = Some(PendingTask { kind, handle });
	}

	fn terminate(&mut self, outcome: Outcome) {
		self.keep_alive.stop(&mut self.session);
		self.session.cancel_pending();
		self.attempt = None;
		self.session.status = Status::Terminated;
		self.outcome = Some(outcome);
	}
}

fn log_failure(failure: &ClientError) {
	let kind = classify(failure);
	match kind {
		FailureKind::Other => warn!(target = "afk.session", kind = %kind, error = %failure, "client error"),
		_ => warn!(target = "afk.session", kind = %kind, error = %failure, "{}", kind.hint()),
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use afk_protocol::{AuthMode, BotConfig, ReconnectConfig, RetryLimit, ServerConfig};
	use afk_runtime::{ConnectionParts, Error, Orientation, Result};

	use super::*;

	struct Unreachable;

	impl GameClient for Unreachable {
		fn create_connection(&self, _options: &ConnectOptions) -> Result<ConnectionParts> {
			Err(Error::LaunchFailed("node: not found".to_string()))
		}
	}

	/// Opens connections whose event streams stay open and silent.
	#[derive(Default)]
	struct Silent {
		senders: std::sync::Mutex<Vec<mpsc::UnboundedSender<ClientEvent>>>,
	}

	struct SilentConnection;

	impl ClientConnection for SilentConnection {
		fn username(&self) -> &str {
			"Idler"
		}
		fn orientation(&self) -> Option<Orientation> {
			None
		}
		fn look(&self, _yaw: f32, _pitch: f32) -> Result<()> {
			Ok(())
		}
		fn respawn(&self) -> Result<()> {
			Ok(())
		}
		fn quit(&self) -> Result<()> {
			Ok(())
		}
	}

	impl GameClient for Silent {
		fn create_connection(&self, _options: &ConnectOptions) -> Result<ConnectionParts> {
			let (tx, rx) = mpsc::unbounded_channel();
			self.senders.lock().unwrap().push(tx);
			Ok(ConnectionParts::new(Box::new(SilentConnection), rx))
		}
	}

	fn config() -> Arc<Config> {
		Arc::new(Config {
			server: ServerConfig {
				host: "localhost".to_string(),
				port: 25565,
				version: None,
			},
			bot: BotConfig {
				username: "Idler".to_string(),
				auth: AuthMode::Offline,
			},
			forge: Default::default(),
			keep_alive: Default::default(),
			reconnect: Default::default(),
			driver: None,
			mods: Vec::new(),
		})
	}

	#[tokio::test(start_paused = true)]
	async fn launch_failure_is_treated_as_end() {
		let mut controller = SessionController::new(config(), Unreachable);
		controller.start();

		assert_eq!(controller.session().status(), Status::Disconnected);
		assert_eq!(controller.session().reconnect_attempts(), 1);
		assert_eq!(controller.session().pending(), Some(PendingKind::Reconnect));
	}

	#[tokio::test(start_paused = true)]
	async fn start_is_ignored_while_connecting() {
		let mut controller = SessionController::new(config(), Silent::default());
		controller.start();
		let first = controller.attempt.as_ref().map(|attempt| attempt.id);
		controller.start();

		assert_eq!(controller.session().status(), Status::Connecting);
		assert_eq!(controller.attempt.as_ref().map(|attempt| attempt.id), first);
	}

	#[tokio::test(start_paused = true)]
	async fn stale_retry_token_is_ignored() {
		let mut controller = SessionController::new(config(), Unreachable);
		controller.start();
		let stale = controller
			.session()
			.pending_retry
			.as_ref()
			.map(|pending| pending.handle.token())
			.unwrap();

		controller.stop();
		controller.process(Input::RetryFired { token: stale });

		assert_eq!(controller.session().status(), Status::Terminated);
		assert_eq!(controller.outcome(), Some(&Outcome::Stopped));
	}

	#[tokio::test(start_paused = true)]
	async fn events_from_superseded_connection_are_dropped() {
		let mut controller = SessionController::new(config(), Silent::default());
		controller.start();
		let current = controller.attempt.as_ref().map(|attempt| attempt.id).unwrap();

		controller.process(Input::Client {
			connection: current.wrapping_sub(1),
			event: ClientEvent::Login,
		});
		assert_eq!(controller.session().status(), Status::Connecting);

		controller.process(Input::Client {
			connection: current,
			event: ClientEvent::Login,
		});
		assert_eq!(controller.session().status(), Status::Connected);
		assert!(controller.session().has_keep_alive());
	}

	#[tokio::test(start_paused = true)]
	async fn stop_from_disconnected_terminates_and_start_restarts() {
		let mut controller = SessionController::new(config(), Silent::default());
		controller.stop();
		controller.stop();

		assert_eq!(controller.session().status(), Status::Terminated);
		assert_eq!(controller.outcome(), Some(&Outcome::Stopped));

		controller.start();
		assert_eq!(controller.session().status(), Status::Connecting);
		assert_eq!(controller.outcome(), None);
		assert!(controller.attempt.is_some());
	}

	#[tokio::test(start_paused = true)]
	async fn start_after_exhaustion_resets_retry_budget() {
		let config = Arc::new(Config {
			reconnect: ReconnectConfig {
				max_retries: RetryLimit::Limited(1),
				..Default::default()
			},
			..(*config()).clone()
		});
		let mut controller = SessionController::new(config, Unreachable);
		controller.start();
		let pending = controller.session().pending_retry.as_ref().map(|p| p.handle.token()).unwrap();
		controller.process(Input::RetryFired { token: pending });

		assert_eq!(controller.outcome(), Some(&Outcome::Exhausted { attempts: 1 }));
		assert_eq!(controller.session().reconnect_attempts(), 1);

		controller.start();
		assert_eq!(controller.outcome(), None);
		assert_eq!(controller.session().status(), Status::Disconnected);
		assert_eq!(controller.session().reconnect_attempts(), 1, "budget restarts from zero");
		assert_eq!(controller.session().pending(), Some(PendingKind::Reconnect));
	}

	/// Opens connections facing north that count `look` calls.
	#[derive(Default)]
	struct Facing {
		looks: Arc<AtomicUsize>,
		senders: std::sync::Mutex<Vec<mpsc::UnboundedSender<ClientEvent>>>,
	}

	struct FacingConnection {
		looks: Arc<AtomicUsize>,
	}

	impl ClientConnection for FacingConnection {
		fn username(&self) -> &str {
			"Idler"
		}
		fn orientation(&self) -> Option<Orientation> {
			Some(Orientation { yaw: 0.0, pitch: 0.0 })
		}
		fn look(&self, _yaw: f32, _pitch: f32) -> Result<()> {
			self.looks.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}
		fn respawn(&self) -> Result<()> {
			Ok(())
		}
		fn quit(&self) -> Result<()> {
			Ok(())
		}
	}

	impl GameClient for Facing {
		fn create_connection(&self, _options: &ConnectOptions) -> Result<ConnectionParts> {
			let (tx, rx) = mpsc::unbounded_channel();
			self.senders.lock().unwrap().push(tx);
			let connection = FacingConnection {
				looks: Arc::clone(&self.looks),
			};
			Ok(ConnectionParts::new(Box::new(connection), rx))
		}
	}

	fn keep_alive_token(controller: &SessionController<Facing>) -> TimerToken {
		controller.session().keep_alive_timer.as_ref().map(|timer| timer.token()).unwrap()
	}

	fn login(controller: &mut SessionController<Facing>) {
		let connection = controller.attempt.as_ref().map(|attempt| attempt.id).unwrap();
		controller.process(Input::Client {
			connection,
			event: ClientEvent::Login,
		});
	}

	#[tokio::test(start_paused = true)]
	async fn keep_alive_tick_from_previous_login_is_ignored() {
		let client = Facing::default();
		let looks = Arc::clone(&client.looks);
		let mut controller = SessionController::new(config(), client);
		controller.start();
		login(&mut controller);
		let stale = keep_alive_token(&controller);

		let connection = controller.attempt.as_ref().map(|attempt| attempt.id).unwrap();
		controller.process(Input::Client {
			connection,
			event: ClientEvent::End { reason: None },
		});
		assert!(!controller.session().has_keep_alive());
		let retry = controller.session().pending_retry.as_ref().map(|p| p.handle.token()).unwrap();
		controller.process(Input::RetryFired { token: retry });
		login(&mut controller);
		let current = keep_alive_token(&controller);
		assert_ne!(stale, current);

		controller.process(Input::KeepAliveTick { token: stale });
		assert_eq!(looks.load(Ordering::SeqCst), 0);

		controller.process(Input::KeepAliveTick { token: current });
		assert_eq!(looks.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn outcome_failure_flag() {
		assert!(!Outcome::Stopped.is_failure());
		assert!(Outcome::Exhausted { attempts: 3 }.is_failure());
		assert!(
			Outcome::ReconnectDisabled {
				reason: "socketClosed".to_string()
			}
			.is_failure()
		);
	}
}
