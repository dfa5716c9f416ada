//! Driver process management
//!
//! A driver is an external program that implements the game protocol and
//! speaks [`DriverRequest`] / [`DriverEvent`] frames on stdio. One driver
//! process is spawned per connection attempt, so a crashed or wedged driver
//! never outlives the connection it served.
//!
//! The driver command is resolved in this order:
//! 1. `AFK_DRIVER` environment variable (a whole command line)
//! 2. `driver` section of the config file
//! 3. `node driver.js`

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use afk_protocol::{ConnectOptions, DriverConfig, DriverEvent, DriverRequest};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::client::{ClientConnection, ConnectionParts, EventStream, GameClient, Orientation};
use crate::error::{Error, Result};
use crate::events::{ClientError, ClientEvent};
use crate::transport::{PipeTransport, PipeTransportReceiver, PipeTransportSender};

/// Environment variable overriding the driver command line.
pub const DRIVER_ENV: &str = "AFK_DRIVER";

/// How long a driver gets to exit after its request channel closes.
const EXIT_GRACE: Duration = Duration::from_secs(2);

/// Resolves the driver command from the environment, then config, then the default.
pub fn resolve_driver(configured: Option<&DriverConfig>) -> DriverConfig {
	select_driver(std::env::var(DRIVER_ENV).ok(), configured)
}

fn select_driver(env_line: Option<String>, configured: Option<&DriverConfig>) -> DriverConfig {
	if let Some(line) = env_line {
		match DriverConfig::from_command_line(&line) {
			Some(driver) => {
				debug!(target = "afk.driver", command = %driver.command, "using driver from {DRIVER_ENV}");
				return driver;
			}
			None => warn!(target = "afk.driver", "{DRIVER_ENV} is set but empty; ignoring"),
		}
	}
	configured.cloned().unwrap_or_default()
}

/// [`GameClient`] backed by a driver process.
///
/// Clones share the set of exiting drivers, so a clone kept aside can
/// [`wait_for_exit`](Self::wait_for_exit) after the session is done.
#[derive(Debug, Clone)]
pub struct DriverClient {
	driver: DriverConfig,
	exits: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl DriverClient {
	pub fn new(driver: DriverConfig) -> Self {
		Self {
			driver,
			exits: Arc::default(),
		}
	}

	pub fn driver(&self) -> &DriverConfig {
		&self.driver
	}

	/// Waits until every driver whose connection was dropped has exited or
	/// been killed. Each driver is bounded by the exit grace period.
	pub async fn wait_for_exit(&self) {
		let exits: Vec<_> = self.exits.lock().drain(..).collect();
		for exit in exits {
			let _ = exit.await;
		}
	}
}

impl GameClient for DriverClient {
	fn create_connection(&self, options: &ConnectOptions) -> Result<ConnectionParts> {
		let mut child = Command::new(&self.driver.command)
			.args(&self.driver.args)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true)
			.spawn()
			.map_err(|e| Error::LaunchFailed(format!("{}: {e}", self.driver.command)))?;

		let stdin = child
			.stdin
			.take()
			.ok_or_else(|| Error::LaunchFailed("driver stdin unavailable".to_string()))?;
		let stdout = child
			.stdout
			.take()
			.ok_or_else(|| Error::LaunchFailed("driver stdout unavailable".to_string()))?;
		let stderr = child.stderr.take();

		debug!(
			target = "afk.driver",
			command = %self.driver.command,
			pid = child.id(),
			"driver spawned"
		);

		let (mut connection, events, exit) = DriverConnection::with_pipes(stdin, stdout, options, Some(child));
		{
			let mut exits = self.exits.lock();
			exits.retain(|exit| !exit.is_finished());
			exits.push(exit);
		}
		if let Some(stderr) = stderr {
			connection.tasks.push(tokio::spawn(forward_stderr(stderr)));
		}

		Ok(ConnectionParts::new(Box::new(connection), events))
	}
}

/// One live driver connection.
///
/// Dropping it closes the request channel: queued requests (such as `quit`)
/// are still written, then the driver gets [`EXIT_GRACE`] to exit before it
/// is killed.
pub struct DriverConnection {
	username: String,
	requests: mpsc::UnboundedSender<DriverRequest>,
	orientation: Arc<Mutex<Option<Orientation>>>,
	tasks: Vec<JoinHandle<()>>,
}

impl DriverConnection {
	/// Wires a connection over arbitrary pipes. The `connect` request is queued immediately.
	pub fn from_pipes<W, R>(writer: W, reader: R, options: &ConnectOptions) -> (Self, EventStream)
	where
		W: AsyncWrite + Unpin + Send + 'static,
		R: AsyncRead + Unpin + Send + 'static,
	{
		let (connection, events, _writer) = Self::with_pipes(writer, reader, options, None);
		(connection, events)
	}

	/// Also returns the writer task, which finishes once the driver has exited.
	fn with_pipes<W, R>(
		writer: W,
		reader: R,
		options: &ConnectOptions,
		child: Option<Child>,
	) -> (Self, EventStream, JoinHandle<()>)
	where
		W: AsyncWrite + Unpin + Send + 'static,
		R: AsyncRead + Unpin + Send + 'static,
	{
		let (transport, frames) = PipeTransport::new(writer, reader);
		let (sender, receiver) = transport.into_parts();
		let (request_tx, request_rx) = mpsc::unbounded_channel();
		let (event_tx, event_rx) = mpsc::unbounded_channel();
		let orientation = Arc::new(Mutex::new(None));

		let _ = request_tx.send(DriverRequest::Connect(options.clone()));

		// Not aborted on drop: it must outlive the handle to flush `quit`.
		let writer_task = tokio::spawn(write_requests(sender, request_rx, child));

		let tasks = vec![
			tokio::spawn(read_frames(receiver)),
			tokio::spawn(translate_frames(frames, event_tx, Arc::clone(&orientation))),
		];

		let connection = Self {
			username: options.username.clone(),
			requests: request_tx,
			orientation,
			tasks,
		};
		(connection, event_rx, writer_task)
	}

	fn request(&self, action: &'static str, request: DriverRequest) -> Result<()> {
		self.requests.send(request).map_err(|_| Error::ActionFailed {
			action,
			message: "driver connection closed".to_string(),
		})
	}
}

impl ClientConnection for DriverConnection {
	fn username(&self) -> &str {
		&self.username
	}

	fn orientation(&self) -> Option<Orientation> {
		*self.orientation.lock()
	}

	fn look(&self, yaw: f32, pitch: f32) -> Result<()> {
		self.request("look", DriverRequest::Look { yaw, pitch })?;
		let mut orientation = self.orientation.lock();
		if orientation.is_some() {
			*orientation = Some(Orientation { yaw, pitch });
		}
		Ok(())
	}

	fn respawn(&self) -> Result<()> {
		self.request("respawn", DriverRequest::Respawn)
	}

	fn quit(&self) -> Result<()> {
		self.request("quit", DriverRequest::Quit)
	}
}

impl Drop for DriverConnection {
	fn drop(&mut self) {
		for task in self.tasks.drain(..) {
			task.abort();
		}
	}
}

async fn write_requests<W>(
	mut sender: PipeTransportSender<W>,
	mut requests: mpsc::UnboundedReceiver<DriverRequest>,
	child: Option<Child>,
) where
	W: AsyncWrite + Unpin + Send,
{
	while let Some(request) = requests.recv().await {
		let frame = match serde_json::to_value(&request) {
			Ok(frame) => frame,
			Err(e) => {
				warn!(target = "afk.driver", error = %e, "failed to encode driver request");
				continue;
			}
		};
		if let Err(e) = sender.send(&frame).await {
			warn!(target = "afk.driver", error = %e, "driver stopped accepting requests");
			break;
		}
	}
	drop(sender);

	if let Some(mut child) = child {
		match tokio::time::timeout(EXIT_GRACE, child.wait()).await {
			Ok(Ok(status)) => debug!(target = "afk.driver", %status, "driver exited"),
			Ok(Err(e)) => warn!(target = "afk.driver", error = %e, "failed to reap driver"),
			Err(_) => {
				warn!(target = "afk.driver", "driver did not exit in time; killing");
				let _ = child.kill().await;
			}
		}
	}
}

async fn read_frames<R>(receiver: PipeTransportReceiver<R>)
where
	R: AsyncRead + Unpin + Send,
{
	match receiver.run().await {
		Ok(()) => {}
		Err(e) if e.is_closed() => debug!(target = "afk.driver", error = %e, "driver output closed"),
		Err(e) => warn!(target = "afk.driver", error = %e, "driver transport failed"),
	}
}

async fn translate_frames(
	mut frames: mpsc::UnboundedReceiver<Value>,
	events: mpsc::UnboundedSender<ClientEvent>,
	orientation: Arc<Mutex<Option<Orientation>>>,
) {
	while let Some(frame) = frames.recv().await {
		let event: DriverEvent = match serde_json::from_value(frame) {
			Ok(event) => event,
			Err(e) => {
				warn!(target = "afk.driver", error = %e, "ignoring malformed driver frame");
				continue;
			}
		};

		if let Some(update) = orientation_of(&event) {
			*orientation.lock() = Some(update);
		}
		if event.event == "end" {
			*orientation.lock() = None;
		}

		if let Some(client_event) = translate(event) {
			if events.send(client_event).is_err() {
				break;
			}
		}
	}
}

async fn forward_stderr(stderr: ChildStderr) {
	let mut lines = BufReader::new(stderr).lines();
	while let Ok(Some(line)) = lines.next_line().await {
		debug!(target = "afk.driver", "{line}");
	}
}

fn orientation_of(event: &DriverEvent) -> Option<Orientation> {
	Some(Orientation {
		yaw: event.f32_param("yaw")?,
		pitch: event.f32_param("pitch")?,
	})
}

/// Maps a driver frame to a client event. `move` frames only carry orientation.
fn translate(event: DriverEvent) -> Option<ClientEvent> {
	let client_event = match event.event.as_str() {
		"login" => ClientEvent::Login,
		"spawn" => ClientEvent::Spawn,
		"death" => ClientEvent::Death,
		"move" => return None,
		"chat" => ClientEvent::Chat {
			username: event.str_param("username").unwrap_or_default().to_string(),
			message: event.str_param("message").unwrap_or_default().to_string(),
		},
		"end" => ClientEvent::End {
			reason: event.str_param("reason").map(str::to_string),
		},
		"error" => ClientEvent::Error(ClientError {
			message: event.str_param("message").unwrap_or("unknown error").to_string(),
			code: event.str_param("code").map(str::to_string),
		}),
		"kicked" => ClientEvent::Kicked {
			reason: match event.params.get("reason") {
				Some(Value::String(reason)) => reason.clone(),
				Some(other) => other.to_string(),
				None => String::new(),
			},
		},
		_ => ClientEvent::Unknown { name: event.event },
	};
	Some(client_event)
}

#[cfg(test)]
mod tests {
	use afk_protocol::AuthMode;
	use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

	use super::*;

	fn options() -> ConnectOptions {
		ConnectOptions {
			host: "localhost".to_string(),
			port: 25565,
			username: "Idler".to_string(),
			auth: AuthMode::Offline,
			version: Some("1.20.1".to_string()),
			hide_errors: false,
			forge: None,
		}
	}

	async fn read_frame(pipe: &mut DuplexStream) -> Value {
		let mut len_buf = [0u8; 4];
		pipe.read_exact(&mut len_buf).await.unwrap();
		let mut body = vec![0u8; u32::from_le_bytes(len_buf) as usize];
		pipe.read_exact(&mut body).await.unwrap();
		serde_json::from_slice(&body).unwrap()
	}

	async fn write_frame(pipe: &mut DuplexStream, frame: Value) {
		let bytes = serde_json::to_vec(&frame).unwrap();
		pipe.write_all(&(bytes.len() as u32).to_le_bytes()).await.unwrap();
		pipe.write_all(&bytes).await.unwrap();
	}

	fn connect() -> (DriverConnection, EventStream, DuplexStream, DuplexStream) {
		let (driver_stdin, stdin_write) = tokio::io::duplex(4096);
		let (stdout_read, driver_stdout) = tokio::io::duplex(4096);
		let (connection, events) = DriverConnection::from_pipes(stdin_write, stdout_read, &options());
		(connection, events, driver_stdin, driver_stdout)
	}

	#[tokio::test]
	async fn connect_is_the_first_request() {
		let (_connection, _events, mut driver_stdin, _driver_stdout) = connect();

		let frame = read_frame(&mut driver_stdin).await;
		assert_eq!(frame["method"], "connect");
		assert_eq!(frame["params"]["username"], "Idler");
		assert_eq!(frame["params"]["version"], "1.20.1");
	}

	#[tokio::test]
	async fn events_are_translated_in_order() {
		let (connection, mut events, _driver_stdin, mut driver_stdout) = connect();

		write_frame(&mut driver_stdout, serde_json::json!({ "event": "login" })).await;
		write_frame(
			&mut driver_stdout,
			serde_json::json!({ "event": "move", "params": { "yaw": 1.0, "pitch": 0.5 } }),
		)
		.await;
		write_frame(&mut driver_stdout, serde_json::json!({ "event": "spawn" })).await;
		write_frame(&mut driver_stdout, serde_json::json!({ "event": "weather" })).await;
		write_frame(
			&mut driver_stdout,
			serde_json::json!({ "event": "end", "params": { "reason": "socketClosed" } }),
		)
		.await;

		assert_eq!(events.recv().await.unwrap(), ClientEvent::Login);
		assert_eq!(events.recv().await.unwrap(), ClientEvent::Spawn);
		assert_eq!(
			events.recv().await.unwrap(),
			ClientEvent::Unknown {
				name: "weather".to_string()
			}
		);
		assert_eq!(
			events.recv().await.unwrap(),
			ClientEvent::End {
				reason: Some("socketClosed".to_string())
			}
		);
		assert_eq!(connection.orientation(), None, "end clears the orientation");
	}

	#[tokio::test]
	async fn look_sends_request_and_tracks_orientation() {
		let (connection, mut events, mut driver_stdin, mut driver_stdout) = connect();
		let _ = read_frame(&mut driver_stdin).await;

		write_frame(
			&mut driver_stdout,
			serde_json::json!({ "event": "spawn", "params": { "yaw": 0.25, "pitch": 0.0 } }),
		)
		.await;
		assert_eq!(events.recv().await.unwrap(), ClientEvent::Spawn);
		assert_eq!(connection.orientation(), Some(Orientation { yaw: 0.25, pitch: 0.0 }));

		connection.look(0.26, 0.0).unwrap();
		let frame = read_frame(&mut driver_stdin).await;
		assert_eq!(frame["method"], "look");
		assert_eq!(connection.orientation(), Some(Orientation { yaw: 0.26, pitch: 0.0 }));
	}

	#[tokio::test]
	async fn quit_is_flushed_after_drop() {
		let (connection, _events, mut driver_stdin, _driver_stdout) = connect();
		let _ = read_frame(&mut driver_stdin).await;

		connection.quit().unwrap();
		drop(connection);

		let frame = read_frame(&mut driver_stdin).await;
		assert_eq!(frame, serde_json::json!({ "method": "quit" }));
	}

	#[tokio::test]
	async fn stream_closes_when_driver_output_closes() {
		let (_connection, mut events, _driver_stdin, driver_stdout) = connect();
		drop(driver_stdout);
		assert!(events.recv().await.is_none());
	}

	#[tokio::test]
	async fn missing_driver_is_a_launch_failure() {
		let client = DriverClient::new(DriverConfig {
			command: "/nonexistent/afk-driver".to_string(),
			args: Vec::new(),
		});
		let err = client.create_connection(&options()).err().expect("spawn must fail");
		assert!(matches!(err, Error::LaunchFailed(_)), "got {err:?}");
		client.wait_for_exit().await;
	}

	#[test]
	fn kicked_reason_accepts_chat_components() {
		let event = DriverEvent::with_params("kicked", serde_json::json!({ "reason": { "text": "banned" } }));
		assert_eq!(
			translate(event),
			Some(ClientEvent::Kicked {
				reason: r#"{"text":"banned"}"#.to_string()
			})
		);
	}

	#[test]
	fn error_frames_keep_their_code() {
		let event = DriverEvent::with_params(
			"error",
			serde_json::json!({ "message": "connect ECONNREFUSED 127.0.0.1:25565", "code": "ECONNREFUSED" }),
		);
		let Some(ClientEvent::Error(err)) = translate(event) else {
			panic!("expected error event");
		};
		assert_eq!(err.code.as_deref(), Some("ECONNREFUSED"));
	}

	#[test]
	fn driver_selection_order() {
		let configured = DriverConfig {
			command: "python3".to_string(),
			args: vec!["driver.py".to_string()],
		};

		let from_env = select_driver(Some("bun run bridge.ts".to_string()), Some(&configured));
		assert_eq!(from_env.command, "bun");
		assert_eq!(from_env.args, vec!["run", "bridge.ts"]);

		assert_eq!(select_driver(Some(" ".to_string()), Some(&configured)), configured);
		assert_eq!(select_driver(None, Some(&configured)), configured);
		assert_eq!(select_driver(None, None), DriverConfig::default());
	}
}
