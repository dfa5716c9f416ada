//! Length-prefixed JSON transport over a pair of byte pipes.
//!
//! Frame layout: `[u32 little-endian length][JSON bytes]`. The writer side is
//! the driver's stdin, the reader side its stdout.

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Upper bound on a single frame; anything larger means the stream is out of sync.
pub const MAX_FRAME_LEN: usize = 32 * 1024 * 1024;

/// Bidirectional transport over a writer and a reader.
pub struct PipeTransport<W, R> {
	sender: PipeTransportSender<W>,
	receiver: PipeTransportReceiver<R>,
}

/// Writing half of a [`PipeTransport`].
pub struct PipeTransportSender<W> {
	writer: W,
}

/// Reading half of a [`PipeTransport`].
///
/// [`run`](Self::run) forwards every decoded frame to the channel returned by
/// [`PipeTransport::new`], in order.
pub struct PipeTransportReceiver<R> {
	reader: R,
	message_tx: mpsc::UnboundedSender<Value>,
}

impl<W, R> PipeTransport<W, R>
where
	W: AsyncWrite + Unpin + Send,
	R: AsyncRead + Unpin + Send,
{
	/// Creates a transport and the channel that receives decoded frames.
	pub fn new(writer: W, reader: R) -> (Self, mpsc::UnboundedReceiver<Value>) {
		let (message_tx, message_rx) = mpsc::unbounded_channel();
		let transport = Self {
			sender: PipeTransportSender { writer },
			receiver: PipeTransportReceiver { reader, message_tx },
		};
		(transport, message_rx)
	}

	/// Splits into independently owned halves.
	pub fn into_parts(self) -> (PipeTransportSender<W>, PipeTransportReceiver<R>) {
		(self.sender, self.receiver)
	}

	/// Reads frames until EOF or the frame channel closes.
	pub async fn run(&mut self) -> Result<()> {
		self.receiver.read_loop().await
	}
}

impl<W> PipeTransportSender<W>
where
	W: AsyncWrite + Unpin + Send,
{
	/// Serializes and writes one frame, then flushes.
	pub async fn send(&mut self, message: &Value) -> Result<()> {
		let bytes = serde_json::to_vec(message)?;
		if bytes.len() > MAX_FRAME_LEN {
			return Err(Error::ProtocolError(format!("outgoing frame of {} bytes exceeds limit", bytes.len())));
		}
		let len = bytes.len() as u32;
		trace!(target = "afk.transport", len, "send frame");

		self.writer
			.write_all(&len.to_le_bytes())
			.await
			.map_err(|e| Error::TransportError(format!("write length: {e}")))?;
		self.writer
			.write_all(&bytes)
			.await
			.map_err(|e| Error::TransportError(format!("write body: {e}")))?;
		self.writer
			.flush()
			.await
			.map_err(|e| Error::TransportError(format!("flush: {e}")))?;
		Ok(())
	}
}

impl<R> PipeTransportReceiver<R>
where
	R: AsyncRead + Unpin + Send,
{
	/// Reads frames until EOF or the frame channel closes.
	pub async fn run(mut self) -> Result<()> {
		self.read_loop().await
	}

	async fn read_loop(&mut self) -> Result<()> {
		loop {
			let mut len_buf = [0u8; 4];
			match self.reader.read_exact(&mut len_buf).await {
				Ok(_) => {}
				Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
					debug!(target = "afk.transport", "pipe closed");
					return Ok(());
				}
				Err(e) => return Err(Error::TransportError(format!("read length: {e}"))),
			}

			let len = u32::from_le_bytes(len_buf) as usize;
			if len > MAX_FRAME_LEN {
				return Err(Error::ProtocolError(format!("incoming frame of {len} bytes exceeds limit")));
			}

			let mut body = vec![0u8; len];
			self.reader
				.read_exact(&mut body)
				.await
				.map_err(|e| Error::TransportError(format!("read body: {e}")))?;

			let message: Value = serde_json::from_slice(&body)?;
			trace!(target = "afk.transport", len, "recv frame");

			if self.message_tx.send(message).is_err() {
				return Ok(());
			}
		}
	}
}
