// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! MCP transport abstraction (stdio and in-process buffers).
//!
//! Stdio framing is newline-delimited JSON: one message per line in each direction.
//! Messages are handled concurrently, so responses may arrive out of request order.

use crate::mcp::handlers::McpHandler;
use crate::mcp::protocol::JsonRpcResponse;
use std::io;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, Lines};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Channel closed")]
    ChannelClosed,
}

/// Transport abstraction for MCP JSON-RPC messages.
#[async_trait::async_trait]
pub trait McpTransport: Send {
    /// Receive the next raw message, `None` once the peer has gone away.
    ///
    /// Must be cancel safe: `serve` polls it alongside outgoing responses.
    async fn recv(&mut self) -> Result<Option<String>, TransportError>;
    /// Send a JSON-RPC response.
    async fn send(&mut self, response: &JsonRpcResponse) -> Result<(), TransportError>;
}

/// Stdio transport with newline-delimited framing.
pub struct StdioTransport {
    reader: Lines<BufReader<tokio::io::Stdin>>,
    writer: BufWriter<tokio::io::Stdout>,
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl StdioTransport {
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()).lines(),
            writer: BufWriter::new(tokio::io::stdout()),
        }
    }
}

#[async_trait::async_trait]
impl McpTransport for StdioTransport {
    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        Ok(self.reader.next_line().await?)
    }

    async fn send(&mut self, response: &JsonRpcResponse) -> Result<(), TransportError> {
        let mut payload = serde_json::to_vec(response)?;
        payload.push(b'\n');
        self.writer.write_all(&payload).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// Buffer-backed transport for tests and in-process use.
pub struct BufferTransport {
    input: mpsc::Receiver<String>,
    output: mpsc::Sender<JsonRpcResponse>,
}

impl BufferTransport {
    pub fn new(input: mpsc::Receiver<String>, output: mpsc::Sender<JsonRpcResponse>) -> Self {
        Self { input, output }
    }
}

#[async_trait::async_trait]
impl McpTransport for BufferTransport {
    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        Ok(self.input.recv().await)
    }

    async fn send(&mut self, response: &JsonRpcResponse) -> Result<(), TransportError> {
        self.output
            .send(response.clone())
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }
}

/// Serve requests from `transport` until it closes.
///
/// Each message runs on its own task; responses are written as they complete. On EOF the
/// in-flight requests are drained before returning.
pub async fn serve<T: McpTransport>(
    transport: &mut T,
    handler: &McpHandler,
) -> Result<(), TransportError> {
    let (response_tx, mut response_rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
    let mut in_flight = JoinSet::new();
    let mut open = true;

    loop {
        if !open && in_flight.is_empty() {
            while let Ok(response) = response_rx.try_recv() {
                transport.send(&response).await?;
            }
            break;
        }

        tokio::select! {
            message = transport.recv(), if open => {
                let Some(message) = message? else {
                    debug!(pending = in_flight.len(), "MCP input closed");
                    open = false;
                    continue;
                };
                let message = message.trim().to_string();
                if message.is_empty() {
                    continue;
                }

                let handler = handler.clone();
                let response_tx = response_tx.clone();
                in_flight.spawn(async move {
                    match handler.handle_text(&message).await {
                        Some(response) => {
                            let _ = response_tx.send(response);
                        }
                        None => debug!("Notification handled, no response"),
                    }
                });
            }
            Some(response) = response_rx.recv() => transport.send(&response).await?,
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    warn!(error = %e, "MCP request task failed");
                }
            }
        }
    }

    info!("MCP transport closed");
    Ok(())
}
