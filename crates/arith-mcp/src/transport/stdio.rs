//! Stdio transport — reads JSON-RPC from stdin, writes to stdout.

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::protocol::{Control, Dispatcher, SessionPolicy, SessionState};
use crate::types::{JsonRpcResponse, McpError, McpResult};

use super::framing::{self, Frame, LineAccumulator};
use super::TransportOptions;

/// Whether stdio is the only transport running in the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    /// A `shutdown` ends the loop so the process can exit.
    Exclusive,
    /// Other transports share the process; `shutdown` only resets the
    /// session.
    Shared,
}

/// Why the read loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioExit {
    Eof,
    ShutdownRequested,
}

/// Stdio transport for desktop clients. The handshake is mandatory.
pub struct StdioTransport {
    dispatcher: Dispatcher,
    policy: SessionPolicy,
    mode: StdioMode,
}

impl StdioTransport {
    pub fn new(dispatcher: Dispatcher, mode: StdioMode) -> Self {
        Self::with_options(dispatcher, mode, TransportOptions::default())
    }

    pub fn with_options(dispatcher: Dispatcher, mode: StdioMode, options: TransportOptions) -> Self {
        Self {
            dispatcher,
            policy: options.policy(SessionPolicy::strict()),
            mode,
        }
    }

    /// Run the transport loop on the process's stdin and stdout.
    pub async fn run(&self) -> McpResult<StdioExit> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.serve(reader, writer).await
    }

    /// Run the transport loop over arbitrary streams.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> McpResult<StdioExit>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut state = SessionState::new();
        let mut accumulator = LineAccumulator::new();
        let mut raw = Vec::new();

        tracing::info!("Stdio transport started ({:?})", self.mode);

        loop {
            raw.clear();
            let bytes_read = reader.read_until(b'\n', &mut raw).await.map_err(McpError::Io)?;

            if bytes_read == 0 {
                if let Some(Frame::Invalid(e)) = accumulator.finish() {
                    tracing::warn!("Parse error: {e}");
                    write_response(&mut writer, &e.to_response(None)).await?;
                }
                tracing::info!("EOF on stdin, shutting down");
                return Ok(StdioExit::Eof);
            }

            let line = match std::str::from_utf8(&raw) {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("Input is not valid UTF-8: {e}");
                    accumulator.reset();
                    let err = McpError::ParseError(format!("Input is not valid UTF-8: {e}"));
                    write_response(&mut writer, &err.to_response(None)).await?;
                    continue;
                }
            };
            for frame in accumulator.push_line(line) {
                let dispatch = match frame {
                    Frame::Message(value) => {
                        self.dispatcher.handle_value(&mut state, value, &self.policy)
                    }
                    Frame::Invalid(e) => {
                        tracing::warn!("Parse error: {e}");
                        write_response(&mut writer, &e.to_response(None)).await?;
                        continue;
                    }
                };

                write_response(&mut writer, &dispatch.response).await?;

                if dispatch.control == Control::Shutdown {
                    match self.mode {
                        StdioMode::Exclusive => {
                            tracing::info!("Shutdown requested over stdio");
                            return Ok(StdioExit::ShutdownRequested);
                        }
                        StdioMode::Shared => {
                            tracing::info!("Shutdown over stdio; other transports keep running");
                        }
                    }
                }
            }
        }
    }
}

/// Whether `reader` yields input within `wait`. End of input counts as no
/// input. Nothing is consumed, so the same reader can then be served.
pub async fn input_ready<R>(reader: &mut R, wait: Duration) -> bool
where
    R: AsyncBufRead + Unpin,
{
    matches!(
        tokio::time::timeout(wait, reader.fill_buf()).await,
        Ok(Ok(buf)) if !buf.is_empty()
    )
}

async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> McpResult<()>
where
    W: AsyncWrite + Unpin,
{
    let framed = framing::frame_message(response)?;
    writer
        .write_all(framed.as_bytes())
        .await
        .map_err(McpError::Io)?;
    writer.flush().await.map_err(McpError::Io)?;
    Ok(())
}
