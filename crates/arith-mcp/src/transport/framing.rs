//! Message framing for newline-delimited JSON.

use serde_json::Value;

use crate::types::{McpError, McpResult};

/// Upper bound on a message accumulated across several lines.
pub const MAX_BUFFERED_BYTES: usize = 1024 * 1024;

/// One unit of input ready for the dispatcher.
#[derive(Debug)]
pub enum Frame {
    /// A complete JSON value.
    Message(Value),
    /// Input that can never become valid JSON.
    Invalid(McpError),
}

enum Parsed {
    Complete(Value),
    Incomplete,
    Invalid(McpError),
}

fn classify(text: &str) -> Parsed {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Parsed::Complete(value),
        Err(e) if e.is_eof() => Parsed::Incomplete,
        Err(e) => Parsed::Invalid(McpError::ParseError(e.to_string())),
    }
}

/// A line that is a complete request envelope on its own.
fn standalone_envelope(line: &str) -> Option<Value> {
    match classify(line) {
        Parsed::Complete(value) if value.get("jsonrpc").is_some() => Some(value),
        _ => None,
    }
}

/// Buffers stdin lines until they form a complete JSON value.
///
/// Most clients send one message per line. A message spread over several
/// lines is accumulated; if an unfinished message is followed by a line that
/// is a full request on its own, the unfinished part is reported as invalid
/// and the new request is processed, so one truncated message cannot swallow
/// the rest of the stream.
#[derive(Debug, Default)]
pub struct LineAccumulator {
    buffer: String,
}

impl LineAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Feed one line of input. Yields zero, one, or two frames.
    ///
    /// A message longer than [`MAX_BUFFERED_BYTES`], on one line or spread
    /// over several, is rejected and the buffer is cleared.
    pub fn push_line(&mut self, line: &str) -> Vec<Frame> {
        let line = line.trim_end_matches(['\r', '\n']);

        if self.buffer.is_empty() {
            if line.trim().is_empty() {
                return Vec::new();
            }
            if line.len() > MAX_BUFFERED_BYTES {
                return vec![Frame::Invalid(Self::oversized())];
            }
            return match classify(line) {
                Parsed::Complete(value) => vec![Frame::Message(value)],
                Parsed::Invalid(e) => vec![Frame::Invalid(e)],
                Parsed::Incomplete => {
                    self.buffer.push_str(line);
                    Vec::new()
                }
            };
        }

        let mut candidate = std::mem::take(&mut self.buffer);
        candidate.push('\n');
        candidate.push_str(line);

        if candidate.len() > MAX_BUFFERED_BYTES {
            return match standalone_envelope(line) {
                Some(value) => vec![Frame::Invalid(Self::oversized()), Frame::Message(value)],
                None => vec![Frame::Invalid(Self::oversized())],
            };
        }

        match classify(&candidate) {
            Parsed::Complete(value) => vec![Frame::Message(value)],
            Parsed::Invalid(e) => match standalone_envelope(line) {
                Some(value) => vec![Frame::Invalid(e), Frame::Message(value)],
                None => vec![Frame::Invalid(e)],
            },
            Parsed::Incomplete => {
                if let Some(value) = standalone_envelope(line) {
                    return vec![Frame::Invalid(Self::truncated()), Frame::Message(value)];
                }
                self.buffer = candidate;
                Vec::new()
            }
        }
    }

    /// Drop anything buffered so far.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Flush at end of input: an unfinished message is reported as invalid.
    pub fn finish(&mut self) -> Option<Frame> {
        if self.buffer.is_empty() {
            return None;
        }
        self.buffer.clear();
        Some(Frame::Invalid(Self::truncated()))
    }

    fn truncated() -> McpError {
        McpError::ParseError("Incomplete JSON message".to_string())
    }

    fn oversized() -> McpError {
        McpError::ParseError(format!("Message exceeds {MAX_BUFFERED_BYTES} bytes"))
    }
}

/// Serialize a value to a JSON line (with trailing newline).
pub fn frame_message(value: &impl serde::Serialize) -> McpResult<String> {
    let mut json = serde_json::to_string(value).map_err(McpError::Json)?;
    json.push('\n');
    Ok(json)
}
