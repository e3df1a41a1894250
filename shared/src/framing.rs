//! Buffer-and-split framing for the newline-delimited protocol

use crate::protocol::ProtocolError;

/// Byte that terminates every protocol line
pub const LINE_TERMINATOR: u8 = b'\n';

/// Longest line, terminator excluded, a buffer accepts unless told otherwise
pub const DEFAULT_MAX_LINE_LENGTH: usize = 4096;

/// Accumulates raw transport bytes and yields complete protocol lines
///
/// A single read may carry several lines, or stop in the middle of one.
/// Complete lines are returned in the order they arrived and the trailing
/// fragment is held back until a later read supplies its terminator.
///
/// A trailing `\r` is stripped from each line and empty lines are skipped.
/// Bytes are decoded lossily; anything that was not ASCII on the wire
/// therefore surfaces as a non-ASCII line and is rejected by the parser.
///
/// A line longer than the configured maximum, complete or not, is a framing
/// error. The stream cannot be resynchronised after one, so the buffer must
/// not be used again.
#[derive(Debug)]
pub struct LineBuffer {
    pending: Vec<u8>,
    max_line_length: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_max_line_length(DEFAULT_MAX_LINE_LENGTH)
    }
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_line_length,
        }
    }

    /// Appends a chunk of transport bytes and returns every line it completed
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>, ProtocolError> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;

        while let Some(offset) = self.pending[start..]
            .iter()
            .position(|&b| b == LINE_TERMINATOR)
        {
            let end = start + offset;
            if offset > self.max_line_length {
                return Err(self.too_long());
            }
            let mut line = &self.pending[start..end];
            if let Some(stripped) = line.strip_suffix(b"\r") {
                line = stripped;
            }
            if !line.is_empty() {
                lines.push(String::from_utf8_lossy(line).into_owned());
            }
            start = end + 1;
        }

        self.pending.drain(..start);
        if self.pending.len() > self.max_line_length {
            return Err(self.too_long());
        }
        Ok(lines)
    }

    /// Bytes received after the last terminator
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn too_long(&self) -> ProtocolError {
        ProtocolError::LineTooLong {
            limit: self.max_line_length,
        }
    }
}
