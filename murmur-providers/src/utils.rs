//! Utilities for LLM providers

use bytes::{BufMut, BytesMut};

use crate::{Error, Result};

/// A buffer that frames a byte stream into text lines.
///
/// Resilient to UTF-8 characters being split across network chunks: bytes
/// accumulate until a `\n` arrives, and splitting only at ASCII `\n` can
/// never cut a multi-byte sequence in half. Trailing `\r` is stripped.
#[derive(Debug)]
pub struct LineBuffer {
    buffer: BytesMut,
    max_capacity: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self {
            buffer: BytesMut::new(),
            max_capacity: 10 * 1024 * 1024, // Default 10MB
        }
    }
}

impl LineBuffer {
    /// Create a new empty line buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom capacity limit
    pub fn with_capacity_limit(max_capacity: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            max_capacity,
        }
    }

    /// Add bytes to the buffer
    pub fn push(&mut self, bytes: &[u8]) -> Result<()> {
        if self.buffer.len() + bytes.len() > self.max_capacity {
            return Err(Error::StreamInterrupted(format!(
                "line buffer exceeded max capacity of {} bytes",
                self.max_capacity
            )));
        }
        self.buffer.put_slice(bytes);
        Ok(())
    }

    /// Extract the next complete line, if one is buffered
    ///
    /// The terminating `\n` (and a preceding `\r`, if any) is consumed and
    /// not included in the returned line.
    pub fn next_line(&mut self) -> Result<Option<String>> {
        let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') else {
            return Ok(None);
        };

        let mut chunk = self.buffer.split_to(pos + 1);
        chunk.truncate(pos);
        if chunk.last() == Some(&b'\r') {
            chunk.truncate(chunk.len() - 1);
        }

        String::from_utf8(chunk.to_vec())
            .map(Some)
            .map_err(|e| Error::StreamInterrupted(format!("invalid UTF-8 in stream line: {}", e)))
    }

    /// Drain whatever is left after the source ends
    ///
    /// A stream may end without a final newline; the residue is still one
    /// logical line.
    pub fn take_remaining(&mut self) -> Result<Option<String>> {
        if self.buffer.is_empty() {
            return Ok(None);
        }
        let chunk = self.buffer.split_to(self.buffer.len());
        String::from_utf8(chunk.to_vec())
            .map(Some)
            .map_err(|e| Error::StreamInterrupted(format!("invalid UTF-8 in stream line: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_framing_with_crlf() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"data: one\r\ndata: two\npartial").unwrap();

        assert_eq!(buffer.next_line().unwrap().as_deref(), Some("data: one"));
        assert_eq!(buffer.next_line().unwrap().as_deref(), Some("data: two"));
        assert_eq!(buffer.next_line().unwrap(), None);
        assert_eq!(buffer.take_remaining().unwrap().as_deref(), Some("partial"));
        assert_eq!(buffer.take_remaining().unwrap(), None);
    }

    #[test]
    fn test_split_utf8_across_chunks() {
        let mut buffer = LineBuffer::new();

        // "心" in UTF-8 is [0xE5, 0xBF, 0x83]
        buffer.push(&[0xE5, 0xBF]).unwrap();
        assert_eq!(buffer.next_line().unwrap(), None);

        buffer.push(&[0x83, b'\n']).unwrap();
        assert_eq!(buffer.next_line().unwrap().as_deref(), Some("心"));
    }

    #[test]
    fn test_capacity_overflow() {
        let mut buffer = LineBuffer::with_capacity_limit(10);
        let res = buffer.push(&[0u8; 11]);
        assert!(res.is_err());
    }

    #[test]
    fn test_empty_lines_preserved() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"\n\ndata: x\n").unwrap();

        assert_eq!(buffer.next_line().unwrap().as_deref(), Some(""));
        assert_eq!(buffer.next_line().unwrap().as_deref(), Some(""));
        assert_eq!(buffer.next_line().unwrap().as_deref(), Some("data: x"));
    }
}
