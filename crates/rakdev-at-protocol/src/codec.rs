//! Line-based codec for the AT serial link.
//!
//! Requests are terminated with `\n`. The module terminates its lines with
//! `\r\n`; both characters are treated as line ends and empty lines are
//! dropped.

use bytes::BytesMut;
use tracing::warn;

/// Longest line accepted before the buffer is discarded.
///
/// Large enough for a maximum-size `AT+SEND` echo or `+EVT:RX` payload.
pub const MAX_LINE_LENGTH: usize = 5120;

/// Request terminator.
pub const LINE_TERMINATOR: u8 = b'\n';

/// A codec for reading and writing AT lines.
#[derive(Debug, Default)]
pub struct LineCodec {
    buffer: BytesMut,
}

impl LineCodec {
    /// Create a new line codec.
    pub fn new() -> Self {
        LineCodec {
            buffer: BytesMut::with_capacity(1024),
        }
    }

    /// Add received bytes to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
        if self.buffer.len() > MAX_LINE_LENGTH && !self.has_line() {
            warn!(
                "LineCodec: discarding {} bytes without a line terminator",
                self.buffer.len()
            );
            self.buffer.clear();
        }
    }

    /// Try to decode a complete line from the buffer.
    ///
    /// The returned line has its terminators stripped and surrounding
    /// whitespace trimmed. Empty lines are skipped.
    pub fn decode_line(&mut self) -> Option<String> {
        loop {
            let end = self
                .buffer
                .iter()
                .position(|&byte| byte == b'\r' || byte == b'\n')?;

            let line_data = self.buffer.split_to(end);
            while matches!(self.buffer.first(), Some(b'\r') | Some(b'\n')) {
                let _ = self.buffer.split_to(1);
            }

            let line = String::from_utf8_lossy(&line_data).trim().to_string();
            if !line.is_empty() {
                return Some(line);
            }
        }
    }

    /// Encode a request line for transmission.
    pub fn encode_line(line: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(LINE_TERMINATOR);
        buf
    }

    /// Whether a complete line is buffered.
    pub fn has_line(&self) -> bool {
        self.buffer.iter().any(|&byte| byte == b'\r' || byte == b'\n')
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_line() {
        assert_eq!(LineCodec::encode_line("AT+BAND=?"), b"AT+BAND=?\n");
        assert_eq!(LineCodec::encode_line(""), b"\n");
    }

    #[test]
    fn test_decode_lines() {
        let mut codec = LineCodec::new();
        codec.push(b"AT+BAND=4\r\nOK\r\n");

        assert_eq!(codec.decode_line(), Some("AT+BAND=4".to_string()));
        assert_eq!(codec.decode_line(), Some("OK".to_string()));
        assert!(codec.decode_line().is_none());
        assert_eq!(codec.buffered_len(), 0);
    }

    #[test]
    fn test_partial_line() {
        let mut codec = LineCodec::new();
        codec.push(b"+EVT:JOI");
        assert!(codec.decode_line().is_none());
        assert!(!codec.has_line());

        codec.push(b"NED\r\n");
        assert_eq!(codec.decode_line(), Some("+EVT:JOINED".to_string()));
    }

    #[test]
    fn test_skips_blank_lines_and_trims() {
        let mut codec = LineCodec::new();
        codec.push(b"\r\n\r\n  Current Work Mode: LoRaWAN.  \r\n");
        assert_eq!(
            codec.decode_line(),
            Some("Current Work Mode: LoRaWAN.".to_string())
        );
        assert!(codec.decode_line().is_none());
    }

    #[test]
    fn test_overlong_input_discarded() {
        let mut codec = LineCodec::new();
        codec.push(&vec![b'A'; MAX_LINE_LENGTH + 1]);
        assert_eq!(codec.buffered_len(), 0);

        codec.push(b"OK\n");
        assert_eq!(codec.decode_line(), Some("OK".to_string()));
    }
}
