//! Line-oriented access to the module's serial link.

use std::io::{self, Read, Write};
use std::time::Duration;

use rakdev_at_protocol::LineCodec;
use tracing::trace;

use crate::Clock;

/// Default time a blocking read waits for a line.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(2000);

/// How long a blocking read sleeps between polls of the stream.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// A bidirectional, newline-delimited text channel to the module.
pub trait LineTransport {
    /// Write one line; the terminator is added by the transport.
    fn send_line(&mut self, line: &str) -> io::Result<()>;

    /// Read one trimmed, non-empty line.
    ///
    /// A non-blocking read returns `Ok(None)` when no complete line is
    /// buffered; a blocking read returns `Ok(None)` on timeout.
    fn read_line(&mut self, blocking: bool) -> io::Result<Option<String>>;

    /// Whether any input is waiting.
    fn available(&mut self) -> bool;

    /// Send an empty line to wake the module from sleep.
    fn poke(&mut self) -> io::Result<()> {
        self.send_line("")
    }
}

/// [`LineTransport`] over any byte stream, e.g. a serial port handle.
///
/// The stream should be configured for short or non-blocking reads;
/// `WouldBlock` and `TimedOut` are treated as "no data yet".
#[derive(Debug)]
pub struct StreamTransport<S, C> {
    stream: S,
    clock: C,
    codec: LineCodec,
    read_timeout: Duration,
}

impl<S: Read + Write, C: Clock> StreamTransport<S, C> {
    pub fn new(stream: S, clock: C) -> Self {
        StreamTransport {
            stream,
            clock,
            codec: LineCodec::new(),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Set how long a blocking read waits.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Move whatever the stream has into the codec. Returns bytes read.
    fn fill(&mut self) -> io::Result<usize> {
        let mut buf = [0u8; 256];
        match self.stream.read(&mut buf) {
            Ok(n) => {
                self.codec.push(&buf[..n]);
                Ok(n)
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }
}

impl<S: Read + Write, C: Clock> LineTransport for StreamTransport<S, C> {
    fn send_line(&mut self, line: &str) -> io::Result<()> {
        trace!("-TX-> '{}'", line);
        self.stream.write_all(&LineCodec::encode_line(line))?;
        self.stream.flush()
    }

    fn read_line(&mut self, blocking: bool) -> io::Result<Option<String>> {
        let started = self.clock.now();
        loop {
            if let Some(line) = self.codec.decode_line() {
                trace!("<-RX- '{}'", line);
                return Ok(Some(line));
            }
            if self.fill()? > 0 {
                continue;
            }
            if !blocking || self.clock.now().saturating_sub(started) >= self.read_timeout {
                return Ok(None);
            }
            self.clock.sleep(POLL_INTERVAL);
        }
    }

    fn available(&mut self) -> bool {
        if self.codec.has_line() {
            return true;
        }
        matches!(self.fill(), Ok(n) if n > 0) || self.codec.buffered_len() > 0
    }
}
