//! Byte-stream transport with decimal length-line framing.
//!
//! Each message travels as a decimal ASCII line holding the payload's exact
//! byte length, followed immediately by that many payload bytes:
//! ```text
//! <N>\n
//! <payload: N bytes>
//! ```
//! There are no other framing bytes. The framing is transport-agnostic: it
//! works over any ordered byte stream, including stdio between two processes
//! with independent buffering.

use std::io::{self, BufRead, Read, StdinLock, StdoutLock, Write};

use tracing::trace;

use crate::error::TransportError;

/// Tracing target for transport operations.
const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

/// Reads and writes length-line framed payloads.
///
/// `receive` returning `Ok(None)` signals a clean shutdown: the stream hit
/// EOF, or the length line was non-positive or unparseable. Only genuine I/O
/// failures surface as errors.
pub trait Transport {
    /// Sends one framed payload.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if writing to the stream fails.
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    /// Receives one framed payload, blocking until it is complete.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if reading fails mid-frame.
    fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError>;
}

/// Frames payloads over any buffered reader/writer pair.
pub struct StreamTransport<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> StreamTransport<R, W> {
    /// Creates a transport from stream halves.
    pub const fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

/// Transport over the process's own stdin/stdout, the usual deployment
/// when the host spawns the extension process.
pub type StdioTransport = StreamTransport<StdinLock<'static>, StdoutLock<'static>>;

/// Creates the stdio transport. The locks are held for the life of the
/// transport; stdout must carry nothing but protocol frames.
#[must_use]
pub fn stdio() -> StdioTransport {
    StreamTransport::new(io::stdin().lock(), io::stdout().lock())
}

impl<R: BufRead, W: Write> Transport for StreamTransport<R, W> {
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        writeln!(self.writer, "{}", payload.len()).map_err(TransportError::Io)?;
        self.writer.write_all(payload)?;
        self.writer.flush()?;
        trace!(target: TRANSPORT_TARGET, bytes = payload.len(), "frame sent");
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut line = String::new();
        let bytes_read = self.reader.read_line(&mut line)?;
        if bytes_read == 0 {
            // EOF before a length line: the peer has gone away.
            trace!(target: TRANSPORT_TARGET, "stream closed");
            return Ok(None);
        }

        let Ok(length) = line.trim().parse::<usize>() else {
            trace!(target: TRANSPORT_TARGET, line = %line.trim(), "unparseable length line");
            return Ok(None);
        };
        if length == 0 {
            return Ok(None);
        }

        let mut payload = vec![0_u8; length];
        self.reader.read_exact(&mut payload)?;
        trace!(target: TRANSPORT_TARGET, bytes = length, "frame received");
        Ok(Some(payload))
    }
}
