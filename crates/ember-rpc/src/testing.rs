//! Test doubles for driving sessions without a real peer.
//!
//! [`ScriptedTransport`] plays the host editor: it yields a fixed sequence
//! of incoming messages and records everything sent through it. Tests
//! script the peer's half of a conversation up front, run the engine, then
//! assert on the recorded outgoing messages and their order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use ember_protocol::Message;

use crate::error::TransportError;
use crate::transport::Transport;

/// In-memory transport scripted with the peer's messages.
///
/// `receive` pops the next scripted payload; once the script runs dry the
/// transport reports a clean shutdown, like a peer closing its end.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    incoming: VecDeque<Vec<u8>>,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl ScriptedTransport {
    /// Creates a transport with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message to the incoming script.
    ///
    /// # Panics
    ///
    /// Panics if the message fails to encode; scripts are fixed test data.
    pub fn push_message(&mut self, message: &Message) {
        let payload = message.to_bytes().expect("scripted message encodes");
        self.incoming.push_back(payload);
    }

    /// Appends raw payload bytes to the incoming script, for exercising
    /// malformed input.
    pub fn push_payload(&mut self, payload: &[u8]) {
        self.incoming.push_back(payload.to_vec());
    }

    /// Returns a handle that can read the sent messages after the transport
    /// has been moved into a session.
    #[must_use]
    pub fn sent_log(&self) -> SentLog {
        SentLog {
            sent: Arc::clone(&self.sent),
        }
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let mut sent = self.sent.lock().unwrap_or_else(|poison| poison.into_inner());
        sent.push(payload.to_vec());
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(self.incoming.pop_front())
    }
}

/// Read-side handle onto a [`ScriptedTransport`]'s sent messages.
#[derive(Debug, Clone)]
pub struct SentLog {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl SentLog {
    /// Decodes and returns every message sent so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if a sent payload fails to decode; the engine only sends
    /// well-formed messages.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        let sent = self.sent.lock().unwrap_or_else(|poison| poison.into_inner());
        sent.iter()
            .map(|payload| Message::from_bytes(payload).expect("sent message decodes"))
            .collect()
    }

    /// Number of messages sent so far.
    #[must_use]
    pub fn len(&self) -> usize {
        let sent = self.sent.lock().unwrap_or_else(|poison| poison.into_inner());
        sent.len()
    }

    /// Whether nothing has been sent yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
