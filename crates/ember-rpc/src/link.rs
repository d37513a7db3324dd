//! Connection state shared by the call engine and the dispatcher.
//!
//! The [`Link`] couples the framed transport with the message codec and owns
//! the per-connection mutable state: the id allocator, the command-existence
//! cache, and the protocol fault counters. There is exactly one `Link` per
//! connection and it is only ever touched from the single logical thread of
//! control, so none of this needs locking; nested call activations reenter
//! it strictly LIFO.

use std::collections::HashMap;

use ember_protocol::Message;
use tracing::{debug, warn};

use crate::error::RpcError;
use crate::idgen::{IdAllocator, IdParity};
use crate::transport::Transport;

/// Tracing target for link operations.
const LINK_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::link");

/// Counters for protocol violations observed on a connection.
///
/// Violations are dropped, not fatal; the counters make them observable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtocolStats {
    /// Frames whose payload failed to decode as a well-shaped message.
    pub malformed_payloads: u64,
    /// Responses whose id matched no active wait (stale, misrouted, or
    /// duplicated replies).
    pub stray_responses: u64,
}

/// Per-connection state: transport, codec, ids, caches, counters.
pub struct Link<T> {
    transport: T,
    ids: IdAllocator,
    command_cache: HashMap<String, bool>,
    stats: ProtocolStats,
}

impl<T: Transport> Link<T> {
    pub(crate) fn new(transport: T, parity: IdParity) -> Self {
        Self {
            transport,
            ids: IdAllocator::new(parity),
            command_cache: HashMap::new(),
            stats: ProtocolStats::default(),
        }
    }

    pub(crate) const fn allocate_id(&mut self) -> i64 {
        self.ids.allocate()
    }

    /// Encodes and sends one message.
    pub(crate) fn send(&mut self, message: &Message) -> Result<(), RpcError> {
        let payload = message.to_bytes()?;
        self.transport.send(&payload)?;
        Ok(())
    }

    /// Reads the next well-formed message, skipping undecodable payloads.
    ///
    /// Returns `Ok(None)` on clean shutdown. Payloads that frame correctly
    /// but do not decode are protocol faults: logged, counted, dropped.
    pub(crate) fn read(&mut self) -> Result<Option<Message>, RpcError> {
        loop {
            let Some(payload) = self.transport.receive()? else {
                return Ok(None);
            };
            match Message::from_bytes(&payload) {
                Ok(message) => return Ok(Some(message)),
                Err(error) => {
                    self.stats.malformed_payloads += 1;
                    warn!(target: LINK_TARGET, %error, "dropping undecodable message");
                }
            }
        }
    }

    /// Records a response whose id matches no active wait.
    pub(crate) fn note_stray_response(&mut self, id: i64, awaited: Option<i64>) {
        self.stats.stray_responses += 1;
        match awaited {
            Some(expected) => warn!(
                target: LINK_TARGET,
                id,
                expected,
                "discarding response with non-matching id"
            ),
            None => warn!(
                target: LINK_TARGET,
                id,
                "discarding response outside any active call"
            ),
        }
    }

    pub(crate) fn cached_command(&self, name: &str) -> Option<bool> {
        self.command_cache.get(name).copied()
    }

    pub(crate) fn cache_command(&mut self, name: &str, exists: bool) {
        debug!(target: LINK_TARGET, name, exists, "caching command existence");
        self.command_cache.insert(name.to_owned(), exists);
    }

    /// Returns the protocol fault counters observed so far.
    #[must_use]
    pub const fn stats(&self) -> ProtocolStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use ember_protocol::{Message, Response};

    use super::*;
    use crate::testing::ScriptedTransport;

    #[test]
    fn undecodable_payloads_are_skipped_and_counted() {
        let mut transport = ScriptedTransport::new();
        transport.push_payload(b"{\"garbage\":true}");
        transport.push_message(&Message::Response(Response {
            id: 2,
            result: 1,
            string: None,
        }));

        let mut link = Link::new(transport, IdParity::Even);
        let message = link.read().expect("read");
        assert_eq!(message.map(|m| m.id()), Some(2));
        assert_eq!(link.stats().malformed_payloads, 1);
    }

    #[test]
    fn clean_shutdown_reads_as_none() {
        let mut link = Link::new(ScriptedTransport::new(), IdParity::Even);
        assert!(link.read().expect("read").is_none());
    }

    #[test]
    fn stray_responses_are_counted() {
        let mut link = Link::new(ScriptedTransport::new(), IdParity::Even);
        link.note_stray_response(99, Some(2));
        link.note_stray_response(7, None);
        assert_eq!(link.stats().stray_responses, 2);
    }

    #[test]
    fn command_cache_stores_both_outcomes() {
        let mut link = Link::new(ScriptedTransport::new(), IdParity::Even);
        assert_eq!(link.cached_command("forw-line"), None);
        link.cache_command("forw-line", true);
        link.cache_command("no-such", false);
        assert_eq!(link.cached_command("forw-line"), Some(true));
        assert_eq!(link.cached_command("no-such"), Some(false));
    }
}
