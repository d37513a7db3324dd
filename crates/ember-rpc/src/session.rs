//! Connection session: handler registration and the serve loop.

use ember_protocol::{ErrorResponse, Message, Response};
use tracing::info;

use crate::dispatch::{self, CommandHandler, HandlerTable, RegistrationError};
use crate::editor::Editor;
use crate::error::RpcError;
use crate::idgen::IdParity;
use crate::link::{Link, ProtocolStats};
use crate::transport::Transport;

/// Tracing target for session lifecycle events.
const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// One extension-to-host connection.
///
/// The session owns the connection state (transport, id allocator, command
/// cache, fault counters) and the table of registered command handlers.
/// [`Session::serve`] runs the top-level loop that answers host requests;
/// [`Session::editor`] lends out the calling surface for requests this side
/// initiates outside any dispatch.
pub struct Session<T> {
    link: Link<T>,
    handlers: HandlerTable<T>,
}

impl<T: Transport> Session<T> {
    /// Creates a session over the given transport, owning the given half of
    /// the id space. The peer must own the other half.
    #[must_use]
    pub fn new(transport: T, parity: IdParity) -> Self {
        Self {
            link: Link::new(transport, parity),
            handlers: HandlerTable::new(),
        }
    }

    /// Registers a command handler. Underscores and dashes in the name are
    /// interchangeable; lookup normalises both the registered and the
    /// requested spelling.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::Duplicate`] if the normalised name is
    /// already taken.
    pub fn register_command<H>(&mut self, name: &str, handler: H) -> Result<(), RegistrationError>
    where
        H: CommandHandler<T> + 'static,
    {
        self.handlers.register(name, Box::new(handler))
    }

    /// Whether a handler is registered under the name.
    #[must_use]
    pub fn has_command(&self, name: &str) -> bool {
        self.handlers.contains(name)
    }

    /// Lends out the host proxy for calls made outside any dispatch, such
    /// as startup announcements and key bindings.
    pub fn editor(&mut self) -> Editor<'_, T> {
        Editor::new(&mut self.link, &self.handlers)
    }

    /// Serves incoming requests until the peer closes the stream.
    ///
    /// Requests are dispatched to registered handlers; responses arriving
    /// outside any active call are protocol violations, counted and
    /// dropped. Clean shutdown (EOF or an unparseable length line) returns
    /// `Ok`.
    ///
    /// # Errors
    ///
    /// Returns transport or codec failures; handler faults do not surface
    /// here, they are answered with error responses and the loop continues.
    pub fn serve(&mut self) -> Result<(), RpcError> {
        info!(target: SESSION_TARGET, "serving host requests");
        loop {
            let Some(message) = self.link.read()? else {
                info!(target: SESSION_TARGET, "peer closed the stream; shutting down");
                return Ok(());
            };
            match message {
                Message::Request(request) => {
                    let response = dispatch::handle(&mut self.link, &self.handlers, &request);
                    self.link.send(&response)?;
                }
                Message::Response(Response { id, .. })
                | Message::Error(ErrorResponse { id, .. }) => {
                    self.link.note_stray_response(id, None);
                }
            }
        }
    }

    /// Protocol fault counters observed so far on this connection.
    #[must_use]
    pub const fn stats(&self) -> ProtocolStats {
        self.link.stats()
    }
}
