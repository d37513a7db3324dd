//! Reentrant RPC engine for editor extensions.
//!
//! The crate connects an extension process to a host editor over a pair of
//! byte streams and lets either side call the other. The hard part is that
//! the calls nest: while this side synchronously awaits the reply to a call
//! it issued, the peer may send a fresh request, which must be serviced
//! before the original wait can resume. The [`Session`] owns the connection
//! state, command handlers register with it, and handlers receive an
//! [`Editor`] proxy through which they can call back into the host
//! mid-dispatch, recursively exercising the same wait loop.
//!
//! Layering, leaf to root: [`transport`](Transport) frames byte payloads,
//! `ember-protocol` encodes and decodes messages, [`Link`] couples the two
//! with the connection state (id allocator, command cache, protocol
//! counters), the call engine correlates replies while dispatching
//! interleaved requests, and [`Editor`] wraps the engine in property and
//! command accessors.

mod dispatch;
mod editor;
mod engine;
mod error;
mod idgen;
mod link;
mod registry;
mod session;
mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use dispatch::{
    CommandArgs, CommandHandler, CommandOutcome, HandlerFault, HandlerTable, RegistrationError,
};
pub use editor::{CommandCall, Editor};
pub use engine::Reply;
pub use error::{RpcError, TransportError};
pub use idgen::{IdAllocator, IdParity};
pub use link::{Link, ProtocolStats};
pub use session::Session;
pub use transport::{StdioTransport, StreamTransport, Transport, stdio};
