//! The reentrant call engine.
//!
//! `invoke` sends a request and blocks for the matching response. While it
//! waits, the peer may send requests of its own; the engine services each
//! one through the dispatcher before resuming the wait. Because a handler
//! may itself call `invoke`, the wait loops nest: each activation owns its
//! own awaited id as a local variable, and the activations form an implicit
//! stack that mirrors the true call nesting between the two processes.
//! There is no explicit stack object and no shared "current id": sharing
//! one would let an inner call's response satisfy an outer wait.

use ember_protocol::{ErrorResponse, Message, Request, Response};
use serde_json::Value;
use tracing::debug;

use crate::dispatch::{self, HandlerTable};
use crate::error::RpcError;
use crate::link::Link;
use crate::transport::Transport;

/// Tracing target for call-engine operations.
const ENGINE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::engine");

/// The peer's reply to an invoked call.
///
/// An error reply is a normal terminal state, not an `Err`: non-negative
/// codes carry ordinary command failure statuses.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The peer answered with a success response.
    Success {
        /// Integer result, conventionally a status code.
        result: i64,
        /// Optional string payload.
        string: Option<String>,
    },
    /// The peer answered with an error response.
    Failure {
        /// Status code (non-negative) or protocol error code (negative).
        code: i64,
        /// Failure description.
        message: String,
    },
}

/// Issues a call and blocks until its reply arrives, servicing any
/// interleaved incoming requests in the meantime.
///
/// # Errors
///
/// Returns [`RpcError::Disconnected`] if the stream closes before the reply
/// arrives; transport and codec failures propagate as-is.
pub(crate) fn invoke<T: Transport>(
    link: &mut Link<T>,
    handlers: &HandlerTable<T>,
    method: &str,
    params: Value,
) -> Result<Reply, RpcError> {
    let id = link.allocate_id();
    debug!(target: ENGINE_TARGET, method, id, "issuing call");
    link.send(&Message::Request(Request {
        method: method.to_owned(),
        params,
        id,
    }))?;
    await_reply(link, handlers, id)
}

/// One wait-loop activation. `awaited` is deliberately a parameter of this
/// frame: recursion through the dispatcher creates inner activations with
/// their own ids, and each activation matches only its own.
fn await_reply<T: Transport>(
    link: &mut Link<T>,
    handlers: &HandlerTable<T>,
    awaited: i64,
) -> Result<Reply, RpcError> {
    loop {
        let Some(message) = link.read()? else {
            return Err(RpcError::Disconnected);
        };

        match message {
            Message::Request(request) => {
                // The peer is calling back into us while we wait. Service it
                // now; our own wait is untouched by its completion.
                debug!(
                    target: ENGINE_TARGET,
                    method = %request.method,
                    id = request.id,
                    awaited,
                    "servicing interleaved request"
                );
                let response = dispatch::handle(link, handlers, &request);
                link.send(&response)?;
            }
            Message::Response(Response { id, result, string }) if id == awaited => {
                debug!(target: ENGINE_TARGET, id, "call completed");
                return Ok(Reply::Success { result, string });
            }
            Message::Error(ErrorResponse { id, code, message }) if id == awaited => {
                debug!(target: ENGINE_TARGET, id, code, "call failed");
                return Ok(Reply::Failure { code, message });
            }
            Message::Response(Response { id, .. }) | Message::Error(ErrorResponse { id, .. }) => {
                link.note_stray_response(id, Some(awaited));
            }
        }
    }
}

#[cfg(test)]
mod tests;
