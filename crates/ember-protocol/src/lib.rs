//! Wire types for the editor-extension RPC protocol.
//!
//! The protocol carries three message shapes (requests, success responses,
//! and error responses) as length-prefixed JSON payloads over a pair of
//! byte streams. This crate owns the message model, the JSON codec, the command
//! status codes, the parameter schemas of the built-in exchanges, and the
//! packed key-code representation. It is pure data: framing, correlation,
//! and dispatch live in `ember-rpc`.

mod key;
mod message;
mod params;
mod status;

pub use key::Key;
pub use message::{DecodeError, ErrorResponse, Message, PROTOCOL_VERSION, Request, Response};
pub use params::{BindParams, CmdParams, ExistsParams, GetParams, InvocationParams, SetParams};
pub use status::{Status, error_code};

/// Method names of the built-in exchanges.
pub mod method {
    /// Read a named host property.
    pub const GET: &str = "get";
    /// Write a named host property.
    pub const SET: &str = "set";
    /// Invoke a host command by name.
    pub const CMD: &str = "cmd";
    /// Announce a key binding to the host.
    pub const BIND: &str = "bind";
    /// Ask the host whether a command name exists.
    pub const QUERY_COMMAND_EXISTS: &str = "query-command-exists";
}
