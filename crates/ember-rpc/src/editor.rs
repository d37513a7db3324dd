//! The host-editor proxy handed to command handlers.
//!
//! [`Editor`] is the calling surface of the connection: property reads and
//! writes (the `get`/`set` bridge), generic command invocation (`cmd`), key
//! bindings (`bind`), and the command-existence registry. Every method is a
//! synchronous round trip through the reentrant call engine, so a handler
//! using it mid-dispatch may find itself servicing further host requests
//! before its own call returns. That nesting is the point.
//!
//! The bridge itself validates nothing: getting or setting a name the host
//! does not recognise is the host's to reject.

use ember_protocol::{BindParams, CmdParams, GetParams, Key, SetParams, Status, method};
use serde_json::Value;
use tracing::debug;

use crate::dispatch::HandlerTable;
use crate::engine::{self, Reply};
use crate::error::RpcError;
use crate::link::Link;
use crate::registry;
use crate::transport::Transport;

/// Tracing target for bridge operations.
const BRIDGE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bridge");

/// Prefix marking a mode-local binding in the `bind` exchange.
const MODE_LOCAL_PREFIX: char = '*';

/// Arguments of a generic command invocation, built up fluently:
///
/// ```
/// use ember_rpc::CommandCall;
/// use ember_protocol::Key;
///
/// let call = CommandCall::new()
///     .with_numeric(4)
///     .with_key(Key::ctrl('j'))
///     .with_string("src/main.rs");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandCall {
    numeric: Option<i64>,
    key: Option<Key>,
    strings: Vec<String>,
}

impl CommandCall {
    /// A call with no arguments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the numeric argument (sets the flag).
    #[must_use]
    pub const fn with_numeric(mut self, numeric: i64) -> Self {
        self.numeric = Some(numeric);
        self
    }

    /// Attaches the invoking key.
    #[must_use]
    pub const fn with_key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    /// Appends a string argument.
    #[must_use]
    pub fn with_string(mut self, string: impl Into<String>) -> Self {
        self.strings.push(string.into());
        self
    }
}

/// Proxy for the host editor on the other end of the connection.
///
/// Borrowed views of the connection state: handlers receive one per
/// dispatch, and [`crate::Session::editor`] lends one out for calls made
/// outside any dispatch (startup announcements, bindings).
pub struct Editor<'a, T> {
    link: &'a mut Link<T>,
    handlers: &'a HandlerTable<T>,
}

impl<'a, T: Transport> Editor<'a, T> {
    pub(crate) fn new(link: &'a mut Link<T>, handlers: &'a HandlerTable<T>) -> Self {
        Self { link, handlers }
    }

    fn call(&mut self, method: &str, params: Value) -> Result<Reply, RpcError> {
        engine::invoke(self.link, self.handlers, method, params)
    }

    /// Reads the named integer property.
    ///
    /// # Errors
    ///
    /// Propagates engine failures; an error reply surfaces as
    /// [`RpcError::Peer`].
    pub fn get_int(&mut self, name: &str, argument: &str) -> Result<i64, RpcError> {
        match self.get(name, argument)? {
            Reply::Success { result, .. } => Ok(result),
            Reply::Failure { code, message } => Err(RpcError::peer(code, message)),
        }
    }

    /// Reads the named string property.
    ///
    /// # Errors
    ///
    /// Propagates engine failures; an error reply surfaces as
    /// [`RpcError::Peer`].
    pub fn get_string(&mut self, name: &str, argument: &str) -> Result<String, RpcError> {
        match self.get(name, argument)? {
            Reply::Success { string, .. } => Ok(string.unwrap_or_default()),
            Reply::Failure { code, message } => Err(RpcError::peer(code, message)),
        }
    }

    fn get(&mut self, name: &str, argument: &str) -> Result<Reply, RpcError> {
        let params = serde_json::to_value(GetParams {
            name: name.to_owned(),
            string: argument.to_owned(),
        })?;
        self.call(method::GET, params)
    }

    /// Writes the named property and waits for the acknowledgement, so a
    /// following read observes the effect. The reply body is discarded.
    ///
    /// # Errors
    ///
    /// Propagates engine failures.
    pub fn set(&mut self, name: &str, int: i64, string: &str) -> Result<(), RpcError> {
        let params = serde_json::to_value(SetParams {
            name: name.to_owned(),
            int,
            string: string.to_owned(),
        })?;
        let reply = self.call(method::SET, params)?;
        if let Reply::Failure { code, message } = reply {
            debug!(target: BRIDGE_TARGET, name, code, message, "set was rejected");
        }
        Ok(())
    }

    /// Returns whether the host knows the named command, using the cached
    /// registry (one round trip per name per connection).
    ///
    /// # Errors
    ///
    /// Propagates engine failures from the first, uncached query.
    pub fn command_exists(&mut self, name: &str) -> Result<bool, RpcError> {
        registry::command_exists(self.link, self.handlers, name)
    }

    /// Invokes a host command by name and returns its trinary status.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::UnknownCommand`] if the existence check fails,
    /// [`RpcError::Peer`] for protocol-level error replies, and propagates
    /// engine failures.
    pub fn invoke_command(&mut self, name: &str, call: CommandCall) -> Result<Status, RpcError> {
        if !self.command_exists(name)? {
            return Err(RpcError::unknown_command(name));
        }
        let params = serde_json::to_value(CmdParams::marshal(
            name,
            call.numeric,
            call.key,
            call.strings,
        ))?;
        let reply = self.call(method::CMD, params)?;
        reply_to_status(reply)
    }

    /// Announces a key binding to the host. A mode-local binding carries a
    /// `*` prefix on the command name.
    ///
    /// # Errors
    ///
    /// Propagates engine failures.
    pub fn bind(&mut self, name: &str, key: Key, mode_local: bool) -> Result<(), RpcError> {
        let name = if mode_local {
            format!("{MODE_LOCAL_PREFIX}{name}")
        } else {
            name.to_owned()
        };
        let params = serde_json::to_value(BindParams {
            key: key.code(),
            name,
        })?;
        let reply = self.call(method::BIND, params)?;
        if let Reply::Failure { code, message } = reply {
            debug!(target: BRIDGE_TARGET, code, message, "bind was rejected");
        }
        Ok(())
    }

    /// Registers one of this process's commands with the host, so the host
    /// can route keystrokes and `M-x`-style invocations back here.
    ///
    /// # Errors
    ///
    /// Propagates command-invocation failures.
    pub fn announce_command(&mut self, name: &str) -> Result<(), RpcError> {
        self.invoke_command(
            "extension-command",
            CommandCall::new().with_string(name),
        )
        .map(|_| ())
    }

    // Named accessors for the host state extensions commonly touch.

    /// The text of the current line.
    ///
    /// # Errors
    ///
    /// Propagates bridge failures.
    pub fn line(&mut self) -> Result<String, RpcError> {
        self.get_string("line", "")
    }

    /// Replaces the text of the current line.
    ///
    /// # Errors
    ///
    /// Propagates bridge failures.
    pub fn set_line(&mut self, text: &str) -> Result<(), RpcError> {
        self.set("line", 0, text)
    }

    /// The 1-based line number of the cursor.
    ///
    /// # Errors
    ///
    /// Propagates bridge failures.
    pub fn lineno(&mut self) -> Result<i64, RpcError> {
        self.get_int("lineno", "")
    }

    /// Moves the cursor to the given line.
    ///
    /// # Errors
    ///
    /// Propagates bridge failures.
    pub fn set_lineno(&mut self, lineno: i64) -> Result<(), RpcError> {
        self.set("lineno", lineno, "")
    }

    /// The cursor's offset within the current line.
    ///
    /// # Errors
    ///
    /// Propagates bridge failures.
    pub fn offset(&mut self) -> Result<i64, RpcError> {
        self.get_int("offset", "")
    }

    /// Moves the cursor to the given offset within the current line.
    ///
    /// # Errors
    ///
    /// Propagates bridge failures.
    pub fn set_offset(&mut self, offset: i64) -> Result<(), RpcError> {
        self.set("offset", offset, "")
    }

    /// Prompts the user in the echo line. `None` means the user aborted the
    /// prompt rather than answering.
    ///
    /// # Errors
    ///
    /// Protocol-level error replies surface as [`RpcError::Peer`].
    pub fn reply(&mut self, prompt: &str) -> Result<Option<String>, RpcError> {
        match self.get("reply", prompt)? {
            Reply::Success { string, .. } => Ok(Some(string.unwrap_or_default())),
            Reply::Failure { code, .. } if code >= 0 => Ok(None),
            Reply::Failure { code, message } => Err(RpcError::peer(code, message)),
        }
    }

    /// Reads one keystroke from the user.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::InvalidKeyCode`] if the host's code does not
    /// decode; propagates bridge failures.
    pub fn getkey(&mut self) -> Result<Key, RpcError> {
        let code = self.get_int("getkey", "")?;
        Key::from_code(code).ok_or(RpcError::InvalidKeyCode { code })
    }

    /// Inserts text at the cursor.
    ///
    /// # Errors
    ///
    /// Propagates bridge failures.
    pub fn insert(&mut self, text: &str) -> Result<(), RpcError> {
        self.set("insert", 0, text)
    }

    /// Shows text in a popup window.
    ///
    /// # Errors
    ///
    /// Propagates bridge failures.
    pub fn popup(&mut self, text: &str) -> Result<(), RpcError> {
        self.set("popup", 0, text)
    }

    /// Sets the current buffer's mode name.
    ///
    /// # Errors
    ///
    /// Propagates bridge failures.
    pub fn set_mode(&mut self, mode: &str) -> Result<(), RpcError> {
        self.set("setmode", 0, mode)
    }

    /// Sets the current buffer's flag bits.
    ///
    /// # Errors
    ///
    /// Propagates bridge failures.
    pub fn set_buffer_flags(&mut self, flags: i64) -> Result<(), RpcError> {
        self.set("bflag", flags, "")
    }

    /// Writes a message to the host's echo line.
    ///
    /// # Errors
    ///
    /// Propagates command-invocation failures.
    pub fn echo(&mut self, message: &str) -> Result<(), RpcError> {
        self.invoke_command("echo", CommandCall::new().with_string(message))
            .map(|_| ())
    }
}

fn reply_to_status(reply: Reply) -> Result<Status, RpcError> {
    match reply {
        Reply::Success { result, .. } => {
            Status::from_code(result).ok_or_else(|| {
                RpcError::peer(result, "success response with non-status result")
            })
        }
        Reply::Failure { code, message } => {
            Status::from_code(code).ok_or_else(|| RpcError::peer(code, message))
        }
    }
}
