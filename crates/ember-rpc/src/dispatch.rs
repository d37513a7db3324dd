//! Incoming-request dispatch to registered command handlers.
//!
//! The dispatcher maps a request's method name to a local handler, marshals
//! the three optional command arguments (numeric prefix, key, strings),
//! runs the handler, and converts its outcome into a response message. A
//! handler fault never escapes: it is caught exactly here and turned into an
//! error response, so the serve loop outlives any misbehaving handler.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::HashMap;

use ember_protocol::{
    ErrorResponse, InvocationParams, Key, Message, Request, Response, Status, error_code,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::editor::Editor;
use crate::error::RpcError;
use crate::link::Link;
use crate::transport::Transport;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// A command implemented by the extension process.
///
/// Handlers receive an [`Editor`] proxy for calling back into the host
/// (nested calls issued through it are serviced by the same reentrant
/// engine that delivered this invocation) and the marshalled
/// [`CommandArgs`].
/// Failures a handler cannot express as a command status are returned as
/// [`HandlerFault`]s and converted to error responses at the dispatch
/// boundary.
pub trait CommandHandler<T> {
    /// Runs the command.
    ///
    /// # Errors
    ///
    /// Returns a [`HandlerFault`] for failures that are not ordinary command
    /// outcomes; the dispatcher reports them to the peer as code -32000.
    fn run(
        &self,
        editor: &mut Editor<'_, T>,
        args: &CommandArgs,
    ) -> Result<CommandOutcome, HandlerFault>;
}

impl<T, F> CommandHandler<T> for F
where
    F: Fn(&mut Editor<'_, T>, &CommandArgs) -> Result<CommandOutcome, HandlerFault>,
{
    fn run(
        &self,
        editor: &mut Editor<'_, T>,
        args: &CommandArgs,
    ) -> Result<CommandOutcome, HandlerFault> {
        self(editor, args)
    }
}

/// Errors raised while registering a command handler.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A handler is already registered under the normalised name.
    #[error("command '{name}' is already registered")]
    Duplicate {
        /// The conflicting, already-normalised name.
        name: String,
    },
}

/// Registered command handlers, keyed by normalised name.
pub struct HandlerTable<T> {
    handlers: HashMap<String, Box<dyn CommandHandler<T>>>,
}

impl<T> HandlerTable<T> {
    pub(crate) fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers a handler. Names are normalised (underscores become
    /// dashes) so both naming conventions resolve to the same handler.
    pub(crate) fn register(
        &mut self,
        name: &str,
        handler: Box<dyn CommandHandler<T>>,
    ) -> Result<(), RegistrationError> {
        let normalised = normalise_name(name);
        if self.handlers.contains_key(&normalised) {
            return Err(RegistrationError::Duplicate { name: normalised });
        }
        self.handlers.insert(normalised, handler);
        Ok(())
    }

    fn get(&self, normalised: &str) -> Option<&dyn CommandHandler<T>> {
        self.handlers.get(normalised).map(|handler| &**handler)
    }

    /// Whether a handler is registered under the (normalised) name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(&normalise_name(name))
    }
}

/// Maps one naming convention onto the other: underscores become dashes.
fn normalise_name(name: &str) -> String {
    name.trim().replace('_', "-")
}

/// The marshalled arguments of one command invocation.
///
/// Every argument is optional. The strings are exposed through on-demand
/// accessors rather than eagerly, so a handler can distinguish "no string
/// supplied" from "empty string supplied".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandArgs {
    numeric: Option<i64>,
    key: i64,
    strings: Option<Vec<String>>,
}

impl CommandArgs {
    /// Marshals arguments from a request's params, leniently: an absent
    /// field means that argument was not supplied.
    fn from_params(params: &Value) -> Self {
        let raw: InvocationParams =
            serde_json::from_value(params.clone()).unwrap_or_default();
        Self {
            numeric: (raw.flag == 1).then_some(raw.prefix),
            key: raw.key,
            strings: raw.strings,
        }
    }

    /// Arguments carrying nothing, for driving handlers directly in tests.
    #[cfg(any(test, feature = "test-support"))]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            numeric: None,
            key: 0,
            strings: None,
        }
    }

    /// The numeric argument, present only when the invocation's flag is set.
    #[must_use]
    pub const fn numeric(&self) -> Option<i64> {
        self.numeric
    }

    /// The key that invoked the command, if one was supplied. The host's
    /// "random key" sentinel and an absent code both read as `None`.
    #[must_use]
    pub fn key(&self) -> Option<Key> {
        if self.key == 0 || self.key == Key::RANDOM.code() {
            return None;
        }
        Key::from_code(self.key)
    }

    /// The string arguments, or `None` when none were supplied at all.
    #[must_use]
    pub fn strings(&self) -> Option<&[String]> {
        self.strings.as_deref()
    }

    /// The first string argument, the common case for prompt-style input.
    #[must_use]
    pub fn first_string(&self) -> Option<&str> {
        self.strings
            .as_deref()
            .and_then(|strings| strings.first())
            .map(String::as_str)
    }
}

/// What a command handler produced: a trinary status plus an optional
/// message for the host's echo line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    status: Status,
    message: String,
}

impl CommandOutcome {
    /// A bare successful outcome.
    #[must_use]
    pub const fn success() -> Self {
        Self {
            status: Status::True,
            message: String::new(),
        }
    }

    /// A successful outcome with a status message.
    #[must_use]
    pub fn success_with(message: impl Into<String>) -> Self {
        Self {
            status: Status::True,
            message: message.into(),
        }
    }

    /// A failed outcome with a reason.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: Status::False,
            message: message.into(),
        }
    }

    /// An aborted outcome with a reason.
    #[must_use]
    pub fn abort(message: impl Into<String>) -> Self {
        Self {
            status: Status::Abort,
            message: message.into(),
        }
    }

    /// The outcome's status.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// The outcome's message text.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

impl From<Status> for CommandOutcome {
    fn from(status: Status) -> Self {
        Self {
            status,
            message: String::new(),
        }
    }
}

/// A failure raised inside a command handler.
///
/// Carries the failure description and best-effort stack context. Faults
/// are caught exactly once, at the dispatch boundary, and reported to the
/// peer as an error response with code -32000; they never unwind the serve
/// loop.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerFault {
    message: String,
    trace: String,
}

impl HandlerFault {
    /// Creates a fault, capturing the current backtrace as stack context
    /// when backtraces are enabled for the process.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        let backtrace = Backtrace::capture();
        let trace = if matches!(backtrace.status(), BacktraceStatus::Captured) {
            backtrace.to_string()
        } else {
            String::new()
        };
        Self {
            message: message.into(),
            trace,
        }
    }

    /// The failure description.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// The captured stack context.
    #[must_use]
    pub fn trace(&self) -> &str {
        self.trace.as_str()
    }

    fn into_report(self) -> String {
        if self.trace.is_empty() {
            self.message
        } else {
            format!("{}\n{}", self.message, self.trace)
        }
    }
}

impl From<RpcError> for HandlerFault {
    fn from(error: RpcError) -> Self {
        Self::new(error.to_string())
    }
}

/// Dispatches one incoming request, producing its response message.
///
/// The handler runs with an [`Editor`] borrowing the same link, so nested
/// calls it issues are correlated on the same connection; they are never
/// re-dispatched into this invocation. The caller sends the returned
/// message.
pub(crate) fn handle<T: Transport>(
    link: &mut Link<T>,
    handlers: &HandlerTable<T>,
    request: &Request,
) -> Message {
    let name = normalise_name(&request.method);
    debug!(
        target: DISPATCH_TARGET,
        method = %name,
        id = request.id,
        "dispatching request"
    );

    let Some(handler) = handlers.get(&name) else {
        return Message::Error(ErrorResponse {
            id: request.id,
            code: error_code::METHOD_NOT_FOUND,
            message: format!("method not found: {name}"),
        });
    };

    let args = CommandArgs::from_params(&request.params);
    let mut editor = Editor::new(link, handlers);
    match handler.run(&mut editor, &args) {
        Ok(outcome) => outcome_to_message(request.id, outcome),
        Err(fault) => {
            warn!(
                target: DISPATCH_TARGET,
                method = %name,
                error = %fault,
                "handler fault"
            );
            Message::Error(ErrorResponse {
                id: request.id,
                code: error_code::HANDLER_FAULT,
                message: fault.into_report(),
            })
        }
    }
}

fn outcome_to_message(id: i64, outcome: CommandOutcome) -> Message {
    let status = outcome.status();
    if status.is_success() {
        let message = outcome.message;
        Message::Response(Response {
            id,
            result: status.code(),
            string: (!message.is_empty()).then_some(message),
        })
    } else {
        // EFALSE/EABORT travel as error responses whose code is the status.
        Message::Error(ErrorResponse {
            id,
            code: status.code(),
            message: outcome.message,
        })
    }
}
