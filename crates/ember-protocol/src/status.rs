//! Command status codes and protocol error codes.

/// Trinary result of a host command.
///
/// The host's commands return false/true/abort, carried on the wire as the
/// integers 0/1/2 (EFALSE/ETRUE/EABORT in the host's own sources). A
/// successful command travels as a success response; the other two statuses
/// travel as error responses whose code equals the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The command failed (EFALSE).
    False,
    /// The command succeeded (ETRUE).
    True,
    /// The command was aborted (EABORT).
    Abort,
}

impl Status {
    /// Returns the wire code for this status.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::False => 0,
            Self::True => 1,
            Self::Abort => 2,
        }
    }

    /// Parses a wire code into a status.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::False),
            1 => Some(Self::True),
            2 => Some(Self::Abort),
            _ => None,
        }
    }

    /// Returns `true` for [`Status::True`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::True)
    }
}

/// Protocol-level error codes, JSON-RPC style.
///
/// Negative codes never collide with command statuses, which are
/// non-negative.
pub mod error_code {
    /// A registered handler raised a fault while running.
    pub const HANDLER_FAULT: i64 = -32000;
    /// No handler is registered for the requested method.
    pub const METHOD_NOT_FOUND: i64 = -32601;
}
