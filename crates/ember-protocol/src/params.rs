//! Parameter schemas for the built-in exchanges.
//!
//! Each request method carries a small flat JSON object as its `params`.
//! One shape per built-in exchange: property reads and writes
//! (`get`/`set`), generic command invocation (`cmd`), key-binding
//! announcements (`bind`), and command-existence queries. Incoming command
//! invocations use the lenient [`InvocationParams`] shape, where every field
//! may be absent.

use serde::{Deserialize, Serialize};

use crate::Key;

/// Parameters of a `get` request: read the named host property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetParams {
    /// Property name (for example `line`, `lineno`, `offset`).
    pub name: String,
    /// Additional string argument; empty when the property takes none.
    #[serde(default)]
    pub string: String,
}

/// Parameters of a `set` request: write the named host property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetParams {
    /// Property name.
    pub name: String,
    /// Integer argument; zero when the property takes none.
    pub int: i64,
    /// String argument; empty when the property takes none.
    pub string: String,
}

/// Parameters of a `cmd` request: invoke a host command by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmdParams {
    /// Command name, dash-separated.
    pub name: String,
    /// 1 when a numeric argument is supplied, 0 otherwise.
    pub flag: i64,
    /// The numeric argument; 1 when absent.
    pub prefix: i64,
    /// Packed key code, or [`Key::RANDOM`] when no key is supplied.
    pub key: i64,
    /// String arguments consumed by the command's prompts.
    pub strings: Vec<String>,
}

/// Parameters of a `bind` request: announce a key binding to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindParams {
    /// Packed key code to bind.
    pub key: i64,
    /// Command name, optionally carrying a mode-flag prefix.
    pub name: String,
}

/// Parameters of a `query-command-exists` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistsParams {
    /// Command name to look up.
    pub name: String,
}

/// Lenient view of the params of an incoming command invocation.
///
/// The host marshals `flag`, `prefix`, `key`, and `strings` alongside the
/// command name (which travels as the request method). Any of them may be
/// absent; absent `strings` is distinct from an empty array, so the field
/// stays an `Option`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct InvocationParams {
    /// 1 when a numeric argument is supplied.
    #[serde(default)]
    pub flag: i64,
    /// The numeric argument.
    #[serde(default)]
    pub prefix: i64,
    /// Packed key code; 0 or [`Key::RANDOM`] means no key was supplied.
    #[serde(default)]
    pub key: i64,
    /// String arguments, if any were supplied at all.
    #[serde(default)]
    pub strings: Option<Vec<String>>,
}

impl CmdParams {
    /// Marshals a command invocation: an absent numeric argument means
    /// `flag = 0, prefix = 1`, an absent key means the [`Key::RANDOM`]
    /// sentinel.
    #[must_use]
    pub fn marshal(
        name: impl Into<String>,
        numeric: Option<i64>,
        key: Option<Key>,
        strings: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            flag: i64::from(numeric.is_some()),
            prefix: numeric.unwrap_or(1),
            key: key.unwrap_or(Key::RANDOM).code(),
            strings,
        }
    }
}
