//! Command-existence registry.
//!
//! The host's command set is fixed for a session, so the first
//! `query-command-exists` round trip per name is also the last: the boolean
//! answer is cached on the link for the connection's lifetime. There is no
//! invalidation.

use ember_protocol::{ExistsParams, Status, method};
use tracing::debug;

use crate::dispatch::HandlerTable;
use crate::engine::{self, Reply};
use crate::error::RpcError;
use crate::link::Link;
use crate::transport::Transport;

/// Tracing target for registry operations.
const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Returns whether the host knows the named command, querying it at most
/// once per name per connection.
///
/// An error reply from the host is cached as "does not exist".
pub(crate) fn command_exists<T: Transport>(
    link: &mut Link<T>,
    handlers: &HandlerTable<T>,
    name: &str,
) -> Result<bool, RpcError> {
    if let Some(known) = link.cached_command(name) {
        debug!(target: REGISTRY_TARGET, name, known, "registry cache hit");
        return Ok(known);
    }

    let params = serde_json::to_value(ExistsParams {
        name: name.to_owned(),
    })?;
    let reply = engine::invoke(link, handlers, method::QUERY_COMMAND_EXISTS, params)?;
    let exists = match reply {
        Reply::Success { result, .. } => result == Status::True.code(),
        Reply::Failure { .. } => false,
    };
    link.cache_command(name, exists);
    Ok(exists)
}
