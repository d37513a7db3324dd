//! The extension server the host editor spawns.
//!
//! The host launches this binary with the protocol on stdin/stdout, then
//! either side calls the other: the host dispatches command invocations
//! here, and the handlers call back into the host for buffer state while
//! they run. The crate wires the pieces together: CLI configuration,
//! stderr telemetry (stdout belongs to the protocol), the built-in command
//! set, and the serve loop, all on top of the `ember-rpc` engine.

pub mod cli;
pub mod commands;
pub mod telemetry;

use ember_rpc::{RegistrationError, RpcError, Session};
use thiserror::Error;
use tracing::info;

use crate::cli::Cli;

/// Tracing target for server lifecycle events.
const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// Errors that terminate the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A built-in command failed to register.
    #[error("command registration failed: {0}")]
    Registration(#[from] RegistrationError),

    /// The RPC engine failed fatally.
    #[error("RPC failure: {0}")]
    Rpc(#[from] RpcError),
}

/// Runs the server over stdin/stdout until the host closes the stream.
///
/// # Errors
///
/// Returns [`ServerError::Registration`] if the built-in command set cannot
/// register, and [`ServerError::Rpc`] for fatal transport failures. A host
/// that simply closes the stream is a clean shutdown, not an error.
pub fn run(cli: &Cli) -> Result<(), ServerError> {
    let mut session = Session::new(ember_rpc::stdio(), cli.id_parity.into());
    commands::register_all(&mut session)?;

    info!(
        target: SERVER_TARGET,
        parity = ?cli.id_parity,
        "extension server ready"
    );
    session.serve()?;

    let stats = session.stats();
    info!(
        target: SERVER_TARGET,
        malformed_payloads = stats.malformed_payloads,
        stray_responses = stats.stray_responses,
        "session closed"
    );
    Ok(())
}
