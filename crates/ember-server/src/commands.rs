//! Built-in commands.
//!
//! A small demonstration set. Each handler is an ordinary function over
//! the [`Editor`] proxy and the marshalled arguments; all of them call
//! back into the host mid-dispatch, so every invocation exercises the
//! reentrant engine. The command set is host-defined and open; these
//! register like any third-party handler would.

use ember_rpc::{
    CommandArgs, CommandCall, CommandOutcome, Editor, HandlerFault, RegistrationError, Session,
    Transport,
};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc2822;

/// Registers the built-in command set with a session.
///
/// # Errors
///
/// Returns [`RegistrationError::Duplicate`] if a name collides with an
/// already registered command.
pub fn register_all<T: Transport + 'static>(session: &mut Session<T>) -> Result<(), RegistrationError> {
    session.register_command("show-dot", show_dot)?;
    session.register_command("goto-percent", goto_percent)?;
    session.register_command("insert-date", insert_date)?;
    session.register_command("describe-key", describe_key)?;
    Ok(())
}

/// Reports the cursor position in the host's echo line.
fn show_dot<T: Transport>(
    editor: &mut Editor<'_, T>,
    _args: &CommandArgs,
) -> Result<CommandOutcome, HandlerFault> {
    let lineno = editor.lineno()?;
    let offset = editor.offset()?;
    editor.echo(&format!("Dot at line {lineno}, offset {offset}"))?;
    Ok(CommandOutcome::success())
}

/// Moves the cursor to N percent of the buffer, N being the numeric
/// argument. Measures the buffer by jumping to its end, then repositions.
fn goto_percent<T: Transport>(
    editor: &mut Editor<'_, T>,
    args: &CommandArgs,
) -> Result<CommandOutcome, HandlerFault> {
    let Some(percent) = args.numeric() else {
        return Ok(CommandOutcome::fail("goto-percent needs a numeric argument"));
    };
    if !(0..=100).contains(&percent) {
        return Ok(CommandOutcome::fail(format!(
            "{percent} is not a percentage"
        )));
    }

    let status = editor.invoke_command("goto-eob", CommandCall::new())?;
    if !status.is_success() {
        return Ok(CommandOutcome::fail("could not reach the end of the buffer"));
    }
    let total = editor.lineno()?;
    let target = (total * percent / 100).max(1);
    editor.set_lineno(target)?;
    Ok(CommandOutcome::success_with(format!(
        "line {target} of {total}"
    )))
}

/// Inserts an RFC 2822 timestamp at the cursor.
fn insert_date<T: Transport>(
    editor: &mut Editor<'_, T>,
    _args: &CommandArgs,
) -> Result<CommandOutcome, HandlerFault> {
    let stamp = OffsetDateTime::now_utc()
        .format(&Rfc2822)
        .map_err(|error| HandlerFault::new(format!("timestamp formatting failed: {error}")))?;
    editor.insert(&stamp)?;
    Ok(CommandOutcome::success())
}

/// Echoes the textual form of the key that invoked the command.
fn describe_key<T: Transport>(
    editor: &mut Editor<'_, T>,
    args: &CommandArgs,
) -> Result<CommandOutcome, HandlerFault> {
    let Some(key) = args.key() else {
        return Ok(CommandOutcome::fail("describe-key was not invoked by a key"));
    };
    editor.echo(&format!("{key}"))?;
    Ok(CommandOutcome::success())
}

#[cfg(test)]
mod tests;
