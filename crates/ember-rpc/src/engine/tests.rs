use ember_protocol::{Message, Request, Response, method};
use serde_json::json;

use super::*;
use crate::dispatch::{CommandArgs, CommandOutcome, HandlerFault, HandlerTable};
use crate::editor::Editor;
use crate::idgen::IdParity;
use crate::testing::ScriptedTransport;

fn request(method: &str, id: i64) -> Message {
    Message::Request(Request {
        method: method.to_owned(),
        params: json!({}),
        id,
    })
}

fn response(id: i64, result: i64) -> Message {
    Message::Response(Response {
        id,
        result,
        string: None,
    })
}

fn succeed<T: Transport>(
    _editor: &mut Editor<'_, T>,
    _args: &CommandArgs,
) -> Result<CommandOutcome, HandlerFault> {
    Ok(CommandOutcome::success())
}

/// Handler that calls back into the host before answering, creating a
/// nested wait inside the dispatch of an already-nested request.
fn nested_probe<T: Transport>(
    editor: &mut Editor<'_, T>,
    _args: &CommandArgs,
) -> Result<CommandOutcome, HandlerFault> {
    let lineno = editor.get_int("lineno", "")?;
    Ok(CommandOutcome::success_with(format!("lineno {lineno}")))
}

fn harness(
    transport: ScriptedTransport,
) -> (Link<ScriptedTransport>, HandlerTable<ScriptedTransport>) {
    (Link::new(transport, IdParity::Even), HandlerTable::new())
}

#[test]
fn invoke_returns_the_matching_reply() {
    let mut transport = ScriptedTransport::new();
    transport.push_message(&response(2, 1));
    let sent = transport.sent_log();

    let (mut link, handlers) = harness(transport);
    let reply =
        invoke(&mut link, &handlers, method::CMD, json!({"name": "foo"})).expect("invoke");

    assert_eq!(
        reply,
        Reply::Success {
            result: 1,
            string: None
        }
    );
    let messages = sent.messages();
    assert_eq!(messages.len(), 1);
    assert!(matches!(
        &messages[0],
        Message::Request(r) if r.id == 2 && r.method == method::CMD
    ));
}

#[test]
fn reentrant_request_is_serviced_before_the_outer_reply() {
    let mut transport = ScriptedTransport::new();
    // The peer calls back into us before answering our call.
    transport.push_message(&request(method::GET, 1));
    transport.push_message(&response(2, 1));
    let sent = transport.sent_log();

    let (mut link, mut handlers) = harness(transport);
    handlers
        .register("get", Box::new(succeed::<ScriptedTransport>))
        .expect("register");

    let reply =
        invoke(&mut link, &handlers, method::CMD, json!({"name": "foo"})).expect("invoke");
    assert_eq!(
        reply,
        Reply::Success {
            result: 1,
            string: None
        }
    );

    let messages = sent.messages();
    assert_eq!(messages.len(), 2);
    // Our call goes out first, then the interleaved request is answered
    // strictly before our own wait resolves.
    assert!(matches!(&messages[0], Message::Request(r) if r.id == 2));
    assert!(matches!(&messages[1], Message::Response(r) if r.id == 1 && r.result == 1));
}

#[test]
fn nested_activations_match_only_their_own_ids() {
    let mut transport = ScriptedTransport::new();
    // While we await id 2, the peer dispatches "probe" into us; the probe
    // handler issues its own call (id 4), and while *that* waits the peer
    // interleaves one more request. The unwind order must be strictly LIFO.
    transport.push_message(&request("probe", 1));
    transport.push_message(&request("ping", 3));
    transport.push_message(&Message::Response(Response {
        id: 4,
        result: 7,
        string: None,
    }));
    transport.push_message(&response(2, 1));
    let sent = transport.sent_log();

    let (mut link, mut handlers) = harness(transport);
    handlers
        .register("probe", Box::new(nested_probe::<ScriptedTransport>))
        .expect("register");
    handlers
        .register("ping", Box::new(succeed::<ScriptedTransport>))
        .expect("register");

    let reply =
        invoke(&mut link, &handlers, method::CMD, json!({"name": "foo"})).expect("invoke");
    assert_eq!(
        reply,
        Reply::Success {
            result: 1,
            string: None
        }
    );

    let messages = sent.messages();
    assert_eq!(messages.len(), 4);
    // cmd call, nested get from the probe handler, then replies unwinding
    // innermost-first.
    assert!(matches!(&messages[0], Message::Request(r) if r.id == 2 && r.method == method::CMD));
    assert!(matches!(&messages[1], Message::Request(r) if r.id == 4 && r.method == method::GET));
    assert!(matches!(&messages[2], Message::Response(r) if r.id == 3));
    assert!(matches!(
        &messages[3],
        Message::Response(r) if r.id == 1 && r.string.as_deref() == Some("lineno 7")
    ));
}

#[test]
fn mismatched_ids_are_discarded_without_corrupting_the_wait() {
    let mut transport = ScriptedTransport::new();
    transport.push_message(&response(99, 1));
    transport.push_message(&response(2, 1));

    let (mut link, handlers) = harness(transport);
    let reply =
        invoke(&mut link, &handlers, method::CMD, json!({"name": "foo"})).expect("invoke");

    assert_eq!(
        reply,
        Reply::Success {
            result: 1,
            string: None
        }
    );
    assert_eq!(link.stats().stray_responses, 1);
}

#[test]
fn error_reply_is_a_normal_terminal_state() {
    let mut transport = ScriptedTransport::new();
    transport.push_message(&Message::Error(ErrorResponse {
        id: 2,
        code: 0,
        message: "command failed".to_owned(),
    }));

    let (mut link, handlers) = harness(transport);
    let reply =
        invoke(&mut link, &handlers, method::CMD, json!({"name": "foo"})).expect("invoke");

    assert_eq!(
        reply,
        Reply::Failure {
            code: 0,
            message: "command failed".to_owned()
        }
    );
}

#[test]
fn eof_during_a_wait_is_fatal() {
    let transport = ScriptedTransport::new();
    let (mut link, handlers) = harness(transport);

    let result = invoke(&mut link, &handlers, method::CMD, json!({"name": "foo"}));
    assert!(matches!(result, Err(RpcError::Disconnected)));
}

#[test]
fn consecutive_calls_allocate_fresh_ids() {
    let mut transport = ScriptedTransport::new();
    transport.push_message(&response(2, 1));
    transport.push_message(&response(4, 1));
    let sent = transport.sent_log();

    let (mut link, handlers) = harness(transport);
    invoke(&mut link, &handlers, method::GET, json!({"name": "lineno"})).expect("first");
    invoke(&mut link, &handlers, method::GET, json!({"name": "offset"})).expect("second");

    let messages = sent.messages();
    assert!(matches!(&messages[0], Message::Request(r) if r.id == 2));
    assert!(matches!(&messages[1], Message::Request(r) if r.id == 4));
}
