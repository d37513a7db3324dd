use ember_protocol::{ErrorResponse, Key, Message, Request, Response, Status, method};
use ember_rpc::testing::ScriptedTransport;
use ember_rpc::{IdParity, Session};
use serde_json::{Value, json};

use super::register_all;

fn invocation(name: &str, id: i64, params: Value) -> Message {
    Message::Request(Request {
        method: name.to_owned(),
        params,
        id,
    })
}

fn success(id: i64, result: i64) -> Message {
    Message::Response(Response {
        id,
        result,
        string: None,
    })
}

/// Runs one scripted host conversation through the full serve loop and
/// returns everything the server sent, in order.
fn converse(script: &[Message]) -> Vec<Message> {
    let mut transport = ScriptedTransport::new();
    for message in script {
        transport.push_message(message);
    }
    let sent = transport.sent_log();

    let mut session = Session::new(transport, IdParity::Even);
    register_all(&mut session).expect("register built-ins");
    session.serve().expect("serve to clean shutdown");

    sent.messages()
}

fn request_at(messages: &[Message], index: usize) -> &Request {
    match messages.get(index) {
        Some(Message::Request(request)) => request,
        other => panic!("expected request at {index}, got {other:?}"),
    }
}

#[test]
fn built_ins_register_under_their_names() {
    let mut session = Session::new(ScriptedTransport::new(), IdParity::Even);
    register_all(&mut session).expect("register");
    for name in ["show-dot", "goto-percent", "insert-date", "describe-key"] {
        assert!(session.has_command(name), "{name} should be registered");
    }
}

#[test]
fn show_dot_reads_the_cursor_and_echoes_it() {
    let messages = converse(&[
        invocation("show-dot", 1, json!({})),
        success(2, 12), // get lineno
        success(4, 3),  // get offset
        success(6, 1),  // query-command-exists echo
        success(8, 1),  // cmd echo
    ]);

    assert_eq!(messages.len(), 5);
    assert_eq!(request_at(&messages, 0).method, method::GET);
    assert_eq!(request_at(&messages, 1).method, method::GET);
    assert_eq!(
        request_at(&messages, 2).method,
        method::QUERY_COMMAND_EXISTS
    );
    let echo = request_at(&messages, 3);
    assert_eq!(echo.method, method::CMD);
    assert_eq!(
        echo.params.get("strings"),
        Some(&json!(["Dot at line 12, offset 3"]))
    );
    // The original invocation is answered last, after every nested call.
    assert!(matches!(
        messages.last(),
        Some(Message::Response(r)) if r.id == 1 && r.result == Status::True.code()
    ));
}

#[test]
fn goto_percent_measures_the_buffer_and_repositions() {
    let messages = converse(&[
        invocation("goto-percent", 1, json!({"flag": 1, "prefix": 50})),
        success(2, 1),   // query-command-exists goto-eob
        success(4, 1),   // cmd goto-eob
        success(6, 200), // get lineno at end of buffer
        success(8, 1),   // set lineno
    ]);

    assert_eq!(messages.len(), 5);
    let cmd = request_at(&messages, 1);
    assert_eq!(cmd.method, method::CMD);
    assert_eq!(cmd.params.get("name"), Some(&json!("goto-eob")));
    let set = request_at(&messages, 3);
    assert_eq!(set.method, method::SET);
    assert_eq!(set.params.get("name"), Some(&json!("lineno")));
    assert_eq!(set.params.get("int"), Some(&json!(100)));
    assert!(matches!(
        messages.last(),
        Some(Message::Response(r))
            if r.id == 1 && r.string.as_deref() == Some("line 100 of 200")
    ));
}

#[test]
fn goto_percent_without_a_numeric_argument_fails_cleanly() {
    let messages = converse(&[invocation("goto-percent", 1, json!({}))]);

    assert_eq!(messages.len(), 1);
    match &messages[0] {
        Message::Error(ErrorResponse { id, code, message }) => {
            assert_eq!(*id, 1);
            assert_eq!(*code, Status::False.code());
            assert!(message.contains("numeric argument"));
        }
        other => panic!("expected error response, got {other:?}"),
    }
}

#[test]
fn goto_percent_rejects_out_of_range_percentages() {
    let messages = converse(&[invocation(
        "goto-percent",
        1,
        json!({"flag": 1, "prefix": 250}),
    )]);

    assert!(matches!(
        &messages[0],
        Message::Error(e) if e.code == Status::False.code()
    ));
}

#[test]
fn insert_date_inserts_through_the_property_bridge() {
    let messages = converse(&[
        invocation("insert-date", 1, json!({})),
        success(2, 1), // set insert
    ]);

    assert_eq!(messages.len(), 2);
    let set = request_at(&messages, 0);
    assert_eq!(set.method, method::SET);
    assert_eq!(set.params.get("name"), Some(&json!("insert")));
    let inserted = set
        .params
        .get("string")
        .and_then(Value::as_str)
        .unwrap_or_default();
    assert!(!inserted.is_empty(), "a timestamp should be inserted");
}

#[test]
fn describe_key_renders_the_invoking_key() {
    let messages = converse(&[
        invocation("describe-key", 1, json!({"key": Key::ctrl('j').code()})),
        success(2, 1), // query-command-exists echo
        success(4, 1), // cmd echo
    ]);

    let echo = request_at(&messages, 1);
    assert_eq!(echo.method, method::CMD);
    assert_eq!(echo.params.get("strings"), Some(&json!(["C-J"])));
}

#[test]
fn describe_key_without_a_key_fails_cleanly() {
    let messages = converse(&[invocation("describe-key", 1, json!({}))]);
    assert!(matches!(
        &messages[0],
        Message::Error(e) if e.code == Status::False.code()
    ));
}
