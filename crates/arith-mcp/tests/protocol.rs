//! Dispatcher and session state machine tests.

use std::sync::Arc;

use serde_json::{json, Value};

use arith_mcp::protocol::{Control, Dispatch, Dispatcher, ReinitializePolicy, SessionPolicy, SessionState};
use arith_mcp::tools::{Tool, ToolError, ToolRegistry};
use arith_mcp::types::*;

// ─────────────────────── helpers ───────────────────────

fn dispatcher() -> Dispatcher {
    Dispatcher::new(Arc::new(ToolRegistry::with_builtin_tools()))
}

fn request(id: i64, method: &str, params: Value) -> Value {
    let mut msg = json!({ "jsonrpc": "2.0", "id": id, "method": method });
    if !params.is_null() {
        msg["params"] = params;
    }
    msg
}

fn calc(operation: &str, numbers: Value) -> Value {
    json!({ "name": "calculator", "parameters": { "operation": operation, "numbers": numbers } })
}

fn send(d: &Dispatcher, state: &mut SessionState, policy: &SessionPolicy, msg: Value) -> Dispatch {
    d.handle_value(state, msg, policy)
}

fn result(dispatch: &Dispatch) -> &Value {
    dispatch.response.result().expect("expected a result")
}

fn error_code(dispatch: &Dispatch) -> i32 {
    dispatch.response.error().expect("expected an error").code
}

fn initialized(d: &Dispatcher, policy: &SessionPolicy) -> SessionState {
    let mut state = SessionState::new();
    let out = send(d, &mut state, policy, request(0, "initialize", Value::Null));
    assert!(!out.response.is_error());
    state
}

// ─────────────────────── handshake ───────────────────────

#[test]
fn initialize_reports_tools() {
    let d = dispatcher();
    let mut state = SessionState::new();
    let out = send(
        &d,
        &mut state,
        &SessionPolicy::strict(),
        request(1, "initialize", json!({ "client_name": "tester" })),
    );

    let result = result(&out);
    assert_eq!(result["name"], SERVER_NAME);
    assert_eq!(result["version"], SERVER_VERSION);
    assert_eq!(
        result["capabilities"]["tools"]["calculator"]["description"],
        "A basic calculator that can perform arithmetic operations"
    );
    assert_eq!(out.response.id, Some(RequestId::Number(1)));
    assert!(state.is_initialized());
    assert_eq!(state.client_info.as_ref().unwrap()["client_name"], "tester");
}

#[test]
fn methods_before_initialize_are_rejected() {
    let d = dispatcher();
    let policy = SessionPolicy::strict();
    let mut state = SessionState::new();

    for method in ["list_tools", "execute", "shutdown", "nope"] {
        let out = send(&d, &mut state, &policy, request(7, method, Value::Null));
        assert_eq!(error_code(&out), -32002, "method {method}");
        assert_eq!(out.response.error().unwrap().message, "Server not initialized");
        assert_eq!(out.response.id, Some(RequestId::Number(7)));
    }
}

#[test]
fn list_tools_matches_registry() {
    let d = dispatcher();
    let policy = SessionPolicy::strict();
    let mut state = initialized(&d, &policy);

    let out = send(&d, &mut state, &policy, request(2, "list_tools", Value::Null));
    let expected = serde_json::to_value(d.registry().describe_all()).unwrap();
    assert_eq!(result(&out), &expected);
    assert_eq!(result(&out).as_object().unwrap().len(), 1);
}

#[test]
fn unknown_method_keeps_id() {
    let d = dispatcher();
    let policy = SessionPolicy::strict();
    let mut state = initialized(&d, &policy);

    let mut msg = request(0, "frobnicate", Value::Null);
    msg["id"] = json!("abc");
    let out = send(&d, &mut state, &policy, msg);
    assert_eq!(error_code(&out), -32601);
    assert_eq!(out.response.id, Some(RequestId::String("abc".into())));
}

#[test]
fn shutdown_then_list_tools_is_not_initialized() {
    let d = dispatcher();
    let policy = SessionPolicy::strict();
    let mut state = initialized(&d, &policy);

    let out = send(&d, &mut state, &policy, request(3, "shutdown", Value::Null));
    assert_eq!(out.control, Control::Shutdown);
    assert_eq!(result(&out), &Value::Null);
    assert!(!state.is_initialized());

    let out = send(&d, &mut state, &policy, request(4, "list_tools", Value::Null));
    assert_eq!(error_code(&out), -32002);
    assert_eq!(out.control, Control::Continue);
}

// ─────────────────────── re-initialize ───────────────────────

#[test]
fn reinitialize_policy_reinitialize() {
    let d = dispatcher();
    let policy = SessionPolicy::strict().with_reinitialize(ReinitializePolicy::Reinitialize);
    let mut state = initialized(&d, &policy);

    let out = send(&d, &mut state, &policy, request(5, "initialize", json!({ "client_name": "again" })));
    assert_eq!(result(&out)["name"], SERVER_NAME);
    assert_eq!(state.client_info.as_ref().unwrap()["client_name"], "again");
}

#[test]
fn reinitialize_policy_reject() {
    let d = dispatcher();
    let policy = SessionPolicy::strict().with_reinitialize(ReinitializePolicy::Reject);
    let mut state = initialized(&d, &policy);

    let out = send(&d, &mut state, &policy, request(5, "initialize", Value::Null));
    assert_eq!(error_code(&out), -32600);
    assert_eq!(out.response.error().unwrap().message, "Server already initialized");
    assert!(state.is_initialized());
}

#[test]
fn reinitialize_policy_ignore() {
    let d = dispatcher();
    let policy = SessionPolicy::strict().with_reinitialize(ReinitializePolicy::Ignore);
    let mut state = initialized(&d, &policy);

    let out = send(&d, &mut state, &policy, request(5, "initialize", Value::Null));
    assert_eq!(error_code(&out), -32601);
    assert!(state.is_initialized());
}

#[test]
fn default_policy_reinitializes() {
    assert_eq!(ReinitializePolicy::default(), ReinitializePolicy::Reinitialize);
}

// ─────────────────────── execute ───────────────────────

#[test]
fn execute_returns_one_entry_per_call_in_order() {
    let d = dispatcher();
    let policy = SessionPolicy::strict();
    let mut state = initialized(&d, &policy);

    let calls = json!({ "function_calls": [
        calc("add", json!([1, 2, 3])),
        calc("subtract", json!([10, 3, 2])),
        calc("divide", json!([10, 0, 2])),
        { "name": "missing", "parameters": {} },
        calc("multiply", json!([2, 3, 4])),
        calc("divide", json!([10, 2])),
        calc("add", json!([1])),
        calc("modulo", json!([1, 2])),
    ]});
    let out = send(&d, &mut state, &policy, request(6, "execute", calls));
    let entries = result(&out).as_array().unwrap();

    assert_eq!(entries.len(), 8);
    assert_eq!(entries[0], json!({ "status": "success", "result": 6 }));
    assert_eq!(entries[1], json!({ "status": "success", "result": 5 }));
    assert_eq!(
        entries[2],
        json!({ "status": "error", "error": "Division by zero is not allowed" })
    );
    assert_eq!(
        entries[3],
        json!({ "status": "error", "error": "Tool 'missing' not found" })
    );
    assert_eq!(entries[4], json!({ "status": "success", "result": 24 }));
    assert_eq!(entries[5], json!({ "status": "success", "result": 5.0 }));
    assert_eq!(
        entries[6],
        json!({ "status": "error", "error": "At least two numbers are required" })
    );
    assert_eq!(
        entries[7],
        json!({ "status": "error", "error": "Unknown operation: modulo" })
    );
}

#[test]
fn execute_with_bad_params_is_invalid_params() {
    let d = dispatcher();
    let policy = SessionPolicy::strict();
    let mut state = initialized(&d, &policy);

    for params in [
        Value::Null,
        json!({}),
        json!({ "function_calls": [] }),
        json!({ "function_calls": "add" }),
        json!({ "function_calls": [{ "parameters": {} }] }),
    ] {
        let out = send(&d, &mut state, &policy, request(8, "execute", params.clone()));
        assert_eq!(error_code(&out), -32602, "params {params}");
    }
}

struct Explodes;

impl Tool for Explodes {
    fn name(&self) -> &str {
        "explodes"
    }

    fn describe(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "explodes".into(),
            description: "Always panics".into(),
            parameters: json!({ "type": "object" }),
        }
    }

    fn invoke(&self, _params: Value) -> Result<Value, ToolError> {
        panic!("boom")
    }
}

#[test]
fn panicking_tool_does_not_affect_siblings() {
    let mut registry = ToolRegistry::with_builtin_tools();
    registry.register(Explodes);
    let d = Dispatcher::new(Arc::new(registry));

    let calls: Vec<FunctionCall> = serde_json::from_value(json!([
        { "name": "explodes", "parameters": {} },
        calc("add", json!([2, 2])),
    ]))
    .unwrap();
    let results = d.execute_calls(&calls);

    assert_eq!(results.len(), 2);
    assert!(!results[0].is_success());
    assert_eq!(results[1], ToolCallResult::success(json!(4)));
}

// ─────────────────────── malformed envelopes ───────────────────────

#[test]
fn malformed_json_is_parse_error_with_null_id() {
    let d = dispatcher();
    let policy = SessionPolicy::strict();
    let mut state = SessionState::new();

    for text in ["{not json", "[1,2]", "42", r#"{"jsonrpc":"1.0","method":"x","id":1}"#, r#"{"jsonrpc":"2.0","id":1}"#] {
        let out = d.handle_text(&mut state, text, &policy);
        assert_eq!(error_code(&out), -32700, "input {text}");
        assert_eq!(out.response.id, None);
        assert_eq!(out.response.to_value()["id"], Value::Null);
    }

    // Still usable afterwards.
    let out = send(&d, &mut state, &policy, request(1, "initialize", Value::Null));
    assert!(!out.response.is_error());
}

// ─────────────────────── relaxed policies ───────────────────────

#[test]
fn auto_policy_initializes_on_first_call() {
    let d = dispatcher();
    let policy = SessionPolicy::auto();
    let mut state = SessionState::new();

    let out = send(
        &d,
        &mut state,
        &policy,
        request(1, "execute", json!({ "function_calls": [calc("add", json!([1, 2]))] })),
    );
    assert_eq!(result(&out)[0], json!({ "status": "success", "result": 3 }));
    assert!(state.is_initialized());
    assert!(state.client_info.is_none());
}

#[test]
fn compat_output_equals_generic_output() {
    let d = dispatcher();
    let strict = SessionPolicy::strict();
    let compat = SessionPolicy::compat();

    let mut generic = initialized(&d, &strict);
    let mut fresh = SessionState::new();

    for msg in [
        request(1, "initialize", Value::Null),
        request(2, "list_tools", Value::Null),
        request(3, "execute", json!({ "function_calls": [calc("multiply", json!([2, 3, 4]))] })),
    ] {
        let expected = send(&d, &mut generic, &strict, msg.clone());
        let actual = send(&d, &mut fresh, &compat, msg);
        assert_eq!(actual.response, expected.response);
    }
}

#[test]
fn compat_list_tools_works_after_shutdown() {
    let d = dispatcher();
    let compat = SessionPolicy::compat();
    let mut state = SessionState::new();

    let out = send(&d, &mut state, &compat, request(1, "shutdown", Value::Null));
    assert_eq!(out.control, Control::Shutdown);

    let out = send(&d, &mut state, &compat, request(2, "list_tools", Value::Null));
    assert!(result(&out).get("calculator").is_some());
}
