//! HTTP router tests, driven in-process with `tower::ServiceExt::oneshot`.

#![cfg(feature = "http")]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use arith_mcp::protocol::{Dispatcher, ReinitializePolicy};
use arith_mcp::tools::ToolRegistry;
use arith_mcp::transport::{HttpTransport, TransportOptions};

fn transport() -> HttpTransport {
    HttpTransport::new(Dispatcher::new(Arc::new(ToolRegistry::with_builtin_tools())))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .method("GET")
                .body(Body::empty())
                .expect("request build"),
        )
        .await
        .expect("request execution");
    let status = response.status();
    (status, body_json(response).await)
}

async fn post(app: Router, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .method("POST")
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
                .expect("request build"),
        )
        .await
        .expect("request execution");
    let status = response.status();
    (status, body_json(response).await)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    serde_json::from_slice(&body).expect("JSON body")
}

fn rpc(id: i64, method: &str, params: Value) -> String {
    json!({ "jsonrpc": "2.0", "method": method, "params": params, "id": id }).to_string()
}

#[tokio::test]
async fn health_reports_healthy() {
    let (status, body) = get(transport().router(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn root_without_upgrade_returns_banner() {
    let (status, body) = get(transport().router(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "MCP Calculator Server is running" }));
}

#[tokio::test]
async fn tools_lists_descriptors() {
    let (status, body) = get(transport().router(), "/tools").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["calculator"]["name"], "calculator");
    assert_eq!(
        body["calculator"]["parameters"]["properties"]["operation"]["enum"],
        json!(["add", "subtract", "multiply", "divide"])
    );
}

#[tokio::test]
async fn post_root_auto_initializes() {
    let t = transport();
    let params = json!({ "function_calls": [
        { "name": "calculator", "parameters": { "operation": "add", "numbers": [1, 2, 3] } }
    ]});

    let (status, body) = post(t.router(), "/", rpc(1, "execute", params)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], json!([{ "status": "success", "result": 6 }]));
    assert!(t.session().lock().await.is_initialized());
}

#[tokio::test]
async fn malformed_json_is_parse_error_with_200() {
    let t = transport();

    let (status, body) = post(t.router(), "/", "{oops").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["id"], Value::Null);

    let (status, body) = post(t.router(), "/", vec![0xff_u8, 0xfe]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], -32700);

    // Server keeps answering.
    let (_, body) = post(t.router(), "/", rpc(2, "list_tools", json!({}))).await;
    assert!(body["result"]["calculator"].is_object());
}

#[tokio::test]
async fn unknown_method_is_method_not_found() {
    let (status, body) = post(transport().router(), "/", rpc(5, "frobnicate", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], -32601);
    assert_eq!(body["id"], 5);
}

#[tokio::test]
async fn shutdown_over_http_resets_shared_session() {
    let t = transport();

    let (_, body) = post(t.router(), "/", rpc(1, "initialize", json!({}))).await;
    assert!(body["result"].is_object());

    let (_, body) = post(t.router(), "/", rpc(2, "shutdown", json!({}))).await;
    assert_eq!(body["result"], Value::Null);
    assert!(!t.session().lock().await.is_initialized());

    // POST / self-initializes again on the next call.
    let (_, body) = post(t.router(), "/", rpc(3, "list_tools", json!({}))).await;
    assert!(body["result"]["calculator"].is_object());
}

#[tokio::test]
async fn mcp_endpoint_matches_generic_output() {
    let generic = transport();
    let compat = transport();

    for (id, method, params) in [
        (1, "initialize", json!({})),
        (2, "list_tools", json!({})),
        (3, "execute", json!({ "function_calls": [
            { "name": "calculator", "parameters": { "operation": "divide", "numbers": [10, 2] } }
        ]})),
    ] {
        let (_, expected) = post(generic.router(), "/", rpc(id, method, params.clone())).await;
        let (_, actual) = post(compat.router(), "/mcp", rpc(id, method, params)).await;
        assert_eq!(actual, expected, "method {method}");
    }
}

#[tokio::test]
async fn reject_policy_applies_to_http() {
    let t = HttpTransport::with_options(
        Dispatcher::new(Arc::new(ToolRegistry::with_builtin_tools())),
        TransportOptions {
            reinitialize: ReinitializePolicy::Reject,
            ..TransportOptions::default()
        },
    );

    let (_, body) = post(t.router(), "/", rpc(1, "initialize", json!({}))).await;
    assert!(body["result"].is_object());

    let (_, body) = post(t.router(), "/", rpc(2, "initialize", json!({}))).await;
    assert_eq!(body["error"]["code"], -32600);
    assert_eq!(body["error"]["message"], "Server already initialized");
}
