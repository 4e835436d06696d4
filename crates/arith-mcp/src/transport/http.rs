//! HTTP transport: JSON-RPC over POST, WebSocket upgrades, and metadata
//! endpoints.

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ws::WebSocketUpgrade, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

use crate::logging::request_logging_middleware;
use crate::protocol::{Control, Dispatcher, SessionPolicy, SessionState, SharedSession};
use crate::types::{McpError, McpResult};

use super::{ws, TransportOptions};

/// Shared server state passed to all handlers via axum State.
pub struct ServerState {
    pub dispatcher: Dispatcher,
    /// The HTTP endpoints' session. WebSocket connections get their own.
    pub session: SharedSession,
    pub options: TransportOptions,
}

/// HTTP + WebSocket transport.
pub struct HttpTransport {
    state: Arc<ServerState>,
}

impl HttpTransport {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self::with_options(dispatcher, TransportOptions::default())
    }

    pub fn with_options(dispatcher: Dispatcher, options: TransportOptions) -> Self {
        Self {
            state: Arc::new(ServerState {
                dispatcher,
                session: SessionState::shared(),
                options,
            }),
        }
    }

    pub fn session(&self) -> SharedSession {
        self.state.session.clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(handle_root).post(handle_rpc))
            .route("/mcp", get(handle_mcp_upgrade).post(handle_mcp_rpc))
            .route("/tools", get(handle_tools))
            .route("/health", get(handle_health))
            .layer(
                ServiceBuilder::new()
                    .layer(middleware::from_fn(request_logging_middleware))
                    .layer(CorsLayer::permissive())
                    .layer(TimeoutLayer::new(self.state.options.request_timeout)),
            )
            .with_state(self.state.clone())
    }

    /// Bind `addr` and serve until Ctrl-C / SIGTERM.
    pub async fn run(&self, addr: &str) -> McpResult<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(McpError::Io)?;

        tracing::info!("HTTP transport listening on {addr}");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `signal` resolves, then drain
    /// in-flight requests.
    pub async fn serve<F>(&self, listener: tokio::net::TcpListener, signal: F) -> McpResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| McpError::Transport(e.to_string()))?;

        tracing::info!("HTTP transport stopped");
        Ok(())
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}

/// `GET /`: WebSocket upgrade if requested, banner otherwise.
async fn handle_root(
    State(state): State<Arc<ServerState>>,
    upgrade: Option<WebSocketUpgrade>,
) -> Response {
    match upgrade {
        Some(upgrade) => {
            let policy = state.options.policy(SessionPolicy::auto());
            upgrade_session(upgrade, &state, policy, SessionState::new())
        }
        None => Json(json!({ "message": "MCP Calculator Server is running" })).into_response(),
    }
}

/// `GET /mcp`: compatibility WebSocket, initialized from connection open.
async fn handle_mcp_upgrade(
    State(state): State<Arc<ServerState>>,
    upgrade: WebSocketUpgrade,
) -> Response {
    let policy = state.options.policy(SessionPolicy::compat());
    upgrade_session(upgrade, &state, policy, SessionState::preinitialized())
}

fn upgrade_session(
    upgrade: WebSocketUpgrade,
    state: &ServerState,
    policy: SessionPolicy,
    session: SessionState,
) -> Response {
    let dispatcher = state.dispatcher.clone();
    let idle_timeout = state.options.idle_timeout;
    upgrade
        .on_upgrade(move |socket| {
            ws::run_connection(socket, dispatcher, policy, session, idle_timeout)
        })
        .into_response()
}

/// `POST /`: generic dispatch, self-initializing on the first call.
async fn handle_rpc(State(state): State<Arc<ServerState>>, body: Bytes) -> Response {
    let policy = state.options.policy(SessionPolicy::auto());
    dispatch_body(&state, &body, &policy).await
}

/// `POST /mcp`: compatibility dispatch.
async fn handle_mcp_rpc(State(state): State<Arc<ServerState>>, body: Bytes) -> Response {
    let policy = state.options.policy(SessionPolicy::compat());
    dispatch_body(&state, &body, &policy).await
}

async fn dispatch_body(state: &ServerState, body: &[u8], policy: &SessionPolicy) -> Response {
    let text = match std::str::from_utf8(body) {
        Ok(text) => text,
        Err(e) => {
            let response = McpError::ParseError(e.to_string()).to_response(None);
            return (StatusCode::OK, Json(response)).into_response();
        }
    };

    let dispatch = {
        let mut session = state.session.lock().await;
        state.dispatcher.handle_text(&mut session, text, policy)
    };

    if dispatch.control == Control::Shutdown {
        tracing::info!("Shutdown over HTTP; session reset");
    }

    (StatusCode::OK, Json(dispatch.response)).into_response()
}

/// `GET /tools`: descriptor of every registered tool.
async fn handle_tools(State(state): State<Arc<ServerState>>) -> Response {
    Json(state.dispatcher.registry().describe_all()).into_response()
}

/// `GET /health`.
async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}
