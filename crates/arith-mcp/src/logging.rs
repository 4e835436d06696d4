//! Tracing setup and HTTP request logging.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `level`.
///
/// Output goes to stderr: stdout belongs to the stdio transport.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Logs one summary line per HTTP request.
#[cfg(feature = "http")]
pub async fn request_logging_middleware(
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started_at = std::time::Instant::now();

    let response = next.run(request).await;
    let status = response.status();

    tracing::info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = started_at.elapsed().as_millis() as u64,
        "request summary"
    );

    if status == axum::http::StatusCode::REQUEST_TIMEOUT {
        tracing::warn!(method = %method, path = %path, "request timed out");
    }

    response
}
