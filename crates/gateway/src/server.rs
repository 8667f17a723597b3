//! Server startup.

use crate::routes::create_router;
use crate::state::AppState;
use askgate_core::{AppError, AppResult, GatewayConfig};
use axum::{extract::Request, middleware, response::Response};
use std::net::SocketAddr;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Log one line per request: method, path, status, duration.
async fn log_requests(request: Request, next: middleware::Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}

/// Run the gateway until the process is stopped.
///
/// The configuration must already be validated; wiring failures (bad
/// Redis URL, unbindable address) are fatal here.
pub async fn serve(config: GatewayConfig) -> AppResult<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState::new(config).await?;

    if state.pipeline.auth_is_open() {
        tracing::warn!(
            "No credential mechanism configured: the gateway accepts unauthenticated callers"
        );
    }

    let app = create_router(state)
        .layer(middleware::from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid bind address: {}", e)))?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
