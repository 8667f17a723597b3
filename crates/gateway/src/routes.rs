//! HTTP routes and error mapping.

use crate::pipeline::{AskAnswer, Credentials};
use crate::state::AppState;
use crate::ui;
use askgate_core::AppError;
use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;

/// Create the gateway router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ask", post(ask))
        .route("/", get(ui::form_page).post(ui::form_submit))
        .route("/health", get(health))
        .with_state(state)
}

/// JSON request body for `POST /ask`.
#[derive(Debug, Deserialize)]
pub struct AskBody {
    pub question: String,
}

/// POST /ask
async fn ask(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<AskBody>,
) -> Result<Json<AskAnswer>, ApiError> {
    let credentials = Credentials {
        api_key: header_str(&headers, "x-api-key"),
        authorization: header_str(&headers, "authorization"),
    };

    let answer = state
        .pipeline
        .ask(&body.question, credentials, &peer.ip().to_string())
        .await?;

    Ok(Json(answer))
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Error wrapper mapping the taxonomy onto stable response statuses, so
/// callers can tell "fix your request" from "try again later" from
/// "backend is down".
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    /// Stable status for each error kind.
    pub fn status(&self) -> StatusCode {
        self.status_and_kind().0
    }

    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            AppError::Auth(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            AppError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_failure"),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "misconfiguration"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        let body = serde_json::json!({
            "error": {
                "message": self.0.to_string(),
                "type": kind,
            }
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            status_of(AppError::Auth("unauthorized".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Validation("empty".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(AppError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            status_of(AppError::Upstream("timeout".to_string())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(AppError::Config("missing".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
