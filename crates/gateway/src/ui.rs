//! Browser-facing form view.
//!
//! A thin HTML page over the same pipeline as the JSON API: a question
//! form posts back to `/` and the rendered page shows the answer with
//! its citations. The view carries no credential inputs; it is meant for
//! deployments running in the explicit open mode or behind network-level
//! protection.

use crate::pipeline::{AskAnswer, Credentials};
use crate::routes::ApiError;
use crate::state::AppState;
use askgate_core::{AppError, AppResult};
use axum::{
    extract::{ConnectInfo, Form, State},
    http::StatusCode,
    response::Html,
};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Askgate</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 40px; background: #f8fafc; }
    .container { max-width: 900px; margin: 0 auto; background: white; padding: 24px; border-radius: 12px; box-shadow: 0 6px 20px rgba(0,0,0,0.08); }
    textarea { width: 100%; min-height: 100px; padding: 12px; border-radius: 8px; border: 1px solid #cbd5e1; }
    button { background: #2563eb; color: white; border: none; padding: 10px 16px; border-radius: 8px; cursor: pointer; }
    .answer { margin-top: 20px; padding: 16px; background: #f1f5f9; border-radius: 8px; }
    .citations { margin-top: 12px; font-size: 0.9rem; color: #475569; }
    .error { margin-top: 20px; padding: 16px; background: #fef2f2; color: #b91c1c; border-radius: 8px; }
  </style>
</head>
<body>
  <div class="container">
    <h2>Askgate</h2>
    <form method="post" action="/">
      <label>Ask a question</label>
      <textarea name="question" placeholder="Ask about the data or docs..." required></textarea>
      <br /><br />
      <button type="submit">Ask</button>
    </form>
    {{#if error}}
      <div class="error">{{error}}</div>
    {{/if}}
    {{#if answer}}
      <div class="answer">
        <strong>Answer:</strong>
        <div>{{answer}}</div>
        <div class="citations">
          <strong>Citations:</strong>
          <ul>
            {{#each citations}}
              <li>{{this.name}} - {{this.path}}</li>
            {{/each}}
          </ul>
        </div>
      </div>
    {{/if}}
  </div>
</body>
</html>
"#;

#[derive(Debug, Default, Serialize)]
struct PageData {
    answer: Option<String>,
    citations: Vec<askgate_retrieval::Citation>,
    error: Option<String>,
}

/// Render the page. Handlebars escaping stays on: answers and citations
/// are untrusted text landing in HTML.
fn render_page(data: &PageData) -> AppResult<String> {
    let mut handlebars = Handlebars::new();
    handlebars
        .register_template_string("page", PAGE_TEMPLATE)
        .map_err(|e| AppError::Other(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("page", data)
        .map_err(|e| AppError::Other(format!("Failed to render page: {}", e)))
}

/// Form body for `POST /`.
#[derive(Debug, Deserialize)]
pub struct AskForm {
    pub question: String,
}

/// GET /
pub async fn form_page() -> Result<Html<String>, ApiError> {
    let page = render_page(&PageData::default())?;
    Ok(Html(page))
}

/// POST /
pub async fn form_submit(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Form(form): Form<AskForm>,
) -> Result<(StatusCode, Html<String>), ApiError> {
    let result = state
        .pipeline
        .ask(&form.question, Credentials::default(), &peer.ip().to_string())
        .await;

    let (status, data) = match result {
        Ok(AskAnswer { answer, citations }) => (
            StatusCode::OK,
            PageData {
                answer: Some(answer),
                citations,
                error: None,
            },
        ),
        Err(err) => {
            let err = ApiError(err);
            (
                err.status(),
                PageData {
                    answer: None,
                    citations: Vec::new(),
                    error: Some(err.0.to_string()),
                },
            )
        }
    };

    let page = render_page(&data)?;
    Ok((status, Html(page)))
}
