//! Askgate Gateway - the query-answering request pipeline and HTTP surface.
//!
//! This crate provides:
//! - Credential verification (static key and/or signed bearer token)
//! - Admission control (local token bucket or shared fixed-window counter)
//! - The per-request pipeline: authenticate, admit, retrieve, generate
//! - The axum HTTP surface (JSON API, HTML form view, health endpoint)

pub mod auth;
pub mod limit;
pub mod pipeline;
pub mod routes;
pub mod server;
pub mod state;
pub mod ui;

#[cfg(test)]
mod tests;

pub use pipeline::{build_context, AskAnswer, AskPipeline, Credentials};
pub use routes::create_router;
pub use server::serve;
pub use state::AppState;
