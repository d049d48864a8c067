//! JSON REST API for the Gavel moderation engine.
//!
//! Exposes an axum [`Router`] backed by any
//! [`gavel_core::store::RequestStore`]. Identity is asserted by an upstream
//! proxy via `x-actor-*` headers (see [`claims`]); TLS and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", gavel_api::api_router(store.clone()))
//! ```

pub mod claims;
pub mod error;
pub mod kyc;
pub mod requests;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use gavel_core::store::RequestStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RequestStore + Send + Sync + 'static,
{
  Router::new()
    // Submission and moderation views
    .route(
      "/requests/{kind}",
      get(requests::list::<S>).post(requests::submit::<S>),
    )
    .route("/requests/{kind}/export.csv", get(requests::export_csv::<S>))
    .route("/requests/{kind}/{id}", get(requests::get_one::<S>))
    // Decisions
    .route("/decisions", post(requests::decide_many::<S>))
    .route("/decisions/{id}", put(requests::decide_one::<S>))
    // Materialization retry
    .route("/materializations/{id}", post(requests::materialize_one::<S>))
    // Owner-facing KYC state
    .route("/kyc/status", get(kyc::status::<S>))
    .with_state(store)
}

// ─── Integration tests ───────────────────────────────────────────────────────
