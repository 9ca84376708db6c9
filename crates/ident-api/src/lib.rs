//! JSON REST API for Ident.
//!
//! Exposes an axum [`Router`] backed by any [`ident_core::store::ContactStore`].
//! TLS, CORS policy and listener setup are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = ident_api::api_router(store.clone());
//! axum::serve(listener, app).await?;
//! ```

pub mod contacts;
pub mod error;
pub mod health;
pub mod identify;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use ident_core::store::ContactStore;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ContactStore + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route("/identify", post(identify::handler::<S>))
    .route("/health", get(health::handler))
    // Contacts
    .route("/contacts", get(contacts::list::<S>))
    .route("/contacts/{id}", get(contacts::get_one::<S>))
    .route("/contacts/{id}/identity", get(contacts::identity::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────
