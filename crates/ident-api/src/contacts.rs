//! Handlers for `/contacts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/contacts` | All contacts, ascending id |
//! | `GET`  | `/contacts/:id` | 404 if not found |
//! | `GET`  | `/contacts/:id/identity` | Consolidated view of the contact's group |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use ident_core::{
  contact::{Contact, ContactId},
  identity::IdentifyResponse,
  store::ContactStore,
};

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /contacts`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Contact>>, ApiError>
where
  S: ContactStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let contacts = store.list_contacts().await.map_err(ApiError::store)?;
  Ok(Json(contacts))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /contacts/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<ContactId>,
) -> Result<Json<Contact>, ApiError>
where
  S: ContactStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let contact = store
    .get_contact(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("contact {id} not found")))?;
  Ok(Json(contact))
}

// ─── Identity ─────────────────────────────────────────────────────────────────

/// `GET /contacts/:id/identity`
pub async fn identity<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<ContactId>,
) -> Result<Json<IdentifyResponse>, ApiError>
where
  S: ContactStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let contact = store
    .identity_of(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("contact {id} not found")))?;
  Ok(Json(IdentifyResponse::from(contact)))
}
