//! Handler for `POST /identify`.
//!
//! Body: `{"email": "...", "phoneNumber": "..."}`; either field may be
//! omitted or `null`, but not both. `phoneNumber` is also accepted as a JSON
//! number and converted to its decimal string.

use std::sync::Arc;

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use ident_core::{
  identity::{IdentifyRequest, IdentifyResponse},
  store::ContactStore,
};
use serde::{Deserialize, Deserializer};

use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyBody {
  #[serde(default)]
  pub email:        Option<String>,
  #[serde(default, deserialize_with = "string_or_number")]
  pub phone_number: Option<String>,
}

impl From<IdentifyBody> for IdentifyRequest {
  fn from(b: IdentifyBody) -> Self { IdentifyRequest::new(b.email, b.phone_number) }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PhoneInput {
  Text(String),
  Number(serde_json::Number),
}

fn string_or_number<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(Option::<PhoneInput>::deserialize(d)?.map(|p| match p {
    PhoneInput::Text(s) => s,
    PhoneInput::Number(n) => n.to_string(),
  }))
}

/// `POST /identify` returns the consolidated identity for the fragment.
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  payload: Result<Json<IdentifyBody>, JsonRejection>,
) -> Result<Json<IdentifyResponse>, ApiError>
where
  S: ContactStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let contact = store.identify(IdentifyRequest::from(body)).await?;
  tracing::debug!(primary = %contact.primary_contact_id, "identified contact");
  Ok(Json(IdentifyResponse::from(contact)))
}
