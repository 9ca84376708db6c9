//! Async HTTP client wrapping the ident JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use ident_core::{
  contact::{Contact, ContactId},
  identity::{IdentifyRequest, IdentifyResponse},
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

/// Async HTTP client for the ident JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, base_url: base_url.into() })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url.trim_end_matches('/'), path)
  }

  /// `POST /identify`
  pub async fn identify(&self, request: &IdentifyRequest) -> Result<IdentifyResponse> {
    let resp = self
      .client
      .post(self.url("/identify"))
      .json(request)
      .send()
      .await
      .context("POST /identify failed")?;
    decode(resp, "POST /identify").await
  }

  /// `GET /contacts/<id>`
  pub async fn get_contact(&self, id: ContactId) -> Result<Contact> {
    let path = format!("/contacts/{id}");
    let resp = self
      .client
      .get(self.url(&path))
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;
    decode(resp, &path).await
  }

  /// `GET /contacts/<id>/identity`
  pub async fn identity(&self, id: ContactId) -> Result<IdentifyResponse> {
    let path = format!("/contacts/{id}/identity");
    let resp = self
      .client
      .get(self.url(&path))
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;
    decode(resp, &path).await
  }

  /// `GET /health`
  pub async fn health(&self) -> Result<serde_json::Value> {
    let resp = self
      .client
      .get(self.url("/health"))
      .send()
      .await
      .context("GET /health failed")?;
    decode(resp, "GET /health").await
  }
}

/// Deserialise a success body, or surface the server's `{"error": ...}`.
async fn decode<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
  let status = resp.status();
  if !status.is_success() {
    let message = resp
      .json::<serde_json::Value>()
      .await
      .ok()
      .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
      .unwrap_or_default();
    return Err(anyhow!("{what} → {status} {message}"));
  }
  resp.json().await.with_context(|| format!("deserialising {what}"))
}
