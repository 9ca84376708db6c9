//! Requests and the consolidated identity view.
//!
//! The consolidated view is never stored; it is always derived from the
//! current members of a group.

use serde::{Deserialize, Serialize};

use crate::contact::{Contact, ContactId};

// ─── Request ─────────────────────────────────────────────────────────────────

/// An incoming contact fragment to reconcile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyRequest {
  pub email:        Option<String>,
  pub phone_number: Option<String>,
}

impl IdentifyRequest {
  /// Build a request, treating empty values as absent.
  pub fn new(email: Option<String>, phone_number: Option<String>) -> Self {
    Self {
      email:        email.filter(|s| !s.is_empty()),
      phone_number: phone_number.filter(|s| !s.is_empty()),
    }
  }

  /// Re-apply the emptiness rule, e.g. after deserialising.
  pub fn normalized(self) -> Self { Self::new(self.email, self.phone_number) }

  pub fn is_empty(&self) -> bool {
    self.email.is_none() && self.phone_number.is_none()
  }

  pub fn email(&self) -> Option<&str> { self.email.as_deref() }

  pub fn phone_number(&self) -> Option<&str> { self.phone_number.as_deref() }
}

// ─── Consolidated view ───────────────────────────────────────────────────────

/// Everything known about one identity group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedContact {
  pub primary_contact_id:    ContactId,
  /// Primary's email first, then secondaries' in creation order; no repeats.
  pub emails:                Vec<String>,
  pub phone_numbers:         Vec<String>,
  pub secondary_contact_ids: Vec<ContactId>,
}

/// Response envelope for an identify call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyResponse {
  pub contact: ConsolidatedContact,
}

impl From<ConsolidatedContact> for IdentifyResponse {
  fn from(contact: ConsolidatedContact) -> Self { Self { contact } }
}

/// Fold the members of one group into a [`ConsolidatedContact`].
///
/// `group` must be in ascending creation order. Returns `None` when it holds
/// no primary contact.
pub fn consolidate(group: &[Contact]) -> Option<ConsolidatedContact> {
  let primary = group.iter().find(|c| c.is_primary())?;
  let secondaries: Vec<&Contact> = group
    .iter()
    .filter(|c| !c.is_primary() && c.linked_id == Some(primary.id))
    .collect();

  let ordered = || std::iter::once(primary).chain(secondaries.iter().copied());

  Some(ConsolidatedContact {
    primary_contact_id:    primary.id,
    emails:                dedup_in_order(ordered().map(|c| c.email.as_deref())),
    phone_numbers:         dedup_in_order(
      ordered().map(|c| c.phone_number.as_deref()),
    ),
    secondary_contact_ids: secondaries.iter().map(|c| c.id).collect(),
  })
}

/// Keep the first occurrence of each non-empty value.
fn dedup_in_order<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
  let mut out: Vec<String> = Vec::new();
  for value in values.flatten() {
    if !value.is_empty() && !out.iter().any(|v| v == value) {
      out.push(value.to_owned());
    }
  }
  out
}
