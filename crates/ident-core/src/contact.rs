//! Contact records, the only stored entity.
//!
//! A contact holds at most one email and one phone number. Those values are
//! written once at creation; afterwards only the link fields move, and only
//! when two identity groups are merged.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Identifier ──────────────────────────────────────────────────────────────

/// Store-assigned contact identifier.
///
/// Ids are handed out in strictly increasing creation order, so a smaller id
/// always denotes an older contact.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ContactId(pub i64);

impl fmt::Display for ContactId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl From<i64> for ContactId {
  fn from(id: i64) -> Self { Self(id) }
}

// ─── Precedence ──────────────────────────────────────────────────────────────

/// Whether a contact is the canonical record of its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPrecedence {
  Primary,
  Secondary,
}

impl LinkPrecedence {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Primary => "primary",
      Self::Secondary => "secondary",
    }
  }
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// A persisted contact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
  pub id:              ContactId,
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  /// Set only on secondaries; names the group's primary.
  pub linked_id:       Option<ContactId>,
  pub link_precedence: LinkPrecedence,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

impl Contact {
  pub fn is_primary(&self) -> bool {
    self.link_precedence == LinkPrecedence::Primary
  }

  /// The id of this contact's group primary as recorded on the row itself.
  ///
  /// `None` for a secondary without a link, which is a store-invariant
  /// violation.
  pub fn primary_id(&self) -> Option<ContactId> {
    match self.link_precedence {
      LinkPrecedence::Primary => Some(self.id),
      LinkPrecedence::Secondary => self.linked_id,
    }
  }
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::ContactRecords::create`]. The id and both
/// timestamps are always assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  pub link_precedence: LinkPrecedence,
  pub linked_id:       Option<ContactId>,
}

impl NewContact {
  /// A new group of its own.
  pub fn primary(email: Option<String>, phone_number: Option<String>) -> Self {
    Self {
      email,
      phone_number,
      link_precedence: LinkPrecedence::Primary,
      linked_id: None,
    }
  }

  /// A new member of the group headed by `primary_id`.
  pub fn secondary(
    email: Option<String>,
    phone_number: Option<String>,
    primary_id: ContactId,
  ) -> Self {
    Self {
      email,
      phone_number,
      link_precedence: LinkPrecedence::Secondary,
      linked_id: Some(primary_id),
    }
  }
}

/// Partial update of a contact's link fields. `None` leaves a field as is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactUpdate {
  pub link_precedence: Option<LinkPrecedence>,
  pub linked_id:       Option<ContactId>,
}

impl ContactUpdate {
  /// Demote a primary into the group headed by `survivor`.
  pub fn demote_to(survivor: ContactId) -> Self {
    Self {
      link_precedence: Some(LinkPrecedence::Secondary),
      linked_id:       Some(survivor),
    }
  }
}
