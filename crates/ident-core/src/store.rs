//! The store traits the resolver runs against.
//!
//! [`ContactRecords`] is the synchronous, per-transaction view a backend hands
//! to the resolver. [`ContactStore`] is the async façade that higher layers
//! (`ident-api`, `ident-server`) depend on; implementations are expected to
//! run each `identify` call as one atomic unit over a `ContactRecords`.

use std::future::Future;

use crate::{
  contact::{Contact, ContactId, ContactUpdate, NewContact},
  error::ResolveError,
  identity::{ConsolidatedContact, IdentifyRequest},
};

// ─── Records ─────────────────────────────────────────────────────────────────

/// Keyed access to contact rows within a single unit of work.
///
/// All list-returning methods yield contacts in ascending creation order.
pub trait ContactRecords {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Contacts whose email equals `email` OR whose phone equals
  /// `phone_number`. An absent argument matches nothing.
  fn find_by_value(
    &mut self,
    email: Option<&str>,
    phone_number: Option<&str>,
  ) -> Result<Vec<Contact>, Self::Error>;

  fn find_by_id(&mut self, id: ContactId) -> Result<Option<Contact>, Self::Error>;

  /// The primary `primary_id` plus every contact linking to it.
  fn find_group(&mut self, primary_id: ContactId) -> Result<Vec<Contact>, Self::Error>;

  /// Persist a new contact. The assigned id must be greater than every id
  /// handed out before.
  fn create(&mut self, input: NewContact) -> Result<Contact, Self::Error>;

  fn update(&mut self, id: ContactId, update: ContactUpdate) -> Result<(), Self::Error>;

  /// Point every contact linked to `old_linked_id` at `new_linked_id`.
  /// Returns the number of rows touched.
  fn update_many_by_linked_id(
    &mut self,
    old_linked_id: ContactId,
    new_linked_id: ContactId,
  ) -> Result<usize, Self::Error>;
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Abstraction over an identity store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ContactStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Reconcile `request` against the stored contacts and return the
  /// consolidated identity. Every read and write happens in one atomic unit;
  /// on error nothing is persisted.
  fn identify(
    &self,
    request: IdentifyRequest,
  ) -> impl Future<Output = Result<ConsolidatedContact, ResolveError<Self::Error>>>
  + Send
  + '_;

  /// Retrieve a contact by id. Returns `None` if not found.
  fn get_contact(
    &self,
    id: ContactId,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// All contacts in ascending id order.
  fn list_contacts(
    &self,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;

  /// The consolidated identity of the group containing `id`, without
  /// recording anything new. Returns `None` if the contact does not exist.
  fn identity_of(
    &self,
    id: ContactId,
  ) -> impl Future<
    Output = Result<Option<ConsolidatedContact>, ResolveError<Self::Error>>,
  > + Send
  + '_;
}
