//! Error types for `ident-core`.

use thiserror::Error;

use crate::contact::ContactId;

/// Failure modes of the identity resolver.
///
/// `E` is the error type of the backing store; it is surfaced unchanged in
/// [`ResolveError::Store`] and never retried here.
#[derive(Debug, Error)]
pub enum ResolveError<E> {
  /// Neither an email nor a phone number was supplied.
  #[error("either email or phoneNumber is required")]
  InvalidRequest,

  /// A secondary contact's `linked_id` is missing, dangling, or cyclic.
  #[error("contact {contact_id} has a broken link to {linked_id:?}")]
  BrokenReference {
    contact_id: ContactId,
    linked_id:  Option<ContactId>,
  },

  #[error("store error: {0}")]
  Store(#[source] E),
}

impl<E> ResolveError<E> {
  /// Map the store error type, leaving the resolver variants untouched.
  pub fn map_store<F>(self, f: impl FnOnce(E) -> F) -> ResolveError<F> {
    match self {
      Self::InvalidRequest => ResolveError::InvalidRequest,
      Self::BrokenReference { contact_id, linked_id } => {
        ResolveError::BrokenReference { contact_id, linked_id }
      }
      Self::Store(e) => ResolveError::Store(f(e)),
    }
  }
}

pub type Result<T, E> = std::result::Result<T, ResolveError<E>>;
