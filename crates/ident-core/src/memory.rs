//! In-memory [`ContactRecords`] backend.
//!
//! Useful for tests and for embedding the resolver where durability does not
//! matter. Ids come from a counter that only moves forward.

use std::convert::Infallible;

use chrono::Utc;

use crate::{
  contact::{Contact, ContactId, ContactUpdate, NewContact},
  store::ContactRecords,
};

#[derive(Debug, Clone)]
pub struct MemoryRecords {
  /// Kept sorted by id.
  contacts: Vec<Contact>,
  next_id:  i64,
}

impl Default for MemoryRecords {
  fn default() -> Self { Self::new() }
}

impl MemoryRecords {
  pub fn new() -> Self { Self { contacts: Vec::new(), next_id: 1 } }

  /// Seed with existing rows, as loaded from elsewhere. The id counter
  /// resumes after the largest id present.
  pub fn from_contacts(mut contacts: Vec<Contact>) -> Self {
    contacts.sort_by_key(|c| c.id);
    let next_id = contacts.last().map_or(1, |c| c.id.0 + 1);
    Self { contacts, next_id }
  }

  pub fn contacts(&self) -> &[Contact] { &self.contacts }

  pub fn len(&self) -> usize { self.contacts.len() }

  pub fn is_empty(&self) -> bool { self.contacts.is_empty() }

  fn get_mut(&mut self, id: ContactId) -> Option<&mut Contact> {
    self.contacts.iter_mut().find(|c| c.id == id)
  }
}

impl ContactRecords for MemoryRecords {
  type Error = Infallible;

  fn find_by_value(
    &mut self,
    email: Option<&str>,
    phone_number: Option<&str>,
  ) -> Result<Vec<Contact>, Infallible> {
    Ok(
      self
        .contacts
        .iter()
        .filter(|c| {
          email.is_some_and(|e| c.email.as_deref() == Some(e))
            || phone_number.is_some_and(|p| c.phone_number.as_deref() == Some(p))
        })
        .cloned()
        .collect(),
    )
  }

  fn find_by_id(&mut self, id: ContactId) -> Result<Option<Contact>, Infallible> {
    Ok(self.contacts.iter().find(|c| c.id == id).cloned())
  }

  fn find_group(&mut self, primary_id: ContactId) -> Result<Vec<Contact>, Infallible> {
    Ok(
      self
        .contacts
        .iter()
        .filter(|c| c.id == primary_id || c.linked_id == Some(primary_id))
        .cloned()
        .collect(),
    )
  }

  fn create(&mut self, input: NewContact) -> Result<Contact, Infallible> {
    let now = Utc::now();
    let contact = Contact {
      id:              ContactId(self.next_id),
      email:           input.email,
      phone_number:    input.phone_number,
      linked_id:       input.linked_id,
      link_precedence: input.link_precedence,
      created_at:      now,
      updated_at:      now,
    };
    self.next_id += 1;
    self.contacts.push(contact.clone());
    Ok(contact)
  }

  fn update(&mut self, id: ContactId, update: ContactUpdate) -> Result<(), Infallible> {
    if let Some(contact) = self.get_mut(id) {
      if let Some(precedence) = update.link_precedence {
        contact.link_precedence = precedence;
      }
      if let Some(linked_id) = update.linked_id {
        contact.linked_id = Some(linked_id);
      }
      contact.updated_at = Utc::now();
    }
    Ok(())
  }

  fn update_many_by_linked_id(
    &mut self,
    old_linked_id: ContactId,
    new_linked_id: ContactId,
  ) -> Result<usize, Infallible> {
    let now = Utc::now();
    let mut touched = 0;
    for contact in &mut self.contacts {
      if contact.linked_id == Some(old_linked_id) {
        contact.linked_id = Some(new_linked_id);
        contact.updated_at = now;
        touched += 1;
      }
    }
    Ok(touched)
  }
}
