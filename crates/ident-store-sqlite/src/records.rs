//! [`SqliteRecords`]: [`ContactRecords`] over one open SQLite connection or
//! transaction.

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use ident_core::{
  contact::{Contact, ContactId, ContactUpdate, NewContact},
  store::ContactRecords,
};

use crate::{
  encode::{CONTACT_COLUMNS, RawContact, encode_dt, encode_precedence},
  Error, Result,
};

/// Borrowed access to the `contacts` table.
///
/// Pass a [`rusqlite::Transaction`] (it derefs to a connection) to make a
/// sequence of calls atomic.
pub struct SqliteRecords<'a> {
  conn: &'a rusqlite::Connection,
}

impl<'a> SqliteRecords<'a> {
  pub fn new(conn: &'a rusqlite::Connection) -> Self { Self { conn } }

  fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Contact>> {
    let mut stmt = self.conn.prepare_cached(sql)?;
    let raws = stmt
      .query_map(params, RawContact::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawContact::into_contact).collect()
  }

  /// Every contact, ascending id.
  pub fn all(&self) -> Result<Vec<Contact>> {
    self.query(
      &format!("SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY id"),
      [],
    )
  }
}

impl ContactRecords for SqliteRecords<'_> {
  type Error = Error;

  fn find_by_value(
    &mut self,
    email: Option<&str>,
    phone_number: Option<&str>,
  ) -> Result<Vec<Contact>> {
    // `col = NULL` is never true, so an absent argument matches nothing.
    self.query(
      &format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts
         WHERE email = ?1 OR phone_number = ?2
         ORDER BY id"
      ),
      rusqlite::params![email, phone_number],
    )
  }

  fn find_by_id(&mut self, id: ContactId) -> Result<Option<Contact>> {
    let raw = self
      .conn
      .query_row(
        &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1"),
        rusqlite::params![id.0],
        RawContact::from_row,
      )
      .optional()?;
    raw.map(RawContact::into_contact).transpose()
  }

  fn find_group(&mut self, primary_id: ContactId) -> Result<Vec<Contact>> {
    self.query(
      &format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts
         WHERE id = ?1 OR linked_id = ?1
         ORDER BY id"
      ),
      rusqlite::params![primary_id.0],
    )
  }

  fn create(&mut self, input: NewContact) -> Result<Contact> {
    let now = Utc::now();
    let at_str = encode_dt(now);

    self.conn.execute(
      "INSERT INTO contacts (
         email, phone_number, linked_id, link_precedence, created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
      rusqlite::params![
        input.email,
        input.phone_number,
        input.linked_id.map(|id| id.0),
        encode_precedence(input.link_precedence),
        at_str,
      ],
    )?;

    Ok(Contact {
      id:              ContactId(self.conn.last_insert_rowid()),
      email:           input.email,
      phone_number:    input.phone_number,
      linked_id:       input.linked_id,
      link_precedence: input.link_precedence,
      created_at:      now,
      updated_at:      now,
    })
  }

  fn update(&mut self, id: ContactId, update: ContactUpdate) -> Result<()> {
    self.conn.execute(
      "UPDATE contacts
       SET link_precedence = COALESCE(?2, link_precedence),
           linked_id       = COALESCE(?3, linked_id),
           updated_at      = ?4
       WHERE id = ?1",
      rusqlite::params![
        id.0,
        update.link_precedence.map(encode_precedence),
        update.linked_id.map(|id| id.0),
        encode_dt(Utc::now()),
      ],
    )?;
    Ok(())
  }

  fn update_many_by_linked_id(
    &mut self,
    old_linked_id: ContactId,
    new_linked_id: ContactId,
  ) -> Result<usize> {
    let touched = self.conn.execute(
      "UPDATE contacts SET linked_id = ?2, updated_at = ?3 WHERE linked_id = ?1",
      rusqlite::params![old_linked_id.0, new_linked_id.0, encode_dt(Utc::now())],
    )?;
    Ok(touched)
  }
}
