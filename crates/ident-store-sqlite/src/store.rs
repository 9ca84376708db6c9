//! [`SqliteStore`]: the SQLite implementation of [`ContactStore`].

use std::{path::Path, time::Duration};

use rusqlite::TransactionBehavior;

use ident_core::{
  ResolveError,
  contact::{Contact, ContactId},
  identity::{ConsolidatedContact, IdentifyRequest},
  resolver,
  store::{ContactRecords as _, ContactStore},
};

use crate::{records::SqliteRecords, schema::SCHEMA, Error, Result};

/// How long a writer waits on a lock held by another connection to the same
/// file before failing with `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// An identity store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All clones
/// share one background thread, so calls are executed one at a time.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ContactStore impl ───────────────────────────────────────────────────────

impl ContactStore for SqliteStore {
  type Error = Error;

  async fn identify(
    &self,
    request: IdentifyRequest,
  ) -> Result<ConsolidatedContact, ResolveError<Error>> {
    let request = request.normalized();
    if request.is_empty() {
      return Err(ResolveError::InvalidRequest);
    }

    // IMMEDIATE takes the write lock before the first lookup, so two
    // requests can never both decide that an email is unknown.
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut records = SqliteRecords::new(&tx);
        let outcome = resolver::resolve(&mut records, &request);
        if outcome.is_ok() {
          tx.commit()?;
        }
        // Dropping `tx` without commit rolls back any partial merge.
        Ok(outcome)
      })
      .await
      .map_err(|e| ResolveError::Store(Error::Database(e)))?;

    if let Err(e) = &outcome {
      tracing::warn!(error = %e, "identify rolled back");
    }
    outcome
  }

  async fn get_contact(&self, id: ContactId) -> Result<Option<Contact>> {
    self
      .conn
      .call(move |conn| Ok(SqliteRecords::new(conn).find_by_id(id)))
      .await?
  }

  async fn list_contacts(&self) -> Result<Vec<Contact>> {
    self
      .conn
      .call(|conn| Ok(SqliteRecords::new(conn).all()))
      .await?
  }

  async fn identity_of(
    &self,
    id: ContactId,
  ) -> Result<Option<ConsolidatedContact>, ResolveError<Error>> {
    self
      .conn
      .call(move |conn| {
        // Deferred: a consistent snapshot without blocking writers elsewhere.
        let tx = conn.transaction()?;
        let view = resolver::view(&mut SqliteRecords::new(&tx), id);
        Ok(view)
      })
      .await
      .map_err(|e| ResolveError::Store(Error::Database(e)))?
  }
}
