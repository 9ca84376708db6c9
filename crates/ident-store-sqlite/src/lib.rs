//! SQLite backend for the Ident contact store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every resolver call executes inside a
//! single SQLite transaction on that thread.

mod encode;
mod records;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use records::SqliteRecords;
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
