//! Core types, store traits and the identity resolver for Ident.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; backends plug in through
//! [`store::ContactRecords`] and [`store::ContactStore`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod contact;
pub mod error;
pub mod identity;
pub mod memory;
pub mod resolver;
pub mod store;

pub use error::{ResolveError, Result};
pub use resolver::{resolve, view};
