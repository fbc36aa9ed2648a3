//! SQLite backend for the clubhub engagement store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Because every call is serialised onto
//! that thread and each engagement mutation is one transaction, flag flips
//! and counter moves can never interleave.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;


#[cfg(test)]
mod service_tests;
