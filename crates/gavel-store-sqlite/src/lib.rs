//! SQLite backend for the Gavel request store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. Guarded transitions are single
//! conditional `UPDATE` statements, which makes them linearizable: SQLite
//! applies one write at a time, so of two racing decisions exactly one
//! matches the `pending` row.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
