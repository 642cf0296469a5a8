//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
//!
//! Functions that modify more than one row never open their own transaction. That is the caller's job.
use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod accounts;
pub mod order_history;
pub mod orders;
pub mod payments;
pub mod reports;

/// Opens a bounded connection pool. Foreign keys are enforced on every connection, and a missing database file is
/// created.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true).foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// True if the error is the store rejecting a row because a referenced row does not exist.
pub(crate) fn is_foreign_key_violation(e: &SqlxError) -> bool {
    matches!(e, SqlxError::Database(db) if db.is_foreign_key_violation())
}

pub(crate) fn is_unique_violation(e: &SqlxError) -> bool {
    matches!(e, SqlxError::Database(db) if db.is_unique_violation())
}
