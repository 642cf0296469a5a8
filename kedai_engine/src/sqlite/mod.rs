//! SQLite backend for the Kedai engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
