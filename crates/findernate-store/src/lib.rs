//! # findernate-store
//!
//! Small local store for the FinderNate client, backed by SQLite.
//!
//! It plays the role browser local storage plays for the web front-end: a
//! key/value table for session data and cached preferences, plus an
//! append-only signal table that lets separate client processes notify each
//! other (the desktop analog of storage-change events between tabs).

pub mod database;
pub mod kv;
pub mod migrations;
pub mod models;
pub mod signals;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
