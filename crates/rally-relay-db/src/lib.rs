//! Rally Relay persistence
//!
//! Status checks live in a single append-only `status_checks` table. The
//! store talks to Postgres or SQLite through sqlx's `Any` driver, chosen by
//! the scheme of the connection URL.

pub mod error;
pub mod sql;
pub mod store;

pub use error::{DbError, DbResult};
pub use sql::{resolve_database_url, SqlStatusStore, StoreOptions};
pub use store::{StatusStore, MAX_LIST_LIMIT};

pub use sqlx::Error as SqlxError;
