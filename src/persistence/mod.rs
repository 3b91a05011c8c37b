//! Persistence layer modules.

pub mod db;
pub mod schema;
pub mod slot_store;

/// Re-export the database pool type for convenience.
pub use sqlx::SqlitePool;
