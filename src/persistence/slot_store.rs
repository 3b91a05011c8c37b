//! The shared hand-off store between the operator listener and the
//! HTTP request handlers.
//!
//! Three kinds of state live here, each under a well-known key:
//!
//! - `active_command` — at most one pending [`CommandSlot`], JSON
//!   serialized, with a TTL. Last write wins; read-once.
//! - `awaiting_<name>` — marker rows for text-capture sub-flows, with
//!   their own TTL.
//! - `service_available` — `"True"`/`"False"`, no expiry, defaults to
//!   available when unset.
//!
//! The listener runs in a different task (and possibly a different
//! process) than the request workers, so at-most-once delivery depends
//! on the `take_*` operations being a single atomic read-and-clear.
//! A `SELECT` followed by a `DELETE` would let two concurrent pollers
//! both observe the slot; `DELETE … RETURNING` closes that race.
//!
//! Expiry is evaluated lazily at read time. There is no background
//! sweep, and the store holds no per-visitor keying: exactly one
//! visitor context is live at a time by design.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::models::command::CommandSlot;
use crate::{AppError, Result};

use super::db::Database;

/// Key holding the serialized pending command.
const ACTIVE_COMMAND_KEY: &str = "active_command";

/// Key holding the availability flag.
const AVAILABILITY_KEY: &str = "service_available";

/// TTL-expiring key/value hand-off store backed by `SQLite`.
#[derive(Clone)]
pub struct SlotStore {
    db: Arc<Database>,
}

/// Internal row struct for key/value reads.
#[derive(sqlx::FromRow)]
struct HandoffRow {
    value: String,
    expires_at: Option<String>,
}

impl HandoffRow {
    /// Whether the row's deadline (if any) has passed.
    fn expired(&self, now: DateTime<Utc>) -> bool {
        match &self.expires_at {
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|deadline| deadline.with_timezone(&Utc) <= now)
                .unwrap_or(true),
            None => false,
        }
    }
}

fn marker_key(name: &str) -> String {
    format!("awaiting_{name}")
}

fn deadline(ttl: Duration) -> Result<String> {
    let span = chrono::Duration::from_std(ttl)
        .map_err(|err| AppError::Db(format!("ttl out of range: {err}")))?;
    Ok((Utc::now() + span).to_rfc3339())
}

impl SlotStore {
    /// Create a store handle over the shared pool.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn upsert(&self, key: &str, value: &str, expires_at: Option<String>) -> Result<()> {
        sqlx::query(
            "INSERT INTO handoff (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                            expires_at = excluded.expires_at",
        )
        .bind(key)
        .bind(value)
        .bind(&expires_at)
        .execute(self.db.as_ref())
        .await?;
        Ok(())
    }

    /// Atomically remove and return the row under `key`, if any.
    ///
    /// The row is removed whether or not it has expired; expired rows
    /// are reported as absent.
    async fn take_row(&self, key: &str) -> Result<Option<HandoffRow>> {
        let row: Option<HandoffRow> =
            sqlx::query_as("DELETE FROM handoff WHERE key = ?1 RETURNING value, expires_at")
                .bind(key)
                .fetch_optional(self.db.as_ref())
                .await?;

        Ok(row.filter(|r| !r.expired(Utc::now())))
    }

    /// Non-destructive read of the row under `key`; expired rows read
    /// as absent.
    async fn peek_row(&self, key: &str) -> Result<Option<HandoffRow>> {
        let row: Option<HandoffRow> =
            sqlx::query_as("SELECT value, expires_at FROM handoff WHERE key = ?1")
                .bind(key)
                .fetch_optional(self.db.as_ref())
                .await?;

        Ok(row.filter(|r| !r.expired(Utc::now())))
    }

    /// Store `slot` as the pending command, unconditionally replacing
    /// any existing one. Expiry is `now + ttl`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if serialization or the write fails.
    pub async fn put_command(&self, slot: &CommandSlot, ttl: Duration) -> Result<()> {
        let value = serde_json::to_string(slot)
            .map_err(|err| AppError::Db(format!("failed to serialize slot: {err}")))?;
        self.upsert(ACTIVE_COMMAND_KEY, &value, Some(deadline(ttl)?))
            .await
    }

    /// Return and delete the pending command, if one exists and has not
    /// expired. A second call without an intervening write returns
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the read or deserialization fails.
    pub async fn take_command(&self) -> Result<Option<CommandSlot>> {
        match self.take_row(ACTIVE_COMMAND_KEY).await? {
            Some(row) => {
                let slot: CommandSlot = serde_json::from_str(&row.value)
                    .map_err(|err| AppError::Db(format!("corrupt slot value: {err}")))?;
                Ok(Some(slot))
            }
            None => Ok(None),
        }
    }

    /// Set the awaiting marker `name` with expiry `now + ttl`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the write fails.
    pub async fn set_awaiting(&self, name: &str, ttl: Duration) -> Result<()> {
        self.upsert(&marker_key(name), "true", Some(deadline(ttl)?))
            .await
    }

    /// Whether the awaiting marker `name` is currently set. Does not
    /// consume the marker.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the read fails.
    pub async fn is_awaiting(&self, name: &str) -> Result<bool> {
        Ok(self.peek_row(&marker_key(name)).await?.is_some())
    }

    /// Atomically consume the awaiting marker `name`. Returns whether
    /// it was set (and unexpired).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the read fails.
    pub async fn take_awaiting(&self, name: &str) -> Result<bool> {
        Ok(self.take_row(&marker_key(name)).await?.is_some())
    }

    /// Remove the awaiting marker `name` without reading it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn clear_awaiting(&self, name: &str) -> Result<()> {
        sqlx::query("DELETE FROM handoff WHERE key = ?1")
            .bind(marker_key(name))
            .execute(self.db.as_ref())
            .await?;
        Ok(())
    }

    /// Read the availability flag. Defaults to available when unset or
    /// holding an unrecognized value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the read fails.
    pub async fn get_availability(&self) -> Result<bool> {
        Ok(match self.peek_row(AVAILABILITY_KEY).await? {
            Some(row) => row.value != "False",
            None => true,
        })
    }

    /// Write the availability flag. No expiry; persists until toggled.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the write fails.
    pub async fn set_availability(&self, available: bool) -> Result<()> {
        let value = if available { "True" } else { "False" };
        self.upsert(AVAILABILITY_KEY, value, None).await
    }
}
