//! The pending-command slot handed from the operator listener to the
//! polling visitor page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single pending command awaiting pickup by the visitor's poll loop.
///
/// At most one slot exists at a time; a newer write replaces an unread
/// older one. The display `message` is copied from the catalog at write
/// time so the poll response is self-contained.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandSlot {
    /// Catalog identifier of the issued command.
    pub command: String,
    /// Visitor-facing display text, possibly empty for trigger commands.
    pub message: String,
    /// Optional free-text payload captured from the operator (e.g. the
    /// callback number for the follow-up command).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// Creation timestamp, serialized as RFC 3339.
    pub timestamp: DateTime<Utc>,
}

impl CommandSlot {
    /// Construct a slot for a plain catalog command.
    #[must_use]
    pub fn new(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            message: message.into(),
            payload: None,
            timestamp: Utc::now(),
        }
    }

    /// Construct a slot carrying an operator-supplied payload.
    #[must_use]
    pub fn with_payload(
        command: impl Into<String>,
        message: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            message: message.into(),
            payload: Some(payload.into()),
            timestamp: Utc::now(),
        }
    }
}
