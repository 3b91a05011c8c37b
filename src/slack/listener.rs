//! The inbound control listener: translates operator actions into
//! hand-off store writes.
//!
//! The listener is a two-state machine. In `Idle`, button presses issue
//! commands and free text is ignored. Pressing the callback-number
//! command moves it to `AwaitingText`, where the next entirely numeric
//! message from the operator is consumed as the command payload. The
//! state lives in the store (an `awaiting_*` marker with a TTL), never
//! in process memory, because request workers and the Socket Mode task
//! may run in separate processes.
//!
//! All outward effects are typed [`ListenerReply`] values; the Slack
//! event layer owns posting, which keeps this module testable without
//! a Slack connection.

use std::time::Duration;

use tracing::info;

use crate::catalog::{CommandCatalog, CHECK_STATUS, REQUEST_CALLBACK_NUMBER, TOGGLE_AVAILABILITY};
use crate::models::command::CommandSlot;
use crate::persistence::slot_store::SlotStore;
use crate::Result;

/// Name of the awaiting marker for the callback-number capture.
const CALLBACK_MARKER: &str = "callback_number";

/// Operator-visible prompt sent when the callback-number flow starts.
const CALLBACK_PROMPT: &str = "Please send the number to show for the visitor callback";

/// Listener processing state, derived from the store on each event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// No capture in progress; free text is ignored.
    Idle,
    /// A numeric follow-up is expected from the operator.
    AwaitingText,
}

/// Reply to be delivered back to the operator channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerReply {
    /// Short acknowledgement of the action taken.
    Ack(String),
    /// An explicit prompt asking the operator for follow-up input.
    Prompt(String),
}

impl ListenerReply {
    /// The message text this reply posts to the operator channel.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Ack(text) | Self::Prompt(text) => text.as_str(),
        }
    }
}

fn availability_text(available: bool) -> &'static str {
    if available {
        "\u{1f7e2} Available"
    } else {
        "\u{1f534} Unavailable"
    }
}

/// Store-backed handler for operator button presses and free text.
#[derive(Clone)]
pub struct ControlListener {
    store: SlotStore,
    catalog: CommandCatalog,
    slot_ttl: Duration,
}

impl ControlListener {
    /// Create a listener over the shared store.
    #[must_use]
    pub fn new(store: SlotStore, catalog: CommandCatalog, slot_ttl: Duration) -> Self {
        Self {
            store,
            catalog,
            slot_ttl,
        }
    }

    /// Current processing state, read from the awaiting marker.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the store read fails.
    pub async fn state(&self) -> Result<ListenerState> {
        if self.store.is_awaiting(CALLBACK_MARKER).await? {
            Ok(ListenerState::AwaitingText)
        } else {
            Ok(ListenerState::Idle)
        }
    }

    /// Process a button-selection action carrying command identifier
    /// `command`.
    ///
    /// Button presses are handled identically in both states; a press
    /// of any slot-writing command while a capture is in progress
    /// cancels the capture explicitly rather than leaving the marker
    /// to its TTL. The availability toggle and status check are pure
    /// reads/toggles and leave an in-progress capture alone.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if a store operation fails.
    pub async fn handle_button(&self, command: &str) -> Result<ListenerReply> {
        match command {
            TOGGLE_AVAILABILITY => {
                let current = self.store.get_availability().await?;
                self.store.set_availability(!current).await?;
                info!(available = !current, "availability toggled");
                Ok(ListenerReply::Ack(format!(
                    "Availability toggled: {}",
                    availability_text(!current)
                )))
            }
            CHECK_STATUS => {
                let current = self.store.get_availability().await?;
                Ok(ListenerReply::Ack(availability_text(current).to_owned()))
            }
            REQUEST_CALLBACK_NUMBER => {
                self.store
                    .set_awaiting(CALLBACK_MARKER, self.slot_ttl)
                    .await?;
                info!("awaiting callback number from operator");
                Ok(ListenerReply::Prompt(CALLBACK_PROMPT.to_owned()))
            }
            id if self.catalog.contains(id) => {
                // A new command supersedes any capture in progress.
                self.store.clear_awaiting(CALLBACK_MARKER).await?;
                let text = self.catalog.display_text(id).unwrap_or_default();
                let slot = CommandSlot::new(id, text);
                self.store.put_command(&slot, self.slot_ttl).await?;
                info!(command = id, "command queued for pickup");
                Ok(ListenerReply::Ack(format!("Command received: {id}")))
            }
            other => {
                info!(command = other, "unrecognized command");
                Ok(ListenerReply::Ack("Invalid command".to_owned()))
            }
        }
    }

    /// Process a free-text message from the operator.
    ///
    /// Returns `None` in `Idle` (free text outside a capture is
    /// ignored). In `AwaitingText`, an entirely numeric message is
    /// consumed as the callback-number payload; anything else produces
    /// a validation reply and leaves the marker (and its remaining
    /// deadline) untouched.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if a store operation fails.
    pub async fn handle_text(&self, text: &str) -> Result<Option<ListenerReply>> {
        match self.state().await? {
            ListenerState::Idle => Ok(None),
            ListenerState::AwaitingText => {
                if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
                    let slot = CommandSlot::with_payload(REQUEST_CALLBACK_NUMBER, "", text);
                    self.store.put_command(&slot, self.slot_ttl).await?;
                    self.store.clear_awaiting(CALLBACK_MARKER).await?;
                    info!(number = text, "callback number captured");
                    Ok(Some(ListenerReply::Ack(format!(
                        "Success! Callback number set to: {text}"
                    ))))
                } else {
                    Ok(Some(ListenerReply::Ack(
                        "Please send a valid number".to_owned(),
                    )))
                }
            }
        }
    }
}
