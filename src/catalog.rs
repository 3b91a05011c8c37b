//! The command catalog: the fixed set of operator commands and their
//! visitor-facing display text.
//!
//! The catalog is immutable and built once at process start. Adding or
//! renaming a command is a deployment-time change, not a runtime
//! operation. Iteration order is stable so rendered button layouts do
//! not shuffle between notifications.

/// Identifier of the availability toggle pseudo-command.
pub const TOGGLE_AVAILABILITY: &str = "TOGGLE_AVAILABILITY";

/// Identifier of the availability status-check pseudo-command.
pub const CHECK_STATUS: &str = "CHECK_STATUS";

/// Identifier of the single command that captures a follow-up numeric
/// value (a callback phone number) from the operator before it is
/// delivered to the visitor.
pub const REQUEST_CALLBACK_NUMBER: &str = "REQUEST_CALLBACK_NUMBER";

/// Ordered set of every command the operator can issue. Entries with
/// empty display text are triggers only: the visitor page reacts to the
/// identifier (or payload) rather than showing a message.
const ENTRIES: &[(&str, &str)] = &[
    ("SHOW_GREETING", "An agent has joined your session"),
    ("SHOW_HOLD", "Please hold on while we look into this"),
    ("OPEN_CHAT_PANEL", ""),
    ("SHOW_FAQ", ""),
    (
        "REQUEST_FEEDBACK",
        "How was your experience? Let us know before you go.",
    ),
    ("SHOW_CALLBACK_PROMPT", "We can call you back instead"),
    (REQUEST_CALLBACK_NUMBER, ""),
    ("DISMISS_PROMPT", ""),
    ("END_SESSION", "This session has ended. Thanks for visiting."),
    (TOGGLE_AVAILABILITY, ""),
    (CHECK_STATUS, ""),
];

/// Immutable mapping from command identifier to display text.
#[derive(Debug, Clone, Copy)]
pub struct CommandCatalog {
    entries: &'static [(&'static str, &'static str)],
}

impl CommandCatalog {
    /// Build the catalog from the compiled-in entry set.
    #[must_use]
    pub fn new() -> Self {
        Self { entries: ENTRIES }
    }

    /// Whether `id` names a recognized command. Exact string match, no
    /// normalization.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|(key, _)| *key == id)
    }

    /// Display text for a command, empty for trigger-only entries.
    /// Returns `None` for unknown identifiers.
    #[must_use]
    pub fn display_text(&self, id: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(key, _)| *key == id)
            .map(|(_, text)| *text)
    }

    /// Iterate identifiers in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    /// Number of commands in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty (never true for the compiled-in set).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CommandCatalog {
    fn default() -> Self {
        Self::new()
    }
}
