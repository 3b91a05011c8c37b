//! Slack Block Kit message builders.
//!
//! Provides helpers for constructing the visit notification message:
//! a text section followed by the full command catalog rendered as
//! interactive buttons, paired two per action row.

use slack_morphism::prelude::{
    SlackActionBlockElement, SlackActionsBlock, SlackBlock, SlackBlockButtonElement, SlackBlockId,
    SlackBlockPlainTextOnly, SlackBlockText, SlackSectionBlock,
};

use crate::catalog::CommandCatalog;

/// Build a plain text section block.
#[must_use]
pub fn text_section(text: &str) -> SlackBlock {
    SlackBlock::Section(SlackSectionBlock::new().with_text(SlackBlockText::MarkDown(text.into())))
}

/// Build an actions block with the given buttons.
#[must_use]
pub fn action_buttons(block_id: &str, buttons: &[(&str, &str, &str)]) -> SlackBlock {
    let elements: Vec<SlackActionBlockElement> = buttons
        .iter()
        .map(|(action_id, text, value)| {
            SlackActionBlockElement::Button(
                SlackBlockButtonElement::new(
                    (*action_id).into(),
                    SlackBlockPlainTextOnly::from(*text),
                )
                .with_value((*value).into()),
            )
        })
        .collect();
    SlackBlock::Actions(
        SlackActionsBlock::new(elements).with_block_id(SlackBlockId(block_id.into())),
    )
}

/// Button label for a command identifier: underscores become spaces.
#[must_use]
pub fn button_label(command: &str) -> String {
    command.replace('_', " ")
}

/// Render every catalog command as buttons, two per action row.
///
/// The `action_id` and button value are both the command identifier, so
/// the interaction handler recovers the command without any decoding.
#[must_use]
pub fn command_rows(catalog: &CommandCatalog) -> Vec<SlackBlock> {
    let ids: Vec<&str> = catalog.iter().collect();
    ids.chunks(2)
        .enumerate()
        .map(|(row, pair)| {
            let buttons: Vec<(&str, String, &str)> = pair
                .iter()
                .map(|id| (*id, button_label(id), *id))
                .collect();
            let borrowed: Vec<(&str, &str, &str)> = buttons
                .iter()
                .map(|(id, label, value)| (*id, label.as_str(), *value))
                .collect();
            action_buttons(&format!("visit_commands_{row}"), &borrowed)
        })
        .collect()
}

/// Build the full visit notification: message text plus command buttons.
#[must_use]
pub fn visit_notification(message: &str, catalog: &CommandCatalog) -> Vec<SlackBlock> {
    let mut blocks = vec![text_section(message)];
    blocks.extend(command_rows(catalog));
    blocks
}
