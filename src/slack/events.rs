//! Slack event dispatch for the control listener.
//!
//! Receives interactive payloads (command button presses) and push
//! message events (operator free text) via Socket Mode, applies the
//! authorization guard, and forwards them to the [`ControlListener`].
//! Replies are posted through the buffered send queue so a slow or
//! failing Slack API never stalls the event callbacks.

use std::sync::Arc;

use slack_morphism::prelude::{
    SlackChannelId, SlackClient, SlackClientEventsUserState, SlackClientHyperHttpsConnector,
    SlackEventCallbackBody, SlackInteractionEvent, SlackMessageEvent, SlackPushEventCallback,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::slack::client::SlackMessage;
use crate::slack::listener::{ControlListener, ListenerReply};

/// Shared state injected into the Socket Mode listener environment.
pub struct EventContext {
    /// The store-backed control state machine.
    pub listener: ControlListener,
    /// Buffered sender for acknowledgements.
    pub ack_tx: mpsc::Sender<SlackMessage>,
    /// Operator channel for replies and for scoping inbound text.
    pub channel: SlackChannelId,
    /// Slack user IDs allowed to drive the listener; empty disables
    /// the check.
    pub authorized_user_ids: Vec<String>,
}

impl EventContext {
    /// Whether `user_id` may drive the control listener.
    ///
    /// On failure the caller silently drops the event so the user gets
    /// no feedback beyond Slack's own acknowledgment; the attempt is
    /// logged as a security event.
    fn is_authorized(&self, user_id: &str) -> bool {
        if self.authorized_user_ids.is_empty()
            || self.authorized_user_ids.iter().any(|id| id == user_id)
        {
            return true;
        }
        warn!(
            user_id,
            "unauthorized user attempted slack interaction (silently ignored)"
        );
        false
    }

    /// Post a listener reply to the operator channel via the queue.
    async fn post_reply(&self, reply: ListenerReply) {
        let message = SlackMessage::plain(self.channel.clone(), reply.text());
        if let Err(err) = self.ack_tx.send(message).await {
            warn!(%err, "failed to enqueue listener reply");
        }
    }
}

async fn event_context(state: &SlackClientEventsUserState) -> Option<Arc<EventContext>> {
    let guard = state.read().await;
    guard.get_user_state::<Arc<EventContext>>().cloned()
}

/// Handle interactive payloads (command buttons) delivered via Socket
/// Mode.
///
/// # Errors
///
/// Never returns an error; failures are logged and swallowed so Slack
/// does not retry the delivery.
pub async fn handle_interaction(
    event: SlackInteractionEvent,
    _client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    state: SlackClientEventsUserState,
) -> slack_morphism::UserCallbackResult<()> {
    let SlackInteractionEvent::BlockActions(block_event) = &event else {
        info!(?event, "unhandled interaction event type");
        return Ok(());
    };

    let Some(ctx) = event_context(&state).await else {
        warn!("event context not available; cannot process interaction");
        return Ok(());
    };

    let user_id = block_event
        .user
        .as_ref()
        .map(|u| u.id.to_string())
        .unwrap_or_default();
    if user_id.is_empty() {
        warn!("block action with empty user ID; ignoring");
        return Ok(());
    }
    if !ctx.is_authorized(&user_id) {
        return Ok(());
    }

    let Some(actions) = &block_event.actions else {
        return Ok(());
    };

    for action in actions {
        // The button value and action_id both carry the command
        // identifier; the value wins when present.
        let command = action
            .value
            .clone()
            .unwrap_or_else(|| action.action_id.to_string());
        info!(command, user_id, "dispatching command button");

        match ctx.listener.handle_button(&command).await {
            Ok(reply) => ctx.post_reply(reply).await,
            Err(err) => warn!(%err, command, "command button failed"),
        }
    }

    Ok(())
}

/// Whether a push message event is operator free text worth processing:
/// posted by a human in the operator channel, no subtype (plain message).
fn is_operator_text(event: &SlackMessageEvent, ctx: &EventContext) -> bool {
    if event.subtype.is_some() || event.sender.bot_id.is_some() {
        return false;
    }
    event
        .origin
        .channel
        .as_ref()
        .is_some_and(|channel| *channel == ctx.channel)
}

/// Handle push events; only plain channel messages become free-text
/// input for the listener.
///
/// # Errors
///
/// Never returns an error; failures are logged and swallowed.
pub async fn handle_push(
    event: SlackPushEventCallback,
    _client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    state: SlackClientEventsUserState,
) -> slack_morphism::UserCallbackResult<()> {
    let SlackEventCallbackBody::Message(message_event) = &event.event else {
        return Ok(());
    };

    let Some(ctx) = event_context(&state).await else {
        warn!("event context not available; cannot process message");
        return Ok(());
    };

    if !is_operator_text(message_event, &ctx) {
        return Ok(());
    }

    let Some(user_id) = message_event.sender.user.as_ref().map(ToString::to_string) else {
        return Ok(());
    };
    if !ctx.is_authorized(&user_id) {
        return Ok(());
    }

    let Some(text) = message_event
        .content
        .as_ref()
        .and_then(|content| content.text.clone())
    else {
        return Ok(());
    };

    match ctx.listener.handle_text(&text).await {
        Ok(Some(reply)) => ctx.post_reply(reply).await,
        Ok(None) => info!(user_id, "free text outside capture ignored"),
        Err(err) => warn!(%err, "free text handling failed"),
    }

    Ok(())
}
