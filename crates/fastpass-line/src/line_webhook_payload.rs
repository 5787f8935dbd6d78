//! Parsing of LINE webhook request bodies into inbound events.

use anyhow::{Context, Result};
use fastpass_core::{FollowEvent, InboundEvent, InboundMessage, ReplyHandle, UserId};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct LineWebhookBody {
    #[serde(default)]
    events: Vec<LineWebhookEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineWebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    reply_token: Option<String>,
    #[serde(default)]
    source: Option<LineEventSource>,
    #[serde(default)]
    message: Option<LineEventMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineEventSource {
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LineEventMessage {
    #[serde(rename = "type")]
    message_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default)]
pub struct ParsedLineWebhook {
    pub events: Vec<InboundEvent>,
    /// Events outside the dispatcher's contract (stickers, unfollows,
    /// events without a user id, ...).
    pub ignored: usize,
}

/// Parses a webhook body. Malformed JSON is an error; unsupported events are
/// counted and dropped.
pub fn parse_line_webhook_body(body: &[u8]) -> Result<ParsedLineWebhook> {
    let body = serde_json::from_slice::<LineWebhookBody>(body)
        .context("invalid LINE webhook payload")?;
    let mut parsed = ParsedLineWebhook::default();
    for event in body.events {
        match convert_event(event) {
            Some(event) => parsed.events.push(event),
            None => parsed.ignored = parsed.ignored.saturating_add(1),
        }
    }
    Ok(parsed)
}

fn convert_event(event: LineWebhookEvent) -> Option<InboundEvent> {
    let user_id = event
        .source
        .and_then(|source| source.user_id)
        .filter(|value| !value.trim().is_empty())?;
    match event.event_type.as_str() {
        "message" => {
            let message = event.message?;
            if message.message_type != "text" {
                return None;
            }
            let reply_token = event.reply_token.filter(|value| !value.trim().is_empty())?;
            Some(InboundEvent::Message(InboundMessage {
                sender: UserId::new(user_id),
                text: message.text.unwrap_or_default(),
                reply_handle: ReplyHandle::new(reply_token),
            }))
        }
        "follow" => Some(InboundEvent::Follow(FollowEvent {
            sender: UserId::new(user_id),
        })),
        _ => None,
    }
}
