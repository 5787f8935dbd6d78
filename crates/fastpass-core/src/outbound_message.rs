//! Outbound message model.
//!
//! Platform adapters render these values; nothing here knows about a wire
//! format.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
/// Actionable affordance attached to a card panel.
pub enum CardAction {
    /// Opens an external document or page.
    OpenUri { label: String, uri: String },
    /// Echoes `text` back as if the user had typed it.
    SendText { label: String, text: String },
}

impl CardAction {
    pub fn label(&self) -> &str {
        match self {
            Self::OpenUri { label, .. } | Self::SendText { label, .. } => label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardField {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// One panel of a structured card. Several panels form a carousel.
pub struct CardPanel {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub fields: Vec<CardField>,
    #[serde(default)]
    pub actions: Vec<CardAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Structured card with a plain-text fallback for clients that cannot render it.
pub struct CardPayload {
    pub alt_text: String,
    pub panels: Vec<CardPanel>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A single deliverable message part.
pub enum OutboundMessage {
    Text(String),
    Card(CardPayload),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Logical response to one inbound event.
///
/// A `Sequence` is one response made of ordered parts and is handed to the
/// sender as a single batch, so it is delivered whole or not at all.
pub enum ResponsePayload {
    Text(String),
    Card(CardPayload),
    Sequence(Vec<OutboundMessage>),
}

impl ResponsePayload {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn into_messages(self) -> Vec<OutboundMessage> {
        match self {
            Self::Text(text) => vec![OutboundMessage::Text(text)],
            Self::Card(card) => vec![OutboundMessage::Card(card)],
            Self::Sequence(parts) => parts,
        }
    }

    pub fn part_count(&self) -> usize {
        match self {
            Self::Text(_) | Self::Card(_) => 1,
            Self::Sequence(parts) => parts.len(),
        }
    }
}
