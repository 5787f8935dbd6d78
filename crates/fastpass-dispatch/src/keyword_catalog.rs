//! Static keyword replies, built in or loaded from a TOML catalog.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use fastpass_core::{
    CardAction, CardField, CardPanel, CardPayload, OutboundMessage, ResponsePayload,
};
use serde::Deserialize;

use crate::dispatch_texts::ORDER_FORM_PREFIX;

pub const CONCERT_CATALOG_KEYWORD: &str = "[!!!]演唱會代操";
const CONCERT_CATALOG_ALT_TEXT: &str = "演唱會節目資訊，歡迎私訊預訂！";
const COMING_SOON: &str = "Coming soon...";

#[derive(Debug, Clone, Deserialize)]
struct KeywordCatalogFile {
    #[serde(default)]
    keywords: Vec<KeywordEntryConfig>,
}

#[derive(Debug, Clone, Deserialize)]
struct KeywordEntryConfig {
    keyword: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    card: Option<CardPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordReply {
    pub keyword: String,
    pub reply: ResponsePayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Ordered exact-text keyword table.
pub struct KeywordCatalog {
    entries: Vec<KeywordReply>,
}

impl Default for KeywordCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KeywordCatalog {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Built-in catalog: the concert listing carousel.
    pub fn builtin() -> Self {
        let listing = ConcertListing {
            title: "TWICE THIS IS FOR WORLD TOUR PART1 IN KAOHSIUNG".to_string(),
            date: COMING_SOON.to_string(),
            location: COMING_SOON.to_string(),
            price: COMING_SOON.to_string(),
            system: COMING_SOON.to_string(),
            image_url: "https://img9.uploadhouse.com/fileuploads/32011/32011699f3f6ed545f4c10e2c725a17104ab2e9c.png".to_string(),
            artist_keyword: "TWICE".to_string(),
            badge: "HOT🔥".to_string(),
        };
        Self {
            entries: vec![KeywordReply {
                keyword: CONCERT_CATALOG_KEYWORD.to_string(),
                reply: ResponsePayload::Card(CardPayload {
                    alt_text: CONCERT_CATALOG_ALT_TEXT.to_string(),
                    panels: vec![listing.into_panel()],
                }),
            }],
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read keyword catalog {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("invalid keyword catalog {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file = toml::from_str::<KeywordCatalogFile>(raw)
            .context("failed to parse keyword catalog toml")?;
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(file.keywords.len());
        for entry in file.keywords {
            let keyword = entry.keyword.trim().to_string();
            if keyword.is_empty() {
                bail!("keyword catalog entry has an empty keyword");
            }
            if !seen.insert(keyword.clone()) {
                bail!("keyword '{keyword}' is declared more than once");
            }
            if entry.card.as_ref().is_some_and(|card| card.panels.is_empty()) {
                bail!("keyword '{keyword}' declares a card with no panels");
            }
            let text = entry
                .text
                .filter(|value| !value.trim().is_empty());
            let reply = match (text, entry.card) {
                (Some(text), None) => ResponsePayload::Text(text),
                (None, Some(card)) => ResponsePayload::Card(card),
                (Some(text), Some(card)) => ResponsePayload::Sequence(vec![
                    OutboundMessage::Text(text),
                    OutboundMessage::Card(card),
                ]),
                (None, None) => bail!("keyword '{keyword}' must define text, card, or both"),
            };
            entries.push(KeywordReply { keyword, reply });
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[KeywordReply] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
/// One concert offered for booking, rendered as a carousel panel whose
/// button fills in the order form prefix.
pub struct ConcertListing {
    pub title: String,
    pub date: String,
    pub location: String,
    pub price: String,
    pub system: String,
    pub image_url: String,
    pub artist_keyword: String,
    pub badge: String,
}

impl ConcertListing {
    pub fn into_panel(self) -> CardPanel {
        let field = |label: &str, value: String| CardField {
            label: label.to_string(),
            value,
        };
        CardPanel {
            title: Some(self.title),
            image_url: Some(self.image_url),
            badge: Some(self.badge),
            fields: vec![
                field("日期", self.date),
                field("地點", self.location),
                field("票價", self.price),
                field("系統", self.system),
            ],
            actions: vec![CardAction::SendText {
                label: "填寫預訂單".to_string(),
                text: format!("{ORDER_FORM_PREFIX}{}", self.artist_keyword),
            }],
        }
    }
}
