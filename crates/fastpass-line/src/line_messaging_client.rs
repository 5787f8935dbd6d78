//! LINE Messaging API client implementing [`MessageSender`].

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use fastpass_core::{DeliveryError, MessageSender, OutboundMessage, ReplyHandle, UserId};
use serde_json::{json, Value};

use crate::line_message_render::render_line_messages;

pub const DEFAULT_LINE_API_BASE: &str = "https://api.line.me";
pub const DEFAULT_LINE_REQUEST_TIMEOUT_MS: u64 = 10_000;
/// Upper bound on message objects per reply or push request.
pub const LINE_MAX_MESSAGES_PER_REQUEST: usize = 5;
const ERROR_DETAIL_MAX_CHARS: usize = 512;

#[derive(Clone)]
pub struct LineMessagingClient {
    http: reqwest::Client,
    api_base: String,
    access_token: String,
}

impl LineMessagingClient {
    pub fn new(api_base: &str, access_token: &str, request_timeout_ms: u64) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("fastpass-line-bot"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create line messaging client")?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            access_token: access_token.trim().to_string(),
        })
    }

    async fn post_messages(&self, endpoint: &str, body: Value) -> Result<(), DeliveryError> {
        let url = format!("{}/v2/bot/message/{endpoint}", self.api_base);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|error| DeliveryError::Transport(error.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let raw = response.text().await.unwrap_or_default();
        let detail = truncate_for_error(&raw, ERROR_DETAIL_MAX_CHARS);
        if endpoint == "reply" && status.as_u16() == 400 && is_reply_token_rejection(&raw) {
            return Err(DeliveryError::ReplyHandleRejected { detail });
        }
        Err(DeliveryError::Http {
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl MessageSender for LineMessagingClient {
    async fn reply(
        &self,
        handle: ReplyHandle,
        messages: Vec<OutboundMessage>,
    ) -> Result<(), DeliveryError> {
        let rendered = validate_and_render(&messages)?;
        self.post_messages(
            "reply",
            json!({
                "replyToken": handle.into_token(),
                "messages": rendered,
            }),
        )
        .await
    }

    async fn push(
        &self,
        to: &UserId,
        messages: Vec<OutboundMessage>,
    ) -> Result<(), DeliveryError> {
        let rendered = validate_and_render(&messages)?;
        self.post_messages(
            "push",
            json!({
                "to": to.as_str(),
                "messages": rendered,
            }),
        )
        .await
    }
}

fn validate_and_render(messages: &[OutboundMessage]) -> Result<Vec<Value>, DeliveryError> {
    if messages.is_empty() {
        return Err(DeliveryError::InvalidPayload(
            "at least one message is required".to_string(),
        ));
    }
    if messages.len() > LINE_MAX_MESSAGES_PER_REQUEST {
        return Err(DeliveryError::InvalidPayload(format!(
            "{} messages exceed the per-request limit of {}",
            messages.len(),
            LINE_MAX_MESSAGES_PER_REQUEST
        )));
    }
    Ok(render_line_messages(messages))
}

fn is_reply_token_rejection(body: &str) -> bool {
    body.to_ascii_lowercase().contains("reply token")
}

fn truncate_for_error(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated = value.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}
