//! Outbound delivery seam implemented by platform adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::{OutboundMessage, ReplyHandle, UserId};

/// Errors returned by [`MessageSender`] implementations.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("reply handle rejected: {detail}")]
    ReplyHandleRejected { detail: String },
    #[error("platform returned http {status}: {detail}")]
    Http { status: u16, detail: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("invalid outbound payload: {0}")]
    InvalidPayload(String),
}

impl DeliveryError {
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::ReplyHandleRejected { .. } => "reply_handle_rejected",
            Self::Http { .. } => "http_error",
            Self::Transport(_) => "transport_error",
            Self::InvalidPayload(_) => "invalid_payload",
        }
    }
}

/// Delivers outbound messages to a chat platform.
///
/// `messages` is always sent as one batch; implementations must not split it
/// across several platform calls.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Replies to the event that issued `handle`. The handle is spent even
    /// when delivery fails.
    async fn reply(
        &self,
        handle: ReplyHandle,
        messages: Vec<OutboundMessage>,
    ) -> Result<(), DeliveryError>;

    /// Pushes messages to `to` outside of any reply context.
    async fn push(&self, to: &UserId, messages: Vec<OutboundMessage>)
        -> Result<(), DeliveryError>;
}
