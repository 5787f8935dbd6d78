use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
/// Opaque identifier of a remote chat party. Only equality is meaningful.
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Single-use token tying an outbound reply to one inbound event.
///
/// Deliberately not `Clone`: sending a reply takes the handle by value, so a
/// handle can be spent at most once per event.
#[derive(Debug, PartialEq, Eq)]
pub struct ReplyHandle(String);

impl ReplyHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Consumes the handle and yields the raw platform token.
    pub fn into_token(self) -> String {
        self.0
    }
}

#[derive(Debug, PartialEq, Eq)]
/// Text message received from a user, carrying its reply handle.
pub struct InboundMessage {
    pub sender: UserId,
    pub text: String,
    pub reply_handle: ReplyHandle,
}

impl InboundMessage {
    pub fn new(
        sender: impl Into<UserId>,
        text: impl Into<String>,
        reply_handle: ReplyHandle,
    ) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            reply_handle,
        }
    }

    /// Inbound text with leading and trailing whitespace removed. No other
    /// normalization is applied before matching.
    pub fn normalized_text(&self) -> &str {
        self.text.trim()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// First-contact event raised when a user adds the bot.
pub struct FollowEvent {
    pub sender: UserId,
}

#[derive(Debug, PartialEq, Eq)]
/// Enumerates inbound events the dispatcher understands.
pub enum InboundEvent {
    Message(InboundMessage),
    Follow(FollowEvent),
}

impl InboundEvent {
    pub fn sender(&self) -> &UserId {
        match self {
            Self::Message(message) => &message.sender,
            Self::Follow(follow) => &follow.sender,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Follow(_) => "follow",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{InboundEvent, InboundMessage, ReplyHandle, UserId};

    #[test]
    fn unit_normalized_text_trims_only_outer_whitespace() {
        let message = InboundMessage::new("U1", "  我要預訂： TWICE  \n", ReplyHandle::new("r1"));
        assert_eq!(message.normalized_text(), "我要預訂： TWICE");
    }

    #[test]
    fn unit_user_id_serializes_as_plain_string() {
        let encoded = serde_json::to_string(&UserId::new("U42")).expect("encode");
        assert_eq!(encoded, "\"U42\"");
        let decoded: UserId = serde_json::from_str("\"U7\"").expect("decode");
        assert_eq!(decoded.as_str(), "U7");
    }

    #[test]
    fn functional_inbound_event_exposes_sender_and_kind() {
        let event = InboundEvent::Message(InboundMessage::new(
            "U9",
            "hello",
            ReplyHandle::new("token"),
        ));
        assert_eq!(event.sender().as_str(), "U9");
        assert_eq!(event.kind(), "message");
    }

    #[test]
    fn unit_reply_handle_yields_token_once_consumed() {
        let handle = ReplyHandle::new("reply-token-1");
        assert_eq!(handle.as_str(), "reply-token-1");
        assert_eq!(handle.into_token(), "reply-token-1");
    }
}
