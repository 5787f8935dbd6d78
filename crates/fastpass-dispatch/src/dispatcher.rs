use std::sync::Arc;

use fastpass_core::{
    FollowEvent, InboundEvent, InboundMessage, MessageSender, ReplyHandle, ResponsePayload, UserId,
};

use crate::command_router::{CommandRouter, RouteRule};
use crate::notification_forwarder::{ForwardNotice, NotificationForwarder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Sent { parts: usize },
    /// No reply planned; silence is a valid outcome.
    Silent,
    Failed { reason_code: &'static str },
    /// Nothing needed sending (for example a follow from a consented user).
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub rule: Option<RouteRule>,
    pub delivery: DeliveryStatus,
    pub forwarded: bool,
}

/// Glues routing to delivery for one inbound event at a time.
///
/// Never returns an error: send failures are logged and the event ends
/// without a reply.
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<CommandRouter>,
    sender: Arc<dyn MessageSender>,
    forwarder: NotificationForwarder,
}

impl Dispatcher {
    pub fn new(
        router: Arc<CommandRouter>,
        sender: Arc<dyn MessageSender>,
        forwarder: NotificationForwarder,
    ) -> Self {
        Self {
            router,
            sender,
            forwarder,
        }
    }

    pub fn router(&self) -> &CommandRouter {
        &self.router
    }

    pub async fn handle_event(&self, event: InboundEvent) -> DispatchReport {
        match event {
            InboundEvent::Message(message) => self.handle_message(message).await,
            InboundEvent::Follow(follow) => self.handle_follow(follow).await,
        }
    }

    pub async fn handle_message(&self, message: InboundMessage) -> DispatchReport {
        let text = message.normalized_text().to_string();
        let InboundMessage {
            sender,
            reply_handle,
            ..
        } = message;
        let outcome = self.router.route(&sender, &text);
        tracing::info!(
            user_id = %sender,
            rule = outcome.rule.as_str(),
            command = outcome.command.as_deref().unwrap_or("-"),
            replies = outcome.response.is_some(),
            "inbound message routed"
        );

        // Queued before the reply is sent; the queue never blocks.
        let forwarded = !outcome.rule.is_gate()
            && self.forwarder.forward(ForwardNotice {
                sender: sender.clone(),
                text,
                auto_reply_enabled: outcome.auto_reply_enabled,
            });

        let delivery = match outcome.response {
            Some(response) => self.deliver_reply(reply_handle, response, &sender).await,
            None => DeliveryStatus::Silent,
        };
        DispatchReport {
            rule: Some(outcome.rule),
            delivery,
            forwarded,
        }
    }

    /// Pushes the terms prompt to a newly following user who has not yet
    /// consented.
    pub async fn handle_follow(&self, follow: FollowEvent) -> DispatchReport {
        let FollowEvent { sender } = follow;
        if self.router.identity().has_consented(&sender) {
            tracing::debug!(user_id = %sender, "follow from consented user; no prompt sent");
            return DispatchReport {
                rule: None,
                delivery: DeliveryStatus::Skipped,
                forwarded: false,
            };
        }
        let prompt = self.router.terms_prompt();
        let parts = prompt.part_count();
        let delivery = match self.sender.push(&sender, prompt.into_messages()).await {
            Ok(()) => DeliveryStatus::Sent { parts },
            Err(error) => {
                tracing::warn!(
                    user_id = %sender,
                    reason_code = error.reason_code(),
                    error = %error,
                    "failed to push terms prompt"
                );
                DeliveryStatus::Failed {
                    reason_code: error.reason_code(),
                }
            }
        };
        DispatchReport {
            rule: Some(RouteRule::TermsPrompt),
            delivery,
            forwarded: false,
        }
    }

    async fn deliver_reply(
        &self,
        handle: ReplyHandle,
        response: ResponsePayload,
        sender: &UserId,
    ) -> DeliveryStatus {
        let parts = response.part_count();
        // The handle is moved into this single call and never retried.
        match self.sender.reply(handle, response.into_messages()).await {
            Ok(()) => DeliveryStatus::Sent { parts },
            Err(error) => {
                tracing::warn!(
                    user_id = %sender,
                    reason_code = error.reason_code(),
                    error = %error,
                    "failed to deliver reply"
                );
                DeliveryStatus::Failed {
                    reason_code: error.reason_code(),
                }
            }
        }
    }
}
