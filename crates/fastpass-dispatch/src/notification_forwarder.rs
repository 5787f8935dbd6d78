//! Best-effort relay of routed messages to the operator.
//!
//! Notices go through a bounded queue drained by one background task, so the
//! reply path never waits on, or fails because of, forwarding.

use std::sync::Arc;

use fastpass_core::{MessageSender, OutboundMessage, UserId};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

pub const DEFAULT_FORWARD_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardNotice {
    pub sender: UserId,
    pub text: String,
    pub auto_reply_enabled: bool,
}

impl ForwardNotice {
    pub fn render(&self) -> String {
        let state = if self.auto_reply_enabled {
            "開啟"
        } else {
            "關閉"
        };
        format!("📩 有人傳訊息：{}（自動回應 {state}）", self.text)
    }
}

#[derive(Debug, Clone)]
pub struct NotificationForwarder {
    queue: Option<mpsc::Sender<ForwardNotice>>,
}

impl NotificationForwarder {
    /// Starts the forwarding task. Must be called inside a tokio runtime.
    pub fn spawn(
        sender: Arc<dyn MessageSender>,
        operator: UserId,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (queue, receiver) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_forward_worker(receiver, sender, operator));
        (Self { queue: Some(queue) }, handle)
    }

    /// Forwarder that drops every notice.
    pub fn disabled() -> Self {
        Self { queue: None }
    }

    /// Enqueues without waiting. Returns whether the notice was accepted; a
    /// full or closed queue drops it with a warning.
    pub fn forward(&self, notice: ForwardNotice) -> bool {
        let Some(queue) = self.queue.as_ref() else {
            return false;
        };
        match queue.try_send(notice) {
            Ok(()) => true,
            Err(TrySendError::Full(notice)) => {
                tracing::warn!(
                    user_id = %notice.sender,
                    reason_code = "forward_queue_full",
                    "dropping operator notification"
                );
                false
            }
            Err(TrySendError::Closed(notice)) => {
                tracing::warn!(
                    user_id = %notice.sender,
                    reason_code = "forward_queue_closed",
                    "dropping operator notification"
                );
                false
            }
        }
    }
}

async fn run_forward_worker(
    mut receiver: mpsc::Receiver<ForwardNotice>,
    sender: Arc<dyn MessageSender>,
    operator: UserId,
) {
    while let Some(notice) = receiver.recv().await {
        let message = OutboundMessage::Text(notice.render());
        // One attempt per notice; failures are only logged.
        match sender.push(&operator, vec![message]).await {
            Ok(()) => tracing::debug!(user_id = %notice.sender, "operator notified"),
            Err(error) => tracing::warn!(
                user_id = %notice.sender,
                reason_code = error.reason_code(),
                error = %error,
                "failed to notify operator"
            ),
        }
    }
    tracing::debug!("operator forwarding queue closed");
}
