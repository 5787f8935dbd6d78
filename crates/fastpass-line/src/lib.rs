//! LINE Messaging API adapter for the FastPass dispatcher.
//!
//! Verifies and parses webhook deliveries, renders outbound messages as LINE
//! message objects, and implements [`fastpass_core::MessageSender`] over the
//! reply and push endpoints.

pub mod line_message_render;
pub mod line_messaging_client;
pub mod line_signature;
pub mod line_webhook_payload;
pub mod line_webhook_server;

pub use line_message_render::*;
pub use line_messaging_client::*;
pub use line_signature::*;
pub use line_webhook_payload::*;
pub use line_webhook_server::*;
