//! Platform-neutral contract types shared across FastPass crates.
//!
//! Holds the inbound event shapes, the outbound message model and the
//! [`MessageSender`] seam implemented by platform adapters.

pub mod event_contract;
pub mod outbound_message;
pub mod sender;

pub use event_contract::*;
pub use outbound_message::*;
pub use sender::*;
