//! Consent-gated command routing for the FastPass chat dispatcher.
//!
//! An inbound message first passes the [`ConsentGate`]; consented users are
//! routed by [`CommandRouter`] over an ordered [`CommandTable`]:
//!
//! 1. privileged exact commands (managers only),
//! 2. the one-shot order form prefix,
//! 3. static keyword replies,
//! 4. the away-reply fallback.
//!
//! [`Dispatcher`] delivers the resulting plan through a
//! [`fastpass_core::MessageSender`] and hands a copy of the message to the
//! [`NotificationForwarder`], which relays it to the operator off the reply
//! path.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use fastpass_access::{IdentityStore, PrivilegeGuard};
//! use fastpass_dispatch::{AutoReplyFlag, CommandRouter, RouteRule, RouterConfig};
//!
//! let config = RouterConfig::default();
//! let router = CommandRouter::new(
//!     Arc::new(IdentityStore::in_memory()),
//!     PrivilegeGuard::new(["Uboss"]),
//!     Arc::new(AutoReplyFlag::default()),
//!     &config,
//! );
//!
//! let outcome = router.route(&"U1".into(), "hello");
//! assert_eq!(outcome.rule, RouteRule::TermsPrompt);
//!
//! let phrase = config.terms.confirmation_phrase();
//! assert_eq!(router.route(&"U1".into(), &phrase).rule, RouteRule::ConsentAccepted);
//! assert_eq!(router.route(&"U1".into(), "hello").rule, RouteRule::Fallback);
//! ```

pub mod auto_reply;
pub mod command_router;
pub mod command_table;
pub mod consent_gate;
pub mod dispatch_texts;
pub mod dispatcher;
pub mod keyword_catalog;
pub mod notification_forwarder;

pub use auto_reply::*;
pub use command_router::*;
pub use command_table::*;
pub use consent_gate::*;
pub use dispatch_texts::*;
pub use dispatcher::*;
pub use keyword_catalog::*;
pub use notification_forwarder::*;
