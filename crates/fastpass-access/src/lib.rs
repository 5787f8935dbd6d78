//! Per-user access state for the FastPass dispatcher.
//!
//! Owns consent and submission records behind atomic check-and-set
//! operations, their optional on-disk state file, and the manager
//! privilege predicate.

pub mod identity_state_file;
pub mod identity_store;
pub mod privilege;

pub use identity_state_file::*;
pub use identity_store::*;
pub use privilege::*;
