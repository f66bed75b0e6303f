//! hellobot core contracts and value types.
//!
//! This crate exposes the pieces shared by the webhook surface: signing-secret
//! verification, typed event envelopes, the block document model used to
//! compose replies, and the outbound message sender.
pub mod blocks;
pub mod envelope;
pub mod outbound;
pub mod signature;

pub use blocks::*;
pub use envelope::*;
pub use outbound::*;
pub use signature::*;
