//! Extension seams of the channel client.
//!
//! - [`EventBroadcaster`] - outbound fan-out of news items, used by the
//!   state machine to announce transport errors
//! - [`MessageCipher`] - end-to-end encryption of chat bodies
//!
//! Both traits are synchronous: they are called from inside the client's
//! event loop and must not block.

mod broadcaster;
mod cipher;

pub use broadcaster::{EventBroadcaster, NoopBroadcaster};
pub use cipher::{MessageCipher, PlaintextCipher};
