//! Wire protocol for Standoff.
//!
//! This crate defines what travels between a player's client and the
//! session coordinator:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`Notification`],
//!   [`Action`], etc.): the requests players make and the pushes the
//!   server sends back.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and the session
//! (game rules). It doesn't know about sockets or rounds; it only knows
//! how to name things and how to serialize them.
//!
//! ```text
//! Transport (frames) → Protocol (ClientMessage) → Session (rounds)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Action, ActionKind, ClientMessage, JoinRejection, Notification,
    PlayerName, ServerMessage, Standing,
};
