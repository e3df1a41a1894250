//! # Relay Protocol
//!
//! Wire types shared by the relay server and its clients.
//!
//! The protocol is line-oriented ASCII text over TCP. Every message is a
//! single line terminated by `\n`; a message is a command name, optionally
//! followed by `:` and a `;`-separated field list. There is no length prefix
//! and no versioning, so framing is entirely the job of [`LineBuffer`].
//!
//! ## Client to server
//! - `PlayerData:<name>;<character>`
//! - `Ready`
//! - `Position:<x>;<y>;<isRight>;<spriteName>`
//! - `Attack:<x>;<y>;<damage>;<isRight>;<range>`
//!
//! ## Server to client
//! - `SuccessPlayerConnect`
//! - `Position:<x>;<y>;<isRight>;<spriteName>;<senderId>`
//! - `Attack:<x>;<y>;<damage>;<isRight>;<range>;<senderId>`
//! - `The game begins!`

pub mod framing;
pub mod protocol;

pub use framing::{LineBuffer, DEFAULT_MAX_LINE_LENGTH, LINE_TERMINATOR};
pub use protocol::{
    AttackUpdate, ClientCommand, MessageKind, PositionUpdate, ProtocolError, ServerMessage,
    SessionId, DEFAULT_PORT, FIELD_SEPARATOR, GAME_BEGINS, SPAWN_SPACING,
};
