//! Wire protocol for the mafia game server.
//!
//! - **Types** ([`GameSnapshot`], [`PlayerView`], [`Request`], [`Response`],
//!   [`Envelope`]) and the closed enumerations ([`LobbyStatus`],
//!   [`GameStatus`], [`Role`], [`Condition`]).
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]).
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Session core (games, players)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ChatMessage, Condition, Envelope, GameId, GameSnapshot, GameStatus,
    JoinParams, LobbyStatus, Payload, PlayerView, Request, Response, Role,
};
