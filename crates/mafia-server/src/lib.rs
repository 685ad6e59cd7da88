//! # Mafia server
//!
//! Streaming game-session server for the mafia party game.
//!
//! Clients join a game by id (or create one with an empty id) and then
//! receive a snapshot of the game, redacted for them, at a fixed interval
//! until the game ends or they disconnect. The rules engine that assigns
//! roles and moves a game from `NOT_STARTED` to `ENDED` is not part of the
//! server: it drives games through the [`SharedRegistry`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mafia_server::prelude::*;
//!
//! # async fn run() -> Result<(), MafiaError> {
//! let config = ServerConfig::load(DEFAULT_CONFIG_PATH)?;
//! let server = MafiaServer::builder()
//!     .bind(&config.bind_addr())
//!     .settings(config.game_settings())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod chat;
mod config;
mod error;
mod handler;
mod server;

pub use chat::{HEARTBEAT_PLAYER_NAME, HEARTBEAT_PLAYER_NUMBER, heartbeat};
pub use config::{
    ConfigError, DEFAULT_CHAT_INTERVAL, DEFAULT_CONFIG_PATH, GameSettings, ServerConfig,
    ServerSection,
};
pub use error::MafiaError;
pub use server::{MafiaServer, MafiaServerBuilder, SharedRegistry};

/// Common imports for running a server and driving its games.
pub mod prelude {
    pub use crate::{
        ConfigError, DEFAULT_CONFIG_PATH, GameSettings, MafiaError, MafiaServer,
        MafiaServerBuilder, ServerConfig, SharedRegistry,
    };
    pub use mafia_protocol::{
        Condition, GameId, GameSnapshot, GameStatus, LobbyStatus, PlayerView, Role,
    };
    pub use mafia_session::{RoleCounts, SessionError, SessionHandle, SessionRegistry};
}
