//! Game session core for the mafia game server.
//!
//! Each game runs as an isolated Tokio task (actor model) owning its
//! roster and statuses. Everything else talks to it through a
//! [`SessionHandle`].
//!
//! # Key types
//!
//! - [`Session`]: the roster, statuses, and per-viewer redaction
//! - [`SessionHandle`]: send commands to a running game
//! - [`SessionRegistry`]: creates games and resolves ids
//! - [`RoleCounts`]: seat configuration (determines capacity)
//!
//! ```text
//! Server (above)  ← one handler per connected viewer
//!     ↕
//! Session core (this crate)  ← games, players, redaction
//!     ↕
//! Protocol (below)  ← GameSnapshot, Role, LobbyStatus, ...
//! ```

mod config;
mod error;
mod handle;
mod id;
mod registry;
mod session;

pub use config::RoleCounts;
pub use error::SessionError;
pub use handle::SessionHandle;
pub use id::{GAME_ID_LEN, generate_game_id};
pub use registry::SessionRegistry;
pub use session::{JoinOutcome, Player, Session, SessionInfo};
