//! Client library for the mafia game server.
//!
//! - [`MafiaClient`] performs calls: `connect`, `join_game`,
//!   `chat_messages`.
//! - [`SnapshotStream`] yields the viewer's redacted snapshots.
//! - [`GameFollower`] keeps the latest snapshot available to another task.
//!
//! ```rust,no_run
//! use mafia_client::MafiaClient;
//! use mafia_protocol::GameId;
//!
//! # async fn play() -> Result<(), mafia_client::ClientError> {
//! let client = MafiaClient::new("localhost:5000");
//! client.connect().await?;
//!
//! let mut stream = client.join_game("alice", &GameId::default()).await?;
//! while let Some(snapshot) = stream.next().await? {
//!     if snapshot.is_rejection() {
//!         println!("join refused: {}", snapshot.lobby_status);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod follow;

pub use client::{ChatStream, MafiaClient, SnapshotStream};
pub use error::ClientError;
pub use follow::{FollowOutcome, GameFollower};
