//! Error types for the session layer.

use mafia_protocol::GameId;

/// Errors that can occur during session operations.
///
/// Capacity and lookup failures are not errors here: a refused join is a
/// normal [`JoinOutcome`](crate::JoinOutcome), and an unknown id is `None`
/// from the registry. What remains are contract violations and a dead
/// session task.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The login is not on the session's roster.
    ///
    /// For `render_for` this means the caller skipped `join`; it is a
    /// programming error, not something a player can trigger.
    #[error("player {login} is not a participant of game {game_id}")]
    NotAParticipant { login: String, game_id: GameId },

    /// The session task is gone or its command channel is closed.
    #[error("game {0} is unavailable")]
    Unavailable(GameId),
}
