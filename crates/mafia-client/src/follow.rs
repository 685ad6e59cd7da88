//! Background follower publishing the viewer's latest snapshot.
//!
//! A consumer task reads the snapshot stream and a UI task reads the
//! latest snapshot. The two meet in a `tokio::sync::watch` channel: every
//! snapshot is published whole, so a reader never sees half of an update.

use mafia_protocol::GameSnapshot;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{ClientError, SnapshotStream};

/// How a followed join stream finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowOutcome {
    /// The join was refused; the snapshot carries `NOT_FOUND` or `FULL`.
    Rejected(GameSnapshot),

    /// The game ended; the snapshot is the full-disclosure view.
    Ended(GameSnapshot),

    /// The server closed the stream before the game ended.
    Closed,
}

/// Follows one game in the background.
///
/// Dropping the follower stops the task and closes the connection, which
/// takes the viewer out of a game that has not started yet.
pub struct GameFollower {
    latest: watch::Receiver<Option<GameSnapshot>>,
    task: JoinHandle<Result<FollowOutcome, ClientError>>,
}

impl GameFollower {
    pub(crate) fn spawn(stream: SnapshotStream) -> Self {
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(follow(stream, tx));
        Self { latest: rx, task }
    }

    /// The most recent snapshot, or `None` before the first one arrives
    /// and after a rejection or disconnect.
    pub fn latest(&self) -> Option<GameSnapshot> {
        self.latest.borrow().clone()
    }

    /// Waits until a new snapshot is published. Returns `false` once the
    /// follower has stopped and no unseen update remains.
    pub async fn changed(&mut self) -> bool {
        self.latest.changed().await.is_ok()
    }

    /// Returns `true` once the stream is over.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the stream to finish.
    pub async fn wait(mut self) -> Result<FollowOutcome, ClientError> {
        match (&mut self.task).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Ok(FollowOutcome::Closed),
        }
    }

    /// Stops following and leaves the game.
    pub fn leave(self) {
        drop(self);
    }
}

impl Drop for GameFollower {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn follow(
    mut stream: SnapshotStream,
    latest: watch::Sender<Option<GameSnapshot>>,
) -> Result<FollowOutcome, ClientError> {
    loop {
        let snapshot = match stream.next().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                latest.send_replace(None);
                return Ok(FollowOutcome::Closed);
            }
            Err(e) => {
                tracing::warn!(error = %e, "game stream failed");
                latest.send_replace(None);
                return Err(e);
            }
        };

        if snapshot.is_rejection() {
            tracing::info!(
                game_id = %snapshot.id,
                lobby_status = %snapshot.lobby_status,
                "join refused"
            );
            latest.send_replace(None);
            return Ok(FollowOutcome::Rejected(snapshot));
        }

        if snapshot.game_status.is_ended() {
            latest.send_replace(Some(snapshot.clone()));
            return Ok(FollowOutcome::Ended(snapshot));
        }

        latest.send_replace(Some(snapshot));
    }
}
