//! Session actor: one Tokio task per game owning its [`Session`].
//!
//! Every operation on a game, reads included, is a [`SessionCommand`] sent
//! over a bounded mpsc channel and answered on a oneshot reply channel.
//! The actor processes commands one at a time, so the roster needs no lock
//! of its own: two concurrent joins can never both take the last seat.

use mafia_protocol::{Condition, GameId, GameSnapshot, GameStatus, Role};
use tokio::sync::{mpsc, oneshot};

use crate::{JoinOutcome, Session, SessionError, SessionInfo};

/// Commands sent to a session actor.
pub(crate) enum SessionCommand {
    Join {
        login: String,
        reply: oneshot::Sender<JoinOutcome>,
    },
    Leave {
        login: String,
        reply: oneshot::Sender<bool>,
    },
    Render {
        viewer: String,
        reply: oneshot::Sender<Result<GameSnapshot, SessionError>>,
    },
    Info {
        reply: oneshot::Sender<SessionInfo>,
    },
    AssignRole {
        login: String,
        role: Role,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    SetCondition {
        login: String,
        condition: Condition,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    MarkChecked {
        login: String,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    SetGameStatus {
        status: GameStatus,
        reply: oneshot::Sender<()>,
    },
    SetSheriffResultsPublic {
        public: bool,
        reply: oneshot::Sender<()>,
    },
    Close {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to a running session actor.
///
/// Cheap to clone: it's an `mpsc::Sender` and the game id. The registry
/// holds one, and every connection handler joined to the game holds one.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: GameId,
    capacity: usize,
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// The game's id. Immutable for the life of the game.
    pub fn id(&self) -> &GameId {
        &self.id
    }

    /// Number of seats, fixed at creation.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tries to seat `login`.
    pub async fn join(&self, login: &str) -> Result<JoinOutcome, SessionError> {
        self.request(|reply| SessionCommand::Join {
            login: login.to_string(),
            reply,
        })
        .await
    }

    /// Removes `login` if the game has not started. Returns `true` if a
    /// player was removed.
    pub async fn leave(&self, login: &str) -> Result<bool, SessionError> {
        self.request(|reply| SessionCommand::Leave {
            login: login.to_string(),
            reply,
        })
        .await
    }

    /// Renders the game as `viewer` may see it.
    pub async fn render_for(&self, viewer: &str) -> Result<GameSnapshot, SessionError> {
        self.request(|reply| SessionCommand::Render {
            viewer: viewer.to_string(),
            reply,
        })
        .await?
    }

    /// Returns the game's metadata.
    pub async fn info(&self) -> Result<SessionInfo, SessionError> {
        self.request(|reply| SessionCommand::Info { reply }).await
    }

    pub async fn assign_role(&self, login: &str, role: Role) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::AssignRole {
            login: login.to_string(),
            role,
            reply,
        })
        .await?
    }

    pub async fn set_condition(
        &self,
        login: &str,
        condition: Condition,
    ) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::SetCondition {
            login: login.to_string(),
            condition,
            reply,
        })
        .await?
    }

    pub async fn mark_checked_by_sheriff(&self, login: &str) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::MarkChecked {
            login: login.to_string(),
            reply,
        })
        .await?
    }

    pub async fn set_game_status(&self, status: GameStatus) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::SetGameStatus { status, reply })
            .await
    }

    pub async fn set_sheriff_results_public(&self, public: bool) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::SetSheriffResultsPublic { public, reply })
            .await
    }

    /// Stops admitting new players.
    pub async fn close(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Close { reply }).await
    }

    /// Sends a command and waits for the actor's reply.
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| SessionError::Unavailable(self.id.clone()))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Unavailable(self.id.clone()))
    }
}

/// The actor side. Runs inside its own task until every handle is dropped.
struct SessionActor {
    session: Session,
    receiver: mpsc::Receiver<SessionCommand>,
}

impl SessionActor {
    async fn run(mut self) {
        let game_id = self.session.id().clone();
        tracing::info!(%game_id, capacity = self.session.capacity(), "game created");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle(cmd);
        }

        tracing::info!(%game_id, "game actor stopped");
    }

    fn handle(&mut self, cmd: SessionCommand) {
        let game_id = self.session.id().clone();
        match cmd {
            SessionCommand::Join { login, reply } => {
                let outcome = self.session.join(&login);
                match outcome {
                    JoinOutcome::Admitted { lobby_full } => tracing::info!(
                        %game_id,
                        %login,
                        players = self.session.players().len(),
                        lobby_full,
                        "player joined"
                    ),
                    JoinOutcome::Full => {
                        tracing::debug!(%game_id, %login, "join refused, game full")
                    }
                }
                let _ = reply.send(outcome);
            }
            SessionCommand::Leave { login, reply } => {
                let removed = self.session.leave(&login);
                if removed {
                    tracing::info!(
                        %game_id,
                        %login,
                        players = self.session.players().len(),
                        "player left"
                    );
                } else {
                    tracing::debug!(
                        %game_id,
                        %login,
                        game_status = %self.session.game_status(),
                        "leave ignored"
                    );
                }
                let _ = reply.send(removed);
            }
            SessionCommand::Render { viewer, reply } => {
                let _ = reply.send(self.session.render_for(&viewer));
            }
            SessionCommand::Info { reply } => {
                let _ = reply.send(self.session.info());
            }
            SessionCommand::AssignRole { login, role, reply } => {
                let _ = reply.send(self.session.assign_role(&login, role));
            }
            SessionCommand::SetCondition {
                login,
                condition,
                reply,
            } => {
                let _ = reply.send(self.session.set_condition(&login, condition));
            }
            SessionCommand::MarkChecked { login, reply } => {
                let _ = reply.send(self.session.mark_checked_by_sheriff(&login));
            }
            SessionCommand::SetGameStatus { status, reply } => {
                tracing::info!(%game_id, %status, "game status changed");
                self.session.set_game_status(status);
                let _ = reply.send(());
            }
            SessionCommand::SetSheriffResultsPublic { public, reply } => {
                self.session.set_sheriff_results_public(public);
                let _ = reply.send(());
            }
            SessionCommand::Close { reply } => {
                tracing::info!(%game_id, "game closed to new players");
                self.session.close();
                let _ = reply.send(());
            }
        }
    }
}

/// Spawns a session actor for a new, empty game and returns its handle.
///
/// `channel_size` bounds the command queue; callers wait when it is full.
pub(crate) fn spawn_session(id: GameId, capacity: usize, channel_size: usize) -> SessionHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = SessionActor {
        session: Session::new(id.clone(), capacity),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    SessionHandle {
        id,
        capacity,
        sender: tx,
    }
}
