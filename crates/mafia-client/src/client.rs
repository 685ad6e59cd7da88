//! Calls against a mafia server.
//!
//! Every call opens its own connection, sends one request, and reads
//! responses until the server closes. Dropping a stream closes its
//! connection, which the server treats as the viewer leaving.

use mafia_protocol::{
    ChatMessage, Codec, Envelope, GameId, GameSnapshot, JoinParams, JsonCodec, Request, Response,
};
use mafia_transport::{ClientConnection, Connection};

use crate::{ClientError, GameFollower};

/// One open call: a connection with its request already sent.
struct Call {
    conn: ClientConnection,
    codec: JsonCodec,
}

impl Call {
    async fn open(addr: &str, request: Request) -> Result<Self, ClientError> {
        let conn = ClientConnection::connect(addr)
            .await
            .map_err(|source| ClientError::Unreachable {
                addr: addr.to_string(),
                source,
            })?;

        let codec = JsonCodec;
        let bytes = codec.encode(&Envelope::request(0, 0, request))?;
        conn.send(&bytes).await?;
        Ok(Self { conn, codec })
    }

    /// Next response, with server faults turned into errors. `None` once
    /// the server has closed the call.
    async fn next(&self) -> Result<Option<Response>, ClientError> {
        let Some(data) = self.conn.recv().await? else {
            return Ok(None);
        };
        match self.codec.decode_response(&data)? {
            Response::Error { code, message } => Err(ClientError::ServerFault { code, message }),
            response => Ok(Some(response)),
        }
    }

    async fn close(self) {
        if let Err(e) = self.conn.close().await {
            tracing::debug!(conn_id = %self.conn.id(), error = %e, "close failed");
        }
    }
}

/// Handle to a mafia server. Holds only the address.
#[derive(Debug, Clone)]
pub struct MafiaClient {
    addr: String,
}

impl MafiaClient {
    /// Creates a client for `addr` (`host:port` or a `ws://` URL).
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Liveness handshake.
    ///
    /// # Errors
    /// [`ClientError::Unreachable`] if the server can't be reached,
    /// [`ClientError::ServerFault`] if it reports a fault.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let call = Call::open(&self.addr, Request::Connect).await?;
        let response = call.next().await?;
        call.close().await;
        match response {
            Some(Response::Empty) => Ok(()),
            other => Err(ClientError::UnexpectedResponse(format!("{other:?}"))),
        }
    }

    /// Joins `game_id` as `user`, or creates a new game if `game_id` is
    /// empty, and returns the snapshot stream.
    pub async fn join_game(&self, user: &str, game_id: &GameId) -> Result<SnapshotStream, ClientError> {
        let request = Request::JoinGame(JoinParams {
            user: user.to_string(),
            game_id: game_id.clone(),
        });
        let call = Call::open(&self.addr, request).await?;
        tracing::debug!(%game_id, user, "join requested");
        Ok(SnapshotStream { call, done: false })
    }

    /// Joins like [`join_game`](Self::join_game) and keeps the latest
    /// snapshot published from a background task.
    pub async fn follow_game(&self, user: &str, game_id: &GameId) -> Result<GameFollower, ClientError> {
        let stream = self.join_game(user, game_id).await?;
        Ok(GameFollower::spawn(stream))
    }

    /// Subscribes to the chat stream.
    pub async fn chat_messages(&self) -> Result<ChatStream, ClientError> {
        let call = Call::open(&self.addr, Request::GetChatMessages).await?;
        Ok(ChatStream { call })
    }
}

/// Snapshots of one game, as the joined viewer may see it.
///
/// Ends after a rejection snapshot, after the `ENDED` snapshot, or when the
/// server closes the stream.
pub struct SnapshotStream {
    call: Call,
    done: bool,
}

impl SnapshotStream {
    /// Waits for the next snapshot. `Ok(None)` means the stream is over.
    pub async fn next(&mut self) -> Result<Option<GameSnapshot>, ClientError> {
        if self.done {
            return Ok(None);
        }
        match self.call.next().await {
            Ok(Some(Response::Game(snapshot))) => {
                if snapshot.is_rejection() || snapshot.game_status.is_ended() {
                    self.done = true;
                }
                Ok(Some(snapshot))
            }
            Ok(Some(other)) => {
                self.done = true;
                Err(ClientError::UnexpectedResponse(format!("{other:?}")))
            }
            Ok(None) => {
                self.done = true;
                Ok(None)
            }
            Err(e) => {
                self.done = true;
                Err(e)
            }
        }
    }

    /// Leaves the game by closing the connection.
    pub async fn close(self) {
        self.call.close().await;
    }
}

/// The chat stream.
pub struct ChatStream {
    call: Call,
}

impl ChatStream {
    pub async fn next(&mut self) -> Result<Option<ChatMessage>, ClientError> {
        match self.call.next().await? {
            Some(Response::ChatMessage(message)) => Ok(Some(message)),
            Some(other) => Err(ClientError::UnexpectedResponse(format!("{other:?}"))),
            None => Ok(None),
        }
    }

    pub async fn close(self) {
        self.call.close().await;
    }
}
