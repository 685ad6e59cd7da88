//! Per-connection handler: one call per connection.
//!
//! Each accepted socket gets its own Tokio task running this handler.
//! The flow is:
//!   1. Complete the WebSocket handshake (5 s deadline)
//!   2. Receive the request envelope (5 s deadline)
//!   3. Dispatch: `Connect` → `Empty`, `GetChatMessages` → chat stream,
//!      `JoinGame` → admission then snapshot stream
//!   4. Close the connection
//!
//! Join protocol:
//!
//! ```text
//! ADMITTING ──(unknown id)──→ REJECTED_NOT_FOUND   one NOT_FOUND snapshot
//!     │ ────(no seat)──────→ REJECTED_FULL        one FULL snapshot
//!     ▼
//! STREAMING ──(ENDED pushed / client gone / send failed)──→ CLOSED
//! ```
//!
//! Leaving `STREAMING` by any path drops the [`LeaveGuard`], which removes
//! the viewer from a not-yet-started game.

use std::sync::Arc;
use std::time::{Duration, Instant};

use mafia_protocol::{
    Codec, Envelope, GameSnapshot, JoinParams, LobbyStatus, ProtocolError, Request, Response,
};
use mafia_session::{JoinOutcome, SessionHandle};
use mafia_transport::{Connection, Handshake, TransportError};

use crate::MafiaError;
use crate::chat::stream_chat;
use crate::server::ServerState;

/// How long a fresh socket may take to upgrade.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a fresh connection may take to send its request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Drop guard that takes a viewer out of the roster when their stream ends.
///
/// `Drop` runs exactly once on every exit path, including errors and
/// panics. Since `Drop` is synchronous, the leave is sent to the session
/// actor from a spawned task.
struct LeaveGuard {
    session: SessionHandle,
    login: String,
}

impl Drop for LeaveGuard {
    fn drop(&mut self) {
        let session = self.session.clone();
        let login = std::mem::take(&mut self.login);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = session.leave(&login).await {
                        tracing::debug!(%login, error = %e, "leave after stream failed");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(
                    game_id = %self.session.id(),
                    %login,
                    "runtime gone, leave skipped"
                );
            }
        }
    }
}

/// Writes response envelopes for one call.
pub(crate) struct Responder<'a, N: Connection, C: Codec> {
    conn: &'a N,
    codec: &'a C,
    seq: u64,
    start: Instant,
}

impl<'a, N, C> Responder<'a, N, C>
where
    N: Connection<Error = TransportError>,
    C: Codec,
{
    fn new(conn: &'a N, codec: &'a C) -> Self {
        Self {
            conn,
            codec,
            seq: 0,
            start: Instant::now(),
        }
    }

    /// Encodes and sends one response.
    pub(crate) async fn send(&mut self, response: Response) -> Result<(), MafiaError> {
        let envelope = Envelope::response(
            self.seq,
            self.start.elapsed().as_millis() as u64,
            response,
        );
        self.seq += 1;
        let bytes = self.codec.encode(&envelope)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }
}

/// Upgrades an accepted socket, then serves it.
pub(crate) async fn handle_incoming<H, C>(
    incoming: H,
    state: Arc<ServerState<C>>,
) -> Result<(), MafiaError>
where
    H: Handshake<Error = TransportError>,
    H::Connection: Connection<Error = TransportError>,
    C: Codec,
{
    let conn = match tokio::time::timeout(HANDSHAKE_TIMEOUT, incoming.handshake()).await {
        Ok(conn) => conn?,
        Err(elapsed) => {
            tracing::debug!("handshake timed out");
            return Err(TransportError::Accept(elapsed.into()).into());
        }
    };
    handle_connection(conn, state).await
}

/// Handles a single connection from handshake to close.
pub(crate) async fn handle_connection<N, C>(
    conn: N,
    state: Arc<ServerState<C>>,
) -> Result<(), MafiaError>
where
    N: Connection<Error = TransportError>,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let result = serve_call(&conn, &state).await;

    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close failed");
    }
    result
}

async fn serve_call<N, C>(conn: &N, state: &Arc<ServerState<C>>) -> Result<(), MafiaError>
where
    N: Connection<Error = TransportError>,
    C: Codec,
{
    let conn_id = conn.id();
    let mut responder = Responder::new(conn, &state.codec);

    let data = match tokio::time::timeout(REQUEST_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            tracing::debug!(%conn_id, "connection closed before request");
            return Ok(());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            tracing::debug!(%conn_id, "request timed out");
            return Err(ProtocolError::RequestTimeout(REQUEST_TIMEOUT).into());
        }
    };

    let request = match state.codec.decode_request(&data) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(%conn_id, error = %e, "rejecting malformed request");
            responder
                .send(Response::Error {
                    code: 400,
                    message: e.to_string(),
                })
                .await?;
            return Err(e.into());
        }
    };

    match request {
        Request::Connect => {
            tracing::debug!(%conn_id, "connect");
            responder.send(Response::Empty).await
        }
        Request::GetChatMessages => {
            stream_chat(conn, &mut responder, state.settings.chat_interval).await
        }
        Request::JoinGame(params) => join_game(conn, state, &mut responder, params).await,
    }
}

/// The join protocol: admission, then the snapshot stream.
async fn join_game<N, C>(
    conn: &N,
    state: &Arc<ServerState<C>>,
    responder: &mut Responder<'_, N, C>,
    params: JoinParams,
) -> Result<(), MafiaError>
where
    N: Connection<Error = TransportError>,
    C: Codec,
{
    let JoinParams { user, game_id } = params;

    // --- ADMITTING ---
    // Lock only to resolve the id; the join itself goes to the game actor.
    let session = {
        let mut registry = state.registry.lock().await;
        registry.get_or_create(&game_id, state.settings.roles.capacity())
    };

    let Some(session) = session else {
        tracing::info!(%game_id, login = %user, "join refused, game not found");
        let rejection = GameSnapshot::rejection(game_id, LobbyStatus::NotFound);
        return responder.send(Response::Game(rejection)).await;
    };

    if session.join(&user).await? == JoinOutcome::Full {
        tracing::info!(game_id = %session.id(), login = %user, "join refused, game full");
        let rejection = GameSnapshot::rejection(session.id().clone(), LobbyStatus::Full);
        return responder.send(Response::Game(rejection)).await;
    }

    // --- STREAMING ---
    let _guard = LeaveGuard {
        session: session.clone(),
        login: user.clone(),
    };
    stream_snapshots(conn, responder, &session, &user, state.settings.update_interval).await

    // _guard drops here → leave fires.
}

/// Pushes the viewer's snapshot every `interval` until the game ends or the
/// viewer goes away.
async fn stream_snapshots<N, C>(
    conn: &N,
    responder: &mut Responder<'_, N, C>,
    session: &SessionHandle,
    login: &str,
    interval: Duration,
) -> Result<(), MafiaError>
where
    N: Connection<Error = TransportError>,
    C: Codec,
{
    let game_id = session.id();

    loop {
        let snapshot = match session.render_for(login).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(%game_id, %login, error = %e, "cannot render snapshot");
                let fault = Response::Error {
                    code: 500,
                    message: "internal server error".into(),
                };
                if let Err(send_err) = responder.send(fault).await {
                    tracing::debug!(%game_id, %login, error = %send_err, "could not report fault");
                }
                return Err(e.into());
            }
        };

        let ended = snapshot.game_status.is_ended();
        if let Err(e) = responder.send(Response::Game(snapshot)).await {
            tracing::info!(%game_id, %login, error = %e, "viewer gone, stream ended");
            return Ok(());
        }

        if ended {
            tracing::info!(%game_id, %login, "game ended, stream complete");
            return Ok(());
        }

        if !wait_or_disconnect(conn, interval).await {
            tracing::info!(%game_id, %login, "viewer disconnected");
            return Ok(());
        }
    }
}

/// Sleeps for `period` while watching the connection.
///
/// Returns `false` as soon as the peer closes or the connection fails, so
/// a stream stops without waiting out the interval. Stray client frames
/// are ignored.
pub(crate) async fn wait_or_disconnect<N>(conn: &N, period: Duration) -> bool
where
    N: Connection<Error = TransportError>,
{
    let deadline = tokio::time::Instant::now() + period;
    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => return true,
            incoming = conn.recv() => match incoming {
                Ok(Some(_)) => {
                    tracing::debug!(conn_id = %conn.id(), "ignoring frame on a server stream");
                }
                Ok(None) => return false,
                Err(e) => {
                    tracing::debug!(conn_id = %conn.id(), error = %e, "recv failed");
                    return false;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mafia_protocol::JsonCodec;
    use mafia_session::{SessionError, SessionRegistry};
    use mafia_transport::ConnectionId;

    /// Records every frame sent; `recv` never yields.
    struct RecordingConnection {
        id: ConnectionId,
        sent: std::sync::Mutex<Vec<Vec<u8>>>,
    }

    impl RecordingConnection {
        fn new() -> Self {
            Self {
                id: ConnectionId::next(),
                sent: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<Vec<u8>> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Connection for RecordingConnection {
        type Error = TransportError;

        async fn send(&self, frame: &[u8]) -> Result<(), Self::Error> {
            self.sent.lock().unwrap().push(frame.to_vec());
            Ok(())
        }

        async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
            std::future::pending().await
        }

        async fn close(&self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn id(&self) -> ConnectionId {
            self.id
        }
    }

    // ========================================================================
    // stream_snapshots
    // ========================================================================

    #[tokio::test]
    async fn test_stream_snapshots_unseated_viewer_gets_500_and_stream_aborts() {
        let mut registry = SessionRegistry::new();
        let session = registry.create(3);
        let conn = RecordingConnection::new();
        let codec = JsonCodec;
        let mut responder = Responder::new(&conn, &codec);

        let result = stream_snapshots(
            &conn,
            &mut responder,
            &session,
            "ghost",
            Duration::from_millis(10),
        )
        .await;

        assert!(matches!(
            result,
            Err(MafiaError::Session(SessionError::NotAParticipant { .. }))
        ));

        let frames = conn.sent();
        assert_eq!(frames.len(), 1);
        match codec.decode_response(&frames[0]).unwrap() {
            Response::Error { code, message } => {
                assert_eq!(code, 500);
                assert_eq!(message, "internal server error");
            }
            other => panic!("expected a 500, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stream_snapshots_seated_viewer_gets_snapshot() {
        let mut registry = SessionRegistry::new();
        let session = registry.create(3);
        session.join("alice").await.unwrap();
        let conn = RecordingConnection::new();
        let codec = JsonCodec;
        let mut responder = Responder::new(&conn, &codec);

        // recv never yields, so the stream keeps running until cancelled.
        let streamed = tokio::time::timeout(
            Duration::from_millis(100),
            stream_snapshots(&conn, &mut responder, &session, "alice", Duration::from_millis(10)),
        )
        .await;
        assert!(streamed.is_err());

        let frames = conn.sent();
        assert!(!frames.is_empty());
        assert!(matches!(
            codec.decode_response(&frames[0]).unwrap(),
            Response::Game(_)
        ));
    }
}
