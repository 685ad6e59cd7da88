//! Chat heartbeat stream.
//!
//! Real chat is not implemented: a `GetChatMessages` call receives a
//! placeholder message every interval until the client goes away.

use std::time::Duration;

use mafia_protocol::{ChatMessage, Codec, Response};
use mafia_transport::{Connection, TransportError};

use crate::MafiaError;
use crate::handler::{Responder, wait_or_disconnect};

/// Player number carried by every heartbeat message.
pub const HEARTBEAT_PLAYER_NUMBER: u32 = 100;

/// Sender name carried by every heartbeat message.
pub const HEARTBEAT_PLAYER_NAME: &str = "User";

/// Builds the `n`th heartbeat message.
pub fn heartbeat(n: u64) -> ChatMessage {
    ChatMessage {
        player_number: HEARTBEAT_PLAYER_NUMBER,
        player_name: HEARTBEAT_PLAYER_NAME.to_string(),
        message: format!("msg{n}"),
    }
}

/// Streams heartbeats, the first one immediately, until the peer closes or
/// a send fails.
pub(crate) async fn stream_chat<N, C>(
    conn: &N,
    responder: &mut Responder<'_, N, C>,
    interval: Duration,
) -> Result<(), MafiaError>
where
    N: Connection<Error = TransportError>,
    C: Codec,
{
    let conn_id = conn.id();
    let mut sent: u64 = 0;

    loop {
        let message = heartbeat(sent);
        tracing::info!(%conn_id, message = %message.message, "chat heartbeat");
        if let Err(e) = responder.send(Response::ChatMessage(message)).await {
            tracing::debug!(%conn_id, error = %e, "chat listener gone");
            return Ok(());
        }
        sent += 1;

        if !wait_or_disconnect(conn, interval).await {
            tracing::debug!(%conn_id, sent, "chat listener disconnected");
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_numbers_messages() {
        let first = heartbeat(0);
        assert_eq!(first.player_number, 100);
        assert_eq!(first.player_name, "User");
        assert_eq!(first.message, "msg0");
        assert_eq!(heartbeat(12).message, "msg12");
    }
}
