//! Core protocol types for the game server's wire format.
//!
//! Everything in this module travels "on the wire": the closed sets of
//! lobby/game/role/condition values, the redacted player view, the full
//! game snapshot a viewer receives, and the request/response envelopes
//! that wrap them.
//!
//! The JSON shape is fixed by the client contract:
//!
//! ```text
//! { "id": "aB3dE9xZ",
//!   "lobbyStatus": "HAVE_SLOTS",
//!   "gameStatus": "NOT_STARTED",
//!   "players": [ { "login": "alice", "role": "UNKNOWN",
//!                  "condition": "ALIVE", "checkedBySheriff": false } ] }
//! ```

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// The identifier of one game session.
///
/// A newtype around `String` so a game id can't be confused with a player
/// login. The empty id has a protocol meaning: "create a new game for me".
///
/// `#[serde(transparent)]` keeps the JSON representation a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub String);

impl GameId {
    /// Returns `true` for the empty id, which asks for a new game.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "<new>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<&str> for GameId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for GameId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Whether a game can still admit players.
///
/// `Full` and `NotFound` double as protocol-level rejection codes: a join
/// that is refused receives exactly one snapshot carrying one of them, and
/// `NotFound` is never stored on a real game.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LobbyStatus {
    #[default]
    HaveSlots,
    Full,
    NotFound,
}

/// The play phase of a game.
///
/// `Day` and `Night` are driven by the rules engine; the session core only
/// cares about `NotStarted` (roster still mutable) and `Ended` (full
/// disclosure, streams finish).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    #[default]
    NotStarted,
    Day,
    Night,
    Ended,
}

impl GameStatus {
    /// Returns `true` once the game is over.
    pub fn is_ended(self) -> bool {
        matches!(self, Self::Ended)
    }
}

/// A player's secret role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Not yet assigned, or hidden from the viewer.
    #[default]
    Unknown,
    Mafia,
    Sheriff,
    Civilian,
}

impl Role {
    /// Roles whose holders recognise each other.
    ///
    /// A mafioso sees the other mafiosi, a sheriff sees the other sheriffs.
    /// Civilians see nobody's role, including their own teammates'.
    pub fn sees_teammates(self) -> bool {
        matches!(self, Self::Mafia | Self::Sheriff)
    }
}

/// Whether a player is still in play.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    #[default]
    Alive,
    Dead,
}

impl fmt::Display for LobbyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HaveSlots => write!(f, "HAVE_SLOTS"),
            Self::Full => write!(f, "FULL"),
            Self::NotFound => write!(f, "NOT_FOUND"),
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "NOT_STARTED"),
            Self::Day => write!(f, "DAY"),
            Self::Night => write!(f, "NIGHT"),
            Self::Ended => write!(f, "ENDED"),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::Mafia => write!(f, "MAFIA"),
            Self::Sheriff => write!(f, "SHERIFF"),
            Self::Civilian => write!(f, "CIVILIAN"),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alive => write!(f, "ALIVE"),
            Self::Dead => write!(f, "DEAD"),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// One player as a particular viewer is allowed to see them.
///
/// `role` is `Unknown` and `checked_by_sheriff` is `false` unless the
/// redaction rules reveal them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub login: String,
    pub role: Role,
    pub condition: Condition,
    pub checked_by_sheriff: bool,
}

/// A viewer-specific, point-in-time rendering of a game.
///
/// Computed fresh for every push and never stored server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub id: GameId,
    pub lobby_status: LobbyStatus,
    pub game_status: GameStatus,
    #[serde(default)]
    pub players: Vec<PlayerView>,
}

impl GameSnapshot {
    /// Builds the single terminal snapshot sent when a join is refused.
    pub fn rejection(id: GameId, status: LobbyStatus) -> Self {
        Self {
            id,
            lobby_status: status,
            game_status: GameStatus::NotStarted,
            players: Vec::new(),
        }
    }

    /// Returns `true` if this snapshot reports a refused join.
    ///
    /// A `Full` lobby status alone is not a rejection: a viewer inside a
    /// full game keeps receiving `Full` snapshots with the roster in them.
    pub fn is_rejection(&self) -> bool {
        match self.lobby_status {
            LobbyStatus::NotFound => true,
            LobbyStatus::Full => self.players.is_empty(),
            LobbyStatus::HaveSlots => false,
        }
    }

    /// Finds a player by login.
    pub fn player(&self, login: &str) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.login == login)
    }
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

/// Parameters of a `JoinGame` call.
///
/// An empty `game_id` asks the server to create a new game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinParams {
    pub user: String,
    #[serde(default)]
    pub game_id: GameId,
}

/// A chat line. The chat is a heartbeat stub for now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub player_number: u32,
    pub player_name: String,
    pub message: String,
}

/// The call a client opens a connection for.
///
/// Each connection carries exactly one request; the server answers with
/// one or more [`Response`]s and then closes.
///
/// `#[serde(tag = "type")]` gives `{ "type": "JoinGame", "user": ..., "gameId": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Liveness handshake. Answered with a single `Empty`.
    Connect,

    /// Join (or create) a game and stream snapshots until it ends.
    JoinGame(JoinParams),

    /// Subscribe to the chat stream.
    GetChatMessages,
}

/// What the server sends back on a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    /// Reply to `Connect`.
    Empty,

    /// One snapshot of a game, or a terminal rejection.
    Game(GameSnapshot),

    /// One chat line.
    ChatMessage(ChatMessage),

    /// The server faulted or could not understand the request.
    /// `code` follows HTTP conventions (400 bad request, 500 internal).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The content of an envelope.
///
/// Adjacently tagged: `{ "type": "Response", "data": { "type": "Empty" } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    Request(Request),
    Response(Response),
}

/// The top-level frame. Every WebSocket message is one `Envelope`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-connection sequence number, starting at 0 on each side.
    pub seq: u64,

    /// Milliseconds since the sender started the call.
    pub timestamp: u64,

    pub payload: Payload,
}

impl Envelope {
    /// Wraps a request.
    pub fn request(seq: u64, timestamp: u64, request: Request) -> Self {
        Self {
            seq,
            timestamp,
            payload: Payload::Request(request),
        }
    }

    /// Wraps a response.
    pub fn response(seq: u64, timestamp: u64, response: Response) -> Self {
        Self {
            seq,
            timestamp,
            payload: Payload::Response(response),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The client contract fixes the JSON shape of snapshots and calls.
    //! These tests pin the serde attributes that produce it.

    use super::*;

    fn sample_snapshot() -> GameSnapshot {
        GameSnapshot {
            id: GameId::from("aB3dE9xZ"),
            lobby_status: LobbyStatus::HaveSlots,
            game_status: GameStatus::NotStarted,
            players: vec![PlayerView {
                login: "alice".into(),
                role: Role::Unknown,
                condition: Condition::Alive,
                checked_by_sheriff: false,
            }],
        }
    }

    #[test]
    fn test_game_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&GameId::from("xyz")).unwrap();
        assert_eq!(json, "\"xyz\"");
    }

    #[test]
    fn test_game_id_display_marks_empty_id() {
        assert_eq!(GameId::default().to_string(), "<new>");
        assert_eq!(GameId::from("abc").to_string(), "abc");
    }

    #[test]
    fn test_enums_serialize_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&LobbyStatus::HaveSlots).unwrap(),
            "\"HAVE_SLOTS\""
        );
        assert_eq!(
            serde_json::to_string(&LobbyStatus::NotFound).unwrap(),
            "\"NOT_FOUND\""
        );
        assert_eq!(
            serde_json::to_string(&GameStatus::NotStarted).unwrap(),
            "\"NOT_STARTED\""
        );
        assert_eq!(serde_json::to_string(&Role::Sheriff).unwrap(), "\"SHERIFF\"");
        assert_eq!(serde_json::to_string(&Condition::Dead).unwrap(), "\"DEAD\"");
    }

    #[test]
    fn test_enum_display_matches_wire_names() {
        for status in [LobbyStatus::HaveSlots, LobbyStatus::Full, LobbyStatus::NotFound] {
            let wire = serde_json::to_string(&status).unwrap();
            assert_eq!(wire, format!("\"{status}\""));
        }
        for role in [Role::Unknown, Role::Mafia, Role::Sheriff, Role::Civilian] {
            let wire = serde_json::to_string(&role).unwrap();
            assert_eq!(wire, format!("\"{role}\""));
        }
    }

    #[test]
    fn test_enum_defaults() {
        assert_eq!(LobbyStatus::default(), LobbyStatus::HaveSlots);
        assert_eq!(GameStatus::default(), GameStatus::NotStarted);
        assert_eq!(Role::default(), Role::Unknown);
        assert_eq!(Condition::default(), Condition::Alive);
    }

    #[test]
    fn test_role_sees_teammates_only_for_mafia_and_sheriff() {
        assert!(Role::Mafia.sees_teammates());
        assert!(Role::Sheriff.sees_teammates());
        assert!(!Role::Civilian.sees_teammates());
        assert!(!Role::Unknown.sees_teammates());
    }

    #[test]
    fn test_snapshot_json_uses_camel_case_fields() {
        let json = serde_json::to_value(sample_snapshot()).unwrap();

        assert_eq!(json["id"], "aB3dE9xZ");
        assert_eq!(json["lobbyStatus"], "HAVE_SLOTS");
        assert_eq!(json["gameStatus"], "NOT_STARTED");
        assert_eq!(json["players"][0]["login"], "alice");
        assert_eq!(json["players"][0]["role"], "UNKNOWN");
        assert_eq!(json["players"][0]["condition"], "ALIVE");
        assert_eq!(json["players"][0]["checkedBySheriff"], false);
    }

    #[test]
    fn test_snapshot_players_default_when_missing() {
        let json = r#"{"id": "x", "lobbyStatus": "NOT_FOUND", "gameStatus": "NOT_STARTED"}"#;
        let snapshot: GameSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.players.is_empty());
        assert!(snapshot.is_rejection());
    }

    #[test]
    fn test_rejection_snapshot_shape() {
        let snapshot = GameSnapshot::rejection(GameId::from("nope"), LobbyStatus::Full);
        assert_eq!(snapshot.id, GameId::from("nope"));
        assert_eq!(snapshot.lobby_status, LobbyStatus::Full);
        assert_eq!(snapshot.game_status, GameStatus::NotStarted);
        assert!(snapshot.players.is_empty());
        assert!(snapshot.is_rejection());
    }

    #[test]
    fn test_full_snapshot_with_roster_is_not_rejection() {
        let mut snapshot = sample_snapshot();
        snapshot.lobby_status = LobbyStatus::Full;
        assert!(!snapshot.is_rejection());
    }

    #[test]
    fn test_snapshot_player_lookup() {
        let snapshot = sample_snapshot();
        assert!(snapshot.player("alice").is_some());
        assert!(snapshot.player("bob").is_none());
    }

    #[test]
    fn test_join_request_json_format() {
        let req = Request::JoinGame(JoinParams {
            user: "alice".into(),
            game_id: GameId::from("abc"),
        });
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["type"], "JoinGame");
        assert_eq!(json["user"], "alice");
        assert_eq!(json["gameId"], "abc");
    }

    #[test]
    fn test_join_request_without_game_id_means_create() {
        let json = r#"{"type": "JoinGame", "user": "bob"}"#;
        let req: Request = serde_json::from_str(json).unwrap();
        match req {
            Request::JoinGame(params) => assert!(params.game_id.is_empty()),
            other => panic!("expected JoinGame, got {other:?}"),
        }
    }

    #[test]
    fn test_response_game_json_format() {
        let resp = Response::Game(sample_snapshot());
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["type"], "Game");
        assert_eq!(json["lobbyStatus"], "HAVE_SLOTS");
    }

    #[test]
    fn test_response_error_json_format() {
        let resp = Response::Error {
            code: 500,
            message: "internal".into(),
        };
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["type"], "Error");
        assert_eq!(json["code"], 500);
    }

    #[test]
    fn test_chat_message_json_format() {
        let msg = ChatMessage {
            player_number: 100,
            player_name: "User".into(),
            message: "msg0".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["playerNumber"], 100);
        assert_eq!(json["playerName"], "User");
    }

    #[test]
    fn test_envelope_payload_adjacently_tagged() {
        let env = Envelope::request(0, 0, Request::Connect);
        let json = serde_json::to_value(&env).unwrap();

        assert_eq!(json["payload"]["type"], "Request");
        assert_eq!(json["payload"]["data"]["type"], "Connect");
    }

    #[test]
    fn test_decode_unknown_request_type_returns_error() {
        let unknown = r#"{"type": "StartGame"}"#;
        let result: Result<Request, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_unknown_role_returns_error() {
        let result: Result<Role, _> = serde_json::from_str("\"DOCTOR\"");
        assert!(result.is_err());
    }
}
