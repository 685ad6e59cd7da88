//! Session registry: creates games and looks them up by id.

use std::collections::HashMap;

use mafia_protocol::GameId;

use crate::SessionHandle;
use crate::handle::spawn_session;
use crate::id::generate_game_id;

/// Default command channel size for session actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// All games on this server, keyed by id.
///
/// `SessionRegistry` is a plain `HashMap` and is not thread-safe by itself.
/// The server keeps it behind a `tokio::sync::Mutex`, so every first-time
/// joiner that creates a game goes through one lock. Lookups only clone a
/// handle, so the lock is never held across session I/O.
///
/// Entries are never removed: a long-running server accumulates ended
/// games.
pub struct SessionRegistry {
    sessions: HashMap<GameId, SessionHandle>,
    channel_size: usize,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            channel_size: DEFAULT_CHANNEL_SIZE,
        }
    }

    /// Creates a new game with `capacity` seats and returns its handle.
    ///
    /// Must be called from within a Tokio runtime: the game's actor task is
    /// spawned here.
    pub fn create(&mut self, capacity: usize) -> SessionHandle {
        let mut id = generate_game_id();
        while self.sessions.contains_key(&id) {
            tracing::debug!(%id, "generated game id already taken, retrying");
            id = generate_game_id();
        }

        let handle = spawn_session(id.clone(), capacity, self.channel_size);
        self.sessions.insert(id, handle.clone());
        handle
    }

    /// Resolves the game a join request names.
    ///
    /// An empty `id` creates a brand-new game. Any other id is looked up;
    /// `None` means no such game.
    pub fn get_or_create(&mut self, id: &GameId, capacity: usize) -> Option<SessionHandle> {
        if id.is_empty() {
            Some(self.create(capacity))
        } else {
            self.lookup(id)
        }
    }

    /// Looks up an existing game.
    pub fn lookup(&self, id: &GameId) -> Option<SessionHandle> {
        self.sessions.get(id).cloned()
    }

    /// Returns the number of games.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no game has been created yet.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Lists all game ids.
    pub fn ids(&self) -> Vec<GameId> {
        self.sessions.keys().cloned().collect()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
