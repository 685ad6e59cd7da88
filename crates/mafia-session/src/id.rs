//! Game id generation.

use mafia_protocol::GameId;
use rand::seq::IndexedRandom;

/// Symbols a generated id is drawn from: `[A-Za-z0-9]`.
const ID_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of a generated id.
pub const GAME_ID_LEN: usize = 8;

/// Generates a fresh game id.
///
/// Eight symbols sampled uniformly *without replacement*, so no symbol
/// repeats within one id. Uniqueness across games is not guaranteed here;
/// the registry retries on the rare collision.
pub fn generate_game_id() -> GameId {
    let mut rng = rand::rng();
    let id: String = ID_ALPHABET
        .choose_multiple(&mut rng, GAME_ID_LEN)
        .map(|&b| char::from(b))
        .collect();
    GameId(id)
}
