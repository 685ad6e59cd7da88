//! Seat configuration for a game.

use serde::{Deserialize, Serialize};

/// How many seats of each role a game has.
///
/// The sum is the game's capacity, fixed when the game is created. Role
/// assignment itself belongs to the rules engine; the session core only
/// needs the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleCounts {
    pub mafia: usize,
    pub sheriff: usize,
    pub civilian: usize,
}

impl RoleCounts {
    /// Total number of seats.
    pub fn capacity(&self) -> usize {
        self.mafia + self.sheriff + self.civilian
    }
}

impl Default for RoleCounts {
    fn default() -> Self {
        Self {
            mafia: 1,
            sheriff: 1,
            civilian: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_sums_all_roles() {
        let roles = RoleCounts {
            mafia: 2,
            sheriff: 1,
            civilian: 4,
        };
        assert_eq!(roles.capacity(), 7);
    }

    #[test]
    fn test_default_role_counts() {
        assert_eq!(RoleCounts::default().capacity(), 4);
    }
}
