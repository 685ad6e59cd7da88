//! The session state: roster, statuses, and per-viewer redaction.
//!
//! [`Session`] is plain data with synchronous methods. It is never shared
//! directly: each session is owned by one actor task (see
//! [`SessionHandle`](crate::SessionHandle)), which serializes every call.
//! That is what makes `join` and `leave` atomic with respect to each other.

use mafia_protocol::{
    Condition, GameId, GameSnapshot, GameStatus, LobbyStatus, PlayerView, Role,
};

use crate::SessionError;

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A seated player and their secret state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub login: String,
    pub role: Role,
    pub condition: Condition,
    pub checked_by_sheriff: bool,
}

impl Player {
    /// A freshly seated player: no role yet, alive, unchecked.
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            role: Role::Unknown,
            condition: Condition::Alive,
            checked_by_sheriff: false,
        }
    }

    /// What `viewer` is allowed to know about this player.
    ///
    /// Rules, first match wins:
    ///
    /// 1. Game ended: everything is revealed.
    /// 2. Sheriff results are public and this player is a sheriff or was
    ///    checked: role and check flag are revealed.
    /// 3. Viewer is mafia or sheriff and shares this player's role: the
    ///    role is revealed (this covers the viewer looking at themselves).
    /// 4. Otherwise role is `Unknown` and the check flag is hidden.
    ///
    /// `condition` is always public.
    fn view_for(
        &self,
        viewer: &Player,
        game_status: GameStatus,
        sheriff_results_public: bool,
    ) -> PlayerView {
        let mut view = PlayerView {
            login: self.login.clone(),
            role: Role::Unknown,
            condition: self.condition,
            checked_by_sheriff: false,
        };

        if game_status.is_ended()
            || (sheriff_results_public
                && (self.role == Role::Sheriff || self.checked_by_sheriff))
        {
            view.role = self.role;
            view.checked_by_sheriff = self.checked_by_sheriff;
        } else if viewer.role.sees_teammates() && viewer.role == self.role {
            view.role = self.role;
        }

        view
    }
}

// ---------------------------------------------------------------------------
// Join outcome / info
// ---------------------------------------------------------------------------

/// Result of a join attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The player was seated. `lobby_full` is `true` if they took the
    /// last seat.
    Admitted { lobby_full: bool },

    /// The game is full or closed; the roster is unchanged.
    Full,
}

impl JoinOutcome {
    /// Returns `true` if the player was seated.
    pub fn is_admitted(self) -> bool {
        matches!(self, Self::Admitted { .. })
    }
}

/// Session metadata without any secret player state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: GameId,
    pub lobby_status: LobbyStatus,
    pub game_status: GameStatus,
    pub sheriff_results_public: bool,
    pub player_count: usize,
    pub capacity: usize,
    pub closed: bool,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One game's mutable state.
///
/// Invariants:
/// - `players.len() <= capacity`
/// - `lobby_status == Full` exactly when `players.len() == capacity`
/// - once `game_status != NotStarted` the roster never shrinks
#[derive(Debug, Clone)]
pub struct Session {
    id: GameId,
    lobby_status: LobbyStatus,
    game_status: GameStatus,
    sheriff_results_public: bool,
    players: Vec<Player>,
    capacity: usize,
    closed: bool,
}

impl Session {
    /// Creates an empty, not-yet-started session.
    pub fn new(id: GameId, capacity: usize) -> Self {
        Self {
            id,
            lobby_status: LobbyStatus::HaveSlots,
            game_status: GameStatus::NotStarted,
            sheriff_results_public: false,
            players: Vec::with_capacity(capacity),
            capacity,
            closed: false,
        }
    }

    pub fn id(&self) -> &GameId {
        &self.id
    }

    pub fn lobby_status(&self) -> LobbyStatus {
        self.lobby_status
    }

    pub fn game_status(&self) -> GameStatus {
        self.game_status
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Seats a new player if there is room.
    ///
    /// This is the only way the roster grows. Duplicate logins are not
    /// rejected; every seat is independent.
    pub fn join(&mut self, login: &str) -> JoinOutcome {
        if self.closed
            || self.lobby_status == LobbyStatus::Full
            || self.players.len() >= self.capacity
        {
            return JoinOutcome::Full;
        }

        self.players.push(Player::new(login));
        let lobby_full = self.players.len() == self.capacity;
        if lobby_full {
            self.lobby_status = LobbyStatus::Full;
        }
        JoinOutcome::Admitted { lobby_full }
    }

    /// Removes the first player with this login, but only before the game
    /// has started. Returns `true` if someone was removed.
    ///
    /// After the start the roster is frozen: a player who disconnects
    /// mid-game stays recorded.
    pub fn leave(&mut self, login: &str) -> bool {
        if self.game_status != GameStatus::NotStarted {
            return false;
        }
        let Some(index) = self.players.iter().position(|p| p.login == login) else {
            return false;
        };

        self.players.remove(index);
        if self.players.len() < self.capacity {
            self.lobby_status = LobbyStatus::HaveSlots;
        }
        true
    }

    /// Renders the game as `viewer_login` is allowed to see it.
    ///
    /// # Errors
    /// [`SessionError::NotAParticipant`] if the viewer is not seated.
    pub fn render_for(&self, viewer_login: &str) -> Result<GameSnapshot, SessionError> {
        let viewer = self.player(viewer_login)?;

        let players = self
            .players
            .iter()
            .map(|about| about.view_for(viewer, self.game_status, self.sheriff_results_public))
            .collect();

        Ok(GameSnapshot {
            id: self.id.clone(),
            lobby_status: self.lobby_status,
            game_status: self.game_status,
            players,
        })
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            lobby_status: self.lobby_status,
            game_status: self.game_status,
            sheriff_results_public: self.sheriff_results_public,
            player_count: self.players.len(),
            capacity: self.capacity,
            closed: self.closed,
        }
    }

    // -- Rules-facing mutations ---------------------------------------------

    pub fn assign_role(&mut self, login: &str, role: Role) -> Result<(), SessionError> {
        self.player_mut(login)?.role = role;
        Ok(())
    }

    pub fn set_condition(&mut self, login: &str, condition: Condition) -> Result<(), SessionError> {
        self.player_mut(login)?.condition = condition;
        Ok(())
    }

    pub fn mark_checked_by_sheriff(&mut self, login: &str) -> Result<(), SessionError> {
        self.player_mut(login)?.checked_by_sheriff = true;
        Ok(())
    }

    pub fn set_game_status(&mut self, status: GameStatus) {
        self.game_status = status;
    }

    pub fn set_sheriff_results_public(&mut self, public: bool) {
        self.sheriff_results_public = public;
    }

    /// Stops admitting players. Seated players are unaffected.
    pub fn close(&mut self) {
        self.closed = true;
    }

    fn player(&self, login: &str) -> Result<&Player, SessionError> {
        self.players
            .iter()
            .find(|p| p.login == login)
            .ok_or_else(|| self.not_a_participant(login))
    }

    fn player_mut(&mut self, login: &str) -> Result<&mut Player, SessionError> {
        let game_id = &self.id;
        self.players
            .iter_mut()
            .find(|p| p.login == login)
            .ok_or_else(|| SessionError::NotAParticipant {
                login: login.to_string(),
                game_id: game_id.clone(),
            })
    }

    fn not_a_participant(&self, login: &str) -> SessionError {
        SessionError::NotAParticipant {
            login: login.to_string(),
            game_id: self.id.clone(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ROLES: [Role; 4] = [Role::Unknown, Role::Mafia, Role::Sheriff, Role::Civilian];

    fn session(capacity: usize) -> Session {
        Session::new(GameId::from("testgame"), capacity)
    }

    /// A started game: mafia `m1`, `m2`; sheriff `s`; civilians `c1`, `c2`.
    fn seated_game() -> Session {
        let mut s = session(5);
        for (login, role) in [
            ("m1", Role::Mafia),
            ("m2", Role::Mafia),
            ("s", Role::Sheriff),
            ("c1", Role::Civilian),
            ("c2", Role::Civilian),
        ] {
            assert!(s.join(login).is_admitted());
            s.assign_role(login, role).unwrap();
        }
        s.set_game_status(GameStatus::Day);
        s
    }

    fn role_seen(s: &Session, viewer: &str, about: &str) -> Role {
        s.render_for(viewer).unwrap().player(about).unwrap().role
    }

    // =====================================================================
    // join()
    // =====================================================================

    #[test]
    fn test_join_sets_defaults_for_new_player() {
        let mut s = session(3);
        s.join("alice");

        let player = &s.players()[0];
        assert_eq!(player.login, "alice");
        assert_eq!(player.role, Role::Unknown);
        assert_eq!(player.condition, Condition::Alive);
        assert!(!player.checked_by_sheriff);
    }

    #[test]
    fn test_join_fills_lobby_at_capacity() {
        let mut s = session(3);

        assert_eq!(s.join("a"), JoinOutcome::Admitted { lobby_full: false });
        assert_eq!(s.lobby_status(), LobbyStatus::HaveSlots);
        assert_eq!(s.join("b"), JoinOutcome::Admitted { lobby_full: false });
        assert_eq!(s.lobby_status(), LobbyStatus::HaveSlots);
        assert_eq!(s.join("c"), JoinOutcome::Admitted { lobby_full: true });
        assert_eq!(s.lobby_status(), LobbyStatus::Full);
    }

    #[test]
    fn test_join_when_full_is_denied_and_roster_unchanged() {
        let mut s = session(3);
        for login in ["a", "b", "c"] {
            s.join(login);
        }

        assert_eq!(s.join("d"), JoinOutcome::Full);

        let logins: Vec<&str> = s.players().iter().map(|p| p.login.as_str()).collect();
        assert_eq!(logins, ["a", "b", "c"]);
    }

    #[test]
    fn test_join_closed_session_is_denied() {
        let mut s = session(3);
        s.close();
        assert_eq!(s.join("a"), JoinOutcome::Full);
        assert!(s.players().is_empty());
    }

    #[test]
    fn test_join_zero_capacity_is_denied() {
        let mut s = session(0);
        assert_eq!(s.join("a"), JoinOutcome::Full);
        assert!(s.players().is_empty());
    }

    // =====================================================================
    // leave()
    // =====================================================================

    #[test]
    fn test_leave_before_start_removes_first_match() {
        let mut s = session(4);
        s.join("a");
        s.join("b");
        s.join("a");

        assert!(s.leave("a"));

        let logins: Vec<&str> = s.players().iter().map(|p| p.login.as_str()).collect();
        assert_eq!(logins, ["b", "a"]);
    }

    #[test]
    fn test_leave_unknown_login_is_noop() {
        let mut s = session(2);
        s.join("a");
        assert!(!s.leave("zzz"));
        assert_eq!(s.players().len(), 1);
    }

    #[test]
    fn test_leave_reopens_full_lobby() {
        let mut s = session(2);
        s.join("a");
        s.join("b");
        assert_eq!(s.lobby_status(), LobbyStatus::Full);

        s.leave("a");
        assert_eq!(s.lobby_status(), LobbyStatus::HaveSlots);
        assert!(s.join("c").is_admitted());
    }

    #[test]
    fn test_leave_after_start_never_shrinks_roster() {
        for status in [GameStatus::Day, GameStatus::Night, GameStatus::Ended] {
            let mut s = session(2);
            s.join("a");
            s.join("b");
            s.set_game_status(status);

            assert!(!s.leave("a"));
            assert_eq!(s.players().len(), 2, "roster changed in {status}");
            assert_eq!(s.lobby_status(), LobbyStatus::Full);
        }
    }

    // =====================================================================
    // render_for()
    // =====================================================================

    #[test]
    fn test_render_for_non_participant_fails() {
        let s = seated_game();
        let err = s.render_for("ghost").unwrap_err();
        assert!(matches!(
            err,
            SessionError::NotAParticipant { ref login, .. } if login == "ghost"
        ));
    }

    #[test]
    fn test_render_preserves_roster_order_and_session_fields() {
        let s = seated_game();
        let snapshot = s.render_for("c1").unwrap();

        assert_eq!(snapshot.id, GameId::from("testgame"));
        assert_eq!(snapshot.lobby_status, LobbyStatus::Full);
        assert_eq!(snapshot.game_status, GameStatus::Day);
        let logins: Vec<&str> = snapshot.players.iter().map(|p| p.login.as_str()).collect();
        assert_eq!(logins, ["m1", "m2", "s", "c1", "c2"]);
    }

    #[test]
    fn test_render_mafia_sees_mafia_only() {
        let s = seated_game();
        assert_eq!(role_seen(&s, "m1", "m1"), Role::Mafia);
        assert_eq!(role_seen(&s, "m1", "m2"), Role::Mafia);
        assert_eq!(role_seen(&s, "m1", "s"), Role::Unknown);
        assert_eq!(role_seen(&s, "m1", "c1"), Role::Unknown);
    }

    #[test]
    fn test_render_sheriff_sees_own_role_only() {
        let s = seated_game();
        assert_eq!(role_seen(&s, "s", "s"), Role::Sheriff);
        assert_eq!(role_seen(&s, "s", "m1"), Role::Unknown);
        assert_eq!(role_seen(&s, "s", "c2"), Role::Unknown);
    }

    #[test]
    fn test_render_civilian_sees_no_roles() {
        let s = seated_game();
        for about in ["m1", "m2", "s", "c1", "c2"] {
            assert_eq!(role_seen(&s, "c1", about), Role::Unknown);
        }
    }

    #[test]
    fn test_render_visibility_law_for_every_role_pair() {
        // Without public sheriff results and before the end, `v` sees
        // `t`'s role iff they share a role that recognises teammates.
        for viewer_role in ROLES {
            for target_role in ROLES {
                let mut s = session(2);
                s.join("v");
                s.join("t");
                s.assign_role("v", viewer_role).unwrap();
                s.assign_role("t", target_role).unwrap();
                s.mark_checked_by_sheriff("t").unwrap();
                s.set_game_status(GameStatus::Night);

                let view = s.render_for("v").unwrap();
                let seen = view.player("t").unwrap();
                let expected = if viewer_role == target_role && viewer_role.sees_teammates() {
                    target_role
                } else {
                    Role::Unknown
                };
                assert_eq!(seen.role, expected, "{viewer_role} viewing {target_role}");
                assert!(!seen.checked_by_sheriff, "check flag leaked");
            }
        }
    }

    #[test]
    fn test_render_condition_is_always_public() {
        let mut s = seated_game();
        s.set_condition("c2", Condition::Dead).unwrap();
        for viewer in ["m1", "s", "c1"] {
            let view = s.render_for(viewer).unwrap();
            assert_eq!(view.player("c2").unwrap().condition, Condition::Dead);
        }
    }

    #[test]
    fn test_render_public_sheriff_results_reveal_sheriff_and_checked() {
        let mut s = seated_game();
        s.mark_checked_by_sheriff("m2").unwrap();
        s.set_sheriff_results_public(true);

        let view = s.render_for("c1").unwrap();
        let sheriff = view.player("s").unwrap();
        assert_eq!(sheriff.role, Role::Sheriff);
        let checked = view.player("m2").unwrap();
        assert_eq!(checked.role, Role::Mafia);
        assert!(checked.checked_by_sheriff);
        // Unchecked players stay hidden.
        assert_eq!(view.player("m1").unwrap().role, Role::Unknown);
        assert_eq!(view.player("c2").unwrap().role, Role::Unknown);
    }

    #[test]
    fn test_render_check_flag_hidden_while_results_private() {
        let mut s = seated_game();
        s.mark_checked_by_sheriff("m1").unwrap();

        // The sheriff's own view does not reveal the flag either; the
        // check result reaches them through the rules engine.
        let view = s.render_for("s").unwrap();
        assert!(!view.player("m1").unwrap().checked_by_sheriff);
        // A mafia teammate sees the role but not the flag.
        let view = s.render_for("m2").unwrap();
        let m1 = view.player("m1").unwrap();
        assert_eq!(m1.role, Role::Mafia);
        assert!(!m1.checked_by_sheriff);
    }

    #[test]
    fn test_render_after_end_discloses_everything_to_everyone() {
        let mut s = seated_game();
        s.mark_checked_by_sheriff("c2").unwrap();
        s.set_game_status(GameStatus::Ended);

        for viewer in ["m1", "m2", "s", "c1", "c2"] {
            let view = s.render_for(viewer).unwrap();
            for player in s.players() {
                let seen = view.player(&player.login).unwrap();
                assert_eq!(seen.role, player.role);
                assert_eq!(seen.checked_by_sheriff, player.checked_by_sheriff);
            }
        }
    }

    // =====================================================================
    // Rules-facing mutations
    // =====================================================================

    #[test]
    fn test_mutations_on_unknown_login_fail() {
        let mut s = seated_game();
        assert!(s.assign_role("nobody", Role::Mafia).is_err());
        assert!(s.set_condition("nobody", Condition::Dead).is_err());
        assert!(s.mark_checked_by_sheriff("nobody").is_err());
    }

    #[test]
    fn test_info_reports_counts_and_flags() {
        let mut s = session(3);
        s.join("a");
        s.set_sheriff_results_public(true);
        s.close();

        let info = s.info();
        assert_eq!(info.player_count, 1);
        assert_eq!(info.capacity, 3);
        assert!(info.closed);
        assert!(info.sheriff_results_public);
        assert_eq!(info.lobby_status, LobbyStatus::HaveSlots);
    }
}
