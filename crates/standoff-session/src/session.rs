//! The session state machine.
//!
//! [`Session`] owns every piece of mutable game state: the lifecycle
//! state, the registry, and the pending round. All of its methods are
//! synchronous and take an [`Outbox`] to queue notifications into; the
//! actor in `coordinator` calls them one command at a time and delivers
//! the outbox afterwards.
//!
//! ## Departures
//!
//! | Remaining | State      | Effect                                        |
//! |-----------|------------|-----------------------------------------------|
//! | ≥ 2       | InProgress | pending round rolled back; `RoundReset` sent  |
//! | 1         | InProgress | survivor told they're last standing; → Lobby  |
//! | 0         | any        | → Lobby                                       |
//! | any       | Lobby      | player list only                              |
//!
//! A `died` departure with nothing pending sends no `RoundReset`.

use standoff_protocol::{
    Action, ActionKind, Notification, PlayerName, Standing,
};

use crate::registry::{validate_name, PlayerRegistry};
use crate::resolver::{self, LAST_STANDING};
use crate::round::PendingRound;
use crate::sink::{Outbox, SharedSink};
use crate::{SessionConfig, SessionError, SessionState};

/// What happened to an accepted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Recorded; `waiting_on` players still have to act.
    Pending { waiting_on: usize },
    /// This was the last action and the round has been resolved.
    Resolved,
}

/// One player's stats, as reported by [`Session::info`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub name: PlayerName,
    pub health: u32,
    pub ammo: u32,
}

/// A point-in-time view of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub state: SessionState,
    /// Active players in join order.
    pub players: Vec<PlayerSnapshot>,
    /// Actions submitted for the current round.
    pub pending: usize,
}

impl SessionInfo {
    pub fn player(&self, name: &str) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| p.name.as_str() == name)
    }
}

/// The single shared game instance.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    state: SessionState,
    registry: PlayerRegistry,
    pending: PendingRound,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::Lobby,
            registry: PlayerRegistry::new(),
            pending: PendingRound::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    pub fn pending(&self) -> &PendingRound {
        &self.pending
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            state: self.state,
            players: self
                .registry
                .iter()
                .map(|p| PlayerSnapshot {
                    name: p.name().clone(),
                    health: p.health(),
                    ammo: p.ammo(),
                })
                .collect(),
            pending: self.pending.len(),
        }
    }

    /// Admits a player to the lobby and sends everyone the new list.
    ///
    /// # Errors
    /// [`SessionError::GameInProgress`], [`SessionError::InvalidName`],
    /// or [`SessionError::NameInUse`], checked in that order. A refused
    /// join changes nothing.
    pub fn join(
        &mut self,
        name: PlayerName,
        sink: SharedSink,
        outbox: &mut Outbox,
    ) -> Result<(), SessionError> {
        if !self.state.is_joinable() {
            return Err(SessionError::GameInProgress);
        }
        validate_name(name.as_str(), self.config.max_name_len)?;
        self.registry.register(
            name.clone(),
            sink,
            self.config.starting_health,
            self.config.starting_ammo,
        )?;

        tracing::info!(
            player = %name,
            players = self.registry.len(),
            "player joined"
        );
        self.registry.broadcast_roster(outbox);
        Ok(())
    }

    /// Removes a player. Returns `false` (and does nothing) if `name` is
    /// not active.
    ///
    /// `died` marks an expected elimination rather than a disruption.
    pub fn leave(
        &mut self,
        name: &str,
        died: bool,
        outbox: &mut Outbox,
    ) -> bool {
        let Some(player) = self.registry.remove(name) else {
            return false;
        };
        tracing::info!(
            player = %player.name(),
            died,
            players = self.registry.len(),
            "player left"
        );

        // A pending shot may name the player who just left.
        let had_pending = !self.pending.is_empty();
        self.pending.rollback(&mut self.registry);

        self.registry.broadcast_roster(outbox);

        if !self.state.is_active() {
            return true;
        }

        match self.registry.len() {
            0 => self.end_game(),
            1 => {
                self.notify_last_standing(outbox);
                self.end_game();
            }
            _ if !died || had_pending => {
                for player in self.registry.iter() {
                    outbox.push(
                        player.name(),
                        &player.sink,
                        Notification::RoundReset { ammo: player.ammo() },
                    );
                }
                tracing::info!("round reset after departure");
            }
            _ => {}
        }
        true
    }

    /// [`Session::leave`] on behalf of the connection that owns `sink`.
    ///
    /// Does nothing unless `name` is currently held by that sink, so a
    /// connection whose player was eliminated can't remove someone who
    /// has since joined under the same name.
    pub fn leave_from(
        &mut self,
        sink: &SharedSink,
        name: &str,
        died: bool,
        outbox: &mut Outbox,
    ) -> bool {
        if !self.registry.is_held_by(name, sink) {
            return false;
        }
        self.leave(name, died, outbox)
    }

    /// Starts a game if the lobby has enough players.
    ///
    /// Returns `false` (a normal outcome) when a game is already running
    /// or too few players have joined.
    pub fn start_game(&mut self, outbox: &mut Outbox) -> bool {
        if !self.state.is_joinable()
            || self.registry.len() < self.config.min_players
        {
            return false;
        }

        self.state = SessionState::InProgress;
        self.pending = PendingRound::new();
        self.registry
            .reset_stats(self.config.starting_health, self.config.starting_ammo);

        for player in self.registry.iter() {
            outbox.push(
                player.name(),
                &player.sink,
                Notification::GameStarted {
                    you: player.name().clone(),
                },
            );
        }
        tracing::info!(players = self.registry.len(), "game started");
        true
    }

    /// Accepts an action in its wire form: a kind plus an optional target.
    ///
    /// # Errors
    /// [`SessionError::InvalidTarget`] for a `Shoot` without a target, and
    /// everything [`Session::submit`] returns.
    pub fn take_action(
        &mut self,
        name: &str,
        kind: ActionKind,
        target: Option<PlayerName>,
        outbox: &mut Outbox,
    ) -> Result<Submission, SessionError> {
        if !self.state.is_active() {
            return Err(SessionError::NotInProgress);
        }
        if !self.registry.contains(name) {
            return Err(SessionError::UnknownPlayer(name.into()));
        }
        let action = Action::from_parts(kind, target).ok_or_else(|| {
            SessionError::InvalidTarget("a shot needs a target".into())
        })?;
        self.submit(name, action, outbox)
    }

    /// [`Session::take_action`] on behalf of the connection that owns
    /// `sink`.
    ///
    /// # Errors
    /// [`SessionError::UnknownPlayer`] if `name` is held by a different
    /// sink, and everything [`Session::take_action`] returns.
    pub fn take_action_from(
        &mut self,
        sink: &SharedSink,
        name: &str,
        kind: ActionKind,
        target: Option<PlayerName>,
        outbox: &mut Outbox,
    ) -> Result<Submission, SessionError> {
        let held_by_other = self.registry.contains(name)
            && !self.registry.is_held_by(name, sink);
        if held_by_other {
            return Err(SessionError::UnknownPlayer(name.into()));
        }
        self.take_action(name, kind, target, outbox)
    }

    /// Records an action and resolves the round if it was the last one.
    ///
    /// The completeness check runs in the same call as the insertion, so
    /// two final submissions can't both see an incomplete round.
    ///
    /// # Errors
    /// [`SessionError::NotInProgress`] outside a game, plus every
    /// validation error from [`PendingRound::submit`].
    pub fn submit(
        &mut self,
        name: &str,
        action: Action,
        outbox: &mut Outbox,
    ) -> Result<Submission, SessionError> {
        if !self.state.is_active() {
            return Err(SessionError::NotInProgress);
        }
        self.pending.submit(&mut self.registry, name, action)?;

        if self.pending.is_complete(self.registry.len()) {
            self.resolve_round(outbox);
            Ok(Submission::Resolved)
        } else {
            Ok(Submission::Pending {
                waiting_on: self.registry.len() - self.pending.len(),
            })
        }
    }

    fn resolve_round(&mut self, outbox: &mut Outbox) {
        let actions = self.pending.take();
        let outcome = resolver::resolve(&actions, &self.registry);

        for result in &outcome.players {
            let Some(player) = self.registry.get_mut(result.name.as_str())
            else {
                continue;
            };
            player.health = result.health;
            outbox.push(
                &player.name,
                &player.sink,
                Notification::RoundResult {
                    narration: result.narration.clone(),
                    health_lost: result.health_lost,
                    health: player.health,
                    ammo: player.ammo,
                    standing: result.standing,
                },
            );
        }
        tracing::info!(
            players = outcome.players.len(),
            survivors = outcome.survivors(),
            "round resolved"
        );

        let eliminated: Vec<PlayerName> =
            outcome.eliminated().cloned().collect();
        for name in &eliminated {
            self.registry.remove(name.as_str());
            tracing::info!(player = %name, "player eliminated");
        }
        if !eliminated.is_empty() {
            self.registry.broadcast_roster(outbox);
        }

        if self.registry.len() <= 1 {
            self.end_game();
        }
    }

    /// Sends the sole remaining player the end-of-game result.
    fn notify_last_standing(&self, outbox: &mut Outbox) {
        let Some(survivor) = self.registry.iter().next() else {
            return;
        };
        outbox.push(
            survivor.name(),
            &survivor.sink,
            Notification::RoundResult {
                narration: vec![LAST_STANDING.to_string()],
                health_lost: 0,
                health: survivor.health(),
                ammo: survivor.ammo(),
                standing: Standing::LastStanding,
            },
        );
    }

    /// Back to the lobby, ready for the next game.
    fn end_game(&mut self) {
        self.state = SessionState::Lobby;
        self.pending = PendingRound::new();
        self.registry
            .reset_stats(self.config.starting_health, self.config.starting_ammo);
        match self.registry.iter().next() {
            Some(winner) if self.registry.len() == 1 => {
                tracing::info!(winner = %winner.name(), "game over");
            }
            _ => tracing::info!("game over, no survivors"),
        }
    }
}
