//! The set of active players.
//!
//! The registry is the only owner of player sinks. Players are kept in
//! join order, which is also the order of every player list and every
//! narration the session produces.

use std::sync::Arc;

use standoff_protocol::{Notification, PlayerName};

use crate::sink::{Outbox, SharedSink};
use crate::SessionError;

/// One active player.
pub struct Player {
    pub(crate) name: PlayerName,
    pub(crate) sink: SharedSink,
    pub(crate) health: u32,
    pub(crate) ammo: u32,
}

impl Player {
    pub fn name(&self) -> &PlayerName {
        &self.name
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn ammo(&self) -> u32 {
        self.ammo
    }

    #[cfg(test)]
    pub(crate) fn is_alive(&self) -> bool {
        self.health > 0
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("name", &self.name)
            .field("health", &self.health)
            .field("ammo", &self.ammo)
            .finish_non_exhaustive()
    }
}

/// Active players, in join order.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: Vec<Player>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a player with the given starting stats.
    ///
    /// # Errors
    /// [`SessionError::NameInUse`] if the name is taken. The registry is
    /// left untouched.
    pub fn register(
        &mut self,
        name: PlayerName,
        sink: SharedSink,
        health: u32,
        ammo: u32,
    ) -> Result<(), SessionError> {
        if self.contains(name.as_str()) {
            return Err(SessionError::NameInUse(name));
        }
        self.players.push(Player {
            name,
            sink,
            health,
            ammo,
        });
        Ok(())
    }

    /// Removes a player, returning it if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Player> {
        let index = self.players.iter().position(|p| p.name.as_str() == name)?;
        Some(self.players.remove(index))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// `true` if `name` is active and joined with this exact sink.
    ///
    /// A name can be freed and taken again; the sink tells the current
    /// holder apart from whoever held it before.
    pub fn is_held_by(&self, name: &str, sink: &SharedSink) -> bool {
        self.get(name).is_some_and(|p| {
            std::ptr::addr_eq(Arc::as_ptr(&p.sink), Arc::as_ptr(sink))
        })
    }

    pub fn get(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name.as_str() == name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.name.as_str() == name)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn names(&self) -> Vec<PlayerName> {
        self.players.iter().map(|p| p.name.clone()).collect()
    }

    /// Puts every player back to full health and the starting ammo.
    pub fn reset_stats(&mut self, health: u32, ammo: u32) {
        for player in &mut self.players {
            player.health = health;
            player.ammo = ammo;
        }
    }

    /// Queues the current player list for every player.
    pub fn broadcast_roster(&self, outbox: &mut Outbox) {
        let names = self.names();
        for player in &self.players {
            outbox.push(
                &player.name,
                &player.sink,
                Notification::PlayerListChanged {
                    names: names.clone(),
                },
            );
        }
    }
}

/// Checks a requested name against the lobby rules.
///
/// # Errors
/// [`SessionError::InvalidName`] for blank names, names longer than
/// `max_len` characters, and names containing control characters.
pub fn validate_name(name: &str, max_len: usize) -> Result<(), SessionError> {
    if name.trim().is_empty() {
        return Err(SessionError::InvalidName("name is blank".into()));
    }
    if name.chars().count() > max_len {
        return Err(SessionError::InvalidName(format!(
            "name is longer than {max_len} characters"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(SessionError::InvalidName(
            "name contains control characters".into(),
        ));
    }
    Ok(())
}
