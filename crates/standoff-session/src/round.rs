//! The turn barrier: one pending action per active player.
//!
//! Ammo is charged when an action is accepted, not when the round
//! resolves. That keeps the "no ammo, no shot" rule honest within a round
//! and lets [`PendingRound::rollback`] hand the ammo back if the round is
//! abandoned.

use std::collections::HashMap;

use standoff_protocol::{Action, PlayerName};

use crate::registry::PlayerRegistry;
use crate::SessionError;

/// Submitted but unresolved actions for the current round.
#[derive(Debug, Default)]
pub struct PendingRound {
    actions: HashMap<PlayerName, Action>,
}

impl PendingRound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Validates and records `name`'s action, charging its ammo cost.
    ///
    /// # Errors
    /// - [`SessionError::UnknownPlayer`]: `name` is not active
    /// - [`SessionError::DuplicateSubmission`]: `name` already acted
    /// - [`SessionError::InvalidTarget`]: shooting oneself or an
    ///   inactive player
    /// - [`SessionError::InsufficientAmmo`]: shooting with zero ammo
    ///
    /// On error nothing changes.
    pub fn submit(
        &mut self,
        registry: &mut PlayerRegistry,
        name: &str,
        action: Action,
    ) -> Result<(), SessionError> {
        let player = registry
            .get(name)
            .ok_or_else(|| SessionError::UnknownPlayer(name.into()))?;
        let player_name = player.name().clone();

        if self.actions.contains_key(name) {
            return Err(SessionError::DuplicateSubmission(player_name));
        }

        if let Action::Shoot { target } = &action {
            if target.as_str() == name {
                return Err(SessionError::InvalidTarget(
                    "cannot shoot yourself".into(),
                ));
            }
            if !registry.contains(target.as_str()) {
                return Err(SessionError::InvalidTarget(format!(
                    "{target} is not in the game"
                )));
            }
            if player.ammo() == 0 {
                return Err(SessionError::InsufficientAmmo(player_name));
            }
        }

        if let Some(player) = registry.get_mut(name) {
            match action {
                Action::Shoot { .. } => player.ammo -= 1,
                Action::Reload => player.ammo = player.ammo.saturating_add(1),
                Action::Block => {}
            }
        }

        self.actions.insert(player_name, action);
        Ok(())
    }

    /// `true` once every one of `active` players has acted.
    pub fn is_complete(&self, active: usize) -> bool {
        active > 0 && self.actions.len() == active
    }

    /// Empties the round and returns its actions for resolution.
    pub fn take(&mut self) -> HashMap<PlayerName, Action> {
        std::mem::take(&mut self.actions)
    }

    /// Discards the round, returning each still-active submitter's ammo
    /// to what it was before they acted.
    pub fn rollback(&mut self, registry: &mut PlayerRegistry) {
        for (name, action) in self.actions.drain() {
            let Some(player) = registry.get_mut(name.as_str()) else {
                continue;
            };
            match action {
                Action::Shoot { .. } => player.ammo = player.ammo.saturating_add(1),
                Action::Reload => player.ammo = player.ammo.saturating_sub(1),
                Action::Block => {}
            }
        }
    }
}
