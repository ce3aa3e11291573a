//! Round resolution.
//!
//! [`resolve`] is a pure function of the submitted actions and the
//! current players: it decides who was hit, how much health everyone
//! loses, who is eliminated, and what each player is told. Applying the
//! result to the registry is the session's job.
//!
//! # Narration
//!
//! Every player gets their own account of the round. Their result comes
//! first, in the first person ("Your shot hit oddjob!"), then one line per
//! other player in registry order, in the third person, with the viewer
//! addressed as "you" ("oddjob's shot was blocked by you!"). Finally, one
//! "<name> died!" line for each other player eliminated this round.

use std::collections::HashMap;

use standoff_protocol::{Action, PlayerName, Standing};

use crate::registry::PlayerRegistry;

/// What the sole survivor is told instead of the round's narration.
pub const LAST_STANDING: &str = "You are the last player standing!";

/// How a shot turned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotResult {
    Hit,
    /// The target chose to block.
    Blocked,
    /// The target is no longer in the game.
    Missed,
}

/// One player's share of a resolved round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerOutcome {
    pub name: PlayerName,
    pub action: Action,
    /// Set for `Shoot` only.
    pub shot: Option<ShotResult>,
    /// `true` if at least one shot hit this player.
    pub was_hit: bool,
    pub health_lost: u32,
    /// Health after the round, never below zero.
    pub health: u32,
    pub standing: Standing,
    pub narration: Vec<String>,
}

/// The full result of one round, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundOutcome {
    pub players: Vec<PlayerOutcome>,
}

impl RoundOutcome {
    #[cfg(test)]
    pub(crate) fn get(&self, name: &str) -> Option<&PlayerOutcome> {
        self.players.iter().find(|p| p.name.as_str() == name)
    }

    /// Players whose health reached zero this round.
    pub fn eliminated(&self) -> impl Iterator<Item = &PlayerName> {
        self.players
            .iter()
            .filter(|p| p.standing == Standing::Eliminated)
            .map(|p| &p.name)
    }

    pub fn survivors(&self) -> usize {
        self.players
            .iter()
            .filter(|p| p.standing != Standing::Eliminated)
            .count()
    }
}

/// Resolves a round.
///
/// Players without a submitted action, and actions from players no longer
/// in the registry, are left out. A shot at a player who has left is a
/// miss.
pub fn resolve(
    actions: &HashMap<PlayerName, Action>,
    registry: &PlayerRegistry,
) -> RoundOutcome {
    let participants: Vec<(&PlayerName, &Action, u32)> = registry
        .iter()
        .filter_map(|p| {
            actions
                .get(p.name().as_str())
                .map(|action| (p.name(), action, p.health()))
        })
        .collect();

    // Shots first: every landed shot costs its target one health.
    let mut hits: HashMap<&str, u32> = HashMap::new();
    let mut shots: HashMap<&str, ShotResult> = HashMap::new();
    for (name, action, _) in &participants {
        let Action::Shoot { target } = action else {
            continue;
        };
        let result = if !registry.contains(target.as_str()) {
            ShotResult::Missed
        } else {
            match actions.get(target.as_str()) {
                Some(Action::Block) => ShotResult::Blocked,
                Some(_) => ShotResult::Hit,
                None => ShotResult::Missed,
            }
        };
        if result == ShotResult::Hit {
            *hits.entry(target.as_str()).or_default() += 1;
        }
        shots.insert(name.as_str(), result);
    }

    let mut players: Vec<PlayerOutcome> = participants
        .iter()
        .map(|(name, action, health)| {
            let health_lost = hits.get(name.as_str()).copied().unwrap_or(0);
            let health = health.saturating_sub(health_lost);
            PlayerOutcome {
                name: (*name).clone(),
                action: (*action).clone(),
                shot: shots.get(name.as_str()).copied(),
                was_hit: health_lost > 0,
                health_lost,
                health,
                standing: if health > 0 {
                    Standing::Alive
                } else {
                    Standing::Eliminated
                },
                narration: Vec::new(),
            }
        })
        .collect();

    let narrations: Vec<Vec<String>> = players
        .iter()
        .map(|viewer| narrate(&viewer.name, &players))
        .collect();
    for (player, narration) in players.iter_mut().zip(narrations) {
        player.narration = narration;
    }

    let survivors: Vec<usize> = players
        .iter()
        .enumerate()
        .filter(|(_, p)| p.standing == Standing::Alive)
        .map(|(i, _)| i)
        .collect();
    if let [winner] = survivors.as_slice() {
        if players.len() > 1 {
            let winner = &mut players[*winner];
            winner.standing = Standing::LastStanding;
            winner.narration = vec![LAST_STANDING.to_string()];
        }
    }

    RoundOutcome { players }
}

/// Builds `viewer`'s account of the round.
fn narrate(viewer: &PlayerName, players: &[PlayerOutcome]) -> Vec<String> {
    let view = Perspective { viewer };
    let mut lines = Vec::with_capacity(players.len() * 2);

    if let Some(own) = players.iter().find(|p| &p.name == viewer) {
        lines.push(view.describe(own));
    }
    lines.extend(
        players
            .iter()
            .filter(|p| &p.name != viewer)
            .map(|p| view.describe(p)),
    );
    lines.extend(
        players
            .iter()
            .filter(|p| &p.name != viewer && p.standing == Standing::Eliminated)
            .map(|p| format!("{} died!", p.name)),
    );
    lines
}

/// Chooses first, second, or third person depending on who is reading.
struct Perspective<'a> {
    viewer: &'a PlayerName,
}

impl Perspective<'_> {
    fn is_viewer(&self, name: &PlayerName) -> bool {
        name == self.viewer
    }

    /// "You" or "bond".
    fn subject(&self, name: &PlayerName) -> String {
        if self.is_viewer(name) {
            "You".to_string()
        } else {
            name.to_string()
        }
    }

    /// "Your" or "bond's".
    fn possessive(&self, name: &PlayerName) -> String {
        if self.is_viewer(name) {
            "Your".to_string()
        } else {
            format!("{name}'s")
        }
    }

    /// "you" or "bond".
    fn object(&self, name: &PlayerName) -> String {
        if self.is_viewer(name) {
            "you".to_string()
        } else {
            name.to_string()
        }
    }

    fn describe(&self, outcome: &PlayerOutcome) -> String {
        match &outcome.action {
            Action::Shoot { target } => {
                let shooter = self.possessive(&outcome.name);
                let target = self.object(target);
                match outcome.shot.unwrap_or(ShotResult::Missed) {
                    ShotResult::Hit => format!("{shooter} shot hit {target}!"),
                    ShotResult::Blocked => {
                        format!("{shooter} shot was blocked by {target}!")
                    }
                    ShotResult::Missed => {
                        format!("{shooter} shot missed {target}!")
                    }
                }
            }
            Action::Block => format!("{} blocked.", self.subject(&outcome.name)),
            Action::Reload => {
                format!("{} reloaded.", self.subject(&outcome.name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use standoff_protocol::Notification;
    use tokio::sync::mpsc;

    use super::*;

    fn registry_with(players: &[(&str, u32)]) -> PlayerRegistry {
        let mut registry = PlayerRegistry::new();
        for (name, health) in players {
            let sink = Arc::new(mpsc::unbounded_channel::<Notification>().0);
            registry.register((*name).into(), sink, *health, 1).unwrap();
        }
        registry
    }

    fn actions(list: &[(&str, Action)]) -> HashMap<PlayerName, Action> {
        list.iter()
            .map(|(name, action)| ((*name).into(), action.clone()))
            .collect()
    }

    fn shoot(target: &str) -> Action {
        Action::Shoot {
            target: target.into(),
        }
    }

    #[test]
    fn test_blocked_shot_does_no_damage() {
        let registry = registry_with(&[("a", 3), ("b", 3), ("c", 3)]);
        let outcome = resolve(
            &actions(&[
                ("a", shoot("b")),
                ("b", Action::Block),
                ("c", Action::Reload),
            ]),
            &registry,
        );

        let b = outcome.get("b").unwrap();
        assert_eq!(b.health_lost, 0);
        assert!(!b.was_hit);
        assert_eq!(b.health, 3);
        assert_eq!(outcome.get("a").unwrap().shot, Some(ShotResult::Blocked));
        assert_eq!(outcome.get("c").unwrap().action, Action::Reload);
    }

    #[test]
    fn test_unblocked_shot_hits() {
        let registry = registry_with(&[("a", 3), ("b", 3)]);
        let outcome = resolve(
            &actions(&[("a", shoot("b")), ("b", Action::Reload)]),
            &registry,
        );

        let b = outcome.get("b").unwrap();
        assert_eq!(b.health_lost, 1);
        assert!(b.was_hit);
        assert_eq!(b.health, 2);
        assert_eq!(outcome.get("a").unwrap().shot, Some(ShotResult::Hit));
    }

    #[test]
    fn test_damage_accumulates_from_multiple_shooters() {
        let registry = registry_with(&[("a", 3), ("b", 3), ("c", 3)]);
        let outcome = resolve(
            &actions(&[
                ("a", shoot("c")),
                ("b", shoot("c")),
                ("c", Action::Reload),
            ]),
            &registry,
        );
        assert_eq!(outcome.get("c").unwrap().health_lost, 2);
        assert_eq!(outcome.get("c").unwrap().health, 1);
    }

    #[test]
    fn test_health_clamps_at_zero() {
        let registry = registry_with(&[("a", 3), ("b", 3), ("c", 1)]);
        let outcome = resolve(
            &actions(&[
                ("a", shoot("c")),
                ("b", shoot("c")),
                ("c", Action::Block),
            ]),
            &registry,
        );
        // Blocked: no damage at all.
        assert_eq!(outcome.get("c").unwrap().health, 1);

        let outcome = resolve(
            &actions(&[
                ("a", shoot("c")),
                ("b", shoot("c")),
                ("c", Action::Reload),
            ]),
            &registry,
        );
        let c = outcome.get("c").unwrap();
        assert_eq!(c.health_lost, 2);
        assert_eq!(c.health, 0);
        assert_eq!(c.standing, Standing::Eliminated);
    }

    #[test]
    fn test_shot_at_departed_target_misses() {
        let registry = registry_with(&[("a", 3), ("b", 3)]);
        let outcome = resolve(
            &actions(&[("a", shoot("gone")), ("b", Action::Block)]),
            &registry,
        );
        let a = outcome.get("a").unwrap();
        assert_eq!(a.shot, Some(ShotResult::Missed));
        assert_eq!(a.narration[0], "Your shot missed gone!");
        assert_eq!(outcome.survivors(), 2);
    }

    #[test]
    fn test_narration_is_personalized_per_viewer() {
        let registry = registry_with(&[("bond", 3), ("jaws", 3), ("oddjob", 3)]);
        let outcome = resolve(
            &actions(&[
                ("bond", shoot("jaws")),
                ("jaws", Action::Block),
                ("oddjob", Action::Reload),
            ]),
            &registry,
        );

        assert_eq!(
            outcome.get("bond").unwrap().narration,
            [
                "Your shot was blocked by jaws!",
                "jaws blocked.",
                "oddjob reloaded.",
            ]
        );
        assert_eq!(
            outcome.get("jaws").unwrap().narration,
            [
                "You blocked.",
                "bond's shot was blocked by you!",
                "oddjob reloaded.",
            ]
        );
        assert_eq!(
            outcome.get("oddjob").unwrap().narration,
            [
                "You reloaded.",
                "bond's shot was blocked by jaws!",
                "jaws blocked.",
            ]
        );
    }

    #[test]
    fn test_viewer_name_inside_other_names_is_not_rewritten() {
        // "an" appears inside "dan", but only whole identities become "you".
        let registry = registry_with(&[("an", 3), ("dan", 3)]);
        let outcome = resolve(
            &actions(&[("an", Action::Block), ("dan", Action::Reload)]),
            &registry,
        );
        assert_eq!(
            outcome.get("an").unwrap().narration,
            ["You blocked.", "dan reloaded."]
        );
    }

    #[test]
    fn test_last_player_standing_overrides_narration() {
        let registry = registry_with(&[("a", 3), ("b", 1)]);
        let outcome = resolve(
            &actions(&[("a", shoot("b")), ("b", Action::Reload)]),
            &registry,
        );

        let a = outcome.get("a").unwrap();
        assert_eq!(a.standing, Standing::LastStanding);
        assert_eq!(a.narration, [LAST_STANDING]);

        let b = outcome.get("b").unwrap();
        assert_eq!(b.standing, Standing::Eliminated);
        assert_eq!(b.narration, ["You reloaded.", "a's shot hit you!"]);
    }

    #[test]
    fn test_died_lines_for_other_eliminated_players() {
        let registry = registry_with(&[("a", 3), ("b", 1), ("c", 3)]);
        let outcome = resolve(
            &actions(&[
                ("a", shoot("b")),
                ("b", Action::Reload),
                ("c", Action::Block),
            ]),
            &registry,
        );
        assert_eq!(
            outcome.get("c").unwrap().narration,
            ["You blocked.", "a's shot hit b!", "b reloaded.", "b died!"]
        );
        assert_eq!(outcome.eliminated().collect::<Vec<_>>(), [&PlayerName::from("b")]);
        assert_eq!(outcome.survivors(), 2);
    }

    #[test]
    fn test_mutual_elimination_has_no_winner() {
        let registry = registry_with(&[("a", 1), ("b", 1)]);
        let outcome = resolve(
            &actions(&[("a", shoot("b")), ("b", shoot("a"))]),
            &registry,
        );
        assert_eq!(outcome.survivors(), 0);
        assert!(outcome
            .players
            .iter()
            .all(|p| p.standing == Standing::Eliminated));
        assert_eq!(
            outcome.get("a").unwrap().narration,
            ["Your shot hit b!", "b's shot hit you!", "b died!"]
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let registry = registry_with(&[("a", 3), ("b", 3), ("c", 3)]);
        let submitted = actions(&[
            ("a", shoot("b")),
            ("b", shoot("c")),
            ("c", shoot("a")),
        ]);
        assert_eq!(resolve(&submitted, &registry), resolve(&submitted, &registry));
    }
}
