//! TOML scenario files describing a map, its inhabitants and scripted noises.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::Deserialize;
use tile_skirmish_core::{AgentKind, Direction, PlayerConfig, Tile};
use tile_skirmish_session::SessionConfig;
use tile_skirmish_world::agent_config_from_notes;

/// Complete scenario loaded from disk.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Scenario {
    /// Glyph rows of the map, top row first.
    pub(crate) map: Vec<String>,
    /// Session tunables; omitted fields keep their defaults.
    #[serde(default)]
    pub(crate) session: SessionConfig,
    /// Player placement, if the scenario has a player.
    #[serde(default)]
    pub(crate) player: Option<PlayerEntry>,
    /// Agents registered after the map loads, in roster order.
    #[serde(default)]
    pub(crate) agents: Vec<AgentEntry>,
    /// Noises raised while the scenario runs.
    #[serde(default)]
    pub(crate) alerts: Vec<AlertEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct PlayerEntry {
    pub(crate) x: u32,
    pub(crate) y: u32,
    #[serde(default = "default_facing")]
    pub(crate) facing: Direction,
    pub(crate) health: Option<i32>,
    pub(crate) attack: Option<i32>,
    /// Milliseconds between two strikes.
    pub(crate) speed_ms: Option<u64>,
}

impl PlayerEntry {
    pub(crate) const fn tile(&self) -> Tile {
        Tile::new(self.x, self.y)
    }

    pub(crate) fn config(&self) -> PlayerConfig {
        let defaults = PlayerConfig::default();
        PlayerConfig {
            health: self.health.unwrap_or(defaults.health),
            attack: self.attack.unwrap_or(defaults.attack),
            attack_interval: self
                .speed_ms
                .map_or(defaults.attack_interval, Duration::from_millis),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct AgentEntry {
    pub(crate) kind: AgentKind,
    pub(crate) x: u32,
    pub(crate) y: u32,
    #[serde(default = "default_facing")]
    pub(crate) facing: Direction,
    /// `Key: value` lines in the same format map editors attach to events.
    #[serde(default)]
    pub(crate) notes: Vec<String>,
}

impl AgentEntry {
    pub(crate) const fn tile(&self) -> Tile {
        Tile::new(self.x, self.y)
    }

    pub(crate) fn config(&self) -> tile_skirmish_core::AgentConfig {
        agent_config_from_notes(self.kind, self.notes.iter().map(String::as_str))
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub(crate) struct AlertEntry {
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) at_ms: u64,
}

impl AlertEntry {
    pub(crate) const fn tile(&self) -> Tile {
        Tile::new(self.x, self.y)
    }

    pub(crate) const fn at(&self) -> Duration {
        Duration::from_millis(self.at_ms)
    }
}

const fn default_facing() -> Direction {
    Direction::South
}

impl Scenario {
    /// Reads and parses a scenario file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid scenario {}", path.display()))
    }

    /// Parses a scenario from TOML text.
    pub(crate) fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse scenario TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_skirmish_core::{TargetPriority, WanderAnchor};

    const AMBUSH: &str = include_str!("../scenarios/ambush.toml");

    #[test]
    fn bundled_scenario_parses() {
        let scenario = Scenario::parse(AMBUSH).expect("scenario");

        assert!(!scenario.map.is_empty());
        assert!(scenario.player.is_some());
        assert!(scenario
            .agents
            .iter()
            .any(|agent| agent.kind == AgentKind::Battler));
        assert!(scenario
            .agents
            .iter()
            .any(|agent| agent.kind == AgentKind::Enemy));
    }

    #[test]
    fn agent_notes_become_configs() {
        let scenario = Scenario::parse(
            r#"
            map = ["....", "...."]

            [session]
            target_priority = "battlers_first"

            [[agents]]
            kind = "Battler"
            x = 1
            y = 1
            facing = "North"
            notes = ["Health: 14", "PathfindRadius: 3", "WanderRadius: 2", "Companion: true"]

            [[alerts]]
            x = 3
            y = 0
            at_ms = 750
            "#,
        )
        .expect("scenario");

        assert_eq!(scenario.session.target_priority, TargetPriority::BattlersFirst);
        assert_eq!(scenario.session.pathfinding_step_ms, 500);

        let agent = &scenario.agents[0];
        assert_eq!(agent.tile(), Tile::new(1, 1));
        assert_eq!(agent.facing, Direction::North);
        let config = agent.config();
        assert_eq!(config.health, 14);
        assert_eq!(config.perception_radius, Some(3));
        assert_eq!(
            config.wander.map(|wander| wander.anchor),
            Some(WanderAnchor::Player)
        );

        assert_eq!(scenario.alerts[0].tile(), Tile::new(3, 0));
        assert_eq!(scenario.alerts[0].at(), Duration::from_millis(750));
        assert!(scenario.player.is_none());
    }

    #[test]
    fn player_stats_fall_back_to_defaults() {
        let scenario = Scenario::parse(
            r#"
            map = ["..."]

            [player]
            x = 2
            y = 0
            attack = 3
            speed_ms = 400
            "#,
        )
        .expect("scenario");

        let player = scenario.player.expect("player");
        assert_eq!(player.tile(), Tile::new(2, 0));
        assert_eq!(player.facing, Direction::South);
        let config = player.config();
        assert_eq!(config.health, PlayerConfig::default().health);
        assert_eq!(config.attack, 3);
        assert_eq!(config.attack_interval, Duration::from_millis(400));
    }

    #[test]
    fn missing_map_is_an_error() {
        assert!(Scenario::parse("[[agents]]\nkind = \"Enemy\"\nx = 0\ny = 0\n").is_err());
    }
}
