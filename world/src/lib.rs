#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Tile Skirmish.
//!
//! The world owns the static grid, both agent rosters, the player and the
//! dense occupancy grid. Every mutation flows through [`apply`] or
//! [`load_map`]; systems observe the state through the [`query`] module.

mod cache;
mod grid;
mod navigation;
mod notes;
mod roster;

use std::time::Duration;

use tile_skirmish_core::{
    ready_at, AgentId, AttackOutcome, Combatant, Command, Direction, Event, Health, MoveError,
    Occupant, PathfindTarget, PlayerConfig, PlayerSnapshot, Tile,
};

pub use cache::DistanceMapCache;
pub use grid::{Grid, MapError, MapSource, TextMap, TileTags};
pub use navigation::{build_distance_map, DistanceMap};
pub use notes::{agent_config_from_notes, parse_note, Note};

use roster::Roster;

/// Represents the authoritative Tile Skirmish world state.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    roster: Roster,
    player: Option<Player>,
    occupancy: OccupancyGrid,
}

impl World {
    /// Creates an empty world without a loaded map.
    ///
    /// Every tile counts as blocked until [`load_map`] installs a grid.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grid: Grid::default(),
            roster: Roster::new(),
            player: None,
            occupancy: OccupancyGrid::new(0, 0),
        }
    }

    fn validate_destination(&self, tile: Tile) -> Result<(), MoveError> {
        if !self.grid.in_bounds(tile) {
            return Err(MoveError::OutOfBounds);
        }
        if self.grid.is_blocked(tile) {
            return Err(MoveError::Blocked);
        }
        if !self.occupancy.is_free(tile) {
            return Err(MoveError::Occupied);
        }
        Ok(())
    }

    fn strike_agent(
        &mut self,
        attacker: Combatant,
        target: AgentId,
        damage: i32,
        out_events: &mut Vec<Event>,
    ) {
        let Some(victim) = self.roster.get_mut(target) else {
            out_events.push(Event::AttackResolved {
                attacker,
                target: Combatant::Agent(target),
                outcome: AttackOutcome::AlreadyDead,
            });
            return;
        };

        victim.health = victim.health.damaged(damage);
        if !victim.health.is_depleted() {
            out_events.push(Event::AttackResolved {
                attacker,
                target: Combatant::Agent(target),
                outcome: AttackOutcome::Damaged {
                    remaining: victim.health,
                },
            });
            return;
        }

        out_events.push(Event::AttackResolved {
            attacker,
            target: Combatant::Agent(target),
            outcome: AttackOutcome::Killed,
        });

        if let Some(dead) = self.roster.remove(target) {
            self.occupancy.vacate(dead.tile);
            tracing::info!(agent = dead.id.get(), kind = ?dead.kind, "agent died");
            out_events.push(Event::AgentDied {
                agent: dead.id,
                kind: dead.kind,
            });
        }
    }

    fn strike_player(&mut self, attacker: Combatant, damage: i32, out_events: &mut Vec<Event>) {
        let Some(player) = self.player.as_mut() else {
            out_events.push(Event::AttackResolved {
                attacker,
                target: Combatant::Player,
                outcome: AttackOutcome::AlreadyDead,
            });
            return;
        };

        player.health = player.health.damaged(damage);
        if !player.health.is_depleted() {
            out_events.push(Event::AttackResolved {
                attacker,
                target: Combatant::Player,
                outcome: AttackOutcome::Damaged {
                    remaining: player.health,
                },
            });
            return;
        }

        player.health = player.max_health;
        tracing::info!("player defeated and restored");
        out_events.push(Event::AttackResolved {
            attacker,
            target: Combatant::Player,
            outcome: AttackOutcome::Killed,
        });
        out_events.push(Event::PlayerDefeated);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Replaces the active map, discarding every agent and the player.
///
/// The previous state is kept untouched when the source is rejected.
pub fn load_map(
    world: &mut World,
    source: &impl MapSource,
    tags: TileTags,
    out_events: &mut Vec<Event>,
) -> Result<(), MapError> {
    let grid = Grid::from_source(source, tags)?;
    let width = grid.width();
    let height = grid.height();

    tracing::info!(
        width,
        height,
        occluders = grid.occluders().len(),
        "loaded map"
    );

    world.occupancy = OccupancyGrid::new(width, height);
    world.grid = grid;
    world.roster = Roster::new();
    world.player = None;
    out_events.push(Event::MapLoaded { width, height });
    Ok(())
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SpawnAgent {
            config,
            tile,
            facing,
        } => {
            if let Err(reason) = world.validate_destination(tile) {
                tracing::warn!(x = tile.x(), y = tile.y(), ?reason, "spawn rejected");
                out_events.push(Event::SpawnRejected { tile, reason });
                return;
            }

            let agent = world.roster.insert(&config, tile, facing);
            world.occupancy.occupy(Occupant::Agent(agent), tile);
            out_events.push(Event::AgentSpawned {
                agent,
                kind: config.kind,
                tile,
            });
        }
        Command::PlacePlayer {
            config,
            tile,
            facing,
        } => {
            let previous = world.player.map(|player| player.tile);
            if let Some(previous) = previous {
                world.occupancy.vacate(previous);
            }

            if let Err(reason) = world.validate_destination(tile) {
                if let Some(previous) = previous {
                    world.occupancy.occupy(Occupant::Player, previous);
                }
                tracing::warn!(x = tile.x(), y = tile.y(), ?reason, "player placement rejected");
                out_events.push(Event::SpawnRejected { tile, reason });
                return;
            }

            world.player = Some(Player::new(config, tile, facing));
            world.occupancy.occupy(Occupant::Player, tile);
            out_events.push(Event::PlayerPlaced { tile, facing });
        }
        Command::MovePlayer { direction } => {
            let Some(from) = world.player.map(|player| player.tile) else {
                return;
            };

            let destination = from
                .step(direction)
                .filter(|tile| world.validate_destination(*tile).is_ok());
            let to = destination.unwrap_or(from);

            if let Some(player) = world.player.as_mut() {
                player.facing = direction;
                player.tile = to;
            }
            if to != from {
                world.occupancy.vacate(from);
                world.occupancy.occupy(Occupant::Player, to);
            }
            out_events.push(Event::PlayerMoved {
                from,
                to,
                facing: direction,
            });
        }
        Command::StepAgent { agent, direction } => {
            let Some(from) = world.roster.get(agent).map(|agent| agent.tile) else {
                out_events.push(Event::StepRejected {
                    agent,
                    reason: MoveError::UnknownAgent,
                });
                return;
            };

            let verdict = from
                .step(direction)
                .ok_or(MoveError::OutOfBounds)
                .and_then(|to| world.validate_destination(to).map(|()| to));

            let to = match verdict {
                Ok(to) => to,
                Err(reason) => {
                    tracing::debug!(agent = agent.get(), ?reason, "step rejected");
                    out_events.push(Event::StepRejected { agent, reason });
                    return;
                }
            };

            if let Some(walker) = world.roster.get_mut(agent) {
                walker.tile = to;
                walker.facing = direction;
            }
            world.occupancy.vacate(from);
            world.occupancy.occupy(Occupant::Agent(agent), to);
            out_events.push(Event::AgentMoved {
                agent,
                from,
                to,
                facing: direction,
            });
        }
        Command::FaceAgent { agent, direction } => {
            let Some(walker) = world.roster.get_mut(agent) else {
                tracing::warn!(agent = agent.get(), "turn requested for unknown agent");
                return;
            };

            if walker.facing != direction {
                walker.facing = direction;
                out_events.push(Event::AgentTurned {
                    agent,
                    facing: direction,
                });
            }
        }
        Command::SetPathfindTarget { agent, target } => {
            let valid = match target {
                PathfindTarget::Tile(tile) => !world.grid.is_blocked(tile),
                PathfindTarget::Player => world.player.is_some(),
                PathfindTarget::Agent(other) => {
                    other != agent && world.roster.get(other).is_some()
                }
            };

            let Some(walker) = world.roster.get_mut(agent).filter(|_| valid) else {
                tracing::warn!(agent = agent.get(), ?target, "pathfind target rejected");
                out_events.push(Event::PathfindTargetRejected { agent, target });
                return;
            };

            if walker.pathfind_target != Some(target) {
                walker.pathfind_target = Some(target);
                tracing::debug!(agent = agent.get(), ?target, "pathfind target changed");
                out_events.push(Event::PathfindTargetChanged {
                    agent,
                    target: Some(target),
                });
            }
        }
        Command::ClearPathfindTarget { agent } => {
            if let Some(walker) = world.roster.get_mut(agent) {
                if walker.pathfind_target.take().is_some() {
                    out_events.push(Event::PathfindTargetChanged {
                        agent,
                        target: None,
                    });
                }
            }
        }
        Command::Attack {
            attacker,
            target,
            now,
        } => {
            let Some(striker) = world.roster.get_mut(attacker) else {
                tracing::warn!(agent = attacker.get(), "attack requested by unknown agent");
                return;
            };

            if !ready_at(striker.last_attack, striker.attack_interval, now) {
                out_events.push(Event::AttackResolved {
                    attacker: Combatant::Agent(attacker),
                    target,
                    outcome: AttackOutcome::OnCooldown,
                });
                return;
            }

            striker.last_attack = Some(now);
            let damage = striker.attack;
            match target {
                Combatant::Player => {
                    world.strike_player(Combatant::Agent(attacker), damage, out_events)
                }
                Combatant::Agent(victim) => {
                    world.strike_agent(Combatant::Agent(attacker), victim, damage, out_events)
                }
            }
        }
        Command::PlayerAttack { now } => {
            let Some(player) = world.player.as_mut() else {
                return;
            };

            if !ready_at(player.last_attack, player.attack_interval, now) {
                return;
            }

            player.last_attack = Some(now);
            let damage = player.attack;
            let victim = player
                .tile
                .step(player.facing)
                .and_then(|front| world.occupancy.occupant(front));

            match victim {
                Some(Occupant::Agent(agent)) => {
                    world.strike_agent(Combatant::Player, agent, damage, out_events)
                }
                _ => out_events.push(Event::PlayerAttackMissed),
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use tile_skirmish_core::{AgentView, OccupancyView, PlayerSnapshot};

    use super::{Grid, World};

    /// Provides read-only access to the active grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Captures a read-only view of both agent rosters.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        AgentView::from_snapshots(world.roster.iter().map(|agent| agent.snapshot()).collect())
    }

    /// Captures the player's state, if the player has been placed.
    #[must_use]
    pub fn player(world: &World) -> Option<PlayerSnapshot> {
        world.player.map(|player| player.snapshot())
    }

    /// Exposes a read-only view of the dense occupancy grid.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        let (width, height) = world.occupancy.dimensions();
        OccupancyView::new(world.occupancy.cells(), width, height)
    }
}

#[derive(Clone, Copy, Debug)]
struct Player {
    tile: Tile,
    facing: Direction,
    health: Health,
    max_health: Health,
    attack: i32,
    attack_interval: Duration,
    last_attack: Option<Duration>,
}

impl Player {
    fn new(config: PlayerConfig, tile: Tile, facing: Direction) -> Self {
        Self {
            tile,
            facing,
            health: Health::new(config.health),
            max_health: Health::new(config.health),
            attack: config.attack,
            attack_interval: config.attack_interval,
            last_attack: None,
        }
    }

    fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            tile: self.tile,
            facing: self.facing,
            health: self.health,
            max_health: self.max_health,
            attack: self.attack,
            attack_interval: self.attack_interval,
            last_attack: self.last_attack,
        }
    }
}

#[derive(Debug)]
struct OccupancyGrid {
    width: u32,
    height: u32,
    cells: Vec<Option<Occupant>>,
}

impl OccupancyGrid {
    fn new(width: u32, height: u32) -> Self {
        let capacity = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![None; capacity],
        }
    }

    fn occupant(&self, tile: Tile) -> Option<Occupant> {
        self.index(tile)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    fn is_free(&self, tile: Tile) -> bool {
        self.occupant(tile).is_none()
    }

    fn occupy(&mut self, occupant: Occupant, tile: Tile) {
        if let Some(slot) = self.index(tile).and_then(|index| self.cells.get_mut(index)) {
            *slot = Some(occupant);
        }
    }

    fn vacate(&mut self, tile: Tile) {
        if let Some(slot) = self.index(tile).and_then(|index| self.cells.get_mut(index)) {
            *slot = None;
        }
    }

    fn index(&self, tile: Tile) -> Option<usize> {
        tile.row_major_index(self.width, self.height)
    }

    fn cells(&self) -> &[Option<Occupant>] {
        &self.cells
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
