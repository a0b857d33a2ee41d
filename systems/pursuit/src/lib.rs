#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that walks agents down cached distance maps and picks wander spots.

use std::{collections::BTreeMap, time::Duration};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tile_skirmish_core::{
    AgentId, AgentSnapshot, AgentView, Command, Direction, FollowConfig, OccupancyView,
    PathfindTarget, PlayerSnapshot, Tile, WanderAnchor, WanderConfig,
};
use tile_skirmish_world::{DistanceMap, DistanceMapCache, Grid};

/// Random draws attempted before a wander tick gives up on finding an open tile.
const WANDER_ATTEMPTS: usize = 8;

/// Neighbor order used when scanning for a downhill step.
const STEP_ORDER: [Direction; 4] = [
    Direction::East,
    Direction::West,
    Direction::South,
    Direction::North,
];

/// Steering system that turns pathfinding targets into single-tile steps.
#[derive(Debug)]
pub struct Pursuit {
    rng: ChaCha8Rng,
    wander_counters: BTreeMap<AgentId, u32>,
    next_follow: BTreeMap<AgentId, Duration>,
}

impl Pursuit {
    /// Creates a pursuit system drawing wander spots from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            wander_counters: BTreeMap::new(),
            next_follow: BTreeMap::new(),
        }
    }

    /// Forgets every wander counter and follow deadline.
    pub fn reset(&mut self) {
        self.wander_counters.clear();
        self.next_follow.clear();
    }

    /// Sends stray companions back to the player, then advances wander
    /// counters of idle agents and assigns fresh wander spots.
    ///
    /// A companion further than its follow range from the player skips
    /// wandering and, once its follow interval elapsed, heads for a random
    /// tile behind the player. Counters of agents that currently chase
    /// something restart from zero.
    pub fn wander(
        &mut self,
        now: Duration,
        agents: &AgentView,
        player: Option<&PlayerSnapshot>,
        grid: &Grid,
        out: &mut Vec<Command>,
    ) {
        self.wander_counters
            .retain(|agent, _| agents.get(*agent).is_some());
        self.next_follow
            .retain(|agent, _| agents.get(*agent).is_some());

        for agent in agents.iter() {
            if let (Some(follow), Some(player)) = (agent.follow, player) {
                if self.follow(now, agent, follow, player, grid, out) {
                    continue;
                }
            }

            let Some(wander) = agent.wander else {
                continue;
            };

            if agent.pathfind_target.is_some() {
                let _ = self.wander_counters.remove(&agent.id);
                continue;
            }

            let counter = self.wander_counters.entry(agent.id).or_insert(0);
            *counter = counter.saturating_add(1);
            if *counter < wander.interval_steps {
                continue;
            }
            *counter = 0;

            let anchor = match (wander.anchor, player) {
                (WanderAnchor::Player, Some(player)) => player.tile,
                _ => agent.spawn,
            };

            if let Some(tile) = self.pick_wander_tile(agent, anchor, wander, grid) {
                tracing::debug!(
                    agent = agent.id.get(),
                    x = tile.x(),
                    y = tile.y(),
                    "wander target picked"
                );
                out.push(Command::SetPathfindTarget {
                    agent: agent.id,
                    target: PathfindTarget::Tile(tile),
                });
            }
        }
    }

    /// Emits one step or turn per agent that has a pathfinding target.
    ///
    /// Occupancy is read from the view captured before the batch, so two agents
    /// heading for the same tile both request it and the world refuses the
    /// second one.
    pub fn advance(
        &mut self,
        agents: &AgentView,
        player: Option<&PlayerSnapshot>,
        grid: &Grid,
        occupancy: OccupancyView<'_>,
        distances: &mut DistanceMapCache,
        out: &mut Vec<Command>,
    ) {
        for agent in agents.iter() {
            let Some(target) = agent.pathfind_target else {
                continue;
            };

            let Some(target_tile) = agents.target_tile(agent, player) else {
                tracing::debug!(agent = agent.id.get(), ?target, "target vanished");
                out.push(Command::ClearPathfindTarget { agent: agent.id });
                continue;
            };

            let map = distances.get_or_build(target_tile, grid);
            if let Some(command) = plan_step(agent, target, target_tile, map, grid, occupancy) {
                out.push(command);
            }
        }
    }

    /// Handles a companion that may have strayed; returns `true` when the
    /// agent is out of range and must not wander this tick.
    fn follow(
        &mut self,
        now: Duration,
        agent: &AgentSnapshot,
        follow: FollowConfig,
        player: &PlayerSnapshot,
        grid: &Grid,
        out: &mut Vec<Command>,
    ) -> bool {
        if agent
            .pathfind_target
            .is_some_and(|target| target.combatant().is_some())
        {
            return false;
        }

        let close = agent.tile.x().abs_diff(player.tile.x()) <= follow.range
            && agent.tile.y().abs_diff(player.tile.y()) <= follow.range;
        if close {
            return false;
        }

        let _ = self.wander_counters.remove(&agent.id);
        if self
            .next_follow
            .get(&agent.id)
            .is_some_and(|due| now < *due)
        {
            return true;
        }
        let _ = self
            .next_follow
            .insert(agent.id, now.saturating_add(follow.interval));

        if let Some(tile) = self.pick_follow_tile(agent, player, follow.spread, grid) {
            tracing::debug!(
                agent = agent.id.get(),
                x = tile.x(),
                y = tile.y(),
                "companion catching up"
            );
            out.push(Command::SetPathfindTarget {
                agent: agent.id,
                target: PathfindTarget::Tile(tile),
            });
        }
        true
    }

    /// Draws a tile behind the player, shifted toward the player's left-hand side.
    fn pick_follow_tile(
        &mut self,
        agent: &AgentSnapshot,
        player: &PlayerSnapshot,
        spread: u32,
        grid: &Grid,
    ) -> Option<Tile> {
        let spread = i64::from(spread);

        for _ in 0..WANDER_ATTEMPTS {
            let back = self.rng.gen_range(0..=spread);
            let side = self.rng.gen_range(0..=spread);
            let (dx, dy) = match player.facing {
                Direction::North => (-side, back),
                Direction::West => (back, side),
                Direction::South => (side, -back),
                Direction::East => (-back, -side),
            };
            let x = i64::from(player.tile.x()) + dx;
            let y = i64::from(player.tile.y()) + dy;
            let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
                continue;
            };

            let candidate = Tile::new(x, y);
            if candidate != agent.tile && candidate != player.tile && !grid.is_blocked(candidate) {
                return Some(candidate);
            }
        }

        None
    }

    fn pick_wander_tile(
        &mut self,
        agent: &AgentSnapshot,
        anchor: Tile,
        wander: WanderConfig,
        grid: &Grid,
    ) -> Option<Tile> {
        let radius = i64::from(wander.radius);

        for _ in 0..WANDER_ATTEMPTS {
            let x = i64::from(anchor.x()) + self.rng.gen_range(-radius..=radius);
            let y = i64::from(anchor.y()) + self.rng.gen_range(-radius..=radius);
            let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
                continue;
            };

            let candidate = Tile::new(x, y);
            if candidate != agent.tile && !grid.is_blocked(candidate) {
                return Some(candidate);
            }
        }

        None
    }
}

/// Chooses the command that moves `agent` one tile closer to `target_tile`.
///
/// Fixed-tile targets are cleared once reached, once they become unreachable
/// and once someone else parks on them while the agent stands next to them.
/// Entity targets are never cleared here; an unreachable entity only stalls
/// the agent for this tick.
fn plan_step(
    agent: &AgentSnapshot,
    target: PathfindTarget,
    target_tile: Tile,
    map: &DistanceMap,
    grid: &Grid,
    occupancy: OccupancyView<'_>,
) -> Option<Command> {
    let tracks_entity = target.combatant().is_some();
    let clear = Command::ClearPathfindTarget { agent: agent.id };

    let Some(current) = map.distance(agent.tile) else {
        if tracks_entity {
            tracing::trace!(agent = agent.id.get(), "target unreachable, stalling");
            return None;
        }
        tracing::debug!(agent = agent.id.get(), "wander target unreachable");
        return Some(clear);
    };

    if current == 0 {
        return (!tracks_entity).then_some(clear);
    }

    if !tracks_entity && current == 1 && !occupancy.is_free(target_tile) {
        return Some(clear);
    }

    for direction in STEP_ORDER {
        let Some(neighbor) = agent.tile.step(direction) else {
            continue;
        };
        if grid.is_blocked(neighbor) {
            continue;
        }
        let Some(distance) = map.distance(neighbor) else {
            continue;
        };
        if distance >= current {
            continue;
        }

        if tracks_entity && neighbor == target_tile {
            return (agent.facing != direction).then_some(Command::FaceAgent {
                agent: agent.id,
                direction,
            });
        }

        if occupancy.is_free(neighbor) {
            return Some(Command::StepAgent {
                agent: agent.id,
                direction,
            });
        }
    }

    None
}
