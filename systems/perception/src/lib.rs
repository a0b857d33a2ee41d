#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns sight checks and noise alerts into pathfinding targets.

mod visibility;

use std::{collections::BTreeMap, time::Duration};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tile_skirmish_core::{
    AgentId, AgentKind, AgentSnapshot, AgentView, Command, PathfindTarget, PlayerSnapshot, Tile,
    TargetPriority,
};
use tile_skirmish_world::Grid;

pub use visibility::{has_line_of_sight, in_circle, in_front_of, is_adjacent, ray_occluded};

/// Multiplier applied to the perception radius when deciding who hears a shot.
const ALERT_RADIUS_FACTOR: f64 = 1.75;

/// Upper bound, exclusive, of the random delay before an alerted enemy reacts.
const ALERT_DELAY_MAX_MILLIS: u64 = 1_500;

/// Target acquisition system that remembers where tracked entities were last seen.
#[derive(Debug)]
pub struct Perception {
    priority: TargetPriority,
    rng: ChaCha8Rng,
    last_seen: BTreeMap<AgentId, Tile>,
    alerts: Vec<PendingAlert>,
}

impl Perception {
    /// Creates a new perception system drawing randomness from `seed`.
    #[must_use]
    pub fn new(priority: TargetPriority, seed: u64) -> Self {
        Self {
            priority,
            rng: ChaCha8Rng::seed_from_u64(seed),
            last_seen: BTreeMap::new(),
            alerts: Vec::new(),
        }
    }

    /// Forgets every sighting and pending alert.
    pub fn reset(&mut self) {
        self.last_seen.clear();
        self.alerts.clear();
    }

    /// Number of alerts still waiting for their delay to elapse.
    #[must_use]
    pub fn pending_alerts(&self) -> usize {
        self.alerts.len()
    }

    /// Schedules enemies that hear a noise at `origin` to investigate it.
    ///
    /// Every enemy with a perception radius whose extended hearing circle
    /// contains the origin reacts after its own random delay.
    pub fn raise_alert(&mut self, origin: Tile, now: Duration, agents: &AgentView) {
        for enemy in agents.of_kind(AgentKind::Enemy) {
            let Some(radius) = enemy.perception_radius else {
                continue;
            };
            if !in_circle(enemy.tile, f64::from(radius) * ALERT_RADIUS_FACTOR, origin) {
                continue;
            }

            let delay = Duration::from_millis(self.rng.gen_range(0..ALERT_DELAY_MAX_MILLIS));
            tracing::debug!(
                agent = enemy.id.get(),
                x = origin.x(),
                y = origin.y(),
                delay_ms = delay.as_millis(),
                "alert scheduled"
            );
            self.alerts.push(PendingAlert {
                agent: enemy.id,
                origin,
                due: now.saturating_add(delay),
            });
        }
    }

    /// Emits target changes for every perceiving agent in roster order.
    ///
    /// A visible candidate always wins. Otherwise a due alert sends the agent
    /// to the noise, and an agent that lost sight of its tracked entity heads
    /// to the tile where it was last seen.
    pub fn handle(
        &mut self,
        now: Duration,
        agents: &AgentView,
        player: Option<&PlayerSnapshot>,
        grid: &Grid,
        out: &mut Vec<Command>,
    ) {
        let alerts = self.take_due_alerts(now, agents);
        self.last_seen.retain(|agent, _| agents.get(*agent).is_some());
        let mut candidates = Vec::new();

        for agent in agents.iter() {
            let Some(radius) = agent.perception_radius else {
                continue;
            };

            self.collect_candidates(agent, agents, player, &mut candidates);
            let sighted = candidates.iter().copied().find(|(_, tile)| {
                has_line_of_sight(agent.tile, agent.facing, radius, *tile, Some(grid.occluders()))
            });

            let desired = if let Some((target, tile)) = sighted {
                let _ = self.last_seen.insert(agent.id, tile);
                Some(target)
            } else if let Some(origin) = alerts.get(&agent.id) {
                let _ = self.last_seen.remove(&agent.id);
                Some(PathfindTarget::Tile(*origin))
            } else {
                self.lost_sight(agent, agents, player)
            };

            let Some(target) = desired else {
                continue;
            };
            if agent.pathfind_target != Some(target) {
                tracing::debug!(agent = agent.id.get(), ?target, "target acquired");
                out.push(Command::SetPathfindTarget {
                    agent: agent.id,
                    target,
                });
            }
        }
    }

    fn collect_candidates(
        &mut self,
        agent: &AgentSnapshot,
        agents: &AgentView,
        player: Option<&PlayerSnapshot>,
        candidates: &mut Vec<(PathfindTarget, Tile)>,
    ) {
        candidates.clear();

        let prey = match agent.kind {
            AgentKind::Enemy => AgentKind::Battler,
            AgentKind::Battler => AgentKind::Enemy,
        };
        let roster = agents
            .of_kind(prey)
            .map(|other| (PathfindTarget::Agent(other.id), other.tile));

        let player = match agent.kind {
            AgentKind::Enemy => player.map(|player| (PathfindTarget::Player, player.tile)),
            AgentKind::Battler => None,
        };

        let player_first = match self.priority {
            TargetPriority::PlayerFirst => true,
            TargetPriority::BattlersFirst => false,
            TargetPriority::CoinFlip => player.is_some() && self.rng.gen_bool(0.5),
        };

        if player_first {
            candidates.extend(player);
            candidates.extend(roster);
        } else {
            candidates.extend(roster);
            candidates.extend(player);
        }
    }

    fn lost_sight(
        &mut self,
        agent: &AgentSnapshot,
        agents: &AgentView,
        player: Option<&PlayerSnapshot>,
    ) -> Option<PathfindTarget> {
        let tracked = agent.pathfind_target?.combatant()?;
        let last_seen = self.last_seen.remove(&agent.id)?;

        if agents.target_tile(agent, player).is_none() {
            return None;
        }

        tracing::debug!(
            agent = agent.id.get(),
            ?tracked,
            x = last_seen.x(),
            y = last_seen.y(),
            "lost sight, heading to last known position"
        );
        Some(PathfindTarget::Tile(last_seen))
    }

    fn take_due_alerts(&mut self, now: Duration, agents: &AgentView) -> BTreeMap<AgentId, Tile> {
        let mut due = BTreeMap::new();
        self.alerts.retain(|alert| {
            if agents.get(alert.agent).is_none() {
                return false;
            }
            if alert.due > now {
                return true;
            }
            let _ = due.insert(alert.agent, alert.origin);
            false
        });
        due
    }
}

#[derive(Clone, Copy, Debug)]
struct PendingAlert {
    agent: AgentId,
    origin: Tile,
    due: Duration,
}
