#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Host-facing driver that owns the world, the distance-map cache and every
//! system, and runs them on a fixed wall-clock cadence.
//!
//! A host calls [`Session::on_map_load`] whenever the active map changes,
//! registers agents and the player, and then calls [`Session::tick`] from its
//! frame callback. Decisions (wander, perception, pursuit) only run once the
//! configured pathfinding step elapsed; melee strikes are checked every tick.

mod config;

use std::time::Duration;

use thiserror::Error;
use tile_skirmish_core::{
    AgentConfig, AgentId, AgentState, AgentView, Command, Direction, Event, MoveError, PlayerConfig,
    PlayerSnapshot, Tile,
};
use tile_skirmish_system_melee::Melee;
use tile_skirmish_system_perception::Perception;
use tile_skirmish_system_pursuit::Pursuit;
use tile_skirmish_world::{
    self as world, query, DistanceMap, DistanceMapCache, MapError, MapSource, World,
};

pub use config::SessionConfig;
pub use tile_skirmish_system_perception::in_circle;

/// Failures surfaced to the host by session setup calls.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The map source could not be turned into a grid.
    #[error("failed to load map")]
    Map(#[from] MapError),
    /// Decision ticks need a non-zero cadence.
    #[error("pathfinding step must be greater than zero")]
    ZeroPathfindingStep,
    /// The world refused to place an entity on the requested tile.
    #[error("cannot place entity at {tile:?}: {reason:?}")]
    PlacementRejected {
        /// Requested tile.
        tile: Tile,
        /// Reason reported by the world.
        reason: MoveError,
    },
}

/// Owns the authoritative world together with the systems that drive it.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    world: World,
    distances: DistanceMapCache,
    perception: Perception,
    pursuit: Pursuit,
    melee: Melee,
    next_decision: Duration,
}

impl Session {
    /// Creates a session without a loaded map.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        if config.pathfinding_step_ms == 0 {
            return Err(SessionError::ZeroPathfindingStep);
        }

        Ok(Self {
            world: World::new(),
            distances: DistanceMapCache::new(),
            perception: Perception::new(config.target_priority, config.seed),
            pursuit: Pursuit::new(config.seed.rotate_left(32)),
            melee: Melee::new(),
            next_decision: Duration::ZERO,
            config,
        })
    }

    /// Configuration the session was created with.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Read-only access to the authoritative world for [`query`] calls.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Snapshot of every active agent in roster order.
    #[must_use]
    pub fn agents(&self) -> AgentView {
        query::agent_view(&self.world)
    }

    /// Snapshot of the player, if placed.
    #[must_use]
    pub fn player(&self) -> Option<PlayerSnapshot> {
        query::player(&self.world)
    }

    /// Decision-loop state of `agent`, or `None` for unknown agents.
    #[must_use]
    pub fn agent_state(&self, agent: AgentId) -> Option<AgentState> {
        let agents = query::agent_view(&self.world);
        let player = query::player(&self.world);
        agents
            .get(agent)
            .map(|snapshot| agents.state_of(snapshot, player.as_ref()))
    }

    /// Replaces the active map.
    ///
    /// Rosters, the player, cached distance maps, sightings, pending alerts
    /// and wander counters are all discarded, and the next tick runs a
    /// decision pass.
    pub fn on_map_load(&mut self, source: &impl MapSource) -> Result<Vec<Event>, SessionError> {
        let mut events = Vec::new();
        world::load_map(&mut self.world, source, self.config.tags, &mut events)?;

        self.distances.invalidate_all();
        self.perception.reset();
        self.pursuit.reset();
        self.next_decision = Duration::ZERO;

        if self.config.precompute_distance_maps {
            self.distances.precompute(query::grid(&self.world));
        }

        Ok(events)
    }

    /// Adds an agent to its roster.
    pub fn register_agent(
        &mut self,
        config: AgentConfig,
        tile: Tile,
        facing: Direction,
    ) -> Result<AgentId, SessionError> {
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::SpawnAgent {
                config,
                tile,
                facing,
            },
            &mut events,
        );

        events
            .iter()
            .find_map(|event| match event {
                Event::AgentSpawned { agent, .. } => Some(Ok(*agent)),
                Event::SpawnRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(MoveError::OutOfBounds))
            .map_err(|reason| SessionError::PlacementRejected { tile, reason })
    }

    /// Places the player, replacing any previous placement.
    pub fn place_player(
        &mut self,
        config: PlayerConfig,
        tile: Tile,
        facing: Direction,
    ) -> Result<(), SessionError> {
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::PlacePlayer {
                config,
                tile,
                facing,
            },
            &mut events,
        );

        match events.as_slice() {
            [Event::SpawnRejected { tile, reason }] => Err(SessionError::PlacementRejected {
                tile: *tile,
                reason: *reason,
            }),
            _ => Ok(()),
        }
    }

    /// Turns the player and steps forward when the destination is free.
    pub fn move_player(&mut self, direction: Direction) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::MovePlayer { direction }, &mut events);
        events
    }

    /// Swings the player's weapon at its facing tile.
    pub fn player_attack(&mut self, now: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::PlayerAttack { now }, &mut events);
        events
    }

    /// Makes enemies within hearing distance of `origin` investigate it.
    pub fn raise_alert(&mut self, origin: Tile, now: Duration) {
        let agents = query::agent_view(&self.world);
        self.perception.raise_alert(origin, now, &agents);
    }

    /// Advances the simulation to `now`, measured from the start of the session.
    ///
    /// Missed decision ticks are not replayed; the next one is scheduled one
    /// step after the tick that ran.
    pub fn tick(&mut self, now: Duration) -> Vec<Event> {
        let mut events = Vec::new();

        if now >= self.next_decision {
            self.next_decision = now.saturating_add(self.config.pathfinding_step());
            self.run_decisions(now, &mut events);
        }

        let agents = query::agent_view(&self.world);
        let player = query::player(&self.world);
        let mut commands = Vec::new();
        self.melee.handle(now, &agents, player.as_ref(), &mut commands);
        apply_all(&mut self.world, commands, &mut events);

        events
    }

    /// Reports whether `agent` currently sees `target` with its perception radius.
    ///
    /// Unknown agents and agents without a perception radius see nothing.
    #[must_use]
    pub fn has_line_of_sight(&self, agent: AgentId, target: Tile) -> bool {
        let agents = query::agent_view(&self.world);
        let Some(observer) = agents.get(agent) else {
            return false;
        };
        let Some(radius) = observer.perception_radius else {
            return false;
        };

        tile_skirmish_system_perception::has_line_of_sight(
            observer.tile,
            observer.facing,
            radius,
            target,
            Some(query::grid(&self.world).occluders()),
        )
    }

    /// Distance map leading to `target`, built on first request.
    pub fn distance_map(&mut self, target: Tile) -> &DistanceMap {
        self.distances
            .get_or_build(target, query::grid(&self.world))
    }

    /// Number of breadth-first searches run since the last map load.
    #[must_use]
    pub const fn distance_map_builds(&self) -> u64 {
        self.distances.builds()
    }

    fn run_decisions(&mut self, now: Duration, events: &mut Vec<Event>) {
        tracing::trace!(now_ms = now.as_millis(), "decision tick");
        let mut commands = Vec::new();

        let agents = query::agent_view(&self.world);
        let player = query::player(&self.world);
        self.pursuit.wander(
            now,
            &agents,
            player.as_ref(),
            query::grid(&self.world),
            &mut commands,
        );
        apply_all(&mut self.world, commands.drain(..), events);

        let agents = query::agent_view(&self.world);
        self.perception.handle(
            now,
            &agents,
            player.as_ref(),
            query::grid(&self.world),
            &mut commands,
        );
        apply_all(&mut self.world, commands.drain(..), events);

        let agents = query::agent_view(&self.world);
        self.pursuit.advance(
            &agents,
            player.as_ref(),
            query::grid(&self.world),
            query::occupancy_view(&self.world),
            &mut self.distances,
            &mut commands,
        );
        apply_all(&mut self.world, commands.drain(..), events);
    }
}

fn apply_all(
    world: &mut World,
    commands: impl IntoIterator<Item = Command>,
    events: &mut Vec<Event>,
) {
    for command in commands {
        world::apply(world, command, events);
    }
}
