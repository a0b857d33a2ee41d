#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tile Skirmish engine.
//!
//! This crate defines the message surface that connects the host integration,
//! the authoritative world, and pure systems. The host and the systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values.
//! Systems read immutable views ([`AgentView`], [`PlayerSnapshot`],
//! [`OccupancyView`]) and respond exclusively with new command batches.

use std::{collections::HashSet, time::Duration};

use serde::{Deserialize, Serialize};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Adds a new agent to the active roster.
    SpawnAgent {
        /// Validated stats applied to the agent.
        config: AgentConfig,
        /// Tile the agent occupies when it appears.
        tile: Tile,
        /// Initial facing direction.
        facing: Direction,
    },
    /// Places the player on the map, replacing any previous position.
    PlacePlayer {
        /// Stats applied to the player.
        config: PlayerConfig,
        /// Tile the player occupies.
        tile: Tile,
        /// Direction the player faces.
        facing: Direction,
    },
    /// Turns the player and advances one tile when the destination is free.
    MovePlayer {
        /// Direction of travel.
        direction: Direction,
    },
    /// Requests that an agent advance a single tile in the specified direction.
    StepAgent {
        /// Identifier of the agent attempting to move.
        agent: AgentId,
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Turns an agent in place.
    FaceAgent {
        /// Identifier of the agent that turns.
        agent: AgentId,
        /// Direction the agent should face.
        direction: Direction,
    },
    /// Assigns a pathfinding target to an agent.
    SetPathfindTarget {
        /// Agent receiving the target.
        agent: AgentId,
        /// Tile or entity the agent should move toward.
        target: PathfindTarget,
    },
    /// Drops the agent's pathfinding target, returning it to idle.
    ClearPathfindTarget {
        /// Agent whose target is cleared.
        agent: AgentId,
    },
    /// Resolves a melee strike from an agent.
    Attack {
        /// Agent delivering the strike.
        attacker: AgentId,
        /// Entity receiving the strike.
        target: Combatant,
        /// Clock reading used for cooldown bookkeeping.
        now: Duration,
    },
    /// Resolves a melee strike from the player against its facing tile.
    PlayerAttack {
        /// Clock reading used for cooldown bookkeeping.
        now: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that a new map replaced the previous one.
    MapLoaded {
        /// Width of the new grid in tiles.
        width: u32,
        /// Height of the new grid in tiles.
        height: u32,
    },
    /// Confirms that an agent joined the roster.
    AgentSpawned {
        /// Identifier allocated to the agent.
        agent: AgentId,
        /// Roster the agent belongs to.
        kind: AgentKind,
        /// Tile the agent occupies.
        tile: Tile,
    },
    /// Reports that a spawn request could not be honoured.
    SpawnRejected {
        /// Requested spawn tile.
        tile: Tile,
        /// Reason the tile was unusable.
        reason: MoveError,
    },
    /// Confirms the player's placement.
    PlayerPlaced {
        /// Tile the player occupies.
        tile: Tile,
        /// Direction the player faces.
        facing: Direction,
    },
    /// Confirms that the player moved or turned.
    PlayerMoved {
        /// Tile the player occupied before the command.
        from: Tile,
        /// Tile the player occupies after the command.
        to: Tile,
        /// Direction the player faces after the command.
        facing: Direction,
    },
    /// Confirms that an agent successfully moved between two tiles.
    AgentMoved {
        /// Identifier of the agent that advanced.
        agent: AgentId,
        /// Tile the agent occupied before moving.
        from: Tile,
        /// Tile the agent occupies after moving.
        to: Tile,
        /// Direction the agent faces after moving.
        facing: Direction,
    },
    /// Confirms that an agent turned in place.
    AgentTurned {
        /// Identifier of the agent that turned.
        agent: AgentId,
        /// Direction the agent now faces.
        facing: Direction,
    },
    /// Reports that a step request was rejected.
    StepRejected {
        /// Identifier of the agent that attempted to move.
        agent: AgentId,
        /// Specific reason the step failed.
        reason: MoveError,
    },
    /// Reports a change of an agent's pathfinding target.
    PathfindTargetChanged {
        /// Agent whose target changed.
        agent: AgentId,
        /// New target, or `None` when the agent returned to idle.
        target: Option<PathfindTarget>,
    },
    /// Reports that a pathfinding target could not be assigned.
    PathfindTargetRejected {
        /// Agent that would have received the target.
        agent: AgentId,
        /// Target that was refused.
        target: PathfindTarget,
    },
    /// Reports the outcome of a melee strike.
    AttackResolved {
        /// Entity that delivered the strike.
        attacker: Combatant,
        /// Entity that received the strike.
        target: Combatant,
        /// Result of the strike.
        outcome: AttackOutcome,
    },
    /// Announces that an agent was removed from its roster after dying.
    AgentDied {
        /// Identifier of the dead agent.
        agent: AgentId,
        /// Roster the agent belonged to.
        kind: AgentKind,
    },
    /// Announces that the player ran out of health and was restored.
    PlayerDefeated,
    /// Reports that the player swung at a tile without a target.
    PlayerAttackMissed,
}

/// Reasons a movement or spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveError {
    /// No agent with the provided identifier exists.
    UnknownAgent,
    /// The destination lies outside the grid.
    OutOfBounds,
    /// The destination is obstructed terrain.
    Blocked,
    /// Another agent or the player stands on the destination.
    Occupied,
}

/// Result of a single melee strike.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttackOutcome {
    /// The target survived with the provided health.
    Damaged {
        /// Health left after the strike.
        remaining: Health,
    },
    /// The strike dropped the target's health to zero or below.
    Killed,
    /// The target had already died; nothing changed.
    AlreadyDead,
    /// The attacker's cooldown has not elapsed; nothing changed.
    OnCooldown,
}

/// Cardinal directions used for movement and facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing `y`.
    North,
    /// Toward increasing `x`.
    East,
    /// Toward increasing `y`.
    South,
    /// Toward decreasing `x`.
    West,
}

/// Location of a single grid tile.
///
/// Equality and hashing are structural, so freshly constructed coordinates
/// with equal components always address the same map or set entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tile {
    x: u32,
    y: u32,
}

impl Tile {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the tile.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row of the tile.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Position of the tile inside a row-major buffer of `width` by `height` cells.
    ///
    /// Returns `None` for tiles outside the buffer.
    #[must_use]
    pub fn row_major_index(self, width: u32, height: u32) -> Option<usize> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let row = usize::try_from(self.y).ok()?;
        let column = usize::try_from(self.x).ok()?;
        let width = usize::try_from(width).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Neighbouring tile one step in `direction`.
    ///
    /// Returns `None` when the step would leave the non-negative quadrant.
    /// Upper grid bounds are not checked here.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<Tile> {
        match direction {
            Direction::North => self.y.checked_sub(1).map(|y| Tile::new(self.x, y)),
            Direction::East => self.x.checked_add(1).map(|x| Tile::new(x, self.y)),
            Direction::South => self.y.checked_add(1).map(|y| Tile::new(self.x, y)),
            Direction::West => self.x.checked_sub(1).map(|x| Tile::new(x, self.y)),
        }
    }
}

/// Unique identifier assigned to an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Roster an agent belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    /// Hostile agent that hunts the player and battlers.
    Enemy,
    /// Friendly fighter that hunts enemies.
    Battler,
}

/// Hit points remaining on a combatant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Health(i32);

impl Health {
    /// Wraps a raw hit point value.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Retrieves the raw hit point value.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }

    /// Health left after a flat subtraction of `damage`.
    #[must_use]
    pub const fn damaged(self, damage: i32) -> Self {
        Self(self.0.saturating_sub(damage))
    }

    /// Reports whether the value reached zero or below.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.0 <= 0
    }
}

/// Participant in a melee exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Combatant {
    /// The player character.
    Player,
    /// An agent from either roster.
    Agent(AgentId),
}

/// Destination an agent is steering toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathfindTarget {
    /// A fixed tile such as a wander spot or a last known position.
    Tile(Tile),
    /// The player's current tile, re-read every decision tick.
    Player,
    /// Another agent's current tile, re-read every decision tick.
    Agent(AgentId),
}

impl PathfindTarget {
    /// Combatant tracked by the target, if it follows an entity.
    #[must_use]
    pub const fn combatant(&self) -> Option<Combatant> {
        match self {
            Self::Tile(_) => None,
            Self::Player => Some(Combatant::Player),
            Self::Agent(agent) => Some(Combatant::Agent(*agent)),
        }
    }
}

/// Reference point a wandering agent drifts around.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WanderAnchor {
    /// The tile the agent spawned on.
    Spawn,
    /// The player's current tile; used by companions.
    Player,
}

/// Periodic random movement applied while an agent has nothing to chase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WanderConfig {
    /// Maximum offset along each axis from the anchor.
    pub radius: u32,
    /// Decision ticks between two wander targets.
    pub interval_steps: u32,
    /// Reference point of the wander area.
    pub anchor: WanderAnchor,
}

/// Catch-up behaviour of a companion that strayed too far from the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FollowConfig {
    /// Largest per-axis distance from the player that still counts as close.
    pub range: u32,
    /// Maximum per-axis offset of the catch-up tile behind the player.
    pub spread: u32,
    /// Minimum time between two catch-up targets.
    pub interval: Duration,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            range: 3,
            spread: 3,
            interval: Duration::from_millis(2_500),
        }
    }
}

/// Validated stats describing a single agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Roster the agent joins.
    pub kind: AgentKind,
    /// Damage dealt per strike.
    pub attack: i32,
    /// Starting hit points.
    pub health: i32,
    /// Minimum time between two strikes.
    pub attack_interval: Duration,
    /// Sight radius in tiles; `None` disables target acquisition.
    pub perception_radius: Option<u32>,
    /// Wander behaviour; `None` keeps the agent still while idle.
    pub wander: Option<WanderConfig>,
    /// Companion catch-up behaviour; `None` for agents that ignore the player.
    pub follow: Option<FollowConfig>,
}

impl AgentConfig {
    /// Creates a configuration with default stats for the provided roster.
    #[must_use]
    pub fn new(kind: AgentKind) -> Self {
        Self {
            kind,
            attack: 0,
            health: 10,
            attack_interval: Duration::from_millis(1_000),
            perception_radius: None,
            wander: None,
            follow: None,
        }
    }
}

/// Validated stats describing the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Starting and restored hit points.
    pub health: i32,
    /// Damage dealt per strike.
    pub attack: i32,
    /// Minimum time between two strikes.
    pub attack_interval: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            health: 20,
            attack: 1,
            attack_interval: Duration::from_millis(1_000),
        }
    }
}

/// Order in which an enemy considers its candidate targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPriority {
    /// The player is checked before any battler.
    #[default]
    PlayerFirst,
    /// Battlers are checked in roster order before the player.
    BattlersFirst,
    /// A seeded coin flip picks one of the two orders per agent and tick.
    CoinFlip,
}

/// Coarse decision-loop state of an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AgentState {
    /// No pathfinding target.
    Idle,
    /// Moving toward a target.
    Seeking,
    /// Facing the tracked entity on an adjacent tile.
    Engaging,
}

/// Immutable representation of a single agent's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentSnapshot {
    /// Unique identifier assigned to the agent.
    pub id: AgentId,
    /// Roster the agent belongs to.
    pub kind: AgentKind,
    /// Tile currently occupied by the agent.
    pub tile: Tile,
    /// Direction the agent faces.
    pub facing: Direction,
    /// Tile the agent spawned on.
    pub spawn: Tile,
    /// Sight radius in tiles, if configured.
    pub perception_radius: Option<u32>,
    /// Current pathfinding target, if any.
    pub pathfind_target: Option<PathfindTarget>,
    /// Wander behaviour, if configured.
    pub wander: Option<WanderConfig>,
    /// Companion catch-up behaviour, if configured.
    pub follow: Option<FollowConfig>,
    /// Remaining hit points.
    pub health: Health,
    /// Damage dealt per strike.
    pub attack: i32,
    /// Minimum time between two strikes.
    pub attack_interval: Duration,
    /// Clock reading of the last strike.
    pub last_attack: Option<Duration>,
}

impl AgentSnapshot {
    /// Tile directly in front of the agent.
    #[must_use]
    pub fn facing_tile(&self) -> Option<Tile> {
        self.tile.step(self.facing)
    }

    /// Reports whether the attack cooldown elapsed at `now`.
    #[must_use]
    pub fn attack_ready(&self, now: Duration) -> bool {
        ready_at(self.last_attack, self.attack_interval, now)
    }
}

/// Immutable representation of the player used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerSnapshot {
    /// Tile currently occupied by the player.
    pub tile: Tile,
    /// Direction the player faces.
    pub facing: Direction,
    /// Remaining hit points.
    pub health: Health,
    /// Hit points restored after a defeat.
    pub max_health: Health,
    /// Damage dealt per strike.
    pub attack: i32,
    /// Minimum time between two strikes.
    pub attack_interval: Duration,
    /// Clock reading of the last strike.
    pub last_attack: Option<Duration>,
}

impl PlayerSnapshot {
    /// Tile directly in front of the player.
    #[must_use]
    pub fn facing_tile(&self) -> Option<Tile> {
        self.tile.step(self.facing)
    }

    /// Reports whether the attack cooldown elapsed at `now`.
    #[must_use]
    pub fn attack_ready(&self, now: Duration) -> bool {
        ready_at(self.last_attack, self.attack_interval, now)
    }
}

/// Reports whether a strike cooldown that started at `last_attack` elapsed at `now`.
///
/// A combatant that never struck is always ready.
#[must_use]
pub fn ready_at(last_attack: Option<Duration>, interval: Duration, now: Duration) -> bool {
    match last_attack {
        None => true,
        Some(last) => last.saturating_add(interval) <= now,
    }
}

/// Read-only snapshot describing every active agent in roster order.
#[derive(Clone, Debug, Default)]
pub struct AgentView {
    snapshots: Vec<AgentSnapshot>,
}

impl AgentView {
    /// Creates a new agent view from snapshots listed in roster order.
    ///
    /// Identifiers are allocated in increasing order, so roster order is also
    /// identifier order.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AgentSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over every snapshot in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over snapshots of a single roster.
    pub fn of_kind(&self, kind: AgentKind) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots
            .iter()
            .filter(move |snapshot| snapshot.kind == kind)
    }

    /// Looks up a snapshot by identifier.
    #[must_use]
    pub fn get(&self, agent: AgentId) -> Option<&AgentSnapshot> {
        self.snapshots
            .binary_search_by_key(&agent, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of agents captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Tile the agent is currently steering toward.
    ///
    /// Entity targets are resolved against the live rosters; a vanished
    /// entity yields `None`.
    #[must_use]
    pub fn target_tile(
        &self,
        agent: &AgentSnapshot,
        player: Option<&PlayerSnapshot>,
    ) -> Option<Tile> {
        match agent.pathfind_target? {
            PathfindTarget::Tile(tile) => Some(tile),
            PathfindTarget::Player => player.map(|player| player.tile),
            PathfindTarget::Agent(other) => self.get(other).map(|snapshot| snapshot.tile),
        }
    }

    /// Derives the decision-loop state of an agent.
    #[must_use]
    pub fn state_of(&self, agent: &AgentSnapshot, player: Option<&PlayerSnapshot>) -> AgentState {
        let Some(target) = agent.pathfind_target else {
            return AgentState::Idle;
        };

        if target.combatant().is_some()
            && agent.facing_tile().is_some()
            && agent.facing_tile() == self.target_tile(agent, player)
        {
            AgentState::Engaging
        } else {
            AgentState::Seeking
        }
    }
}

/// Entity standing on a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Occupant {
    /// The player character.
    Player,
    /// An agent from either roster.
    Agent(AgentId),
}

/// Read-only view into the dense occupancy grid.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    cells: &'a [Option<Occupant>],
    width: u32,
    height: u32,
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by the provided row-major slice.
    #[must_use]
    pub fn new(cells: &'a [Option<Occupant>], width: u32, height: u32) -> Self {
        Self {
            cells,
            width,
            height,
        }
    }

    /// Returns the entity occupying the provided tile, if any.
    #[must_use]
    pub fn occupant(&self, tile: Tile) -> Option<Occupant> {
        tile.row_major_index(self.width, self.height)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Reports whether no entity stands on the tile.
    #[must_use]
    pub fn is_free(&self, tile: Tile) -> bool {
        self.occupant(tile).is_none()
    }

}

/// Ordered collection of tiles that block line of sight.
///
/// Keeps the scan order for iteration alongside a hash index for lookups.
#[derive(Clone, Debug, Default)]
pub struct Occluders {
    ordered: Vec<Tile>,
    index: HashSet<Tile>,
}

impl Occluders {
    /// Builds the collection, dropping duplicate tiles after their first occurrence.
    #[must_use]
    pub fn from_tiles(tiles: impl IntoIterator<Item = Tile>) -> Self {
        let mut occluders = Self::default();
        for tile in tiles {
            if occluders.index.insert(tile) {
                occluders.ordered.push(tile);
            }
        }
        occluders
    }

    /// Reports whether the tile blocks sight.
    #[must_use]
    pub fn contains(&self, tile: Tile) -> bool {
        self.index.contains(&tile)
    }

    /// Iterator over the occluders in scan order.
    pub fn iter(&self) -> impl Iterator<Item = Tile> + '_ {
        self.ordered.iter().copied()
    }

    /// Number of occluder tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Reports whether the collection holds no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
