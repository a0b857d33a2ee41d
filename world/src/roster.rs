//! Authoritative agent state and identifier allocation.

use std::time::Duration;

use tile_skirmish_core::{
    AgentConfig, AgentId, AgentKind, AgentSnapshot, Direction, FollowConfig, Health,
    PathfindTarget, Tile, WanderConfig,
};

/// Agent stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Agent {
    pub(crate) id: AgentId,
    pub(crate) kind: AgentKind,
    pub(crate) tile: Tile,
    pub(crate) facing: Direction,
    pub(crate) spawn: Tile,
    pub(crate) perception_radius: Option<u32>,
    pub(crate) pathfind_target: Option<PathfindTarget>,
    pub(crate) wander: Option<WanderConfig>,
    pub(crate) follow: Option<FollowConfig>,
    pub(crate) health: Health,
    pub(crate) attack: i32,
    pub(crate) attack_interval: Duration,
    pub(crate) last_attack: Option<Duration>,
}

impl Agent {
    pub(crate) fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            kind: self.kind,
            tile: self.tile,
            facing: self.facing,
            spawn: self.spawn,
            perception_radius: self.perception_radius,
            pathfind_target: self.pathfind_target,
            wander: self.wander,
            follow: self.follow,
            health: self.health,
            attack: self.attack,
            attack_interval: self.attack_interval,
            last_attack: self.last_attack,
        }
    }
}

/// Active agents of both kinds in insertion order.
#[derive(Debug)]
pub(crate) struct Roster {
    agents: Vec<Agent>,
    next_agent_id: AgentId,
}

impl Roster {
    /// Creates an empty roster with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            agents: Vec::new(),
            next_agent_id: AgentId::new(0),
        }
    }

    /// Adds an agent and returns the identifier allocated to it.
    pub(crate) fn insert(&mut self, config: &AgentConfig, tile: Tile, facing: Direction) -> AgentId {
        let id = self.next_agent_id;
        self.next_agent_id = AgentId::new(id.get().saturating_add(1));
        self.agents.push(Agent {
            id,
            kind: config.kind,
            tile,
            facing,
            spawn: tile,
            perception_radius: config.perception_radius,
            pathfind_target: None,
            wander: config.wander,
            follow: config.follow,
            health: Health::new(config.health),
            attack: config.attack,
            attack_interval: config.attack_interval,
            last_attack: None,
        });
        id
    }

    /// Removes the agent, preserving the order of the remaining entries.
    pub(crate) fn remove(&mut self, id: AgentId) -> Option<Agent> {
        let index = self.position(id)?;
        Some(self.agents.remove(index))
    }

    pub(crate) fn get(&self, id: AgentId) -> Option<&Agent> {
        self.position(id).map(|index| &self.agents[index])
    }

    pub(crate) fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.position(id).map(move |index| &mut self.agents[index])
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    fn position(&self, id: AgentId) -> Option<usize> {
        self.agents
            .binary_search_by_key(&id, |agent| agent.id)
            .ok()
    }
}
