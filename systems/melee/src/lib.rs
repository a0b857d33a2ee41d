#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits melee strikes for agents facing their quarry.

use std::time::Duration;

use tile_skirmish_core::{AgentState, AgentView, Command, PlayerSnapshot};

/// Melee system that queues attack commands for agents whose cooldown elapsed.
#[derive(Debug, Default)]
pub struct Melee {
    scratch: Vec<Command>,
}

impl Melee {
    /// Creates a new melee system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::Attack` entries for agents ready to strike at `now`.
    ///
    /// An agent strikes when it tracks an entity, the entity stands on the
    /// tile the agent faces, and the agent's attack interval has elapsed.
    pub fn handle(
        &mut self,
        now: Duration,
        agents: &AgentView,
        player: Option<&PlayerSnapshot>,
        out: &mut Vec<Command>,
    ) {
        if agents.is_empty() {
            return;
        }

        self.scratch.clear();

        for agent in agents.iter() {
            if agents.state_of(agent, player) != AgentState::Engaging {
                continue;
            }
            let Some(target) = agent.pathfind_target.and_then(|target| target.combatant()) else {
                continue;
            };
            if !agent.attack_ready(now) {
                continue;
            }

            self.scratch.push(Command::Attack {
                attacker: agent.id,
                target,
                now,
            });
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}
