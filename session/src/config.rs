//! Tunables that shape a session's decision loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tile_skirmish_core::TargetPriority;
use tile_skirmish_world::TileTags;

const DEFAULT_PATHFINDING_STEP_MS: u64 = 500;
const DEFAULT_SEED: u64 = 0x7a1e_5c0f_f1e1_d5ee;

/// Configuration applied when a [`Session`](crate::Session) is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Milliseconds between two decision ticks.
    pub pathfinding_step_ms: u64,
    /// Tags marking line-of-sight occluders in the map metadata.
    pub tags: TileTags,
    /// Order in which enemies consider the player and battlers.
    pub target_priority: TargetPriority,
    /// Builds a distance map for every open tile on map load.
    pub precompute_distance_maps: bool,
    /// Seed of every pseudo-random draw made by the systems.
    pub seed: u64,
}

impl SessionConfig {
    /// Wall-clock interval between two decision ticks.
    #[must_use]
    pub const fn pathfinding_step(&self) -> Duration {
        Duration::from_millis(self.pathfinding_step_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pathfinding_step_ms: DEFAULT_PATHFINDING_STEP_MS,
            tags: TileTags::default(),
            target_priority: TargetPriority::default(),
            precompute_distance_maps: false,
            seed: DEFAULT_SEED,
        }
    }
}
