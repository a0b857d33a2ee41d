//! Parser for `Key: value` note lines attached to map objects.

use std::time::Duration;

use tile_skirmish_core::{AgentConfig, AgentKind, FollowConfig, WanderAnchor, WanderConfig};

const DEFAULT_WANDER_INTERVAL: u32 = 4;

/// Single `Key: value` pair extracted from a note line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Note<'a> {
    key: &'a str,
    value: &'a str,
}

impl<'a> Note<'a> {
    /// Trimmed key preceding the first colon.
    #[must_use]
    pub const fn key(&self) -> &'a str {
        self.key
    }

    /// Trimmed text following the first colon.
    #[must_use]
    pub const fn value(&self) -> &'a str {
        self.value
    }
}

/// Splits a note line at its first colon.
///
/// Lines without a colon or with an empty key yield `None`.
#[must_use]
pub fn parse_note(line: &str) -> Option<Note<'_>> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some(Note {
        key,
        value: value.trim(),
    })
}

/// Builds an agent configuration from note lines.
///
/// Recognised keys are `Attack`, `Health`, `Speed` (milliseconds between
/// strikes), `PathfindRadius`, `WanderRadius`, `WanderInterval` (decision
/// ticks), `Companion` and `FollowFrequency` (milliseconds between two
/// catch-up targets of a companion). Malformed lines and values are skipped
/// and the corresponding default is kept.
pub fn agent_config_from_notes<'a>(
    kind: AgentKind,
    lines: impl IntoIterator<Item = &'a str>,
) -> AgentConfig {
    let mut config = AgentConfig::new(kind);
    let mut wander_radius = None;
    let mut wander_interval = DEFAULT_WANDER_INTERVAL;
    let mut companion = false;
    let mut follow = FollowConfig::default();

    for line in lines {
        let Some(note) = parse_note(line) else {
            tracing::trace!(line, "skipping note without key");
            continue;
        };

        let applied = match note.key() {
            "Attack" => note.value().parse::<i32>().map(|value| config.attack = value).is_ok(),
            "Health" => note.value().parse::<i32>().map(|value| config.health = value).is_ok(),
            "Speed" => note
                .value()
                .parse::<u64>()
                .map(|millis| config.attack_interval = Duration::from_millis(millis))
                .is_ok(),
            "PathfindRadius" => note
                .value()
                .parse::<u32>()
                .map(|radius| config.perception_radius = Some(radius))
                .is_ok(),
            "WanderRadius" => note
                .value()
                .parse::<u32>()
                .map(|radius| wander_radius = Some(radius))
                .is_ok(),
            "WanderInterval" => note
                .value()
                .parse::<u32>()
                .map(|steps| wander_interval = steps)
                .is_ok(),
            "FollowFrequency" => note
                .value()
                .parse::<u64>()
                .map(|millis| follow.interval = Duration::from_millis(millis))
                .is_ok(),
            "Companion" => note
                .value()
                .parse::<bool>()
                .map(|flag| companion = flag)
                .is_ok(),
            _ => true,
        };

        if !applied {
            tracing::debug!(key = note.key(), value = note.value(), "ignoring malformed note value");
        }
    }

    config.wander = wander_radius
        .filter(|radius| *radius > 0)
        .map(|radius| WanderConfig {
            radius,
            interval_steps: wander_interval.max(1),
            anchor: if companion {
                WanderAnchor::Player
            } else {
                WanderAnchor::Spawn
            },
        });
    config.follow = companion.then_some(follow);
    config
}
