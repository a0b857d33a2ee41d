//! Geometric visibility predicates over tile coordinates.

use tile_skirmish_core::{Direction, Occluders, Tile};

/// Samples taken along a sight ray per tile of perception radius.
const SAMPLES_PER_RADIUS_TILE: u32 = 4;

/// Reports whether `target` lies strictly inside the circle around `origin`.
#[must_use]
pub fn in_circle(origin: Tile, radius: f64, target: Tile) -> bool {
    let dx = f64::from(target.x()) - f64::from(origin.x());
    let dy = f64::from(target.y()) - f64::from(origin.y());
    dx * dx + dy * dy < radius * radius
}

/// Reports whether `target` lies in the half plane `origin` faces.
///
/// Tiles on the same row or column as the origin count as in front.
#[must_use]
pub fn in_front_of(origin: Tile, facing: Direction, target: Tile) -> bool {
    match facing {
        Direction::North => target.y() <= origin.y(),
        Direction::East => target.x() >= origin.x(),
        Direction::South => target.y() >= origin.y(),
        Direction::West => target.x() <= origin.x(),
    }
}

/// Reports whether `target` is within one tile of `origin` on both axes.
#[must_use]
pub fn is_adjacent(origin: Tile, target: Tile) -> bool {
    origin.x().abs_diff(target.x()) <= 1 && origin.y().abs_diff(target.y()) <= 1
}

/// Samples the segment from `origin` toward `target` and reports whether any
/// sampled tile is an occluder.
///
/// Samples sit at `t = i / sample_count` for `i` in `0..sample_count` and are
/// rounded to the nearest tile. A missing occluder collection
/// counts as occluded.
#[must_use]
pub fn ray_occluded(
    origin: Tile,
    target: Tile,
    sample_count: u32,
    occluders: Option<&Occluders>,
) -> bool {
    let Some(occluders) = occluders else {
        return true;
    };
    if occluders.is_empty() || sample_count == 0 {
        return false;
    }

    let (ox, oy) = (f64::from(origin.x()), f64::from(origin.y()));
    let (dx, dy) = (f64::from(target.x()) - ox, f64::from(target.y()) - oy);
    let samples = f64::from(sample_count);

    (0..sample_count).any(|i| {
        let t = f64::from(i) / samples;
        let sample = Tile::new(round_to_tile(ox + dx * t), round_to_tile(oy + dy * t));
        occluders.contains(sample)
    })
}

/// Full sight check used by target acquisition.
///
/// The target must be inside the perception circle, either in front of the
/// observer or adjacent to it, and the ray must not cross an occluder.
#[must_use]
pub fn has_line_of_sight(
    origin: Tile,
    facing: Direction,
    radius: u32,
    target: Tile,
    occluders: Option<&Occluders>,
) -> bool {
    in_circle(origin, f64::from(radius), target)
        && (in_front_of(origin, facing, target) || is_adjacent(origin, target))
        && !ray_occluded(
            origin,
            target,
            radius.saturating_mul(SAMPLES_PER_RADIUS_TILE),
            occluders,
        )
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_to_tile(value: f64) -> u32 {
    value.round().max(0.0) as u32
}
