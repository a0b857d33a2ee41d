//! Memoized distance maps keyed by target tile.

use std::collections::HashMap;

use tile_skirmish_core::Tile;

use crate::{
    grid::Grid,
    navigation::{build_distance_map, DistanceMap},
};

/// Distance maps built during the lifetime of the active map.
///
/// Holds at most one map per target. Entries are never evicted individually;
/// [`DistanceMapCache::invalidate_all`] drops every map when the grid changes.
#[derive(Debug, Default)]
pub struct DistanceMapCache {
    maps: HashMap<Tile, DistanceMap>,
    builds: u64,
}

impl DistanceMapCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the map rooted at `target`, running the search on first request.
    pub fn get_or_build(&mut self, target: Tile, grid: &Grid) -> &DistanceMap {
        let builds = &mut self.builds;
        self.maps.entry(target).or_insert_with(|| {
            *builds += 1;
            let map = build_distance_map(target, grid);
            tracing::debug!(
                x = target.x(),
                y = target.y(),
                reachable = map.reachable_count(),
                "built distance map"
            );
            map
        })
    }

    /// Returns the cached map rooted at `target` without building it.
    #[must_use]
    pub fn get(&self, target: Tile) -> Option<&DistanceMap> {
        self.maps.get(&target)
    }

    /// Builds a map for every open tile of the grid.
    pub fn precompute(&mut self, grid: &Grid) {
        for tile in grid.open_tiles() {
            let _ = self.get_or_build(tile, grid);
        }
        tracing::info!(maps = self.maps.len(), "precomputed distance maps");
    }

    /// Drops every cached map and resets the build counter.
    pub fn invalidate_all(&mut self) {
        self.maps.clear();
        self.builds = 0;
    }

    /// Number of searches run since the last invalidation.
    #[must_use]
    pub const fn builds(&self) -> u64 {
        self.builds
    }

    /// Number of cached maps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Reports whether no map is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_requests_reuse_the_same_map() {
        let grid = Grid::with_obstacles(5, 5, [Tile::new(2, 2)], []).expect("grid");
        let mut cache = DistanceMapCache::new();

        let first: *const DistanceMap = cache.get_or_build(Tile::new(4, 4), &grid);
        let second: *const DistanceMap = cache.get_or_build(Tile::new(4, 4), &grid);

        assert!(std::ptr::eq(first, second));
        assert_eq!(cache.builds(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn each_distinct_target_builds_once() {
        let grid = Grid::with_obstacles(4, 4, [], []).expect("grid");
        let mut cache = DistanceMapCache::new();

        for _ in 0..3 {
            let _ = cache.get_or_build(Tile::new(0, 0), &grid);
            let _ = cache.get_or_build(Tile::new(3, 1), &grid);
        }

        assert_eq!(cache.builds(), 2);
        assert!(cache.get(Tile::new(3, 1)).is_some());
        assert!(cache.get(Tile::new(1, 1)).is_none());
    }

    #[test]
    fn invalidation_forces_rebuild() {
        let grid = Grid::with_obstacles(4, 4, [], []).expect("grid");
        let mut cache = DistanceMapCache::new();
        let before = cache.get_or_build(Tile::new(1, 1), &grid).clone();

        cache.invalidate_all();
        assert!(cache.is_empty());
        assert_eq!(cache.builds(), 0);

        let after = cache.get_or_build(Tile::new(1, 1), &grid);
        assert_eq!(&before, after);
        assert_eq!(cache.builds(), 1);
    }

    #[test]
    fn precompute_covers_open_tiles() {
        let grid = Grid::with_obstacles(3, 3, [Tile::new(1, 1)], []).expect("grid");
        let mut cache = DistanceMapCache::new();

        cache.precompute(&grid);

        assert_eq!(cache.len(), 8);
        assert_eq!(cache.builds(), 8);
        assert!(cache.get(Tile::new(1, 1)).is_none());
    }
}
