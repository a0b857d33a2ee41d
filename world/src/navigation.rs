//! Breadth-first distance maps rooted at a single target tile.

use std::collections::VecDeque;

use tile_skirmish_core::{Direction, Tile};

use crate::grid::Grid;

const UNREACHABLE: u32 = u32::MAX;

/// Dense step-distance grid seeded from one target tile.
///
/// The map mirrors the grid dimensions it was built from and stores the
/// breadth-first search results that drive pursuit. Unreachable tiles report
/// `None`. Maps never change after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistanceMap {
    root: Tile,
    width: u32,
    height: u32,
    distances: Vec<u32>,
}

impl DistanceMap {
    /// Step distance from `tile` to the root, if the root is reachable.
    #[must_use]
    pub fn distance(&self, tile: Tile) -> Option<u32> {
        if tile == self.root {
            return Some(0);
        }

        let index = tile.row_major_index(self.width, self.height)?;
        self.distances
            .get(index)
            .copied()
            .filter(|distance| *distance != UNREACHABLE)
    }

    /// Number of tiles with a known distance, the root included.
    #[must_use]
    pub fn reachable_count(&self) -> usize {
        let seeded = self
            .distances
            .iter()
            .filter(|distance| **distance != UNREACHABLE)
            .count();
        if self.root.row_major_index(self.width, self.height).is_some() {
            seeded
        } else {
            seeded + 1
        }
    }

    /// Iterator over every tile with a known distance, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (Tile, u32)> + '_ {
        let width = self.width;
        (0..self.height)
            .flat_map(move |y| (0..width).map(move |x| Tile::new(x, y)))
            .filter_map(move |tile| self.distance(tile).map(|distance| (tile, distance)))
    }
}

/// Computes shortest 4-connected step distances from every reachable tile to `target`.
///
/// The target is always seeded with distance zero, even when the grid marks it
/// blocked. Out-of-bounds targets produce a map holding only the target.
#[must_use]
pub fn build_distance_map(target: Tile, grid: &Grid) -> DistanceMap {
    let width = grid.width();
    let height = grid.height();
    let mut distances = vec![UNREACHABLE; grid.tile_count()];
    let mut queue = VecDeque::new();

    if let Some(root_index) = grid.index(target) {
        distances[root_index] = 0;
        queue.push_back(target);
    }

    while let Some(tile) = queue.pop_front() {
        let Some(current_index) = grid.index(tile) else {
            continue;
        };
        let next_distance = distances[current_index].saturating_add(1);

        for neighbor in neighbors(tile) {
            if grid.is_blocked(neighbor) {
                continue;
            }

            let Some(neighbor_index) = grid.index(neighbor) else {
                continue;
            };

            if distances[neighbor_index] != UNREACHABLE {
                continue;
            }

            distances[neighbor_index] = next_distance;
            queue.push_back(neighbor);
        }
    }

    DistanceMap {
        root: target,
        width,
        height,
        distances,
    }
}

fn neighbors(tile: Tile) -> impl Iterator<Item = Tile> {
    [
        Direction::East,
        Direction::West,
        Direction::South,
        Direction::North,
    ]
    .into_iter()
    .filter_map(move |direction| tile.step(direction))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_has_zero_distance() {
        let grid = Grid::with_obstacles(3, 4, [], []).expect("grid");
        let map = build_distance_map(Tile::new(1, 2), &grid);

        assert_eq!(map.distance(Tile::new(1, 2)), Some(0));
        assert_eq!(map.distance(Tile::new(1, 1)), Some(1));
        assert_eq!(map.distance(Tile::new(1, 0)), Some(2));
        assert_eq!(map.distance(Tile::new(0, 0)), Some(3));
        assert_eq!(map.reachable_count(), 12);
    }

    #[test]
    fn walls_force_detours() {
        let wall = Tile::new(1, 1);
        let grid = Grid::with_obstacles(3, 4, [wall], []).expect("grid");
        let map = build_distance_map(Tile::new(1, 2), &grid);

        assert_eq!(map.distance(wall), None);
        assert_eq!(map.distance(Tile::new(1, 0)), Some(4));
        assert_eq!(map.distance(Tile::new(0, 1)), Some(2));
    }

    #[test]
    fn sealed_pocket_stays_unreachable() {
        let grid = Grid::with_obstacles(
            4,
            1,
            [Tile::new(2, 0)],
            [],
        )
        .expect("grid");
        let map = build_distance_map(Tile::new(0, 0), &grid);

        assert_eq!(map.distance(Tile::new(1, 0)), Some(1));
        assert_eq!(map.distance(Tile::new(3, 0)), None);
        assert_eq!(map.reachable_count(), 2);
    }

    #[test]
    fn blocked_target_is_still_seeded() {
        let target = Tile::new(1, 0);
        let grid = Grid::with_obstacles(3, 1, [target], []).expect("grid");
        let map = build_distance_map(target, &grid);

        assert_eq!(map.distance(target), Some(0));
        assert_eq!(map.distance(Tile::new(0, 0)), Some(1));
        assert_eq!(map.distance(Tile::new(2, 0)), Some(1));
    }

    #[test]
    fn boxed_in_target_maps_only_itself() {
        let target = Tile::new(1, 1);
        let ring = [
            Tile::new(1, 0),
            Tile::new(0, 1),
            Tile::new(2, 1),
            Tile::new(1, 2),
        ];
        let grid = Grid::with_obstacles(3, 3, ring, []).expect("grid");
        let map = build_distance_map(target, &grid);

        assert_eq!(map.iter().collect::<Vec<_>>(), vec![(target, 0)]);
    }

    #[test]
    fn out_of_bounds_target_maps_only_itself() {
        let grid = Grid::with_obstacles(2, 2, [], []).expect("grid");
        let target = Tile::new(5, 5);
        let map = build_distance_map(target, &grid);

        assert_eq!(map.distance(target), Some(0));
        assert_eq!(map.distance(Tile::new(1, 1)), None);
        assert_eq!(map.reachable_count(), 1);
    }

    #[test]
    fn distances_match_exhaustive_relaxation() {
        let walls = [
            Tile::new(1, 0),
            Tile::new(1, 1),
            Tile::new(1, 2),
            Tile::new(1, 3),
            Tile::new(3, 1),
            Tile::new(3, 2),
            Tile::new(3, 3),
            Tile::new(3, 4),
        ];
        let grid = Grid::with_obstacles(5, 5, walls, []).expect("grid");
        let target = Tile::new(4, 0);
        let map = build_distance_map(target, &grid);

        let mut expected = vec![vec![None; 5]; 5];
        expected[0][4] = Some(0u32);
        loop {
            let mut changed = false;
            for tile in grid.open_tiles() {
                let best = neighbors(tile)
                    .filter(|neighbor| grid.in_bounds(*neighbor))
                    .filter_map(|neighbor| expected[neighbor.y() as usize][neighbor.x() as usize])
                    .min()
                    .map(|distance| distance + 1);
                let slot = &mut expected[tile.y() as usize][tile.x() as usize];
                if let Some(best) = best {
                    if slot.map_or(true, |current| best < current) {
                        *slot = Some(best);
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        for tile in grid.open_tiles() {
            assert_eq!(
                map.distance(tile),
                expected[tile.y() as usize][tile.x() as usize],
                "mismatch at {tile:?}"
            );
        }
        assert_eq!(map.distance(Tile::new(0, 0)), Some(12));
    }
}
