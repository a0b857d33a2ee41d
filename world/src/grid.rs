//! Static tile grid rebuilt from map metadata on every map load.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tile_skirmish_core::{Occluders, Tile};

/// Provider of the static per-tile metadata of the active map.
pub trait MapSource {
    /// Number of tile columns.
    fn width(&self) -> u32;

    /// Number of tile rows.
    fn height(&self) -> u32;

    /// Terrain tag painted on the tile.
    fn terrain_tag(&self, tile: Tile) -> u32;

    /// Region identifier painted on the tile.
    fn region_id(&self, tile: Tile) -> u32;

    /// Reports whether walkers may enter the tile.
    fn is_passable(&self, tile: Tile) -> bool;
}

/// Tag values that mark a tile as a line-of-sight occluder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileTags {
    /// Region identifier that blocks sight.
    pub blocking_region: u32,
    /// Terrain tag that blocks sight.
    pub blocking_terrain: u32,
}

impl Default for TileTags {
    fn default() -> Self {
        Self {
            blocking_region: 13,
            blocking_terrain: 1,
        }
    }
}

/// Reasons a map cannot be turned into a grid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    /// The map has no tiles at all.
    #[error("map has zero area ({width}x{height})")]
    Empty {
        /// Reported width.
        width: u32,
        /// Reported height.
        height: u32,
    },
    /// The tile count does not fit into addressable memory.
    #[error("map of {width}x{height} tiles is too large")]
    TooLarge {
        /// Reported width.
        width: u32,
        /// Reported height.
        height: u32,
    },
    /// A text map row differs in length from the first row.
    #[error("row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: u32,
        /// Length of the first row.
        expected: u32,
        /// Length of the offending row.
        found: u32,
    },
    /// A text map contains a character with no tile meaning.
    #[error("unknown glyph {glyph:?} at ({x}, {y})")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Column of the character.
        x: u32,
        /// Row of the character.
        y: u32,
    },
}

/// Walkability and sight information for every tile of the active map.
#[derive(Clone, Debug, Default)]
pub struct Grid {
    width: u32,
    height: u32,
    blocked: Vec<bool>,
    occluders: Occluders,
}

impl Grid {
    /// Scans the map source once and captures blocked and occluding tiles.
    pub fn from_source(source: &impl MapSource, tags: TileTags) -> Result<Self, MapError> {
        let width = source.width();
        let height = source.height();
        let mut blocked = Vec::new();
        let mut occluders = Vec::new();

        for y in 0..height {
            for x in 0..width {
                let tile = Tile::new(x, y);
                if !source.is_passable(tile) {
                    blocked.push(tile);
                }
                if source.terrain_tag(tile) == tags.blocking_terrain
                    || source.region_id(tile) == tags.blocking_region
                {
                    occluders.push(tile);
                }
            }
        }

        Self::with_obstacles(width, height, blocked, occluders)
    }

    /// Builds a grid from explicit obstacle lists.
    ///
    /// Tiles outside the bounds are ignored.
    pub fn with_obstacles(
        width: u32,
        height: u32,
        blocked: impl IntoIterator<Item = Tile>,
        occluders: impl IntoIterator<Item = Tile>,
    ) -> Result<Self, MapError> {
        if width == 0 || height == 0 {
            return Err(MapError::Empty { width, height });
        }

        let cell_count = usize::try_from(width)
            .ok()
            .zip(usize::try_from(height).ok())
            .and_then(|(columns, rows)| columns.checked_mul(rows))
            .ok_or(MapError::TooLarge { width, height })?;

        let mut grid = Self {
            width,
            height,
            blocked: vec![false; cell_count],
            occluders: Occluders::default(),
        };

        for tile in blocked {
            if let Some(index) = grid.index(tile) {
                grid.blocked[index] = true;
            }
        }

        grid.occluders =
            Occluders::from_tiles(occluders.into_iter().filter(|tile| grid.in_bounds(*tile)));
        Ok(grid)
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the tile lies inside the grid.
    #[must_use]
    pub const fn in_bounds(&self, tile: Tile) -> bool {
        tile.x() < self.width && tile.y() < self.height
    }

    /// Reports whether walkers cannot enter the tile.
    ///
    /// Every out-of-bounds tile counts as blocked.
    #[must_use]
    pub fn is_blocked(&self, tile: Tile) -> bool {
        self.index(tile)
            .and_then(|index| self.blocked.get(index).copied())
            .unwrap_or(true)
    }

    /// Tiles that block line of sight, in scan order.
    #[must_use]
    pub fn occluders(&self) -> &Occluders {
        &self.occluders
    }

    /// Number of tiles in the grid.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.blocked.len()
    }

    /// Iterator over every in-bounds tile that is not blocked, row by row.
    pub fn open_tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| Tile::new(x, y)))
            .filter(move |tile| !self.is_blocked(*tile))
    }

    pub(crate) fn index(&self, tile: Tile) -> Option<usize> {
        tile.row_major_index(self.width, self.height)
    }
}

/// Map source parsed from rows of glyphs.
///
/// `.` is open floor, `#` is a wall that blocks movement and sight, `~` blocks
/// sight only and `o` blocks movement only.
#[derive(Clone, Debug)]
pub struct TextMap {
    width: u32,
    height: u32,
    glyphs: Vec<char>,
    tags: TileTags,
}

impl TextMap {
    /// Parses the rows, painting sight blockers with the provided tags.
    pub fn parse<S: AsRef<str>>(rows: &[S], tags: TileTags) -> Result<Self, MapError> {
        let height = u32::try_from(rows.len()).map_err(|_| MapError::TooLarge {
            width: 0,
            height: u32::MAX,
        })?;
        let mut width = None;
        let mut glyphs = Vec::new();

        for (y, row) in (0..height).zip(rows) {
            let mut found = 0u32;
            for glyph in row.as_ref().chars() {
                if !matches!(glyph, '.' | '#' | '~' | 'o') {
                    return Err(MapError::UnknownGlyph { glyph, x: found, y });
                }
                glyphs.push(glyph);
                found = found.saturating_add(1);
            }

            let expected = *width.get_or_insert(found);
            if expected != found {
                return Err(MapError::RaggedRow {
                    row: y,
                    expected,
                    found,
                });
            }
        }

        Ok(Self {
            width: width.unwrap_or(0),
            height,
            glyphs,
            tags,
        })
    }

    fn glyph(&self, tile: Tile) -> char {
        if tile.x() >= self.width || tile.y() >= self.height {
            return '#';
        }
        let index = usize::try_from(u64::from(tile.y()) * u64::from(self.width) + u64::from(tile.x()))
            .unwrap_or(usize::MAX);
        self.glyphs.get(index).copied().unwrap_or('#')
    }
}

impl MapSource for TextMap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn terrain_tag(&self, tile: Tile) -> u32 {
        if self.glyph(tile) == '~' {
            self.tags.blocking_terrain
        } else {
            0
        }
    }

    fn region_id(&self, tile: Tile) -> u32 {
        if self.glyph(tile) == '#' {
            self.tags.blocking_region
        } else {
            0
        }
    }

    fn is_passable(&self, tile: Tile) -> bool {
        matches!(self.glyph(tile), '.' | '~')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_tiles_are_blocked() {
        let grid = Grid::with_obstacles(3, 2, [], []).expect("grid");
        assert!(!grid.is_blocked(Tile::new(2, 1)));
        assert!(grid.is_blocked(Tile::new(3, 0)));
        assert!(grid.is_blocked(Tile::new(0, 2)));
        assert!(!grid.in_bounds(Tile::new(3, 0)));
    }

    #[test]
    fn zero_area_is_rejected() {
        assert_eq!(
            Grid::with_obstacles(0, 4, [], []).unwrap_err(),
            MapError::Empty {
                width: 0,
                height: 4
            }
        );
    }

    #[test]
    fn text_map_marks_walls_and_sight_blockers() {
        let map = TextMap::parse(&[".#~", "o.."], TileTags::default()).expect("map");
        let grid = Grid::from_source(&map, TileTags::default()).expect("grid");

        assert!(grid.is_blocked(Tile::new(1, 0)));
        assert!(!grid.is_blocked(Tile::new(2, 0)));
        assert!(grid.is_blocked(Tile::new(0, 1)));
        assert_eq!(
            grid.occluders().iter().collect::<Vec<_>>(),
            vec![Tile::new(1, 0), Tile::new(2, 0)]
        );
        assert_eq!(grid.open_tiles().count(), 4);
    }

    #[test]
    fn custom_tags_change_occluders() {
        let tags = TileTags {
            blocking_region: 7,
            blocking_terrain: 3,
        };
        let map = TextMap::parse(&["#~"], tags).expect("map");

        let matching = Grid::from_source(&map, tags).expect("grid");
        assert_eq!(matching.occluders().len(), 2);

        let mismatched = Grid::from_source(&map, TileTags::default()).expect("grid");
        assert!(mismatched.occluders().is_empty());
    }

    #[test]
    fn text_map_rejects_malformed_rows() {
        assert_eq!(
            TextMap::parse(&["...", ".."], TileTags::default()).unwrap_err(),
            MapError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            }
        );
        assert_eq!(
            TextMap::parse(&["..x"], TileTags::default()).unwrap_err(),
            MapError::UnknownGlyph {
                glyph: 'x',
                x: 2,
                y: 0
            }
        );
    }
}
