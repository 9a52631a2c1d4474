//! Tile matrix owned by a level and the world-space lookups built on it.

use crystal_defence_core::{Adjacency, NavigationGraph, TileCoord, TileKind, TileRole};
use glam::Vec3;
use thiserror::Error;

use crate::tile::Tile;

/// Failures raised while assembling a grid.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GridError {
    /// The grid would contain no tiles.
    #[error("grid dimensions {columns}x{rows} must both be positive")]
    InvalidDimensions {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// The tile edge length is not a positive finite number.
    #[error("tile size {0} must be positive and finite")]
    InvalidTileSize(f32),
    /// A tile was placed outside the grid.
    #[error("tile {0:?} lies outside the grid")]
    TileOutOfBounds(TileCoord),
    /// Two tiles were placed on the same cell.
    #[error("tile {0:?} was placed twice")]
    DuplicateTile(TileCoord),
    /// A cell was left empty when the grid was finalised.
    #[error("tile {0:?} was never placed")]
    MissingTile(TileCoord),
    /// A tile carries a non-finite anchor point.
    #[error("tile {0:?} has no usable anchor point")]
    InvalidAnchor(TileCoord),
    /// A layout row does not match the width of the first row.
    #[error("layout row {row} has {found} tiles, expected {expected}")]
    RaggedLayout {
        /// Offending row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// A layout glyph does not describe any tile.
    #[error("unknown glyph '{glyph}' at row {row}, column {column}")]
    UnknownGlyph {
        /// Unrecognised character.
        glyph: char,
        /// Row of the character.
        row: usize,
        /// Column of the character.
        column: usize,
    },
}

/// Square grid of tiles stored in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    columns: u32,
    rows: u32,
    tile_size: f32,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Creates a grid made entirely of default tiles.
    pub fn uniform(columns: u32, rows: u32, tile_size: f32) -> Result<Self, GridError> {
        let mut builder = GridBuilder::new(columns, rows, tile_size)?;
        builder.fill_vacant(TileKind::Default);
        builder.build()
    }

    /// Number of tile columns (grid width).
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows (grid height).
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a tile in world units.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Tile stored at the coordinate, if it lies inside the grid.
    #[must_use]
    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        coord
            .index_in(self.columns, self.rows)
            .and_then(|index| self.tiles.get(index))
    }

    pub(crate) fn tile_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        coord
            .index_in(self.columns, self.rows)
            .and_then(|index| self.tiles.get_mut(index))
    }

    /// Tile containing the world-space position.
    ///
    /// Positions left of or behind the grid, beyond its far edges, or with
    /// non-finite components resolve to `None`.
    #[must_use]
    pub fn tile_at(&self, position: Vec3) -> Option<&Tile> {
        let row = (position.z / self.tile_size).floor();
        let column = (position.x / self.tile_size).floor();
        if !row.is_finite() || !column.is_finite() || row < 0.0 || column < 0.0 {
            return None;
        }

        self.tile(TileCoord::new(row as u32, column as u32))
    }

    /// Adjacent tiles in the canonical down, up, right, left (then diagonal) order.
    pub fn neighbors<'a>(
        &'a self,
        tile: &Tile,
        adjacency: Adjacency,
    ) -> impl Iterator<Item = &'a Tile> + 'a {
        tile.coord()
            .neighbors(self.columns, self.rows, adjacency)
            .filter_map(move |coord| self.tile(coord))
    }

    /// Every tile in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Spawn tiles in row-major order.
    pub fn origins(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|tile| tile.is_origin())
    }

    /// Crystal tiles in row-major order.
    pub fn destinations(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|tile| tile.is_destination())
    }

    /// Tiles currently hosting a building.
    pub fn buildings(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|tile| tile.has_building())
    }
}

impl NavigationGraph for Grid {
    fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    fn is_navigable(&self, tile: TileCoord) -> bool {
        self.tile(tile).is_some_and(Tile::is_navigable)
    }

    fn navigation_weight(&self, tile: TileCoord) -> Option<f32> {
        self.tile(tile).map(Tile::navigation_weight)
    }

    fn tile_kind(&self, tile: TileCoord) -> Option<TileKind> {
        self.tile(tile).map(Tile::kind)
    }

    fn anchor(&self, tile: TileCoord) -> Option<Vec3> {
        self.tile(tile).map(Tile::anchor)
    }

    fn tile_at(&self, position: Vec3) -> Option<TileCoord> {
        Grid::tile_at(self, position).map(Tile::coord)
    }
}

/// Incremental grid assembly used by level generation and layout parsing.
#[derive(Debug)]
pub struct GridBuilder {
    columns: u32,
    rows: u32,
    tile_size: f32,
    slots: Vec<Option<Tile>>,
}

impl GridBuilder {
    /// Starts an empty grid. Dimensions and tile size must be positive.
    pub fn new(columns: u32, rows: u32, tile_size: f32) -> Result<Self, GridError> {
        if columns == 0 || rows == 0 {
            return Err(GridError::InvalidDimensions { columns, rows });
        }
        if !tile_size.is_finite() || tile_size <= 0.0 {
            return Err(GridError::InvalidTileSize(tile_size));
        }

        let capacity = usize::try_from(u64::from(columns) * u64::from(rows))
            .map_err(|_| GridError::InvalidDimensions { columns, rows })?;
        Ok(Self {
            columns,
            rows,
            tile_size,
            slots: vec![None; capacity],
        })
    }

    /// Number of tile columns being assembled.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows being assembled.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// World-space center of the cell on the ground plane.
    #[must_use]
    pub fn anchor_for(&self, coord: TileCoord) -> Vec3 {
        Vec3::new(
            (coord.column() as f32 + 0.5) * self.tile_size,
            0.0,
            (coord.row() as f32 + 0.5) * self.tile_size,
        )
    }

    /// Creates a tile of the given kind anchored at its cell center.
    #[must_use]
    pub fn tile(&self, coord: TileCoord, kind: TileKind) -> Tile {
        Tile::new(coord, kind, self.anchor_for(coord))
    }

    /// Reports whether the cell still awaits a tile.
    #[must_use]
    pub fn is_vacant(&self, coord: TileCoord) -> bool {
        coord
            .index_in(self.columns, self.rows)
            .and_then(|index| self.slots.get(index))
            .is_some_and(Option::is_none)
    }

    /// Places a tile into its cell.
    pub fn place(&mut self, tile: Tile) -> Result<(), GridError> {
        let coord = tile.coord();
        let index = coord
            .index_in(self.columns, self.rows)
            .ok_or(GridError::TileOutOfBounds(coord))?;
        if !tile.anchor().is_finite() {
            return Err(GridError::InvalidAnchor(coord));
        }

        let slot = &mut self.slots[index];
        if slot.is_some() {
            return Err(GridError::DuplicateTile(coord));
        }
        *slot = Some(tile);
        Ok(())
    }

    /// Fills every vacant cell with a tile of the given kind.
    pub fn fill_vacant(&mut self, kind: TileKind) {
        for row in 0..self.rows {
            for column in 0..self.columns {
                let coord = TileCoord::new(row, column);
                if self.is_vacant(coord) {
                    let tile = self.tile(coord, kind);
                    if let Some(index) = coord.index_in(self.columns, self.rows) {
                        self.slots[index] = Some(tile);
                    }
                }
            }
        }
    }

    /// Finalises the grid, failing if any cell was left empty.
    pub fn build(self) -> Result<Grid, GridError> {
        let columns = self.columns;
        let mut tiles = Vec::with_capacity(self.slots.len());
        for (index, slot) in self.slots.into_iter().enumerate() {
            match slot {
                Some(tile) => tiles.push(tile),
                None => {
                    let index = u32::try_from(index).unwrap_or(u32::MAX);
                    return Err(GridError::MissingTile(TileCoord::new(
                        index / columns,
                        index % columns,
                    )));
                }
            }
        }

        Ok(Grid {
            columns: self.columns,
            rows: self.rows,
            tile_size: self.tile_size,
            tiles,
        })
    }
}

pub(crate) fn assign_role(grid: &mut Grid, coord: TileCoord, role: TileRole) -> bool {
    let Some(tile) = grid.tile_mut(coord) else {
        return false;
    };

    tile.set_role(role);
    tile.set_buildable(false);
    if role == TileRole::Destination {
        tile.set_navigable(false);
    }
    true
}
