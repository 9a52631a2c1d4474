#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Crystal Defence navigation engine.
//!
//! This crate defines the vocabulary that connects adapters, the authoritative
//! world, and pure systems. Adapters submit [`Command`] values describing
//! desired mutations, the world executes those commands via its `apply` entry
//! point, and then broadcasts [`Event`] values for systems to react to
//! deterministically. Systems read the tile graph exclusively through the
//! [`NavigationGraph`] trait and report agent progress as [`NavigationEvent`]
//! values.

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Seed used for level generation when no explicit seed is configured.
pub const DEFAULT_LEVEL_SEED: u64 = 0x42f0_e1eb_d4a5_3c21;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the current level with a freshly generated one.
    GenerateLevel {
        /// Parameters controlling the generated layout.
        config: LevelConfig,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests placement of a building on the provided tile.
    PlaceBuilding {
        /// Tile that would host the building.
        tile: TileCoord,
    },
    /// Requests removal of the building occupying the provided tile.
    RemoveBuilding {
        /// Tile currently hosting the building.
        tile: TileCoord,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a new level replaced the previous one.
    LevelGenerated {
        /// Number of tile columns in the new grid.
        columns: u32,
        /// Number of tile rows in the new grid.
        rows: u32,
    },
    /// Confirms that a building now occupies a tile.
    BuildingPlaced {
        /// Tile that received the building.
        tile: TileCoord,
    },
    /// Confirms that a building was removed from a tile.
    BuildingRemoved {
        /// Tile that hosted the building.
        tile: TileCoord,
    },
    /// Reports that a building placement request was rejected.
    PlacementRejected {
        /// Tile provided in the placement request.
        tile: TileCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports that a building removal request was rejected.
    RemovalRejected {
        /// Tile provided in the removal request.
        tile: TileCoord,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
}

/// Notifications emitted by navigation agents while following routes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationEvent {
    /// The agent came within stopping distance of an intermediate waypoint.
    WaypointReached {
        /// Agent that reached the waypoint.
        agent: AgentId,
        /// Tile whose anchor was reached.
        tile: TileCoord,
    },
    /// The agent consumed its whole route and stopped.
    Arrived {
        /// Agent that arrived.
        agent: AgentId,
        /// Final tile of the consumed route.
        tile: TileCoord,
    },
    /// The agent's destination is no longer reachable and its route was dropped.
    RouteLost {
        /// Agent that lost its route.
        agent: AgentId,
    },
}

/// Unique identifier assigned to a navigation agent.
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

/// Location of a single grid tile expressed as row and column indices.
///
/// Rows grow along the world `z` axis and columns along the world `x` axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    row: u32,
    column: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Row-major offset of the tile inside a grid with the given dimensions.
    #[must_use]
    pub fn index_in(self, columns: u32, rows: u32) -> Option<usize> {
        if self.column >= columns || self.row >= rows {
            return None;
        }

        let row = usize::try_from(self.row).ok()?;
        let column = usize::try_from(self.column).ok()?;
        let width = usize::try_from(columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Enumerates the adjacent tiles that exist inside a `columns` x `rows` grid.
    ///
    /// The order is fixed: down, up, right, left, followed by down-right,
    /// down-left, up-right and up-left when diagonals are enabled. Search
    /// tie-breaking depends on it.
    #[must_use]
    pub fn neighbors(self, columns: u32, rows: u32, adjacency: Adjacency) -> Neighbors {
        let mut neighbors = Neighbors::default();
        if self.column >= columns || self.row >= rows {
            return neighbors;
        }

        let down = self.row.checked_sub(1);
        let up = self.row.checked_add(1).filter(|row| *row < rows);
        let right = self.column.checked_add(1).filter(|column| *column < columns);
        let left = self.column.checked_sub(1);

        if let Some(row) = down {
            neighbors.push(TileCoord::new(row, self.column));
        }
        if let Some(row) = up {
            neighbors.push(TileCoord::new(row, self.column));
        }
        if let Some(column) = right {
            neighbors.push(TileCoord::new(self.row, column));
        }
        if let Some(column) = left {
            neighbors.push(TileCoord::new(self.row, column));
        }

        if adjacency == Adjacency::WithDiagonals {
            for (row, column) in [(down, right), (down, left), (up, right), (up, left)] {
                if let (Some(row), Some(column)) = (row, column) {
                    neighbors.push(TileCoord::new(row, column));
                }
            }
        }

        neighbors
    }
}

/// Connectivity rule applied when enumerating tile neighbors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Adjacency {
    /// Four orthogonal neighbors.
    #[default]
    Cardinal,
    /// Four orthogonal neighbors followed by the four diagonal ones.
    WithDiagonals,
}

impl Adjacency {
    /// Selects the adjacency matching a "navigate diagonals" toggle.
    #[must_use]
    pub const fn from_diagonal_flag(diagonals: bool) -> Self {
        if diagonals {
            Self::WithDiagonals
        } else {
            Self::Cardinal
        }
    }
}

/// Fixed-capacity iterator over the neighbors of a tile.
#[derive(Clone, Debug, Default)]
pub struct Neighbors {
    buffer: [Option<TileCoord>; 8],
    len: usize,
    cursor: usize,
}

impl Neighbors {
    fn push(&mut self, tile: TileCoord) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = Some(tile);
            self.len += 1;
        }
    }
}

impl Iterator for Neighbors {
    type Item = TileCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.cursor;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Neighbors {}

/// Terrain variety of a tile. Determines its base navigation weight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Plain ground.
    #[default]
    Default,
    /// Impassable terrain. Never navigable.
    Obstacle,
    /// Ground that costs more to cross.
    SlowZone,
}

impl TileKind {
    /// Weight charged for entering a tile of this kind.
    #[must_use]
    pub const fn base_weight(self) -> f32 {
        match self {
            Self::Default => 1.0,
            Self::SlowZone => 2.0,
            Self::Obstacle => f32::INFINITY,
        }
    }

    /// Kinds that level generation scatters across the playfield.
    #[must_use]
    pub const fn special() -> [TileKind; 2] {
        [Self::Obstacle, Self::SlowZone]
    }
}

/// Gameplay role attached to a tile. Origin and destination are exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileRole {
    /// Ordinary tile.
    #[default]
    None,
    /// Spawn point where agents enter the level.
    Origin,
    /// Crystal tile that agents try to reach.
    Destination,
}

/// Read-only view of the navigation graph formed by a tile grid.
///
/// Systems never touch the world's tile storage directly; they query it
/// through this trait so searches and agents stay decoupled from the owner.
pub trait NavigationGraph {
    /// Grid dimensions as `(columns, rows)`.
    fn dimensions(&self) -> (u32, u32);

    /// Whether an agent may move through the tile.
    fn is_navigable(&self, tile: TileCoord) -> bool;

    /// Cost of entering the tile, if it exists.
    fn navigation_weight(&self, tile: TileCoord) -> Option<f32>;

    /// Terrain kind of the tile, if it exists.
    fn tile_kind(&self, tile: TileCoord) -> Option<TileKind>;

    /// World-space waypoint of the tile, if it exists.
    fn anchor(&self, tile: TileCoord) -> Option<Vec3>;

    /// Tile containing the provided world-space position.
    fn tile_at(&self, position: Vec3) -> Option<TileCoord>;

    /// Reports whether the tile lies inside the grid.
    fn contains(&self, tile: TileCoord) -> bool {
        let (columns, rows) = self.dimensions();
        tile.column() < columns && tile.row() < rows
    }

    /// Adjacent in-bounds tiles in the canonical order.
    fn adjacent_tiles(&self, tile: TileCoord, adjacency: Adjacency) -> Neighbors {
        let (columns, rows) = self.dimensions();
        tile.neighbors(columns, rows, adjacency)
    }
}

/// Ordered sequence of tiles produced by a search.
///
/// Tiles are stored from the destination back to the origin, both inclusive.
/// A route always contains at least one tile; "no path" is expressed by the
/// absence of a route.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Route {
    tiles: Vec<TileCoord>,
}

impl Route {
    /// Wraps a destination-first tile sequence. Returns `None` when empty.
    #[must_use]
    pub fn from_destination_first(tiles: Vec<TileCoord>) -> Option<Self> {
        if tiles.is_empty() {
            None
        } else {
            Some(Self { tiles })
        }
    }

    /// Tiles from destination to origin.
    #[must_use]
    pub fn tiles(&self) -> &[TileCoord] {
        &self.tiles
    }

    /// Number of tiles, endpoints included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Always false; present for API symmetry with collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Final tile of the route.
    #[must_use]
    pub fn destination(&self) -> TileCoord {
        self.tiles[0]
    }

    /// Starting tile of the route.
    #[must_use]
    pub fn origin(&self) -> TileCoord {
        self.tiles[self.tiles.len() - 1]
    }

    /// Reports whether the route passes through the tile.
    #[must_use]
    pub fn contains(&self, tile: TileCoord) -> bool {
        self.tiles.contains(&tile)
    }

    /// Tiles to visit in travel order, excluding the origin the agent already occupies.
    pub fn waypoints(&self) -> impl DoubleEndedIterator<Item = TileCoord> + '_ {
        self.tiles.iter().rev().skip(1).copied()
    }

    /// Total weight of the entered tiles. The origin's own weight is not charged.
    #[must_use]
    pub fn cost<G>(&self, graph: &G) -> f32
    where
        G: NavigationGraph + ?Sized,
    {
        self.waypoints()
            .map(|tile| graph.navigation_weight(tile).unwrap_or(f32::INFINITY))
            .sum()
    }
}

/// Parameters controlling level generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// Side length of a square tile in world units.
    pub tile_size: f32,
    /// Requested amount of obstacle and slow tiles. Capped at half the grid.
    pub special_tiles: u32,
    /// Seed driving every random choice made during generation.
    pub seed: u64,
    /// Enables eight-way adjacency for path searches.
    pub diagonal_navigation: bool,
}

impl LevelConfig {
    /// Adjacency rule implied by the diagonal navigation toggle.
    #[must_use]
    pub const fn adjacency(&self) -> Adjacency {
        Adjacency::from_diagonal_flag(self.diagonal_navigation)
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            columns: 20,
            rows: 20,
            tile_size: 1.0,
            special_tiles: 100,
            seed: DEFAULT_LEVEL_SEED,
            diagonal_navigation: false,
        }
    }
}

/// Reasons a building placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The tile lies outside the configured grid.
    OutOfBounds,
    /// The tile does not allow construction.
    NotBuildable,
    /// A building already occupies the tile.
    Occupied,
    /// Blocking the tile would cut every origin off from the destinations.
    BlocksAllRoutes,
}

/// Reasons a building removal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalError {
    /// No building occupies the tile.
    NoBuilding,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn cardinal_neighbors_follow_fixed_order() {
        let neighbors: Vec<_> = TileCoord::new(2, 2)
            .neighbors(5, 5, Adjacency::Cardinal)
            .collect();
        assert_eq!(
            neighbors,
            vec![
                TileCoord::new(1, 2),
                TileCoord::new(3, 2),
                TileCoord::new(2, 3),
                TileCoord::new(2, 1),
            ]
        );
    }

    #[test]
    fn diagonal_neighbors_follow_cardinal_ones() {
        let neighbors: Vec<_> = TileCoord::new(2, 2)
            .neighbors(5, 5, Adjacency::WithDiagonals)
            .collect();
        assert_eq!(neighbors.len(), 8);
        assert_eq!(
            &neighbors[4..],
            &[
                TileCoord::new(1, 3),
                TileCoord::new(1, 1),
                TileCoord::new(3, 3),
                TileCoord::new(3, 1),
            ]
        );
    }

    #[test]
    fn corner_tile_has_clipped_neighborhood() {
        let cardinal: Vec<_> = TileCoord::new(0, 0)
            .neighbors(3, 3, Adjacency::Cardinal)
            .collect();
        assert_eq!(cardinal, vec![TileCoord::new(1, 0), TileCoord::new(0, 1)]);

        let diagonal = TileCoord::new(0, 0).neighbors(3, 3, Adjacency::WithDiagonals);
        assert_eq!(diagonal.len(), 3);
    }

    #[test]
    fn out_of_bounds_tile_has_no_neighbors() {
        assert_eq!(
            TileCoord::new(7, 1)
                .neighbors(3, 3, Adjacency::WithDiagonals)
                .count(),
            0
        );
    }

    #[test]
    fn route_waypoints_skip_origin_and_run_forward() {
        let route = Route::from_destination_first(vec![
            TileCoord::new(2, 0),
            TileCoord::new(1, 0),
            TileCoord::new(0, 0),
        ])
        .expect("non-empty route");

        assert_eq!(route.destination(), TileCoord::new(2, 0));
        assert_eq!(route.origin(), TileCoord::new(0, 0));
        assert_eq!(
            route.waypoints().collect::<Vec<_>>(),
            vec![TileCoord::new(1, 0), TileCoord::new(2, 0)]
        );
    }

    #[test]
    fn empty_route_is_unrepresentable() {
        assert!(Route::from_destination_first(Vec::new()).is_none());
    }

    #[test]
    fn index_in_is_row_major() {
        assert_eq!(TileCoord::new(2, 3).index_in(4, 5), Some(11));
        assert_eq!(TileCoord::new(5, 0).index_in(4, 5), None);
    }

    #[test]
    fn obstacle_weight_is_unbounded() {
        assert!(TileKind::Obstacle.base_weight().is_infinite());
        assert!(TileKind::SlowZone.base_weight() > TileKind::Default.base_weight());
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn level_config_round_trips_through_bincode() {
        assert_round_trip(&LevelConfig {
            columns: 12,
            rows: 9,
            seed: 7,
            diagonal_navigation: true,
            ..LevelConfig::default()
        });
    }

    proptest! {
        #[test]
        fn neighbors_stay_in_bounds_and_exclude_self(
            columns in 1u32..12,
            rows in 1u32..12,
            row in 0u32..12,
            column in 0u32..12,
            diagonals in any::<bool>(),
        ) {
            prop_assume!(row < rows && column < columns);
            let tile = TileCoord::new(row, column);
            let adjacency = Adjacency::from_diagonal_flag(diagonals);
            for neighbor in tile.neighbors(columns, rows, adjacency) {
                prop_assert!(neighbor.row() < rows);
                prop_assert!(neighbor.column() < columns);
                prop_assert_ne!(neighbor, tile);
                prop_assert!(neighbor.row().abs_diff(row) <= 1);
                prop_assert!(neighbor.column().abs_diff(column) <= 1);
            }
        }
    }
}
