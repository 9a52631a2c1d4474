#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative level state for Crystal Defence.
//!
//! The world owns the tile grid and is the only place where it mutates.
//! Adapters submit [`Command`] values through [`apply`] and observe the
//! resulting [`Event`] values; systems read the grid through [`query`].

mod generation;
mod grid;
mod layout;
pub mod placement;
mod tile;

use crystal_defence_core::{
    Adjacency, Command, Event, LevelConfig, PlacementError, TileCoord, TileKind,
};
use crystal_defence_system_pathfinding::Pathfinder;
use log::{debug, error, info, warn};

pub use generation::generate_level;
pub use grid::{Grid, GridBuilder, GridError};
pub use tile::Tile;

/// Represents the authoritative Crystal Defence level state.
#[derive(Debug)]
pub struct World {
    config: LevelConfig,
    grid: Grid,
    pathfinder: Pathfinder,
    tick_index: u64,
}

impl World {
    /// Creates a world around a freshly generated level.
    pub fn generate(config: LevelConfig) -> Result<Self, GridError> {
        let grid = generate_level(&config)?;
        Ok(Self {
            pathfinder: Pathfinder::new(config.adjacency()),
            config,
            grid,
            tick_index: 0,
        })
    }

    /// Creates a world around a prepared grid, such as one parsed from a layout.
    #[must_use]
    pub fn from_grid(grid: Grid, adjacency: Adjacency) -> Self {
        let special_tiles = grid
            .tiles()
            .filter(|tile| tile.kind() != TileKind::Default)
            .count();
        let config = LevelConfig {
            columns: grid.columns(),
            rows: grid.rows(),
            tile_size: grid.tile_size(),
            special_tiles: u32::try_from(special_tiles).unwrap_or(u32::MAX),
            diagonal_navigation: adjacency == Adjacency::WithDiagonals,
            ..LevelConfig::default()
        };
        Self {
            config,
            grid,
            pathfinder: Pathfinder::new(adjacency),
            tick_index: 0,
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::GenerateLevel { config } => match generate_level(&config) {
            Ok(grid) => {
                world.pathfinder = Pathfinder::new(config.adjacency());
                world.grid = grid;
                world.config = config;
                out_events.push(Event::LevelGenerated {
                    columns: world.grid.columns(),
                    rows: world.grid.rows(),
                });
            }
            Err(error) => error!("level generation failed, keeping current level: {error}"),
        },
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::PlaceBuilding { tile } => {
            match placement::place(&mut world.grid, tile, &world.pathfinder) {
                Ok(()) => {
                    debug!("building placed on {tile:?}");
                    out_events.push(Event::BuildingPlaced { tile });
                }
                Err(PlacementError::BlocksAllRoutes) => {
                    warn!("building on {tile:?} would cut every origin off");
                    out_events.push(Event::PlacementRejected {
                        tile,
                        reason: PlacementError::BlocksAllRoutes,
                    });
                }
                Err(reason) => {
                    info!("building placement on {tile:?} rejected: {reason:?}");
                    out_events.push(Event::PlacementRejected { tile, reason });
                }
            }
        }
        Command::RemoveBuilding { tile } => match placement::remove(&mut world.grid, tile) {
            Ok(()) => {
                debug!("building removed from {tile:?}");
                out_events.push(Event::BuildingRemoved { tile });
            }
            Err(reason) => {
                info!("building removal on {tile:?} rejected: {reason:?}");
                out_events.push(Event::RemovalRejected { tile, reason });
            }
        },
    }
}

/// Evaluates whether a building could be placed without keeping it.
///
/// The tile is blocked only for the duration of the reachability check.
pub fn preview_placement(world: &mut World, tile: TileCoord) -> Result<(), PlacementError> {
    placement::preview(&mut world.grid, tile, &world.pathfinder)
}

/// Read-only queries over the world state.
pub mod query {
    use crystal_defence_core::{LevelConfig, TileCoord};
    use crystal_defence_system_pathfinding::Pathfinder;
    use glam::Vec3;

    use super::{Grid, Tile, World};

    /// Provides read-only access to the level grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Pathfinder configured with the level's adjacency rule.
    #[must_use]
    pub fn pathfinder(world: &World) -> &Pathfinder {
        &world.pathfinder
    }

    /// Configuration that produced the current level.
    #[must_use]
    pub fn config(world: &World) -> &LevelConfig {
        &world.config
    }

    /// Tile containing the world-space position.
    #[must_use]
    pub fn tile_at(world: &World, position: Vec3) -> Option<&Tile> {
        world.grid.tile_at(position)
    }

    /// Spawn origins in row-major order.
    #[must_use]
    pub fn origins(world: &World) -> Vec<TileCoord> {
        world.grid.origins().map(Tile::coord).collect()
    }

    /// Crystal destinations in row-major order.
    #[must_use]
    pub fn destinations(world: &World) -> Vec<TileCoord> {
        world.grid.destinations().map(Tile::coord).collect()
    }

    /// Tiles currently hosting buildings.
    #[must_use]
    pub fn buildings(world: &World) -> Vec<TileCoord> {
        world.grid.buildings().map(Tile::coord).collect()
    }

    /// Number of ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}
