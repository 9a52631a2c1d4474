//! Two-phase building placement.
//!
//! A [`PlacementProbe`] tentatively blocks a tile, lets the caller run
//! reachability checks against the modified grid, and then either commits the
//! building or restores the tile when dropped.

use crystal_defence_core::{PlacementError, RemovalError, TileCoord};
use crystal_defence_system_pathfinding::Pathfinder;

use crate::{grid::Grid, tile::Tile};

/// Open placement transaction holding exclusive access to the grid.
#[derive(Debug)]
pub struct PlacementProbe<'a> {
    grid: &'a mut Grid,
    tile: TileCoord,
    was_navigable: bool,
    committed: bool,
}

impl<'a> PlacementProbe<'a> {
    /// Tentatively marks the tile as non-navigable.
    pub fn begin(grid: &'a mut Grid, tile: TileCoord) -> Result<Self, PlacementError> {
        let target = grid.tile_mut(tile).ok_or(PlacementError::OutOfBounds)?;
        if target.has_building() {
            return Err(PlacementError::Occupied);
        }
        if !target.is_buildable() {
            return Err(PlacementError::NotBuildable);
        }

        let was_navigable = target.is_navigable();
        target.set_navigable(false);
        Ok(Self {
            grid,
            tile,
            was_navigable,
            committed: false,
        })
    }

    /// Tile under evaluation.
    #[must_use]
    pub const fn tile(&self) -> TileCoord {
        self.tile
    }

    /// Grid as it would look with the tile blocked.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        self.grid
    }

    /// Reports whether every origin can still reach some destination.
    #[must_use]
    pub fn keeps_routes_open(&self, pathfinder: &Pathfinder) -> bool {
        disconnected_origins(self.grid, pathfinder).is_empty()
    }

    /// Turns the tentative block into a permanent building.
    pub fn commit(mut self) {
        if let Some(target) = self.grid.tile_mut(self.tile) {
            target.set_building(true);
            target.set_buildable(false);
        }
        self.committed = true;
    }
}

impl Drop for PlacementProbe<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        if let Some(target) = self.grid.tile_mut(self.tile) {
            target.set_navigable(self.was_navigable);
        }
    }
}

/// Origins that cannot reach any destination with the first-path search.
///
/// Levels without destinations have nothing to protect and report none.
#[must_use]
pub fn disconnected_origins(grid: &Grid, pathfinder: &Pathfinder) -> Vec<TileCoord> {
    let destinations: Vec<TileCoord> = grid.destinations().map(Tile::coord).collect();
    if destinations.is_empty() {
        return Vec::new();
    }

    grid.origins()
        .map(Tile::coord)
        .filter(|origin| {
            !destinations.iter().any(|destination| {
                pathfinder
                    .calculate_path(grid, *origin, *destination)
                    .is_some()
            })
        })
        .collect()
}

/// Evaluates a placement without keeping it.
pub fn preview(
    grid: &mut Grid,
    tile: TileCoord,
    pathfinder: &Pathfinder,
) -> Result<(), PlacementError> {
    let probe = PlacementProbe::begin(grid, tile)?;
    if probe.keeps_routes_open(pathfinder) {
        Ok(())
    } else {
        Err(PlacementError::BlocksAllRoutes)
    }
}

/// Places a building when doing so keeps every origin connected.
pub fn place(
    grid: &mut Grid,
    tile: TileCoord,
    pathfinder: &Pathfinder,
) -> Result<(), PlacementError> {
    let probe = PlacementProbe::begin(grid, tile)?;
    if !probe.keeps_routes_open(pathfinder) {
        return Err(PlacementError::BlocksAllRoutes);
    }

    probe.commit();
    Ok(())
}

/// Removes a building and reopens its tile.
pub fn remove(grid: &mut Grid, tile: TileCoord) -> Result<(), RemovalError> {
    let target = grid
        .tile_mut(tile)
        .filter(|target| target.has_building())
        .ok_or(RemovalError::NoBuilding)?;

    target.set_building(false);
    target.set_navigable(true);
    target.set_buildable(true);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crystal_defence_core::Adjacency;

    fn corridor() -> Grid {
        Grid::from_layout(["C.C", "#.#", "...", ",S,"], 1.0).expect("layout")
    }

    #[test]
    fn dropped_probe_restores_tile() {
        let mut grid = corridor();
        let tile = TileCoord::new(2, 0);
        {
            let probe = PlacementProbe::begin(&mut grid, tile).expect("buildable");
            assert!(!probe.grid().tile(tile).expect("tile").is_navigable());
        }

        let restored = grid.tile(tile).expect("tile");
        assert!(restored.is_navigable());
        assert!(!restored.has_building());
    }

    #[test]
    fn committed_probe_keeps_building() {
        let mut grid = corridor();
        let tile = TileCoord::new(2, 0);
        PlacementProbe::begin(&mut grid, tile).expect("buildable").commit();

        let placed = grid.tile(tile).expect("tile");
        assert!(placed.has_building());
        assert!(!placed.is_navigable());
        assert!(!placed.is_buildable());
    }

    #[test]
    fn blocking_the_only_corridor_is_rejected() {
        let mut grid = corridor();
        let pathfinder = Pathfinder::new(Adjacency::Cardinal);

        assert_eq!(
            place(&mut grid, TileCoord::new(1, 1), &pathfinder),
            Err(PlacementError::BlocksAllRoutes)
        );
        assert!(grid.tile(TileCoord::new(1, 1)).expect("tile").is_navigable());
    }

    #[test]
    fn side_placement_is_accepted() {
        let mut grid = corridor();
        let pathfinder = Pathfinder::new(Adjacency::Cardinal);

        assert_eq!(preview(&mut grid, TileCoord::new(2, 2), &pathfinder), Ok(()));
        assert!(!grid.tile(TileCoord::new(2, 2)).expect("tile").has_building());

        assert_eq!(place(&mut grid, TileCoord::new(2, 2), &pathfinder), Ok(()));
        assert_eq!(
            place(&mut grid, TileCoord::new(2, 2), &pathfinder),
            Err(PlacementError::Occupied)
        );
    }

    #[test]
    fn reserved_and_outside_tiles_are_rejected() {
        let mut grid = corridor();
        let pathfinder = Pathfinder::new(Adjacency::Cardinal);

        assert_eq!(
            place(&mut grid, TileCoord::new(3, 0), &pathfinder),
            Err(PlacementError::NotBuildable)
        );
        assert_eq!(
            place(&mut grid, TileCoord::new(3, 1), &pathfinder),
            Err(PlacementError::NotBuildable)
        );
        assert_eq!(
            place(&mut grid, TileCoord::new(8, 8), &pathfinder),
            Err(PlacementError::OutOfBounds)
        );
    }

    #[test]
    fn removal_reopens_tile() {
        let mut grid = corridor();
        let pathfinder = Pathfinder::new(Adjacency::Cardinal);
        place(&mut grid, TileCoord::new(2, 2), &pathfinder).expect("placement");

        assert_eq!(remove(&mut grid, TileCoord::new(2, 2)), Ok(()));
        assert!(grid.tile(TileCoord::new(2, 2)).expect("tile").is_navigable());
        assert_eq!(
            remove(&mut grid, TileCoord::new(2, 2)),
            Err(RemovalError::NoBuilding)
        );
    }

    #[test]
    fn disconnected_origins_lists_walled_spawns() {
        let grid = Grid::from_layout(["C..", "###", ".S."], 1.0).expect("layout");
        let pathfinder = Pathfinder::new(Adjacency::Cardinal);

        assert_eq!(
            disconnected_origins(&grid, &pathfinder),
            vec![TileCoord::new(2, 1)]
        );
    }
}
