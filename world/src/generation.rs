//! Seeded procedural level layout.

use crystal_defence_core::{LevelConfig, TileCoord, TileKind, TileRole};
use crystal_defence_system_pathfinding::Pathfinder;
use log::{info, warn};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    grid::{assign_role, Grid, GridBuilder, GridError},
    placement::disconnected_origins,
};

/// Rows kept free of construction along the spawn and crystal edges.
const RESERVED_EDGE_ROWS: u32 = 2;

/// Generates a level from the configuration.
///
/// Obstacles and slow zones are scattered over the playfield band between
/// the reserved edge rows. Spawn origins are placed on the last row and
/// crystal destinations on row zero. The same configuration always yields
/// the same grid.
pub fn generate_level(config: &LevelConfig) -> Result<Grid, GridError> {
    let mut builder = GridBuilder::new(config.columns, config.rows, config.tile_size)?;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    let band = playfield_band(config.columns, config.rows);
    let half_grid = u64::from(config.columns) * u64::from(config.rows) / 2;
    let requested = u64::from(config.special_tiles).min(half_grid);
    let special_count = usize::try_from(requested)
        .unwrap_or(usize::MAX)
        .min(band.len());

    let kinds = TileKind::special();
    let specials: Vec<TileCoord> = band
        .choose_multiple(&mut rng, special_count)
        .copied()
        .collect();
    for coord in &specials {
        let kind = kinds[rng.gen_range(0..kinds.len())];
        let tile = builder.tile(*coord, kind);
        builder.place(tile)?;
    }

    for row in 0..config.rows {
        for column in 0..config.columns {
            let coord = TileCoord::new(row, column);
            if builder.is_vacant(coord) {
                let tile = builder
                    .tile(coord, TileKind::Default)
                    .with_buildable(!is_reserved_row(row, config.rows));
                builder.place(tile)?;
            }
        }
    }

    let mut grid = builder.build()?;
    let origins = scatter_roles(&mut grid, &mut rng, config.rows - 1, TileRole::Origin);
    let destinations = scatter_roles(&mut grid, &mut rng, 0, TileRole::Destination);

    info!(
        "generated {}x{} level: {} special tiles, {} origins, {} destinations (seed {:#x})",
        config.columns,
        config.rows,
        specials.len(),
        origins,
        destinations,
        config.seed
    );

    let pathfinder = Pathfinder::new(config.adjacency());
    for origin in disconnected_origins(&grid, &pathfinder) {
        warn!("origin {origin:?} cannot reach any destination");
    }

    Ok(grid)
}

fn playfield_band(columns: u32, rows: u32) -> Vec<TileCoord> {
    let end = rows.saturating_sub(RESERVED_EDGE_ROWS);
    (RESERVED_EDGE_ROWS..end)
        .flat_map(|row| (0..columns).map(move |column| TileCoord::new(row, column)))
        .collect()
}

fn is_reserved_row(row: u32, rows: u32) -> bool {
    row < RESERVED_EDGE_ROWS || row + RESERVED_EDGE_ROWS >= rows
}

fn role_count(columns: u32, rng: &mut ChaCha8Rng) -> usize {
    let upper = columns / 2;
    let count = if upper > 1 { rng.gen_range(1..upper) } else { 1 };
    usize::try_from(count.min(columns)).unwrap_or(1)
}

fn scatter_roles(grid: &mut Grid, rng: &mut ChaCha8Rng, row: u32, role: TileRole) -> usize {
    let count = role_count(grid.columns(), rng);
    let mut columns: Vec<u32> = (0..grid.columns()).collect();
    columns.shuffle(rng);

    let mut assigned = 0;
    for column in columns.into_iter().take(count) {
        let coord = TileCoord::new(row, column);
        if grid.tile(coord).is_some_and(|tile| tile.is_origin()) {
            continue;
        }
        if assign_role(grid, coord, role) {
            assigned += 1;
        }
    }
    assigned
}
