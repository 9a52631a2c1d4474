//! Plain-text tile layouts.
//!
//! One character per tile, one line per row, row zero first:
//!
//! | glyph | tile |
//! |-------|------|
//! | `.`   | default ground |
//! | `,`   | default ground reserved from construction |
//! | `~`   | slow zone |
//! | `#`   | obstacle |
//! | `S`   | spawn origin |
//! | `C`   | crystal destination |
//! | `B`   | ground occupied by a building |

use crystal_defence_core::{TileCoord, TileKind, TileRole};

use crate::{
    grid::{Grid, GridBuilder, GridError},
    tile::Tile,
};

impl Grid {
    /// Parses a grid from text rows. Blank lines and surrounding whitespace are ignored.
    pub fn from_layout<I, S>(lines: I, tile_size: f32) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows: Vec<Vec<char>> = lines
            .into_iter()
            .map(|line| line.as_ref().trim().chars().collect::<Vec<_>>())
            .filter(|row| !row.is_empty())
            .collect();

        let expected = rows.first().map_or(0, Vec::len);
        for (index, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(GridError::RaggedLayout {
                    row: index,
                    expected,
                    found: row.len(),
                });
            }
        }

        let columns = u32::try_from(expected).unwrap_or(u32::MAX);
        let row_count = u32::try_from(rows.len()).unwrap_or(u32::MAX);
        let mut builder = GridBuilder::new(columns, row_count, tile_size)?;

        for (row_index, row) in rows.iter().enumerate() {
            for (column_index, glyph) in row.iter().copied().enumerate() {
                let coord = TileCoord::new(row_index as u32, column_index as u32);
                let tile = tile_from_glyph(&builder, coord, glyph).ok_or(
                    GridError::UnknownGlyph {
                        glyph,
                        row: row_index,
                        column: column_index,
                    },
                )?;
                builder.place(tile)?;
            }
        }

        builder.build()
    }

    /// Renders the grid as text rows, row zero first.
    #[must_use]
    pub fn to_layout(&self) -> Vec<String> {
        (0..self.rows())
            .map(|row| {
                (0..self.columns())
                    .filter_map(|column| self.tile(TileCoord::new(row, column)))
                    .map(glyph_for)
                    .collect()
            })
            .collect()
    }
}

fn tile_from_glyph(builder: &GridBuilder, coord: TileCoord, glyph: char) -> Option<Tile> {
    let tile = match glyph {
        '.' => builder.tile(coord, TileKind::Default),
        ',' => builder
            .tile(coord, TileKind::Default)
            .with_buildable(false),
        '~' => builder.tile(coord, TileKind::SlowZone),
        '#' => builder.tile(coord, TileKind::Obstacle),
        'S' => builder
            .tile(coord, TileKind::Default)
            .with_role(TileRole::Origin)
            .with_buildable(false),
        'C' => builder
            .tile(coord, TileKind::Default)
            .with_role(TileRole::Destination)
            .with_navigable(false)
            .with_buildable(false),
        'B' => builder.tile(coord, TileKind::Default).with_building(),
        _ => return None,
    };
    Some(tile)
}

fn glyph_for(tile: &Tile) -> char {
    if tile.has_building() {
        return 'B';
    }

    match (tile.role(), tile.kind()) {
        (TileRole::Destination, _) => 'C',
        (TileRole::Origin, _) => 'S',
        (TileRole::None, TileKind::Obstacle) => '#',
        (TileRole::None, TileKind::SlowZone) => '~',
        (TileRole::None, TileKind::Default) if tile.is_buildable() => '.',
        (TileRole::None, TileKind::Default) => ',',
    }
}
