//! Single-line level strings for sharing layouts between runs.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use crystal_defence_world::{Grid, GridError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SNAPSHOT_DOMAIN: &str = "level";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "level:v1";
const FIELD_DELIMITER: char = ':';

/// Snapshot of a level's tiles and dimensions.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LevelSnapshot {
    pub(crate) columns: u32,
    pub(crate) rows: u32,
    pub(crate) tile_size: f32,
    /// Glyph rows, row zero first.
    pub(crate) layout: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct SerializableSnapshot {
    tile_size: f32,
    rows: Vec<String>,
}

/// Errors that can occur while decoding layout transfer strings.
#[derive(Debug, Error)]
pub(crate) enum LayoutError {
    #[error("layout string was empty")]
    EmptyPayload,
    #[error("layout string is missing the {0}")]
    MissingField(&'static str),
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    #[error("layout declares {declared} but its rows describe {found}")]
    DimensionMismatch { declared: String, found: String },
    #[error("could not decode layout payload: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    #[error("could not parse layout payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error("layout does not describe a valid grid: {0}")]
    InvalidGrid(#[from] GridError),
}

impl LevelSnapshot {
    /// Captures the current tiles of a grid.
    pub(crate) fn capture(grid: &Grid) -> Self {
        Self {
            columns: grid.columns(),
            rows: grid.rows(),
            tile_size: grid.tile_size(),
            layout: grid.to_layout(),
        }
    }

    /// Encodes the snapshot into a single-line string.
    pub(crate) fn encode(&self) -> Result<String, LayoutError> {
        let payload = SerializableSnapshot {
            tile_size: self.tile_size,
            rows: self.layout.clone(),
        };
        let json = serde_json::to_vec(&payload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{SNAPSHOT_HEADER}:{}x{}:{encoded}",
            self.columns, self.rows
        ))
    }

    /// Decodes a snapshot and checks that its rows match the declared dimensions.
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LayoutError::MissingField("prefix"))?;
        let version = parts.next().ok_or(LayoutError::MissingField("version"))?;
        let dimensions = parts
            .next()
            .ok_or(LayoutError::MissingField("grid dimensions"))?;
        let payload = parts.next().ok_or(LayoutError::MissingField("payload"))?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(LayoutError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(LayoutError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD.decode(payload.as_bytes())?;
        let decoded: SerializableSnapshot = serde_json::from_slice(&bytes)?;

        let found_rows = decoded.rows.len();
        let found_columns = decoded.rows.first().map_or(0, |row| row.chars().count());
        if found_rows != rows as usize || found_columns != columns as usize {
            return Err(LayoutError::DimensionMismatch {
                declared: format!("{columns}x{rows}"),
                found: format!("{found_columns}x{found_rows}"),
            });
        }

        Ok(Self {
            columns,
            rows,
            tile_size: decoded.tile_size,
            layout: decoded.rows,
        })
    }

    /// Rebuilds the grid described by the snapshot.
    pub(crate) fn to_grid(&self) -> Result<Grid, LayoutError> {
        Ok(Grid::from_layout(&self.layout, self.tile_size)?)
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LayoutError> {
    let invalid = || LayoutError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;

    if columns == 0 || rows == 0 {
        return Err(invalid());
    }

    Ok((columns, rows))
}
