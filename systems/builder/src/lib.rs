#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure builder system responsible for emitting building placement and removal commands.

use crystal_defence_core::{Command, Event, PlacementError, TileCoord};

/// Outcome of evaluating a building on the hovered tile without committing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementPreview {
    /// Tile the preview was computed for.
    pub tile: TileCoord,
    /// Indicates whether a building may be placed there.
    pub placeable: bool,
    /// Reason the placement would be rejected, if any.
    pub reason: Option<PlacementError>,
}

impl PlacementPreview {
    /// Builds a preview from the result of a tentative placement check.
    #[must_use]
    pub fn from_check(tile: TileCoord, check: Result<(), PlacementError>) -> Self {
        Self {
            tile,
            placeable: check.is_ok(),
            reason: check.err(),
        }
    }
}

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuilderInput {
    /// Indicates whether the player confirmed a placement on this frame.
    pub confirm_action: bool,
    /// Indicates whether the player requested building removal on this frame.
    pub remove_action: bool,
    /// Tile currently hovered by the cursor.
    pub cursor_tile: Option<TileCoord>,
}

impl BuilderInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(
        confirm_action: bool,
        remove_action: bool,
        cursor_tile: Option<TileCoord>,
    ) -> Self {
        Self {
            confirm_action,
            remove_action,
            cursor_tile,
        }
    }
}

/// System that translates preview + input into placement commands.
#[derive(Clone, Debug, Default)]
pub struct Builder {
    last_rejection: Option<(TileCoord, PlacementError)>,
}

impl Builder {
    /// Creates a new builder system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_rejection: None,
        }
    }

    /// Most recent placement the world refused, kept until a placement succeeds.
    #[must_use]
    pub const fn last_rejection(&self) -> Option<(TileCoord, PlacementError)> {
        self.last_rejection
    }

    /// Consumes world events and adapter-derived input to emit builder commands.
    ///
    /// The `has_building` closure should mirror the world's grid so the
    /// system only requests removal of tiles that actually host a building.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        preview: Option<PlacementPreview>,
        input: BuilderInput,
        mut has_building: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(TileCoord) -> bool,
    {
        for event in events {
            match event {
                Event::PlacementRejected { tile, reason } => {
                    self.last_rejection = Some((*tile, *reason));
                }
                Event::BuildingPlaced { .. } | Event::LevelGenerated { .. } => {
                    self.last_rejection = None;
                }
                _ => {}
            }
        }

        if input.confirm_action {
            if let Some(preview) = preview.filter(|preview| preview.placeable) {
                out.push(Command::PlaceBuilding { tile: preview.tile });
            }
        }

        if input.remove_action {
            if let Some(tile) = input.cursor_tile.filter(|tile| has_building(*tile)) {
                out.push(Command::RemoveBuilding { tile });
            }
        }
    }
}
