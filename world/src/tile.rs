//! Single cell of the navigation grid.

use crystal_defence_core::{TileCoord, TileKind, TileRole};
use glam::Vec3;

/// Node of the navigation graph.
///
/// Coordinates are fixed once the tile is placed into a grid. The flags are
/// flipped by level generation and building placement.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    coord: TileCoord,
    kind: TileKind,
    navigation_weight: f32,
    navigable: bool,
    buildable: bool,
    role: TileRole,
    building: bool,
    anchor: Vec3,
}

impl Tile {
    /// Creates a tile whose weight and flags derive from its kind.
    ///
    /// Obstacles start non-navigable and non-buildable; every other kind starts
    /// open for both movement and construction.
    #[must_use]
    pub fn new(coord: TileCoord, kind: TileKind, anchor: Vec3) -> Self {
        let open = kind != TileKind::Obstacle;
        Self {
            coord,
            kind,
            navigation_weight: kind.base_weight(),
            navigable: open,
            buildable: open,
            role: TileRole::None,
            building: false,
            anchor,
        }
    }

    /// Returns the tile with the provided gameplay role.
    #[must_use]
    pub fn with_role(mut self, role: TileRole) -> Self {
        self.role = role;
        self
    }

    /// Returns the tile with the provided navigability flag.
    #[must_use]
    pub fn with_navigable(mut self, navigable: bool) -> Self {
        self.navigable = navigable;
        self
    }

    /// Returns the tile with the provided buildability flag.
    #[must_use]
    pub fn with_buildable(mut self, buildable: bool) -> Self {
        self.buildable = buildable;
        self
    }

    /// Returns the tile with an explicit traversal cost. Negative values clamp to zero.
    #[must_use]
    pub fn with_navigation_weight(mut self, weight: f32) -> Self {
        self.navigation_weight = weight.max(0.0);
        self
    }

    /// Returns the tile marked as hosting a building.
    #[must_use]
    pub fn with_building(mut self) -> Self {
        self.building = true;
        self.navigable = false;
        self.buildable = false;
        self
    }

    /// Grid coordinate of the tile.
    #[must_use]
    pub const fn coord(&self) -> TileCoord {
        self.coord
    }

    /// Terrain kind of the tile.
    #[must_use]
    pub const fn kind(&self) -> TileKind {
        self.kind
    }

    /// Cost charged for entering the tile.
    #[must_use]
    pub const fn navigation_weight(&self) -> f32 {
        self.navigation_weight
    }

    /// Whether agents may move through the tile. Obstacles never are.
    #[must_use]
    pub fn is_navigable(&self) -> bool {
        self.navigable && self.kind != TileKind::Obstacle
    }

    /// Whether a building may be placed on the tile.
    #[must_use]
    pub const fn is_buildable(&self) -> bool {
        self.buildable
    }

    /// Gameplay role of the tile.
    #[must_use]
    pub const fn role(&self) -> TileRole {
        self.role
    }

    /// Whether the tile is a spawn origin.
    #[must_use]
    pub fn is_origin(&self) -> bool {
        self.role == TileRole::Origin
    }

    /// Whether the tile is a crystal destination.
    #[must_use]
    pub fn is_destination(&self) -> bool {
        self.role == TileRole::Destination
    }

    /// Whether a building currently occupies the tile.
    #[must_use]
    pub const fn has_building(&self) -> bool {
        self.building
    }

    /// World-space waypoint used to align visuals and steer agents.
    #[must_use]
    pub const fn anchor(&self) -> Vec3 {
        self.anchor
    }

    pub(crate) fn set_navigable(&mut self, navigable: bool) {
        self.navigable = navigable;
    }

    pub(crate) fn set_buildable(&mut self, buildable: bool) {
        self.buildable = buildable;
    }

    pub(crate) fn set_role(&mut self, role: TileRole) {
        self.role = role;
    }

    pub(crate) fn set_building(&mut self, building: bool) {
        self.building = building;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obstacle_is_never_navigable() {
        let tile =
            Tile::new(TileCoord::new(0, 0), TileKind::Obstacle, Vec3::ZERO).with_navigable(true);
        assert!(!tile.is_navigable());
    }

    #[test]
    fn slow_zone_inherits_heavier_weight() {
        let tile = Tile::new(TileCoord::new(1, 1), TileKind::SlowZone, Vec3::ZERO);
        assert!(tile.is_navigable());
        assert!(tile.navigation_weight() > 1.0);
    }

    #[test]
    fn building_closes_tile() {
        let tile = Tile::new(TileCoord::new(1, 1), TileKind::Default, Vec3::ZERO).with_building();
        assert!(tile.has_building());
        assert!(!tile.is_navigable());
        assert!(!tile.is_buildable());
    }

    #[test]
    fn role_replaces_previous_role() {
        let tile = Tile::new(TileCoord::new(0, 2), TileKind::Default, Vec3::ZERO)
            .with_role(TileRole::Origin)
            .with_role(TileRole::Destination);
        assert!(tile.is_destination());
        assert!(!tile.is_origin());
    }
}
