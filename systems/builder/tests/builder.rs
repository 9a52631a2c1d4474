use crystal_defence_core::{Adjacency, Command, Event, PlacementError, TileCoord};
use crystal_defence_system_builder::{Builder, BuilderInput, PlacementPreview};
use crystal_defence_world::{self as world, query, Grid, World};

fn preview_at(tile: TileCoord, placeable: bool) -> PlacementPreview {
    let check = if placeable {
        Ok(())
    } else {
        Err(PlacementError::NotBuildable)
    };
    PlacementPreview::from_check(tile, check)
}

fn confirm() -> BuilderInput {
    BuilderInput {
        confirm_action: true,
        ..BuilderInput::default()
    }
}

#[test]
fn confirm_emits_place_command() {
    let mut builder = Builder::default();
    let mut commands = Vec::new();

    builder.handle(
        &[],
        Some(preview_at(TileCoord::new(2, 2), true)),
        confirm(),
        |_| false,
        &mut commands,
    );

    assert_eq!(
        commands,
        vec![Command::PlaceBuilding {
            tile: TileCoord::new(2, 2),
        }],
        "builder should emit a placement command when confirming a valid preview",
    );
}

#[test]
fn confirm_ignored_when_preview_not_placeable() {
    let mut builder = Builder::default();
    let mut commands = Vec::new();

    builder.handle(
        &[],
        Some(preview_at(TileCoord::new(2, 2), false)),
        confirm(),
        |_| false,
        &mut commands,
    );

    assert!(
        commands.is_empty(),
        "invalid preview must not emit commands"
    );
}

#[test]
fn confirm_ignored_without_preview() {
    let mut builder = Builder::default();
    let mut commands = Vec::new();

    builder.handle(&[], None, confirm(), |_| false, &mut commands);

    assert!(commands.is_empty());
}

#[test]
fn remove_emits_command_when_building_present() {
    let mut builder = Builder::new();
    let mut commands = Vec::new();
    let tile = TileCoord::new(3, 1);

    builder.handle(
        &[],
        None,
        BuilderInput::new(false, true, Some(tile)),
        |candidate| candidate == tile,
        &mut commands,
    );

    assert_eq!(commands, vec![Command::RemoveBuilding { tile }]);
}

#[test]
fn remove_ignored_when_no_building_present() {
    let mut builder = Builder::new();
    let mut commands = Vec::new();

    builder.handle(
        &[],
        None,
        BuilderInput::new(false, true, Some(TileCoord::new(3, 1))),
        |_| false,
        &mut commands,
    );

    assert!(commands.is_empty());
}

#[test]
fn rejections_are_remembered_until_a_placement_succeeds() {
    let mut builder = Builder::new();
    let mut commands = Vec::new();
    let tile = TileCoord::new(1, 1);

    builder.handle(
        &[Event::PlacementRejected {
            tile,
            reason: PlacementError::BlocksAllRoutes,
        }],
        None,
        BuilderInput::default(),
        |_| false,
        &mut commands,
    );
    assert_eq!(
        builder.last_rejection(),
        Some((tile, PlacementError::BlocksAllRoutes))
    );

    builder.handle(
        &[Event::BuildingPlaced {
            tile: TileCoord::new(2, 0),
        }],
        None,
        BuilderInput::default(),
        |_| false,
        &mut commands,
    );
    assert_eq!(builder.last_rejection(), None);
    assert!(commands.is_empty());
}

#[test]
fn preview_from_world_drives_placement() {
    let grid = Grid::from_layout(["C.C", "#.#", "...", ",S,"], 1.0).expect("layout");
    let mut world = World::from_grid(grid, Adjacency::Cardinal);
    let mut builder = Builder::new();

    let blocking = TileCoord::new(1, 1);
    let preview =
        PlacementPreview::from_check(blocking, world::preview_placement(&mut world, blocking));
    assert_eq!(preview.reason, Some(PlacementError::BlocksAllRoutes));

    let mut commands = Vec::new();
    builder.handle(&[], Some(preview), confirm(), |_| false, &mut commands);
    assert!(commands.is_empty());

    let open = TileCoord::new(2, 2);
    let preview = PlacementPreview::from_check(open, world::preview_placement(&mut world, open));
    builder.handle(&[], Some(preview), confirm(), |_| false, &mut commands);

    let mut events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }
    assert_eq!(events, vec![Event::BuildingPlaced { tile: open }]);
    assert_eq!(query::buildings(&world), vec![open]);
}
