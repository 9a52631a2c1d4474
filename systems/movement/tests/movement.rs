use std::time::Duration;

use crystal_defence_core::{
    AgentId, Adjacency, Command, Event, NavigationEvent, NavigationGraph, TileCoord,
};
use crystal_defence_system_movement::{AgentConfig, Movement};
use crystal_defence_world::{self as world, query, Grid, World};

const TICK: Duration = Duration::from_millis(50);

fn world_from(layout: &[&str]) -> World {
    let grid = Grid::from_layout(layout.iter().copied(), 1.0).expect("layout parses");
    World::from_grid(grid, Adjacency::Cardinal)
}

fn movement_for(world: &World) -> Movement {
    Movement::new(
        *query::pathfinder(world),
        AgentConfig {
            speed: 2.0,
            stopping_distance: 0.05,
            ..AgentConfig::default()
        },
    )
}

fn spawn_at_origin(world: &World, movement: &mut Movement) -> AgentId {
    let origin = query::origins(world)[0];
    let anchor = query::grid(world).anchor(origin).expect("anchor");
    movement.spawn(anchor)
}

fn tick(world: &mut World, movement: &mut Movement, out: &mut Vec<NavigationEvent>) {
    let mut events = Vec::new();
    world::apply(world, Command::Tick { dt: TICK }, &mut events);
    movement.handle(&events, query::grid(world), out);
}

fn apply(world: &mut World, movement: &mut Movement, command: Command) -> Vec<NavigationEvent> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    let mut out = Vec::new();
    movement.handle(&events, query::grid(world), &mut out);
    out
}

#[test]
fn agent_walks_from_spawn_to_crystal() {
    let mut world = world_from(&["..C", ".#.", "S.."]);
    let mut movement = movement_for(&world);
    let agent = spawn_at_origin(&world, &mut movement);
    let crystal = query::destinations(&world)[0];

    assert!(movement.dispatch(agent, crystal, query::grid(&world)));

    let mut out = Vec::new();
    for _ in 0..400 {
        tick(&mut world, &mut movement, &mut out);
        if out
            .iter()
            .any(|event| matches!(event, NavigationEvent::Arrived { .. }))
        {
            break;
        }
    }

    assert_eq!(
        out.last(),
        Some(&NavigationEvent::Arrived {
            agent,
            tile: crystal
        })
    );
    let waypoints = out
        .iter()
        .filter(|event| matches!(event, NavigationEvent::WaypointReached { .. }))
        .count();
    assert_eq!(waypoints, 3);

    let follower = movement.follower(agent).expect("agent");
    assert!(!follower.can_navigate());
    assert_eq!(follower.velocity(), glam::Vec3::ZERO);
    assert_eq!(movement.destination(agent), None);
    let anchor = query::grid(&world).anchor(crystal).expect("anchor");
    assert!(follower.position().distance(anchor) <= 0.05);
}

#[test]
fn placing_a_building_on_the_route_replans_it() {
    let mut world = world_from(&["C..", "...", "S.."]);
    let mut movement = movement_for(&world);
    let agent = spawn_at_origin(&world, &mut movement);
    let crystal = TileCoord::new(0, 0);
    assert!(movement.dispatch(agent, crystal, query::grid(&world)));
    assert!(movement
        .follower(agent)
        .expect("agent")
        .waypoints()
        .any(|tile| tile == TileCoord::new(1, 0)));

    let out = apply(
        &mut world,
        &mut movement,
        Command::PlaceBuilding {
            tile: TileCoord::new(1, 0),
        },
    );

    assert!(out.is_empty());
    let waypoints: Vec<_> = movement.follower(agent).expect("agent").waypoints().collect();
    assert!(!waypoints.contains(&TileCoord::new(1, 0)));
    assert_eq!(waypoints.last(), Some(&crystal));
    assert_eq!(movement.destination(agent), Some(crystal));
}

#[test]
fn agents_whose_crystal_is_walled_off_lose_their_route() {
    let mut world = world_from(&["C#C", ".#.", ".S."]);
    let mut movement = movement_for(&world);
    let agent = spawn_at_origin(&world, &mut movement);
    assert!(movement.dispatch(agent, TileCoord::new(0, 2), query::grid(&world)));

    let out = apply(
        &mut world,
        &mut movement,
        Command::PlaceBuilding {
            tile: TileCoord::new(1, 2),
        },
    );

    assert_eq!(out, vec![NavigationEvent::RouteLost { agent }]);
    let follower = movement.follower(agent).expect("agent");
    assert_eq!(follower.remaining_waypoints(), 0);
    assert!(!follower.can_navigate());
    assert_eq!(movement.destination(agent), None);
}

#[test]
fn rejected_placements_leave_routes_alone() {
    let mut world = world_from(&["C..", "#.#", ".S."]);
    let mut movement = movement_for(&world);
    let agent = spawn_at_origin(&world, &mut movement);
    assert!(movement.dispatch(agent, TileCoord::new(0, 0), query::grid(&world)));
    let before: Vec<_> = movement.follower(agent).expect("agent").waypoints().collect();

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::PlaceBuilding {
            tile: TileCoord::new(1, 1),
        },
        &mut events,
    );
    assert!(matches!(events.as_slice(), [Event::PlacementRejected { .. }]));

    let mut out = Vec::new();
    movement.handle(&events, query::grid(&world), &mut out);
    let after: Vec<_> = movement.follower(agent).expect("agent").waypoints().collect();
    assert_eq!(before, after);
    assert!(out.is_empty());
}

#[test]
fn regenerating_the_level_clears_agents() {
    let mut world = world_from(&["C..", "...", "S.."]);
    let mut movement = movement_for(&world);
    let _ = spawn_at_origin(&world, &mut movement);

    let config = query::config(&world).clone();
    let out = apply(&mut world, &mut movement, Command::GenerateLevel { config });

    assert!(out.is_empty());
    assert!(movement.is_empty());
}

fn ticks_to_arrive(layout: &[&str]) -> (usize, f32) {
    let mut world = world_from(layout);
    let mut movement = movement_for(&world);
    let agent = spawn_at_origin(&world, &mut movement);
    let crystal = query::destinations(&world)[0];
    assert!(movement.dispatch(agent, crystal, query::grid(&world)));

    let mut out = Vec::new();
    for ticks in 1..=400 {
        tick(&mut world, &mut movement, &mut out);
        if out.contains(&NavigationEvent::Arrived {
            agent,
            tile: crystal,
        }) {
            let speed = movement.follower(agent).expect("agent").speed();
            return (ticks, speed);
        }
    }
    panic!("agent never reached {crystal:?}");
}

#[test]
fn crossing_slow_zones_takes_longer() {
    let (open_ticks, open_speed) = ticks_to_arrive(&["S...C"]);
    let (slow_ticks, slow_speed) = ticks_to_arrive(&["S~~~C"]);

    assert!(
        slow_ticks > open_ticks,
        "slow zones took {slow_ticks} ticks, open ground {open_ticks}"
    );
    assert_eq!(open_speed, 2.0);
    assert_eq!(slow_speed, 2.0);
}
