//! Headless run that walks agents from every spawn toward the crystals.

use std::{fmt, time::Duration};

use crystal_defence_core::{AgentId, Command, Event, NavigationEvent, NavigationGraph, TileCoord};
use crystal_defence_system_movement::{AgentConfig, Movement};
use crystal_defence_world::{self as world, query, World};
use log::{debug, info};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Parameters of a simulation run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SimulationOptions {
    pub(crate) agents: u32,
    pub(crate) max_ticks: u32,
    /// Place a random building every this many ticks.
    pub(crate) build_every: Option<u32>,
    pub(crate) tick: Duration,
    pub(crate) seed: u64,
}

/// Tally of what happened during a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SimulationReport {
    pub(crate) ticks: u32,
    pub(crate) spawned: usize,
    pub(crate) stranded: usize,
    pub(crate) waypoints: usize,
    pub(crate) arrived: usize,
    pub(crate) rerouted: usize,
    pub(crate) lost: usize,
    pub(crate) buildings: usize,
}

impl SimulationReport {
    /// Agents still walking when the run stopped.
    pub(crate) fn walking(&self) -> usize {
        self.spawned - self.stranded - self.arrived - self.lost
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ticks:     {}", self.ticks)?;
        writeln!(f, "spawned:   {}", self.spawned)?;
        writeln!(f, "stranded:  {}", self.stranded)?;
        writeln!(f, "waypoints: {}", self.waypoints)?;
        writeln!(f, "arrived:   {}", self.arrived)?;
        writeln!(f, "rerouted:  {}", self.rerouted)?;
        writeln!(f, "lost:      {}", self.lost)?;
        writeln!(f, "walking:   {}", self.walking())?;
        write!(f, "buildings: {}", self.buildings)
    }
}

/// Spawns agents round-robin on the origins and ticks until all of them settle.
pub(crate) fn run(
    world: &mut World,
    agent: AgentConfig,
    options: SimulationOptions,
) -> SimulationReport {
    let mut movement = Movement::new(*query::pathfinder(world), agent);
    let mut report = SimulationReport::default();
    let mut rng = ChaCha8Rng::seed_from_u64(options.seed);

    let origins = query::origins(world);
    if origins.is_empty() {
        info!("level has no origins, nothing to simulate");
        return report;
    }

    for index in 0..options.agents as usize {
        let origin = origins[index % origins.len()];
        let Some(anchor) = query::grid(world).anchor(origin) else {
            continue;
        };
        let id = movement.spawn(anchor);
        report.spawned += 1;
        if !dispatch_to_cheapest(&mut movement, id, world) {
            debug!("agent {} at {origin:?} has no reachable crystal", id.get());
            report.stranded += 1;
        }
    }

    let mut navigation = Vec::new();
    for tick in 1..=options.max_ticks {
        if !movement
            .agents()
            .any(|(id, _)| movement.destination(id).is_some())
        {
            break;
        }
        report.ticks = tick;

        let mut events = Vec::new();
        if let Some(every) = options.build_every.filter(|every| *every > 0) {
            if tick % every == 0 {
                if let Some(tile) = random_building_site(world, &mut rng) {
                    world::apply(world, Command::PlaceBuilding { tile }, &mut events);
                }
            }
        }
        world::apply(world, Command::Tick { dt: options.tick }, &mut events);

        report.buildings += events
            .iter()
            .filter(|event| matches!(event, Event::BuildingPlaced { .. }))
            .count();

        navigation.clear();
        movement.handle(&events, query::grid(world), &mut navigation);
        for event in &navigation {
            match *event {
                NavigationEvent::WaypointReached { .. } => report.waypoints += 1,
                NavigationEvent::Arrived { agent, tile } => {
                    debug!("agent {} reached crystal {tile:?}", agent.get());
                    report.arrived += 1;
                }
                NavigationEvent::RouteLost { agent } => {
                    if dispatch_to_cheapest(&mut movement, agent, world) {
                        report.rerouted += 1;
                    } else {
                        report.lost += 1;
                    }
                }
            }
        }
    }

    info!(
        "simulation finished after {} ticks: {} of {} agents arrived",
        report.ticks, report.arrived, report.spawned
    );
    report
}

/// Sends the agent toward the crystal with the cheapest route from where it stands.
fn dispatch_to_cheapest(movement: &mut Movement, agent: AgentId, world: &World) -> bool {
    let grid = query::grid(world);
    let pathfinder = query::pathfinder(world);
    let Some(from) = movement
        .follower(agent)
        .and_then(|follower| grid.tile_at(follower.position()))
    else {
        return false;
    };

    let cheapest = query::destinations(world)
        .into_iter()
        .filter_map(|destination| {
            pathfinder
                .calculate_optimal_path(grid, from.coord(), destination)
                .map(|route| (route.cost(grid), destination))
        })
        .min_by(|(left, _), (right, _)| left.total_cmp(right));

    cheapest.is_some_and(|(_, destination)| movement.dispatch(agent, destination, grid))
}

fn random_building_site(world: &World, rng: &mut ChaCha8Rng) -> Option<TileCoord> {
    let candidates: Vec<TileCoord> = query::grid(world)
        .tiles()
        .filter(|tile| tile.is_buildable() && tile.is_navigable())
        .map(|tile| tile.coord())
        .collect();
    candidates.choose(rng).copied()
}
