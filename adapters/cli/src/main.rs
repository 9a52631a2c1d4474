#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives the Crystal Defence navigation engine.

mod config;
mod layout_transfer;
mod simulate;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crystal_defence_core::{NavigationGraph, Route, TileCoord};
use crystal_defence_system_builder::{Builder, BuilderInput, PlacementPreview};
use crystal_defence_world::{self as world, placement, query, World};
use glam::Vec3;
use log::{debug, info};

use crate::{
    config::Settings,
    layout_transfer::LevelSnapshot,
    simulate::{SimulationOptions, SimulationReport},
};

/// Fixed simulation step used by `simulate`.
const SIMULATION_STEP: Duration = Duration::from_millis(50);

/// Crystal Defence level and navigation toolbox.
#[derive(Debug, Parser)]
#[command(name = "crystal-defence", version)]
struct Cli {
    /// TOML file with `[level]` and `[agent]` tables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Level transfer string to load instead of generating a level.
    #[arg(long, global = true)]
    layout: Option<String>,

    /// Seed overriding the configured generation seed.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Prints the level map and its transfer string.
    Generate,
    /// Searches a route between two tiles given as ROW,COL.
    Path {
        #[arg(long, value_parser = parse_tile)]
        from: TileCoord,
        #[arg(long, value_parser = parse_tile)]
        to: TileCoord,
        /// Return the first route found instead of the cheapest one.
        #[arg(long)]
        first: bool,
    },
    /// Places buildings on the given ROW,COL tiles, keeping every spawn connected.
    Place {
        #[arg(required = true, value_parser = parse_tile)]
        tiles: Vec<TileCoord>,
    },
    /// Walks agents from the spawns to the crystals.
    Simulate {
        #[arg(long, default_value_t = 8)]
        agents: u32,
        #[arg(long, default_value_t = 20_000)]
        max_ticks: u32,
        /// Place a random building every N ticks.
        #[arg(long)]
        build_every: Option<u32>,
    },
}

/// Entry point for the Crystal Defence command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        settings.level.seed = seed;
    }
    let mut world = load_world(cli.layout.as_deref(), &settings)?;

    match cli.command {
        CliCommand::Generate => print_level(&world),
        CliCommand::Path { from, to, first } => find_path(&world, from, to, first),
        CliCommand::Place { tiles } => place_buildings(&mut world, &tiles),
        CliCommand::Simulate {
            agents,
            max_ticks,
            build_every,
        } => {
            let report = simulate::run(
                &mut world,
                settings.agent,
                SimulationOptions {
                    agents,
                    max_ticks,
                    build_every,
                    tick: SIMULATION_STEP,
                    seed: settings.level.seed,
                },
            );
            print_report(&world, &report)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn load_world(layout: Option<&str>, settings: &Settings) -> Result<World> {
    if let Some(encoded) = layout {
        let snapshot = LevelSnapshot::decode(encoded).context("failed to decode --layout")?;
        let grid = snapshot
            .to_grid()
            .context("--layout does not describe a playable level")?;
        debug!(
            "loaded {}x{} level from transfer string",
            snapshot.columns, snapshot.rows
        );
        return Ok(World::from_grid(grid, settings.level.adjacency()));
    }

    World::generate(settings.level.clone()).with_context(|| {
        format!(
            "failed to generate a {}x{} level",
            settings.level.columns, settings.level.rows
        )
    })
}

fn print_level(world: &World) -> Result<()> {
    let grid = query::grid(world);
    for line in grid.to_layout() {
        println!("{line}");
    }
    println!();
    println!("origins:      {}", format_tiles(&query::origins(world)));
    println!("destinations: {}", format_tiles(&query::destinations(world)));

    let disconnected = placement::disconnected_origins(grid, query::pathfinder(world));
    if !disconnected.is_empty() {
        println!("disconnected: {}", format_tiles(&disconnected));
    }

    let encoded = LevelSnapshot::capture(grid)
        .encode()
        .context("failed to encode level transfer string")?;
    println!("layout:       {encoded}");
    Ok(())
}

fn find_path(world: &World, from: TileCoord, to: TileCoord, first: bool) -> Result<()> {
    let grid = query::grid(world);
    for tile in [from, to] {
        if !grid.contains(tile) {
            bail!(
                "tile {} lies outside the {}x{} grid",
                format_tile(tile),
                grid.rows(),
                grid.columns()
            );
        }
    }

    let pathfinder = query::pathfinder(world);
    let route = if first {
        pathfinder.calculate_path(grid, from, to)
    } else {
        pathfinder.calculate_optimal_path(grid, from, to)
    };
    let Some(route) = route else {
        bail!("no route from {} to {}", format_tile(from), format_tile(to));
    };

    for line in overlay_route(world, &route) {
        println!("{line}");
    }
    println!();
    let travel: Vec<TileCoord> = route.tiles().iter().rev().copied().collect();
    println!("route: {}", format_tiles(&travel));
    println!("tiles: {}", route.len());
    println!("cost:  {}", route.cost(grid));
    println!("length: {:.2}", route_length(grid, &route));
    Ok(())
}

fn place_buildings(world: &mut World, tiles: &[TileCoord]) -> Result<()> {
    let mut builder = Builder::new();
    let mut events = Vec::new();
    let mut placed = 0_usize;

    for &tile in tiles {
        let preview = PlacementPreview::from_check(tile, world::preview_placement(world, tile));
        let input = BuilderInput::new(true, false, Some(tile));
        let mut commands = Vec::new();
        builder.handle(
            &events,
            Some(preview),
            input,
            |coord| {
                query::grid(world)
                    .tile(coord)
                    .is_some_and(|hosted| hosted.has_building())
            },
            &mut commands,
        );

        events.clear();
        for command in commands {
            world::apply(world, command, &mut events);
        }

        match preview.reason {
            None => {
                placed += 1;
                println!("placed   {}", format_tile(tile));
            }
            Some(reason) => println!("rejected {}: {reason:?}", format_tile(tile)),
        }
    }

    info!("placed {placed} of {} buildings", tiles.len());
    println!();
    print_level(world)
}

fn print_report(world: &World, report: &SimulationReport) -> Result<()> {
    for line in query::grid(world).to_layout() {
        println!("{line}");
    }
    println!();
    println!("{report}");
    Ok(())
}

/// Draws the level with `*` on every tile the route passes between its endpoints.
fn overlay_route(world: &World, route: &Route) -> Vec<String> {
    let grid = query::grid(world);
    grid.to_layout()
        .into_iter()
        .enumerate()
        .map(|(row, line)| {
            line.chars()
                .enumerate()
                .map(|(column, glyph)| {
                    let tile = TileCoord::new(row as u32, column as u32);
                    let endpoint = tile == route.origin() || tile == route.destination();
                    if route.contains(tile) && !endpoint {
                        '*'
                    } else {
                        glyph
                    }
                })
                .collect()
        })
        .collect()
}

/// World-space distance walked along the route's anchors.
fn route_length<G>(graph: &G, route: &Route) -> f32
where
    G: NavigationGraph + ?Sized,
{
    let anchors: Vec<Vec3> = route
        .tiles()
        .iter()
        .filter_map(|tile| graph.anchor(*tile))
        .collect();
    anchors
        .windows(2)
        .map(|pair| pair[0].distance(pair[1]))
        .sum()
}

fn parse_tile(value: &str) -> Result<TileCoord, String> {
    let (row, column) = value
        .split_once(',')
        .ok_or_else(|| format!("expected ROW,COL but got '{value}'"))?;
    let row = row
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid row '{row}': {error}"))?;
    let column = column
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid column '{column}': {error}"))?;
    Ok(TileCoord::new(row, column))
}

fn format_tile(tile: TileCoord) -> String {
    format!("{},{}", tile.row(), tile.column())
}

fn format_tiles(tiles: &[TileCoord]) -> String {
    if tiles.is_empty() {
        return String::from("-");
    }
    tiles
        .iter()
        .map(|tile| format_tile(*tile))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use crystal_defence_core::Adjacency;
    use crystal_defence_world::Grid;

    fn corridor() -> World {
        let grid = Grid::from_layout(["C.C", "#.#", "...", ",S,"], 1.0).expect("layout");
        World::from_grid(grid, Adjacency::Cardinal)
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn tiles_parse_as_row_then_column() {
        assert_eq!(parse_tile("3,7"), Ok(TileCoord::new(3, 7)));
        assert_eq!(parse_tile(" 0 , 12 "), Ok(TileCoord::new(0, 12)));
        assert!(parse_tile("3").is_err());
        assert!(parse_tile("a,1").is_err());
        assert!(parse_tile("-1,1").is_err());
    }

    #[test]
    fn subcommands_accept_tile_arguments() {
        let cli = Cli::try_parse_from([
            "crystal-defence",
            "--seed",
            "9",
            "path",
            "--from",
            "19,3",
            "--to",
            "0,4",
            "--first",
        ])
        .expect("parses");

        assert_eq!(cli.seed, Some(9));
        match cli.command {
            CliCommand::Path { from, to, first } => {
                assert_eq!(from, TileCoord::new(19, 3));
                assert_eq!(to, TileCoord::new(0, 4));
                assert!(first);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn place_requires_at_least_one_tile() {
        assert!(Cli::try_parse_from(["crystal-defence", "place"]).is_err());
    }

    #[test]
    fn route_overlay_marks_intermediate_tiles() {
        let world = corridor();
        let (spawn, crystal) = (TileCoord::new(3, 1), TileCoord::new(0, 0));
        let route = query::pathfinder(&world)
            .calculate_optimal_path(query::grid(&world), spawn, crystal)
            .expect("route");

        assert_eq!(
            overlay_route(&world, &route),
            vec!["C*C", "#*#", ".*.", ",S,"]
        );
        assert_eq!(route_length(query::grid(&world), &route), 4.0);
    }

    #[test]
    fn placing_through_the_builder_skips_blocking_tiles() {
        let mut world = corridor();

        place_buildings(&mut world, &[TileCoord::new(1, 1), TileCoord::new(2, 0)])
            .expect("placement runs");

        assert_eq!(query::buildings(&world), vec![TileCoord::new(2, 0)]);
    }

    #[test]
    fn layout_flag_replaces_generation() {
        let encoded = LevelSnapshot::capture(query::grid(&corridor()))
            .encode()
            .expect("encodes");

        let world = load_world(Some(&encoded), &Settings::default()).expect("loads");

        assert_eq!(query::grid(&world), query::grid(&corridor()));
    }
}
