#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Route searches over the tile navigation graph.
//!
//! Both searches share one label-correcting breadth-first traversal over a
//! FIFO frontier. Every reached tile carries a `(predecessor, cost)` label and
//! a tile is re-enqueued whenever a strictly cheaper label is found for it.
//! Neighbors are accepted when they are navigable or when they are the
//! requested destination, so non-navigable targets such as crystals remain
//! reachable.

use std::collections::VecDeque;

use crystal_defence_core::{Adjacency, NavigationGraph, Route, TileCoord};
use log::debug;

/// Stateless search service configured with an adjacency rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pathfinder {
    adjacency: Adjacency,
}

impl Pathfinder {
    /// Creates a pathfinder that expands neighbors with the provided rule.
    #[must_use]
    pub const fn new(adjacency: Adjacency) -> Self {
        Self { adjacency }
    }

    /// Adjacency rule used when expanding tiles.
    #[must_use]
    pub const fn adjacency(&self) -> Adjacency {
        self.adjacency
    }

    /// Cost-aware search bounded by the cheapest route found so far.
    ///
    /// Candidates are charged the navigation weight of the entered tile, so
    /// the origin's own weight never counts while the destination's always
    /// does. Candidates at or above the bound are pruned and the traversal
    /// runs until the frontier drains. Returns `None` when either endpoint lies
    /// outside the graph or the destination cannot be reached.
    #[must_use]
    pub fn calculate_optimal_path<G>(
        &self,
        graph: &G,
        from: TileCoord,
        to: TileCoord,
    ) -> Option<Route>
    where
        G: NavigationGraph + ?Sized,
    {
        self.search(graph, from, to, Strategy::BranchAndBound)
    }

    /// Uniform-cost search that stops the first time the destination is reached.
    ///
    /// Tile weights are ignored. The route is valid but not necessarily the
    /// cheapest one.
    #[must_use]
    pub fn calculate_path<G>(
        &self,
        graph: &G,
        from: TileCoord,
        to: TileCoord,
    ) -> Option<Route>
    where
        G: NavigationGraph + ?Sized,
    {
        self.search(graph, from, to, Strategy::FirstFound)
    }

    fn search<G>(
        &self,
        graph: &G,
        from: TileCoord,
        to: TileCoord,
        strategy: Strategy,
    ) -> Option<Route>
    where
        G: NavigationGraph + ?Sized,
    {
        let (columns, rows) = graph.dimensions();
        let from_index = from.index_in(columns, rows)?;
        if !graph.contains(to) {
            return None;
        }
        if from == to {
            return Route::from_destination_first(vec![from]);
        }

        let cell_count = usize::try_from(u64::from(columns) * u64::from(rows)).ok()?;
        let mut labels: Vec<Option<Label>> = vec![None; cell_count];
        labels[from_index] = Some(Label {
            predecessor: None,
            cost: 0.0,
        });

        let mut frontier = VecDeque::new();
        frontier.push_back(from);
        let mut bound = f32::INFINITY;
        let mut expansions = 0_usize;

        'traversal: while let Some(current) = frontier.pop_front() {
            let Some(current_cost) = current
                .index_in(columns, rows)
                .and_then(|index| labels[index])
                .map(|label| label.cost)
            else {
                continue;
            };
            expansions += 1;

            for neighbor in graph.adjacent_tiles(current, self.adjacency) {
                if neighbor != to && !graph.is_navigable(neighbor) {
                    continue;
                }
                let Some(index) = neighbor.index_in(columns, rows) else {
                    continue;
                };

                let step = match strategy {
                    Strategy::BranchAndBound => match graph.navigation_weight(neighbor) {
                        Some(weight) => weight,
                        None => continue,
                    },
                    Strategy::FirstFound => 1.0,
                };
                let candidate = current_cost + step;
                if strategy == Strategy::BranchAndBound && candidate >= bound {
                    continue;
                }

                if labels[index].map_or(true, |label| label.cost > candidate) {
                    labels[index] = Some(Label {
                        predecessor: Some(current),
                        cost: candidate,
                    });
                    frontier.push_back(neighbor);
                }

                if neighbor == to {
                    match strategy {
                        Strategy::BranchAndBound => bound = candidate,
                        Strategy::FirstFound => break 'traversal,
                    }
                }
            }
        }

        let route = reconstruct(&labels, columns, rows, from, to);
        match &route {
            Some(route) => debug!(
                "{strategy:?} search {from:?} -> {to:?}: {} tiles after {expansions} expansions",
                route.len()
            ),
            None => debug!(
                "{strategy:?} search {from:?} -> {to:?}: unreachable after {expansions} expansions"
            ),
        }
        route
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Strategy {
    BranchAndBound,
    FirstFound,
}

#[derive(Clone, Copy, Debug)]
struct Label {
    predecessor: Option<TileCoord>,
    cost: f32,
}

/// Walks predecessor links from `to` back to `from`.
///
/// The walk is capped at one step per label so a malformed chain cannot loop.
fn reconstruct(
    labels: &[Option<Label>],
    columns: u32,
    rows: u32,
    from: TileCoord,
    to: TileCoord,
) -> Option<Route> {
    let mut tiles = vec![to];
    let mut cursor = to;
    while cursor != from {
        let label = labels[cursor.index_in(columns, rows)?]?;
        cursor = label.predecessor?;
        tiles.push(cursor);
        if tiles.len() > labels.len() {
            return None;
        }
    }

    Route::from_destination_first(tiles)
}
