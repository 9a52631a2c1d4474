#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Agent movement system that follows routes across the tile grid.
//!
//! The system owns one [`RouteFollower`] per agent, advances them on
//! [`Event::TimeAdvanced`], and re-plans their routes whenever a building
//! changes the navigation graph. Agents standing on a slow zone move at
//! [`AgentConfig::slowdown`] times their own speed until they leave it.

mod follower;

use std::collections::BTreeMap;

use crystal_defence_core::{
    AgentId, Event, NavigationEvent, NavigationGraph, TileCoord, TileKind,
};
use crystal_defence_system_pathfinding::Pathfinder;
use glam::Vec3;
use log::{debug, info, trace};

pub use follower::{AgentConfig, RouteFollower, StepOutcome};

/// Pure system that reacts to world events and reports agent progress.
#[derive(Debug)]
pub struct Movement {
    pathfinder: Pathfinder,
    config: AgentConfig,
    agents: BTreeMap<AgentId, Agent>,
    next_id: u32,
}

#[derive(Debug)]
struct Agent {
    follower: RouteFollower,
    destination: Option<TileCoord>,
    /// Speed to restore once the agent leaves a slow zone.
    slowed_from: Option<f32>,
}

impl Agent {
    fn apply_terrain<G>(&mut self, id: AgentId, graph: &G, slowdown: f32)
    where
        G: NavigationGraph + ?Sized,
    {
        let in_slow_zone = graph
            .tile_at(self.follower.position())
            .and_then(|tile| graph.tile_kind(tile))
            == Some(TileKind::SlowZone);

        match (in_slow_zone, self.slowed_from) {
            (true, None) => {
                let base = self.follower.speed();
                trace!("agent {} entered a slow zone", id.get());
                self.follower.set_speed(base * slowdown);
                self.slowed_from = Some(base);
            }
            (false, Some(base)) => {
                trace!("agent {} left a slow zone", id.get());
                self.follower.set_speed(base);
                self.slowed_from = None;
            }
            _ => {}
        }
    }
}

impl Movement {
    /// Creates an empty movement system.
    #[must_use]
    pub fn new(pathfinder: Pathfinder, config: AgentConfig) -> Self {
        Self {
            pathfinder,
            config,
            agents: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Adds an idle agent at the provided position.
    pub fn spawn(&mut self, position: Vec3) -> AgentId {
        let id = AgentId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let _ = self.agents.insert(
            id,
            Agent {
                follower: RouteFollower::new(position, self.config),
                destination: None,
                slowed_from: None,
            },
        );
        id
    }

    /// Removes an agent. Returns `false` when it did not exist.
    pub fn despawn(&mut self, agent: AgentId) -> bool {
        self.agents.remove(&agent).is_some()
    }

    /// Plans the cheapest route from the agent's tile to `destination` and starts following it.
    ///
    /// Returns `false` when the agent is unknown, stands outside the grid,
    /// already occupies the destination, or no route exists.
    pub fn dispatch<G>(&mut self, agent: AgentId, destination: TileCoord, graph: &G) -> bool
    where
        G: NavigationGraph + ?Sized,
    {
        let pathfinder = self.pathfinder;
        let Some(entry) = self.agents.get_mut(&agent) else {
            return false;
        };
        let Some(from) = graph.tile_at(entry.follower.position()) else {
            debug!("agent {} stands outside the grid", agent.get());
            return false;
        };
        let Some(route) = pathfinder.calculate_optimal_path(graph, from, destination) else {
            debug!(
                "agent {} has no route from {from:?} to {destination:?}",
                agent.get()
            );
            return false;
        };
        if !entry.follower.set_route(&route, graph) {
            return false;
        }

        entry.destination = Some(destination);
        debug!(
            "agent {} dispatched to {destination:?} over {} tiles",
            agent.get(),
            route.len()
        );
        true
    }

    /// Consumes world events and reports agent progress.
    pub fn handle<G>(&mut self, events: &[Event], graph: &G, out: &mut Vec<NavigationEvent>)
    where
        G: NavigationGraph + ?Sized,
    {
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => {
                    let slowdown = self.config.slowdown;
                    for (id, agent) in &mut self.agents {
                        agent.apply_terrain(*id, graph, slowdown);
                        match agent.follower.update(*dt) {
                            StepOutcome::WaypointReached(tile) => {
                                out.push(NavigationEvent::WaypointReached { agent: *id, tile });
                            }
                            StepOutcome::Arrived(tile) => {
                                agent.destination = None;
                                out.push(NavigationEvent::Arrived { agent: *id, tile });
                            }
                            StepOutcome::Moving | StepOutcome::Idle => {}
                        }
                    }
                }
                Event::BuildingPlaced { .. } | Event::BuildingRemoved { .. } => {
                    self.replan(graph, out);
                }
                Event::LevelGenerated { .. } => {
                    debug!("level replaced, dropping {} agents", self.agents.len());
                    self.agents.clear();
                }
                Event::PlacementRejected { .. } | Event::RemovalRejected { .. } => {}
            }
        }
    }

    fn replan<G>(&mut self, graph: &G, out: &mut Vec<NavigationEvent>)
    where
        G: NavigationGraph + ?Sized,
    {
        let pathfinder = self.pathfinder;
        for (id, agent) in &mut self.agents {
            let Some(destination) = agent.destination else {
                continue;
            };

            let route = graph
                .tile_at(agent.follower.position())
                .and_then(|from| pathfinder.calculate_optimal_path(graph, from, destination));
            let Some(route) = route else {
                info!("agent {} lost its route to {destination:?}", id.get());
                agent.follower.stop_route();
                agent.destination = None;
                out.push(NavigationEvent::RouteLost { agent: *id });
                continue;
            };

            let paused = !agent.follower.can_navigate();
            if agent.follower.set_route(&route, graph) && paused {
                agent.follower.pause_route();
            }
        }
    }

    /// Follower driving the agent, if it exists.
    #[must_use]
    pub fn follower(&self, agent: AgentId) -> Option<&RouteFollower> {
        self.agents.get(&agent).map(|entry| &entry.follower)
    }

    /// Mutable follower driving the agent, for pausing or retuning it.
    ///
    /// A speed set while the agent crosses a slow zone is replaced by the
    /// pre-zone speed once it leaves.
    pub fn follower_mut(&mut self, agent: AgentId) -> Option<&mut RouteFollower> {
        self.agents.get_mut(&agent).map(|entry| &mut entry.follower)
    }

    /// Destination the agent is currently travelling to.
    #[must_use]
    pub fn destination(&self, agent: AgentId) -> Option<TileCoord> {
        self.agents.get(&agent).and_then(|entry| entry.destination)
    }

    /// Agents in identifier order.
    pub fn agents(&self) -> impl Iterator<Item = (AgentId, &RouteFollower)> {
        self.agents.iter().map(|(id, entry)| (*id, &entry.follower))
    }

    /// Number of live agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether no agent is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for Movement {
    fn default() -> Self {
        Self::new(Pathfinder::default(), AgentConfig::default())
    }
}
