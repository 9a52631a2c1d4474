//! Route-following motion controller for a single agent.

use std::{collections::VecDeque, time::Duration};

use crystal_defence_core::{NavigationGraph, Route, TileCoord};
use glam::Vec3;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// Motion tunables applied to newly spawned agents.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Distance at which a waypoint counts as reached.
    pub stopping_distance: f32,
    /// Speed multiplier applied while the agent stands on a slow zone.
    pub slowdown: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            stopping_distance: 1.0,
            slowdown: 0.5,
        }
    }
}

/// Result of advancing a follower by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The follower is paused or has nothing to follow.
    Idle,
    /// The follower moved toward its current waypoint.
    Moving,
    /// An intermediate waypoint was reached and the next one targeted.
    WaypointReached(TileCoord),
    /// The final waypoint was reached; the follower stopped.
    Arrived(TileCoord),
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Waypoint {
    tile: TileCoord,
    anchor: Vec3,
}

/// Moves a position along a route, one waypoint anchor at a time.
///
/// Routes arrive destination-first from the pathfinder and are consumed from
/// the tile after the origin toward the destination. Motion is planar: the
/// velocity never has a vertical component and the height snaps to the
/// current waypoint every tick.
#[derive(Clone, Debug)]
pub struct RouteFollower {
    position: Vec3,
    waypoints: VecDeque<Waypoint>,
    velocity: Vec3,
    moving_direction: Vec3,
    facing: Vec3,
    can_navigate: bool,
    speed: f32,
    stopping_distance_squared: f32,
    last_remaining_distance_squared: f32,
}

impl RouteFollower {
    /// Creates an idle follower at the provided position.
    #[must_use]
    pub fn new(position: Vec3, config: AgentConfig) -> Self {
        Self {
            position,
            waypoints: VecDeque::new(),
            velocity: Vec3::ZERO,
            moving_direction: Vec3::ZERO,
            facing: Vec3::Z,
            can_navigate: false,
            speed: config.speed,
            stopping_distance_squared: config.stopping_distance * config.stopping_distance,
            last_remaining_distance_squared: f32::INFINITY,
        }
    }

    /// Replaces the current route and starts moving along it.
    ///
    /// The origin tile is dropped because the follower is assumed to stand on
    /// it already. Routes that leave nothing to visit, or whose tiles have no
    /// anchor in the graph, are ignored and `false` is returned; the follower
    /// keeps whatever it was doing. Re-planning while already standing on the
    /// destination tile therefore leaves a live route untouched instead of
    /// stopping the agent.
    pub fn set_route<G>(&mut self, route: &Route, graph: &G) -> bool
    where
        G: NavigationGraph + ?Sized,
    {
        let waypoints: Option<VecDeque<Waypoint>> = route
            .waypoints()
            .map(|tile| graph.anchor(tile).map(|anchor| Waypoint { tile, anchor }))
            .collect();
        let Some(waypoints) = waypoints.filter(|waypoints| !waypoints.is_empty()) else {
            debug!(
                "ignoring route to {:?}: nothing left to follow",
                route.destination()
            );
            return false;
        };

        self.waypoints = waypoints;
        self.last_remaining_distance_squared = f32::INFINITY;
        self.resume_route();
        true
    }

    /// Aims at the current waypoint and restores full speed.
    pub fn resume_route(&mut self) {
        let Some(target) = self.waypoints.front() else {
            return;
        };

        let mut direction = target.anchor - self.position;
        direction.y = 0.0;
        self.moving_direction = direction.normalize_or_zero();
        self.velocity = self.moving_direction * self.speed;
        if self.moving_direction != Vec3::ZERO {
            self.facing = self.moving_direction;
        }
        self.can_navigate = true;
    }

    /// Stops moving but keeps the remaining waypoints.
    pub fn pause_route(&mut self) {
        self.halt();
    }

    /// Stops moving and forgets the remaining waypoints.
    pub fn stop_route(&mut self) {
        self.halt();
        self.waypoints.clear();
    }

    /// Clears the route and moves the follower to a new position.
    pub fn reset(&mut self, position: Vec3) {
        self.stop_route();
        self.position = position;
        self.last_remaining_distance_squared = f32::INFINITY;
    }

    /// Teleports the follower without touching its route.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Changes the travel speed, rescaling the velocity of a live route.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
        if !self.waypoints.is_empty() {
            self.velocity = self.velocity.normalize_or_zero() * speed;
        }
    }

    /// Changes the distance at which waypoints count as reached.
    pub fn set_stopping_distance(&mut self, stopping_distance: f32) {
        self.stopping_distance_squared = stopping_distance * stopping_distance;
    }

    /// Advances the follower by `dt` of simulated time.
    ///
    /// Steps are integrated as `velocity * dt` and may carry the follower past
    /// its waypoint; the next update sees the distance grow and re-aims. When a
    /// waypoint is reached the drift reference restarts from the next waypoint,
    /// so switching targets never counts as lost progress.
    pub fn update(&mut self, dt: Duration) -> StepOutcome {
        let Some(mut target) = self.waypoints.front().copied() else {
            self.halt();
            return StepOutcome::Idle;
        };
        if !self.can_navigate {
            self.halt();
            return StepOutcome::Idle;
        }

        let mut outcome = StepOutcome::Moving;
        let mut remaining = self.position.distance_squared(target.anchor);
        if remaining <= self.stopping_distance_squared {
            let _ = self.waypoints.pop_front();
            let Some(next) = self.waypoints.front().copied() else {
                self.halt();
                self.last_remaining_distance_squared = f32::INFINITY;
                debug!("route exhausted at {:?}", target.tile);
                return StepOutcome::Arrived(target.tile);
            };

            outcome = StepOutcome::WaypointReached(target.tile);
            target = next;
            self.last_remaining_distance_squared = f32::INFINITY;
            self.resume_route();
            remaining = self.position.distance_squared(target.anchor);
        }

        if self.last_remaining_distance_squared <= remaining {
            trace!(
                "no progress toward {:?} ({remaining} >= {}), re-aiming",
                target.tile,
                self.last_remaining_distance_squared
            );
            self.resume_route();
        }

        self.integrate(target.anchor, dt.as_secs_f32());
        self.last_remaining_distance_squared = remaining;
        outcome
    }

    /// Straight-line distance to the current waypoint.
    #[must_use]
    pub fn remaining_distance(&self) -> Option<f32> {
        self.remaining_distance_squared().map(f32::sqrt)
    }

    /// Squared distance to the current waypoint. Prefer this for comparisons.
    #[must_use]
    pub fn remaining_distance_squared(&self) -> Option<f32> {
        self.waypoints
            .front()
            .map(|target| self.position.distance_squared(target.anchor))
    }

    /// Straight-line distance from the follower to an arbitrary point.
    #[must_use]
    pub fn remaining_distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }

    /// Squared distance from the follower to an arbitrary point.
    #[must_use]
    pub fn remaining_distance_squared_to(&self, point: Vec3) -> f32 {
        self.position.distance_squared(point)
    }

    /// Length of the polyline through every remaining waypoint.
    #[must_use]
    pub fn remaining_route_distance(&self) -> f32 {
        let mut previous = self.position;
        let mut total = 0.0;
        for waypoint in &self.waypoints {
            total += previous.distance(waypoint.anchor);
            previous = waypoint.anchor;
        }
        total
    }

    /// Current world-space position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Current velocity in world units per second.
    #[must_use]
    pub const fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Normalised horizontal heading, zero while stopped.
    #[must_use]
    pub const fn moving_direction(&self) -> Vec3 {
        self.moving_direction
    }

    /// Last non-zero heading, used to orient the agent.
    #[must_use]
    pub const fn facing(&self) -> Vec3 {
        self.facing
    }

    /// Whether the follower is actively moving along a route.
    #[must_use]
    pub const fn can_navigate(&self) -> bool {
        self.can_navigate
    }

    /// Configured travel speed.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Number of waypoints still to visit.
    #[must_use]
    pub fn remaining_waypoints(&self) -> usize {
        self.waypoints.len()
    }

    /// Tile currently being approached.
    #[must_use]
    pub fn current_waypoint(&self) -> Option<TileCoord> {
        self.waypoints.front().map(|waypoint| waypoint.tile)
    }

    /// Anchor of the tile currently being approached.
    #[must_use]
    pub fn current_target(&self) -> Option<Vec3> {
        self.waypoints.front().map(|waypoint| waypoint.anchor)
    }

    /// Remaining waypoint tiles in visiting order.
    pub fn waypoints(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.waypoints.iter().map(|waypoint| waypoint.tile)
    }

    fn halt(&mut self) {
        self.velocity = Vec3::ZERO;
        self.moving_direction = Vec3::ZERO;
        self.can_navigate = false;
    }

    /// Moves along the velocity, snapping the height to the target's.
    fn integrate(&mut self, target: Vec3, dt: f32) {
        self.position += self.velocity * dt;
        self.position.y = target.y;
    }
}
