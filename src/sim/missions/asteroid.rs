//! Asteroid deflection
//!
//! Navigate a gravitational field of asteroids to a target. Every asteroid
//! pulls on the craft; the pulls are summed and applied once per tick.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::zero_g::Target;
use crate::heading;
use crate::sim::physics::{circles_overlap, drain, inverse_square_pull, spend};
use crate::sim::state::{Failure, SimRng, TickEvent, Verdict};
use crate::sim::tick::{Mission, Step};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Asteroid {
    pub pos: Vec2,
    pub radius: f32,
    pub mass: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsteroidConfig {
    /// Square field side length
    pub field_size: f32,
    pub start: Vec2,
    pub fuel: f32,
    pub craft_radius: f32,
    pub target: Vec2,
    pub target_radius: f32,
    pub asteroid_count: usize,
    /// Asteroid centres are drawn from `[spawn_min, spawn_max)` on both axes
    pub spawn_min: f32,
    pub spawn_max: f32,
    pub radius_range: (f32, f32),
    pub mass_range: (f32, f32),
    pub gravity_constant: f32,
    pub thrust_power: f32,
    pub thrust_cost: f32,
    pub max_speed: f32,
    pub friction: f32,
    /// Passive fuel loss per tick
    pub fuel_drain: f32,
    pub drift_speed: f32,
    /// Fixed layout instead of a generated one
    pub asteroids: Option<Vec<Asteroid>>,
}

impl Default for AsteroidConfig {
    fn default() -> Self {
        Self {
            field_size: 500.0,
            start: Vec2::new(50.0, 50.0),
            fuel: 100.0,
            craft_radius: 10.0,
            target: Vec2::new(450.0, 450.0),
            target_radius: 20.0,
            asteroid_count: 5,
            spawn_min: 150.0,
            spawn_max: 350.0,
            radius_range: (10.0, 40.0),
            mass_range: (50.0, 150.0),
            gravity_constant: 0.1,
            thrust_power: 0.5,
            thrust_cost: 1.0,
            max_speed: 5.0,
            friction: 0.99,
            fuel_drain: 0.1,
            drift_speed: 0.05,
            asteroids: None,
        }
    }
}

/// Thrust along a heading in degrees (0 = +x, 90 = +y)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AsteroidControl {
    Thrust { angle: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocketState {
    pub pos: Vec2,
    pub vel: Vec2,
    pub fuel: f32,
    pub asteroids: Vec<Asteroid>,
    pub target: Target,
}

#[derive(Debug, Clone, Default)]
pub struct AsteroidDeflection {
    pub config: AsteroidConfig,
}

impl AsteroidDeflection {
    pub fn new(config: AsteroidConfig) -> Self {
        Self { config }
    }

    fn generate_asteroids(&self, rng: &mut SimRng) -> Vec<Asteroid> {
        let cfg = &self.config;
        (0..cfg.asteroid_count)
            .map(|_| Asteroid {
                pos: Vec2::new(
                    sample(rng, cfg.spawn_min, cfg.spawn_max),
                    sample(rng, cfg.spawn_min, cfg.spawn_max),
                ),
                radius: sample(rng, cfg.radius_range.0, cfg.radius_range.1),
                mass: sample(rng, cfg.mass_range.0, cfg.mass_range.1),
            })
            .collect()
    }
}

/// Uniform sample that tolerates an empty range
fn sample(rng: &mut SimRng, low: f32, high: f32) -> f32 {
    if high > low {
        rng.random_range(low..high)
    } else {
        low
    }
}

impl Mission for AsteroidDeflection {
    type State = RocketState;
    type Control = AsteroidControl;

    fn name(&self) -> &'static str {
        "asteroid-deflection"
    }

    fn initial_state(&self, rng: &mut SimRng) -> RocketState {
        let cfg = &self.config;
        let asteroids = match &cfg.asteroids {
            Some(layout) => layout.clone(),
            None => self.generate_asteroids(rng),
        };
        RocketState {
            pos: cfg.start,
            vel: Vec2::ZERO,
            fuel: cfg.fuel,
            asteroids,
            target: Target::new(cfg.target, cfg.target_radius),
        }
    }

    fn step(
        &self,
        state: &RocketState,
        control: Option<&AsteroidControl>,
        dt: f32,
        _rng: &mut SimRng,
    ) -> Step<RocketState> {
        let cfg = &self.config;
        let mut next = state.clone();
        let mut events = Vec::new();

        if let Some(AsteroidControl::Thrust { angle }) = control {
            match spend(next.fuel, cfg.thrust_cost) {
                Ok(fuel) => {
                    next.fuel = fuel;
                    next.vel = (next.vel + heading(*angle) * cfg.thrust_power)
                        .clamp_length_max(cfg.max_speed);
                    events.push(TickEvent::ControlApplied);
                }
                Err(reason) => events.push(TickEvent::ControlRejected(reason)),
            }
        }

        let pull: Vec2 = next
            .asteroids
            .iter()
            .map(|a| inverse_square_pull(next.pos, a.pos, cfg.gravity_constant * a.mass, a.radius))
            .sum();
        next.vel += pull * dt;
        next.vel *= cfg.friction;
        next.pos = (next.pos + next.vel * dt).clamp(Vec2::ZERO, Vec2::splat(cfg.field_size));
        next.fuel = drain(next.fuel, cfg.fuel_drain * dt);

        let collided = next
            .asteroids
            .iter()
            .any(|a| circles_overlap(next.pos, cfg.craft_radius, a.pos, a.radius));

        let verdict = if collided {
            Verdict::Fail(Failure::AsteroidCollision)
        } else if next.target.contains(next.pos) {
            next.target.reached = true;
            Verdict::Succeed
        } else if next.fuel < cfg.thrust_cost && next.vel.length() < cfg.drift_speed {
            Verdict::Fail(Failure::Adrift)
        } else {
            Verdict::Continue
        };

        Step::new(next).with_verdict(verdict).with_events(events)
    }
}
