//! Orbital mechanics puzzle
//!
//! Pick a launch angle and power, then watch. The satellite succeeds once its
//! recent trail stays inside the ideal orbit band.

use std::convert::Infallible;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::heading;
use crate::sim::physics::inverse_square_pull;
use crate::sim::state::{Failure, SimRng, Trail, Verdict};
use crate::sim::tick::{Mission, Step};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitalConfig {
    pub planet_center: Vec2,
    pub planet_radius: f32,
    pub gravity_constant: f32,
    pub planet_mass: f32,
    pub start: Vec2,
    /// Launch heading in degrees (0 = +x)
    pub launch_angle: f32,
    /// Launch speed is `launch_power / 10`
    pub launch_power: f32,
    pub ideal_orbit_radius: f32,
    pub orbit_tolerance: f32,
    /// Trail samples required before the orbit can count as stable
    pub min_samples: usize,
    pub trail_capacity: usize,
    pub escape_distance: f32,
}

impl Default for OrbitalConfig {
    fn default() -> Self {
        Self {
            planet_center: Vec2::new(300.0, 300.0),
            planet_radius: 50.0,
            gravity_constant: 0.2,
            planet_mass: 5000.0,
            start: Vec2::new(300.0, 100.0),
            launch_angle: 45.0,
            launch_power: 50.0,
            ideal_orbit_radius: 200.0,
            orbit_tolerance: 30.0,
            min_samples: 100,
            trail_capacity: 200,
            escape_distance: 600.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteState {
    pub pos: Vec2,
    pub vel: Vec2,
    pub trail: Trail,
}

#[derive(Debug, Clone, Default)]
pub struct OrbitalPuzzle {
    pub config: OrbitalConfig,
}

impl OrbitalPuzzle {
    pub fn new(config: OrbitalConfig) -> Self {
        Self { config }
    }

    /// Launch parameters for the chosen attempt
    pub fn with_launch(angle: f32, power: f32) -> Self {
        Self::new(OrbitalConfig {
            launch_angle: angle,
            launch_power: power,
            ..Default::default()
        })
    }

    fn stable(&self, trail: &Trail) -> bool {
        let cfg = &self.config;
        trail.len() >= cfg.min_samples
            && trail.iter().all(|p| {
                (p.distance(cfg.planet_center) - cfg.ideal_orbit_radius).abs() < cfg.orbit_tolerance
            })
    }
}

impl Mission for OrbitalPuzzle {
    type State = SatelliteState;
    /// Launch parameters are fixed before the run
    type Control = Infallible;

    fn name(&self) -> &'static str {
        "orbital-puzzle"
    }

    fn initial_state(&self, _rng: &mut SimRng) -> SatelliteState {
        let cfg = &self.config;
        SatelliteState {
            pos: cfg.start,
            vel: heading(cfg.launch_angle) * (cfg.launch_power / 10.0),
            trail: Trail::new(cfg.trail_capacity),
        }
    }

    fn step(
        &self,
        state: &SatelliteState,
        _control: Option<&Infallible>,
        dt: f32,
        _rng: &mut SimRng,
    ) -> Step<SatelliteState> {
        let cfg = &self.config;
        let mut next = state.clone();

        let gm = cfg.gravity_constant * cfg.planet_mass;
        next.vel += inverse_square_pull(next.pos, cfg.planet_center, gm, cfg.planet_radius) * dt;
        next.pos += next.vel * dt;
        next.trail.push(next.pos);

        let distance = next.pos.distance(cfg.planet_center);
        let verdict = if distance < cfg.planet_radius {
            Verdict::Fail(Failure::PlanetImpact)
        } else if distance > cfg.escape_distance {
            Verdict::Fail(Failure::EscapedOrbit)
        } else if self.stable(&next.trail) {
            Verdict::Succeed
        } else {
            Verdict::Continue
        };

        Step::new(next).with_verdict(verdict)
    }
}
