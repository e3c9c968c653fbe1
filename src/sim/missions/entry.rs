//! Atmospheric entry
//!
//! Choose an entry angle, measured from vertical, before the run. Too steep
//! and the heat shield fails; too shallow and the craft skips off the upper
//! atmosphere and leaves the view.

use std::convert::Infallible;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::state::{Failure, SimRng, Trail, Verdict};
use crate::sim::tick::{Mission, Step};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryConfig {
    pub width: f32,
    pub height: f32,
    pub planet_center: Vec2,
    pub planet_radius: f32,
    pub atmosphere_thickness: f32,
    pub start: Vec2,
    pub entry_speed: f32,
    /// Degrees from vertical, fixed before the run
    pub entry_angle: f32,
    pub ideal_min_angle: f32,
    pub ideal_max_angle: f32,
    /// Downward acceleration inside the atmosphere
    pub gravity: f32,
    /// Velocity multiplier inside the atmosphere
    pub drag: f32,
    pub steep_heat_per_degree: f32,
    pub steep_heat_per_speed: f32,
    pub ideal_heat_per_speed: f32,
    /// Skip response of a shallow entry: (vx factor, vy factor)
    pub skip_factors: (f32, f32),
    pub max_heat: f32,
    pub safe_heat: f32,
    /// Altitude band above the surface that counts as a landing
    pub landing_corridor: f32,
    pub safe_speed: f32,
    pub trail_capacity: usize,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 400.0,
            planet_center: Vec2::new(300.0, 500.0),
            planet_radius: 200.0,
            atmosphere_thickness: 100.0,
            start: Vec2::new(60.0, 20.0),
            entry_speed: 2.0,
            entry_angle: 25.0,
            ideal_min_angle: 20.0,
            ideal_max_angle: 30.0,
            gravity: 0.05,
            drag: 0.98,
            steep_heat_per_degree: 0.3,
            steep_heat_per_speed: 0.3,
            ideal_heat_per_speed: 0.1,
            skip_factors: (1.01, 0.9),
            max_heat: 100.0,
            safe_heat: 90.0,
            landing_corridor: 25.0,
            safe_speed: 2.5,
            trail_capacity: 100,
        }
    }
}

/// Where an entry angle falls relative to the ideal corridor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AngleBand {
    TooSteep,
    Ideal,
    TooShallow,
}

impl EntryConfig {
    pub fn band(&self) -> AngleBand {
        if self.entry_angle < self.ideal_min_angle {
            AngleBand::TooSteep
        } else if self.entry_angle > self.ideal_max_angle {
            AngleBand::TooShallow
        } else {
            AngleBand::Ideal
        }
    }

    fn altitude(&self, pos: Vec2) -> f32 {
        pos.distance(self.planet_center) - self.planet_radius
    }

    fn out_of_view(&self, pos: Vec2) -> bool {
        pos.x < 0.0 || pos.x > self.width || pos.y > self.height
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryState {
    pub pos: Vec2,
    pub vel: Vec2,
    pub heat: f32,
    pub trail: Trail,
}

#[derive(Debug, Clone, Default)]
pub struct AtmosphericEntry {
    pub config: EntryConfig,
}

impl AtmosphericEntry {
    pub fn new(config: EntryConfig) -> Self {
        Self { config }
    }

    pub fn with_angle(entry_angle: f32) -> Self {
        Self::new(EntryConfig {
            entry_angle,
            ..Default::default()
        })
    }
}

impl Mission for AtmosphericEntry {
    type State = EntryState;
    type Control = Infallible;

    fn name(&self) -> &'static str {
        "atmospheric-entry"
    }

    fn initial_state(&self, _rng: &mut SimRng) -> EntryState {
        let cfg = &self.config;
        let angle = cfg.entry_angle.to_radians();
        EntryState {
            pos: cfg.start,
            vel: Vec2::new(angle.sin(), angle.cos()) * cfg.entry_speed,
            heat: 0.0,
            trail: Trail::new(cfg.trail_capacity),
        }
    }

    fn step(
        &self,
        state: &EntryState,
        _control: Option<&Infallible>,
        dt: f32,
        _rng: &mut SimRng,
    ) -> Step<EntryState> {
        let cfg = &self.config;
        let mut next = state.clone();

        let altitude = cfg.altitude(next.pos);
        if altitude < cfg.atmosphere_thickness {
            next.vel.y += cfg.gravity * dt;
            let speed = next.vel.length();
            match cfg.band() {
                AngleBand::TooSteep => {
                    let excess = cfg.ideal_min_angle - cfg.entry_angle;
                    next.heat += (excess * cfg.steep_heat_per_degree
                        + speed * cfg.steep_heat_per_speed)
                        * dt;
                }
                AngleBand::TooShallow if altitude > cfg.atmosphere_thickness / 2.0 => {
                    next.vel.x *= cfg.skip_factors.0;
                    next.vel.y *= cfg.skip_factors.1;
                }
                _ => next.heat += speed * cfg.ideal_heat_per_speed * dt,
            }
            next.vel *= cfg.drag;
        }

        next.pos += next.vel * dt;
        next.trail.push(next.pos);

        let altitude = cfg.altitude(next.pos);
        let verdict = if next.heat > cfg.max_heat {
            Verdict::Fail(Failure::BurnedUp)
        } else if altitude < 0.0 {
            Verdict::Fail(Failure::PlanetImpact)
        } else if cfg.out_of_view(next.pos) {
            Verdict::Fail(Failure::OffCourse)
        } else if altitude < cfg.landing_corridor
            && next.heat < cfg.safe_heat
            && next.vel.length() < cfg.safe_speed
        {
            Verdict::Succeed
        } else {
            Verdict::Continue
        };

        Step::new(next).with_verdict(verdict)
    }
}
