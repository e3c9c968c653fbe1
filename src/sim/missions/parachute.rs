//! Parachute deployment
//!
//! A capsule falls through a thin atmosphere. Deploying the parachute raises
//! drag enough to reach a survivable terminal velocity; deploying too high
//! risks drifting off target.

use serde::{Deserialize, Serialize};

use crate::sim::state::{Failure, Rejection, SimRng, TickEvent, Verdict};
use crate::sim::tick::{Mission, Step};

pub const DRIFT_ADVISORY: &str =
    "Parachute deployed high: wind drift may carry the capsule off target";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParachuteConfig {
    /// Metres
    pub start_altitude: f32,
    /// Metres per second, downward positive
    pub start_velocity: f32,
    pub gravity: f32,
    pub air_density: f32,
    pub capsule_drag: f32,
    pub parachute_drag: f32,
    pub safe_landing_velocity: f32,
    /// Deploying above this altitude raises the drift advisory
    pub drift_altitude: f32,
    /// Seconds per tick
    pub dt: f32,
}

impl Default for ParachuteConfig {
    fn default() -> Self {
        Self {
            start_altitude: 5000.0,
            start_velocity: 100.0,
            gravity: 9.8,
            air_density: 0.8,
            capsule_drag: 0.5,
            parachute_drag: 150.0,
            safe_landing_velocity: 10.0,
            drift_altitude: 3000.0,
            dt: 0.1,
        }
    }
}

impl ParachuteConfig {
    fn drag(&self, deployed: bool) -> f32 {
        if deployed {
            self.parachute_drag
        } else {
            self.capsule_drag
        }
    }

    /// Speed at which drag balances gravity
    pub fn terminal_velocity(&self, deployed: bool) -> f32 {
        let k = self.drag(deployed) * self.air_density / 1000.0;
        if k > 0.0 {
            (self.gravity / k).sqrt()
        } else {
            f32::INFINITY
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParachuteControl {
    Deploy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescentState {
    pub altitude: f32,
    pub velocity: f32,
    pub parachute_deployed: bool,
    /// Altitude at which the parachute opened
    pub deployed_at: Option<f32>,
}

impl DescentState {
    pub fn drift_risk(&self, config: &ParachuteConfig) -> bool {
        self.parachute_deployed && self.altitude > config.drift_altitude
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParachuteDeployment {
    pub config: ParachuteConfig,
}

impl ParachuteDeployment {
    pub fn new(config: ParachuteConfig) -> Self {
        Self { config }
    }
}

impl Mission for ParachuteDeployment {
    type State = DescentState;
    type Control = ParachuteControl;

    fn name(&self) -> &'static str {
        "parachute-deployment"
    }

    fn default_dt(&self) -> f32 {
        self.config.dt
    }

    fn initial_state(&self, _rng: &mut SimRng) -> DescentState {
        DescentState {
            altitude: self.config.start_altitude,
            velocity: self.config.start_velocity,
            parachute_deployed: false,
            deployed_at: None,
        }
    }

    fn step(
        &self,
        state: &DescentState,
        control: Option<&ParachuteControl>,
        dt: f32,
        _rng: &mut SimRng,
    ) -> Step<DescentState> {
        let cfg = &self.config;
        let mut next = state.clone();
        let mut events = Vec::new();

        if let Some(ParachuteControl::Deploy) = control {
            if next.parachute_deployed {
                events.push(TickEvent::ControlRejected(Rejection::AlreadyDeployed));
            } else {
                next.parachute_deployed = true;
                next.deployed_at = Some(next.altitude);
                events.push(TickEvent::ControlApplied);
            }
        }

        let drag = cfg.drag(next.parachute_deployed);
        let accel = cfg.gravity - drag * cfg.air_density * next.velocity * next.velocity / 1000.0;
        let mut velocity = next.velocity + accel * dt;
        if accel < 0.0 {
            // explicit Euler overshoots under heavy drag
            velocity = velocity.max(cfg.terminal_velocity(next.parachute_deployed));
        }
        next.velocity = velocity.max(0.0);
        next.altitude = (next.altitude - next.velocity * dt).max(0.0);

        if next.drift_risk(cfg) {
            events.push(TickEvent::Advisory(DRIFT_ADVISORY));
        }

        let verdict = if next.altitude <= 0.0 {
            if next.velocity <= cfg.safe_landing_velocity {
                Verdict::Succeed
            } else {
                Verdict::Fail(Failure::HardLanding {
                    impact_velocity: next.velocity,
                })
            }
        } else {
            Verdict::Continue
        };

        Step::new(next).with_verdict(verdict).with_events(events)
    }
}
