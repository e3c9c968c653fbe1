//! Landing control
//!
//! The learner writes the decision logic. Every tick the controller sees the
//! current altitude and velocity and returns a command; anything that goes
//! wrong inside it (an error or a panic) fails the landing instead of taking
//! down the host.

use std::convert::Infallible;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::physics::spend;
use crate::sim::state::{Failure, SimRng, TickEvent, Verdict};
use crate::sim::tick::{Mission, Step};

/// What the lander should do this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    FireThrusters,
    DeployLandingGear,
    Monitor,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::FireThrusters => "FIRE_THRUSTERS",
            Command::DeployLandingGear => "DEPLOY_LANDING_GEAR",
            Command::Monitor => "MONITOR",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FIRE_THRUSTERS" => Ok(Command::FireThrusters),
            "DEPLOY_LANDING_GEAR" => Ok(Command::DeployLandingGear),
            "MONITOR" => Ok(Command::Monitor),
            other => Err(ControlError::UnknownCommand(other.to_string())),
        }
    }
}

/// Runtime failure of learner-authored control logic
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ControlError {
    #[error("unrecognized command '{0}'")]
    UnknownCommand(String),
    #[error("no rule matched altitude {altitude:.1}, velocity {velocity:.1}")]
    NoRuleMatched { altitude: f32, velocity: f32 },
    #[error("controller panicked: {0}")]
    Panicked(String),
    #[error("{0}")]
    Custom(String),
}

/// Decision function invoked once per tick
///
/// Panics are caught and turned into a failed landing on native targets.
/// On `wasm32` panics abort the module, so web controllers must report
/// problems through `ControlError` instead of panicking.
pub trait Controller {
    fn command(&self, altitude: f32, velocity: f32) -> Result<Command, ControlError>;
}

impl<F> Controller for F
where
    F: Fn(f32, f32) -> Result<Command, ControlError>,
{
    fn command(&self, altitude: f32, velocity: f32) -> Result<Command, ControlError> {
        self(altitude, velocity)
    }
}

/// Invoke a controller behind a panic boundary
fn evaluate(
    controller: &dyn Controller,
    altitude: f32,
    velocity: f32,
) -> Result<Command, ControlError> {
    match catch_unwind(AssertUnwindSafe(|| controller.command(altitude, velocity))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(ControlError::Panicked(message))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandingConfig {
    pub start_altitude: f32,
    /// Downward positive
    pub start_velocity: f32,
    pub fuel: f32,
    pub gravity: f32,
    pub thrust_power: f32,
    pub fuel_per_burn: f32,
    pub safe_landing_velocity: f32,
    pub dt: f32,
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            start_altitude: 500.0,
            start_velocity: 30.0,
            fuel: 100.0,
            gravity: 1.0,
            thrust_power: 6.0,
            fuel_per_burn: 1.0,
            safe_landing_velocity: 5.0,
            dt: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanderState {
    pub altitude: f32,
    pub velocity: f32,
    pub fuel: f32,
    pub landing_gear_deployed: bool,
    pub thrusters_active: bool,
    /// Telemetry, one line per tick
    pub flight_log: Vec<String>,
}

/// Landing mission driven by a learner-supplied controller
pub struct LandingControl {
    pub config: LandingConfig,
    controller: Box<dyn Controller>,
}

impl LandingControl {
    pub fn new(config: LandingConfig, controller: impl Controller + 'static) -> Self {
        Self {
            config,
            controller: Box::new(controller),
        }
    }

    pub fn with_controller(controller: impl Controller + 'static) -> Self {
        Self::new(LandingConfig::default(), controller)
    }
}

impl fmt::Debug for LandingControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LandingControl")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Mission for LandingControl {
    type State = LanderState;
    /// The controller decides everything
    type Control = Infallible;

    fn name(&self) -> &'static str {
        "landing-control"
    }

    fn default_dt(&self) -> f32 {
        self.config.dt
    }

    fn initial_state(&self, _rng: &mut SimRng) -> LanderState {
        LanderState {
            altitude: self.config.start_altitude,
            velocity: self.config.start_velocity,
            fuel: self.config.fuel,
            landing_gear_deployed: false,
            thrusters_active: false,
            flight_log: Vec::new(),
        }
    }

    fn step(
        &self,
        state: &LanderState,
        _control: Option<&Infallible>,
        dt: f32,
        _rng: &mut SimRng,
    ) -> Step<LanderState> {
        let cfg = &self.config;
        let mut next = state.clone();
        let mut events = Vec::new();

        let command = match evaluate(self.controller.as_ref(), state.altitude, state.velocity) {
            Ok(command) => command,
            Err(error) => {
                next.flight_log.push(format!("Error: {error}"));
                return Step::new(next).with_verdict(Verdict::Fail(Failure::ControlError(error)));
            }
        };

        next.thrusters_active = false;
        match command {
            Command::FireThrusters => match spend(next.fuel, cfg.fuel_per_burn) {
                Ok(fuel) => {
                    next.fuel = fuel;
                    next.thrusters_active = true;
                    events.push(TickEvent::ControlApplied);
                }
                Err(reason) => events.push(TickEvent::ControlRejected(reason)),
            },
            Command::DeployLandingGear => next.landing_gear_deployed = true,
            Command::Monitor => {}
        }

        next.flight_log.push(format!(
            "Altitude: {:.0}m, Velocity: {:.1}m/s, Command: {}",
            state.altitude, state.velocity, command
        ));

        let thrust = if next.thrusters_active {
            cfg.thrust_power
        } else {
            0.0
        };
        next.velocity += (cfg.gravity - thrust) * dt;
        next.altitude = (next.altitude - next.velocity * dt).max(0.0);

        let verdict = if next.altitude <= 0.0 {
            if !next.landing_gear_deployed {
                Verdict::Fail(Failure::GearNotDeployed)
            } else if next.velocity > cfg.safe_landing_velocity {
                Verdict::Fail(Failure::LandingTooFast {
                    impact_velocity: next.velocity,
                })
            } else {
                next.flight_log.push(format!(
                    "Touchdown at {:.1}m/s with {:.0} fuel remaining",
                    next.velocity, next.fuel
                ));
                Verdict::Succeed
            }
        } else {
            Verdict::Continue
        };

        Step::new(next).with_verdict(verdict).with_events(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Outcome;
    use crate::sim::tick::Episode;

    fn fly(mission: LandingControl) -> Episode<LandingControl> {
        let mut episode = Episode::new(mission, 1);
        for _ in 0..10_000 {
            if episode.tick_default(None).is_some() {
                break;
            }
        }
        episode
    }

    type Reply = Result<Command, ControlError>;

    fn two_rule(
        fire_below: f32,
        fire_over: f32,
        gear_below: f32,
        gear_over: f32,
    ) -> LandingControl {
        LandingControl::with_controller(move |altitude: f32, velocity: f32| -> Reply {
            if altitude < fire_below && velocity > fire_over {
                Ok(Command::FireThrusters)
            } else if altitude < gear_below && velocity > gear_over {
                Ok(Command::DeployLandingGear)
            } else {
                Ok(Command::Monitor)
            }
        })
    }

    #[test]
    fn test_command_names() {
        assert_eq!("MONITOR".parse::<Command>(), Ok(Command::Monitor));
        assert_eq!(Command::FireThrusters.to_string(), "FIRE_THRUSTERS");
        assert_eq!(
            "LAUNCH_ROCKET".parse::<Command>(),
            Err(ControlError::UnknownCommand("LAUNCH_ROCKET".into()))
        );
    }

    #[test]
    fn test_braking_controller_lands() {
        let episode = fly(two_rule(200.0, 4.0, 100.0, 1.0));
        assert_eq!(episode.outcome(), &Outcome::Succeeded);
        let state = episode.state();
        assert!(state.landing_gear_deployed);
        assert!(state.velocity <= 5.0);
        assert!(state.fuel >= 0.0 && state.fuel < 100.0);
        assert!(state.flight_log[0].starts_with("Altitude: 500m, Velocity: 30.0m/s"));
    }

    #[test]
    fn test_late_burn_lands_too_fast() {
        // never brakes: velocity only exceeds 50 well after 1000 m
        let episode = fly(two_rule(1000.0, 50.0, 100.0, 10.0));
        match episode.outcome() {
            Outcome::Failed(Failure::LandingTooFast { impact_velocity }) => {
                assert!(*impact_velocity > 40.0);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(episode.state().fuel, 100.0);
    }

    #[test]
    fn test_gear_never_deployed() {
        let episode = fly(two_rule(200.0, 4.0, -1.0, 1.0));
        assert_eq!(episode.outcome(), &Outcome::Failed(Failure::GearNotDeployed));
        assert_eq!(
            episode.outcome().failure().map(|f| f.to_string()),
            Some("Landing gear was not deployed".to_string())
        );
    }

    #[test]
    fn test_controller_error_fails_episode() {
        let mission = LandingControl::with_controller(|altitude: f32, _velocity: f32| -> Reply {
            if altitude < 450.0 {
                Err(ControlError::Custom("sensor offline".into()))
            } else {
                Ok(Command::Monitor)
            }
        });
        let episode = fly(mission);
        assert_eq!(
            episode.outcome(),
            &Outcome::Failed(Failure::ControlError(ControlError::Custom(
                "sensor offline".into()
            )))
        );
        let last = episode.state().flight_log.last();
        assert!(last.is_some_and(|line| line.starts_with("Error:")));
    }

    #[test]
    #[cfg(not(target_arch = "wasm32"))]
    fn test_controller_panic_is_contained() {
        let mission =
            LandingControl::with_controller(|_altitude: f32, _velocity: f32| -> Reply {
                panic!("divide by zero")
            });
        let mut episode = Episode::new(mission, 1);
        let signal = episode.tick_default(None);
        assert!(signal.is_some());
        assert_eq!(
            episode.outcome(),
            &Outcome::Failed(Failure::ControlError(ControlError::Panicked(
                "divide by zero".into()
            )))
        );
        // state was not advanced past the failing tick
        assert_eq!(episode.state().altitude, 500.0);
    }

    #[test]
    fn test_thrust_needs_fuel() {
        let mission = LandingControl::new(
            LandingConfig {
                fuel: 0.0,
                ..Default::default()
            },
            |_: f32, _: f32| -> Result<Command, ControlError> { Ok(Command::FireThrusters) },
        );
        let mut episode = Episode::new(mission, 1);
        episode.tick_default(None);
        let state = episode.state();
        assert!(!state.thrusters_active);
        assert!(state.velocity > 30.0);
        assert_eq!(state.fuel, 0.0);
    }
}
