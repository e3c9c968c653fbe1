//! Zero-gravity navigation
//!
//! Rotate and thrust toward a target with no external forces. Space wraps
//! around at the edges, and a little friction keeps the craft controllable.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::physics::spend;
use crate::sim::state::{Failure, SimRng, TickEvent, Verdict};
use crate::sim::tick::{Mission, Step};
use crate::{heading, normalize_degrees, wrap_position};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZeroGConfig {
    pub width: f32,
    pub height: f32,
    pub fuel: f32,
    /// Velocity added per thrust
    pub thrust_power: f32,
    pub thrust_cost: f32,
    /// Degrees turned per rotate intent
    pub rotation_step: f32,
    pub rotation_cost: f32,
    /// Velocity multiplier applied once per tick
    pub friction: f32,
    pub target: Vec2,
    pub target_radius: f32,
    /// Below this speed an empty craft is considered adrift
    pub drift_speed: f32,
}

impl Default for ZeroGConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 600.0,
            fuel: 100.0,
            thrust_power: 0.5,
            thrust_cost: 1.0,
            rotation_step: 3.0,
            rotation_cost: 0.5,
            friction: 0.99,
            target: Vec2::new(500.0, 100.0),
            target_radius: 30.0,
            drift_speed: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavControl {
    RotateLeft,
    RotateRight,
    Thrust,
}

/// Circular goal region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub pos: Vec2,
    pub radius: f32,
    pub reached: bool,
}

impl Target {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            radius,
            reached: false,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.distance(self.pos) < self.radius
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavState {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Nose direction in degrees; 0 points up the screen
    pub rotation: f32,
    pub fuel: f32,
    /// Thrust was applied this tick (flame rendering)
    pub thrusting: bool,
    pub target: Target,
}

#[derive(Debug, Clone, Default)]
pub struct ZeroGravityNavigation {
    pub config: ZeroGConfig,
}

impl ZeroGravityNavigation {
    pub fn new(config: ZeroGConfig) -> Self {
        Self { config }
    }

    fn cheapest_action(&self) -> f32 {
        self.config.rotation_cost.min(self.config.thrust_cost)
    }
}

impl Mission for ZeroGravityNavigation {
    type State = NavState;
    type Control = NavControl;

    fn name(&self) -> &'static str {
        "zero-gravity-navigation"
    }

    fn initial_state(&self, _rng: &mut SimRng) -> NavState {
        let cfg = &self.config;
        NavState {
            pos: Vec2::new(cfg.width / 2.0, cfg.height / 2.0),
            vel: Vec2::ZERO,
            rotation: 0.0,
            fuel: cfg.fuel,
            thrusting: false,
            target: Target::new(cfg.target, cfg.target_radius),
        }
    }

    fn step(
        &self,
        state: &NavState,
        control: Option<&NavControl>,
        dt: f32,
        _rng: &mut SimRng,
    ) -> Step<NavState> {
        let cfg = &self.config;
        let mut next = state.clone();
        let mut events = Vec::new();
        next.thrusting = false;

        if let Some(&control) = control {
            let cost = match control {
                NavControl::RotateLeft | NavControl::RotateRight => cfg.rotation_cost,
                NavControl::Thrust => cfg.thrust_cost,
            };
            match spend(next.fuel, cost) {
                Ok(fuel) => {
                    next.fuel = fuel;
                    match control {
                        NavControl::RotateLeft => {
                            next.rotation = normalize_degrees(next.rotation - cfg.rotation_step)
                        }
                        NavControl::RotateRight => {
                            next.rotation = normalize_degrees(next.rotation + cfg.rotation_step)
                        }
                        NavControl::Thrust => {
                            next.vel += heading(next.rotation - 90.0) * cfg.thrust_power;
                            next.thrusting = true;
                        }
                    }
                    events.push(TickEvent::ControlApplied);
                }
                Err(reason) => events.push(TickEvent::ControlRejected(reason)),
            }
        }

        next.vel *= cfg.friction;
        next.pos = wrap_position(next.pos + next.vel * dt, cfg.width, cfg.height);

        let verdict = if next.target.contains(next.pos) {
            next.target.reached = true;
            Verdict::Succeed
        } else if next.fuel < self.cheapest_action() && next.vel.length() < cfg.drift_speed {
            Verdict::Fail(Failure::Adrift)
        } else {
            Verdict::Continue
        };

        Step::new(next).with_verdict(verdict).with_events(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Outcome, Rejection};
    use crate::sim::tick::{Episode, TerminalSignal};
    use proptest::prelude::*;

    fn episode() -> Episode<ZeroGravityNavigation> {
        Episode::new(ZeroGravityNavigation::default(), 1)
    }

    #[test]
    fn test_rotate_then_thrust_reaches_target() {
        let mut episode = episode();
        let plan: Vec<NavControl> = std::iter::repeat_n(NavControl::RotateRight, 15)
            .chain(std::iter::repeat_n(NavControl::Thrust, 6))
            .collect();

        let mut signal = None;
        for i in 0..400 {
            signal = episode.tick(plan.get(i), 1.0);
            if signal.is_some() {
                break;
            }
        }

        assert_eq!(signal, Some(TerminalSignal::Succeeded));
        assert!(episode.state().target.reached);
        assert!((episode.state().fuel - 86.5).abs() < 1e-3);
        assert!((episode.state().rotation - 45.0).abs() < 1e-4);
    }

    #[test]
    fn test_space_wraps() {
        let mut episode = episode();
        let mut state = episode.state().clone();
        state.pos = Vec2::new(300.0, 1.0);
        state.vel = Vec2::new(0.0, -3.0);
        let mut rng = crate::sim::RngState::new(1).to_rng();
        let step = episode.mission().step(&state, None, 1.0, &mut rng);
        assert!(step.state.pos.y > 590.0);
        assert_eq!(step.verdict, Verdict::Continue);
        episode.reset();
        assert_eq!(episode.state().pos, Vec2::new(300.0, 300.0));
    }

    #[test]
    fn test_spinning_out_of_fuel_is_adrift() {
        let mut episode = episode();
        let mut ticks = 0;
        while episode.is_running() && ticks < 500 {
            episode.tick(Some(&NavControl::RotateLeft), 1.0);
            ticks += 1;
        }
        assert_eq!(episode.outcome(), &Outcome::Failed(Failure::Adrift));
        assert_eq!(episode.state().fuel, 0.0);
        assert_eq!(ticks, 200);
    }

    #[test]
    fn test_thrust_rejected_without_fuel() {
        let mission = ZeroGravityNavigation::new(ZeroGConfig {
            fuel: 0.75,
            ..Default::default()
        });
        let mut rng = crate::sim::RngState::new(1).to_rng();
        let state = mission.initial_state(&mut rng);
        let step = mission.step(&state, Some(&NavControl::Thrust), 1.0, &mut rng);
        assert_eq!(step.state.fuel, 0.75);
        assert_eq!(step.state.vel, Vec2::ZERO);
        assert!(matches!(
            step.events.as_slice(),
            [TickEvent::ControlRejected(Rejection::InsufficientFuel { .. })]
        ));
        // a rotation is still affordable, so not adrift yet
        assert_eq!(step.verdict, Verdict::Continue);
    }

    proptest! {
        #[test]
        fn prop_fuel_never_negative(controls in proptest::collection::vec(0u8..4, 0..400)) {
            let mut episode = episode();
            for c in controls {
                let control = match c {
                    0 => Some(NavControl::RotateLeft),
                    1 => Some(NavControl::RotateRight),
                    2 => Some(NavControl::Thrust),
                    _ => None,
                };
                episode.tick(control.as_ref(), 1.0);
                prop_assert!(episode.state().fuel >= 0.0);
            }
        }
    }
}
