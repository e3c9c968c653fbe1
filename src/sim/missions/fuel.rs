//! Fuel optimization
//!
//! A turn-based resource puzzle: each burn trades fuel for distance at a
//! random efficiency, and occasional difficulty spikes leak fuel. There is
//! no continuous integration, so `dt` is ignored.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sim::physics::spend;
use crate::sim::state::{Failure, Rejection, SimRng, TickEvent, Verdict};
use crate::sim::tick::{Mission, Step};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelConfig {
    pub max_fuel: f32,
    pub target_distance: f32,
    /// Allowed burn amounts; empty means any positive amount
    pub burn_options: Vec<f32>,
    /// Distance per unit of fuel is drawn from `[min, max)`
    pub efficiency_range: (f32, f32),
    /// Chance of a difficulty spike after each burn
    pub spike_chance: f64,
    /// A spike removes up to this fraction of the remaining fuel
    pub spike_max_loss: f32,
    pub score_multiplier: f32,
}

impl Default for FuelConfig {
    fn default() -> Self {
        Self {
            max_fuel: 1000.0,
            target_distance: 5000.0,
            burn_options: vec![50.0, 100.0, 200.0],
            efficiency_range: (1.0, 3.0),
            spike_chance: 0.3,
            spike_max_loss: 0.1,
            score_multiplier: 1.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FuelControl {
    Burn { amount: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnRecord {
    pub fuel_used: f32,
    pub efficiency: f32,
    pub distance_gained: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelState {
    pub fuel: f32,
    pub distance: f32,
    pub burns: Vec<BurnRecord>,
    pub spikes: u32,
    /// Set when the episode ends
    pub score: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct FuelOptimization {
    pub config: FuelConfig,
}

impl FuelOptimization {
    pub fn new(config: FuelConfig) -> Self {
        Self { config }
    }

    /// Cheapest burn a player may still choose
    pub fn smallest_burn(&self) -> f32 {
        self.config
            .burn_options
            .iter()
            .copied()
            .reduce(f32::min)
            .unwrap_or(f32::MIN_POSITIVE)
    }

    pub fn score(&self, distance: f32) -> u64 {
        (distance * self.config.score_multiplier).floor() as u64
    }

    fn allowed(&self, amount: f32) -> bool {
        self.config.burn_options.is_empty() || self.config.burn_options.contains(&amount)
    }
}

impl Mission for FuelOptimization {
    type State = FuelState;
    type Control = FuelControl;

    fn name(&self) -> &'static str {
        "fuel-optimization"
    }

    fn initial_state(&self, _rng: &mut SimRng) -> FuelState {
        FuelState {
            fuel: self.config.max_fuel,
            distance: 0.0,
            burns: Vec::new(),
            spikes: 0,
            score: None,
        }
    }

    fn step(
        &self,
        state: &FuelState,
        control: Option<&FuelControl>,
        _dt: f32,
        rng: &mut SimRng,
    ) -> Step<FuelState> {
        let cfg = &self.config;
        let mut next = state.clone();
        let mut events = Vec::new();

        if let Some(&FuelControl::Burn { amount }) = control {
            let spent = if self.allowed(amount) {
                spend(next.fuel, amount)
            } else {
                Err(Rejection::InvalidAmount)
            };
            match spent {
                Ok(fuel) => {
                    let (low, high) = cfg.efficiency_range;
                    let efficiency = if high > low {
                        rng.random_range(low..high)
                    } else {
                        low
                    };
                    let gained = amount * efficiency;
                    next.fuel = fuel;
                    next.distance += gained;
                    next.burns.push(BurnRecord {
                        fuel_used: amount,
                        efficiency,
                        distance_gained: gained,
                    });
                    events.push(TickEvent::ControlApplied);

                    if rng.random_bool(cfg.spike_chance.clamp(0.0, 1.0)) {
                        let loss = if cfg.spike_max_loss > 0.0 {
                            rng.random_range(0.0..cfg.spike_max_loss)
                        } else {
                            0.0
                        };
                        next.fuel *= 1.0 - loss;
                        next.spikes += 1;
                        events.push(TickEvent::Advisory("Difficulty spike! Fuel leak detected"));
                    }
                }
                Err(reason) => events.push(TickEvent::ControlRejected(reason)),
            }
        }

        let verdict = if next.distance >= cfg.target_distance {
            Verdict::Succeed
        } else if next.fuel < self.smallest_burn() {
            Verdict::Fail(Failure::OutOfFuel {
                distance: next.distance,
                target: cfg.target_distance,
            })
        } else {
            Verdict::Continue
        };
        if verdict != Verdict::Continue {
            next.score = Some(self.score(next.distance));
        }

        Step::new(next).with_verdict(verdict).with_events(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Outcome;
    use crate::sim::tick::Episode;
    use proptest::prelude::*;

    fn no_spikes() -> FuelOptimization {
        FuelOptimization::new(FuelConfig {
            spike_chance: 0.0,
            ..Default::default()
        })
    }

    #[test]
    fn test_five_big_burns_run_dry() {
        let mut episode = Episode::new(no_spikes(), 2024);
        let burn = FuelControl::Burn { amount: 200.0 };
        for _ in 0..5 {
            episode.tick(Some(&burn), 1.0);
        }

        let state = episode.state();
        assert_eq!(state.fuel, 0.0);
        assert_eq!(state.burns.len(), 5);
        assert!(state.distance >= 1000.0 && state.distance < 3000.0);
        assert!(matches!(
            episode.outcome(),
            Outcome::Failed(Failure::OutOfFuel { .. })
        ));
        assert_eq!(state.score, Some((state.distance * 1.2).floor() as u64));
    }

    #[test]
    fn test_burn_log_adds_up() {
        let mut episode = Episode::new(no_spikes(), 9);
        for amount in [50.0, 100.0, 200.0] {
            episode.tick(Some(&FuelControl::Burn { amount }), 1.0);
        }
        let state = episode.state();
        let total: f32 = state.burns.iter().map(|b| b.distance_gained).sum();
        assert!((total - state.distance).abs() < 1e-2);
        assert_eq!(state.fuel, 650.0);
        for burn in &state.burns {
            assert!((1.0..3.0).contains(&burn.efficiency));
        }
        assert_eq!(state.score, None);
    }

    #[test]
    fn test_unlisted_amount_rejected() {
        let mut episode = Episode::new(no_spikes(), 1);
        episode.tick(Some(&FuelControl::Burn { amount: 75.0 }), 1.0);
        assert_eq!(episode.state().fuel, 1000.0);
        assert_eq!(
            episode.last_events(),
            &[TickEvent::ControlRejected(Rejection::InvalidAmount)]
        );
    }

    #[test]
    fn test_generous_config_succeeds() {
        let mission = FuelOptimization::new(FuelConfig {
            target_distance: 500.0,
            spike_chance: 0.0,
            ..Default::default()
        });
        let mut episode = Episode::new(mission, 3);
        let burn = FuelControl::Burn { amount: 200.0 };
        let mut ticks = 0;
        while episode.is_running() {
            episode.tick(Some(&burn), 1.0);
            ticks += 1;
        }
        assert_eq!(episode.outcome(), &Outcome::Succeeded);
        assert!(ticks <= 3);
        assert!(episode.state().score.is_some());
    }

    #[test]
    fn test_spikes_only_leak_fuel() {
        let mission = FuelOptimization::new(FuelConfig {
            spike_chance: 1.0,
            ..Default::default()
        });
        let mut episode = Episode::new(mission, 5);
        episode.tick(Some(&FuelControl::Burn { amount: 100.0 }), 1.0);
        let state = episode.state();
        assert_eq!(state.spikes, 1);
        assert!(state.fuel <= 900.0 && state.fuel > 810.0);
        let spike = TickEvent::Advisory("Difficulty spike! Fuel leak detected");
        assert!(episode.last_events().contains(&spike));
    }

    proptest! {
        #[test]
        fn prop_fuel_never_negative(
            seed in 0u64..500,
            picks in proptest::collection::vec(0usize..4, 0..40),
        ) {
            let mut episode = Episode::new(FuelOptimization::default(), seed);
            let options = [50.0, 100.0, 200.0, 400.0];
            for pick in picks {
                let burn = FuelControl::Burn { amount: options[pick] };
                episode.tick(Some(&burn), 1.0);
                prop_assert!(episode.state().fuel >= 0.0);
            }
        }
    }
}
