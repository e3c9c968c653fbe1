//! Shared simulation types
//!
//! Outcome state machine, failure reasons, control rejections and the bounded
//! trail buffer. Every mission variant speaks in these terms so the tick
//! engine and the host adapter never need to know which mini-game is running.

use std::collections::VecDeque;

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::missions::landing::ControlError;

/// RNG used by every mission (obstacle layout, burn efficiency, spikes)
pub type SimRng = Pcg32;

/// Lifecycle of an episode. Once terminal it never changes again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    #[default]
    Running,
    Succeeded,
    Failed(Failure),
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Running)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Outcome::Running)
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Coarse failure taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Craft overlapped an obstacle or the planet body
    Collision,
    /// Fuel ran out before the goal
    ResourceExhausted,
    /// Reached the ground or atmosphere in an unsafe state
    UnsafeTouchdown,
    /// Left the playable region
    OutOfBounds,
    /// Learner-authored control logic errored
    ControlEvaluation,
    /// Quiz score below the pass mark
    Assessment,
}

/// Why an episode failed. Each cause renders its own message.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum Failure {
    #[error("You crashed into an asteroid.")]
    AsteroidCollision,
    #[error("Your spacecraft crashed into the planet!")]
    PlanetImpact,
    #[error("Your spacecraft burned up in the atmosphere!")]
    BurnedUp,
    #[error("Your spacecraft went off course!")]
    OffCourse,
    #[error("The satellite escaped the planet's gravity!")]
    EscapedOrbit,
    #[error("Out of fuel and adrift. The target is out of reach.")]
    Adrift,
    #[error("Out of fuel! You reached {distance:.0} of {target:.0} km.")]
    OutOfFuel { distance: f32, target: f32 },
    #[error("Landing too hard! Impact velocity: {impact_velocity:.0} m/s")]
    HardLanding { impact_velocity: f32 },
    #[error("Landing gear was not deployed")]
    GearNotDeployed,
    #[error("Landing velocity too high: {impact_velocity:.1} m/s")]
    LandingTooFast { impact_velocity: f32 },
    #[error("Error in landing code: {0}")]
    ControlError(#[from] ControlError),
    #[error("You got {correct} out of {total} correct. You need at least {required} to pass.")]
    AnalysisBelowPassMark { correct: u32, total: u32, required: u32 },
}

impl Failure {
    pub fn kind(&self) -> FailureKind {
        match self {
            Failure::AsteroidCollision | Failure::PlanetImpact => FailureKind::Collision,
            Failure::Adrift | Failure::OutOfFuel { .. } => FailureKind::ResourceExhausted,
            Failure::BurnedUp
            | Failure::HardLanding { .. }
            | Failure::GearNotDeployed
            | Failure::LandingTooFast { .. } => FailureKind::UnsafeTouchdown,
            Failure::OffCourse | Failure::EscapedOrbit => FailureKind::OutOfBounds,
            Failure::ControlError(_) => FailureKind::ControlEvaluation,
            Failure::AnalysisBelowPassMark { .. } => FailureKind::Assessment,
        }
    }
}

/// Result of one tick's terminal predicates
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Continue,
    Succeed,
    Fail(Failure),
}

/// Why a control intent had no effect
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum Rejection {
    #[error("not enough fuel: need {required:.1}, have {available:.1}")]
    InsufficientFuel { required: f32, available: f32 },
    #[error("invalid amount")]
    InvalidAmount,
    #[error("already deployed")]
    AlreadyDeployed,
    #[error("Please answer all questions before submitting ({answered} of {required} answered)")]
    Incomplete { answered: usize, required: usize },
    #[error("control does not apply to this mission")]
    NotApplicable,
}

/// Side information produced by a tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickEvent {
    ControlApplied,
    ControlRejected(Rejection),
    Advisory(&'static str),
}

/// Bounded position history, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trail {
    points: VecDeque<Vec2>,
    capacity: usize,
}

impl Trail {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a point, evicting the oldest once full
    pub fn push(&mut self, point: Vec2) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn oldest(&self) -> Option<Vec2> {
        self.points.front().copied()
    }

    pub fn newest(&self) -> Option<Vec2> {
        self.points.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.points.iter().copied()
    }

    /// The most recent `count` points, oldest first
    pub fn recent(&self, count: usize) -> impl Iterator<Item = Vec2> + '_ {
        let skip = self.points.len().saturating_sub(count);
        self.points.iter().skip(skip).copied()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

/// Seed plus stream. `reset` moves to the next stream so a replayed episode
/// is reproducible while a reset one gets a fresh layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    pub fn to_rng(&self) -> SimRng {
        Pcg32::new(self.seed, self.stream)
    }

    pub fn next_stream(&mut self) {
        self.stream = self.stream.wrapping_add(1);
    }
}
