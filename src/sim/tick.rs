//! Fixed timestep simulation tick
//!
//! The engine shared by every mini-game: a `Mission` supplies initial state,
//! per-tick physics and terminal predicates; `advance` applies one tick and
//! owns the outcome state machine.

use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::state::{Failure, Outcome, RngState, SimRng, TickEvent, Verdict};

/// One parameterization of the tick engine
pub trait Mission {
    type State: Clone + fmt::Debug;
    type Control: fmt::Debug;

    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Fixed timestep the mini-game was tuned for
    fn default_dt(&self) -> f32 {
        1.0
    }

    /// Build the starting state. Obstacles and targets are generated here,
    /// once per episode, from the injected RNG.
    fn initial_state(&self, rng: &mut SimRng) -> Self::State;

    /// Apply at most one control intent, integrate physics and evaluate the
    /// terminal predicates against the updated state.
    fn step(
        &self,
        state: &Self::State,
        control: Option<&Self::Control>,
        dt: f32,
        rng: &mut SimRng,
    ) -> Step<Self::State>;
}

/// Output of `Mission::step`
#[derive(Debug, Clone)]
pub struct Step<S> {
    pub state: S,
    pub verdict: Verdict,
    pub events: Vec<TickEvent>,
}

impl<S> Step<S> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            verdict: Verdict::Continue,
            events: Vec::new(),
        }
    }

    pub fn with_verdict(mut self, verdict: Verdict) -> Self {
        self.verdict = verdict;
        self
    }

    pub fn with_events(mut self, events: Vec<TickEvent>) -> Self {
        self.events = events;
        self
    }
}

/// Read-only snapshot handed to renderers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame<S> {
    pub state: S,
    pub outcome: Outcome,
    /// Ticks applied since the episode started
    pub tick: u64,
}

impl<S> Frame<S> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            outcome: Outcome::Running,
            tick: 0,
        }
    }
}

/// Emitted exactly once, on the Running -> terminal transition
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalSignal {
    Succeeded,
    Failed(Failure),
}

/// Result of advancing a frame by one tick
#[derive(Debug, Clone)]
pub struct Advance<S> {
    pub frame: Frame<S>,
    pub signal: Option<TerminalSignal>,
    pub events: Vec<TickEvent>,
}

/// Advance a frame by one fixed timestep.
///
/// A terminal frame is returned unchanged with no signal, so calling this
/// after the episode ended is harmless.
pub fn advance<M: Mission>(
    mission: &M,
    frame: &Frame<M::State>,
    control: Option<&M::Control>,
    dt: f32,
    rng: &mut SimRng,
) -> Advance<M::State> {
    if frame.outcome.is_terminal() {
        return Advance {
            frame: frame.clone(),
            signal: None,
            events: Vec::new(),
        };
    }

    let Step {
        state,
        verdict,
        events,
    } = mission.step(&frame.state, control, dt, rng);

    let (outcome, signal) = match verdict {
        Verdict::Continue => (Outcome::Running, None),
        Verdict::Succeed => (Outcome::Succeeded, Some(TerminalSignal::Succeeded)),
        Verdict::Fail(failure) => (
            Outcome::Failed(failure.clone()),
            Some(TerminalSignal::Failed(failure)),
        ),
    };

    Advance {
        frame: Frame {
            state,
            outcome,
            tick: frame.tick + 1,
        },
        signal,
        events,
    }
}

/// A running mini-game: mission parameters, RNG and the current frame
pub struct Episode<M: Mission> {
    mission: M,
    rng_state: RngState,
    rng: SimRng,
    frame: Frame<M::State>,
    last_events: Vec<TickEvent>,
}

impl<M: Mission> Episode<M> {
    pub fn new(mission: M, seed: u64) -> Self {
        let rng_state = RngState::new(seed);
        let mut rng = rng_state.to_rng();
        let state = mission.initial_state(&mut rng);
        info!("{} started (seed {})", mission.name(), seed);
        Self {
            mission,
            rng_state,
            rng,
            frame: Frame::new(state),
            last_events: Vec::new(),
        }
    }

    /// Apply one tick. Returns the terminal signal if this tick ended the
    /// episode.
    pub fn tick(&mut self, control: Option<&M::Control>, dt: f32) -> Option<TerminalSignal> {
        let Advance {
            frame,
            signal,
            events,
        } = advance(&self.mission, &self.frame, control, dt, &mut self.rng);

        for event in &events {
            match event {
                TickEvent::ControlRejected(reason) => {
                    debug!("{}: control rejected: {}", self.mission.name(), reason)
                }
                TickEvent::Advisory(message) => debug!("{}: {}", self.mission.name(), message),
                TickEvent::ControlApplied => {}
            }
        }

        match &signal {
            Some(TerminalSignal::Succeeded) => {
                info!("{} succeeded after {} ticks", self.mission.name(), frame.tick)
            }
            Some(TerminalSignal::Failed(failure @ Failure::ControlError(_))) => {
                warn!("{} failed: {}", self.mission.name(), failure)
            }
            Some(TerminalSignal::Failed(failure)) => {
                info!("{} failed after {} ticks: {}", self.mission.name(), frame.tick, failure)
            }
            None => {}
        }

        self.frame = frame;
        self.last_events = events;
        signal
    }

    /// Tick with the mission's own timestep
    pub fn tick_default(&mut self, control: Option<&M::Control>) -> Option<TerminalSignal> {
        let dt = self.mission.default_dt();
        self.tick(control, dt)
    }

    /// Full reinitialisation: fresh initial state on the next RNG stream,
    /// outcome back to Running, tick counter back to zero.
    pub fn reset(&mut self) {
        self.rng_state.next_stream();
        self.rng = self.rng_state.to_rng();
        self.frame = Frame::new(self.mission.initial_state(&mut self.rng));
        self.last_events.clear();
        info!("{} reset", self.mission.name());
    }

    pub fn mission(&self) -> &M {
        &self.mission
    }

    pub fn seed(&self) -> u64 {
        self.rng_state.seed
    }

    pub fn frame(&self) -> &Frame<M::State> {
        &self.frame
    }

    pub fn state(&self) -> &M::State {
        &self.frame.state
    }

    pub fn outcome(&self) -> &Outcome {
        &self.frame.outcome
    }

    pub fn is_running(&self) -> bool {
        self.frame.outcome.is_running()
    }

    /// Events produced by the most recent tick
    pub fn last_events(&self) -> &[TickEvent] {
        &self.last_events
    }
}
