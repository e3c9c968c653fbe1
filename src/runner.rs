//! Host adapter
//!
//! Drives an `Episode` from a timer or animation-frame callback. The host
//! passes the current time; elapsed time is accumulated and converted into
//! fixed ticks. Every callback carries the `LoopHandle` it was armed with, so
//! a callback that outlives a reset or a page change is recognised as stale
//! and ignored.
//!
//! Single-threaded: the runner is the only writer of the episode.

use std::collections::VecDeque;

use log::{debug, info};

use crate::consts::*;
use crate::sim::{Episode, Failure, Frame, Mission, Outcome, TerminalSignal};

/// Loop timing
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    /// Wall-clock time per simulation tick (ms)
    pub tick_interval_ms: f64,
    /// Delay between success and the success notification (ms)
    pub success_delay_ms: f64,
    /// Ticks allowed per callback
    pub max_substeps: u32,
    /// Simulation timestep; `None` uses the mission's own
    pub dt: Option<f32>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: f64::from(TICK_INTERVAL_MS),
            success_delay_ms: f64::from(SUCCESS_DELAY_MS),
            max_substeps: MAX_SUBSTEPS,
            dt: None,
        }
    }
}

/// Identifies one armed tick source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoopHandle {
    generation: u64,
}

/// What the host should do after a callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Keep scheduling callbacks
    Continue,
    /// Episode finished and listeners were notified; stop scheduling
    Finished,
    /// Callback belongs to a cancelled loop; nothing was touched
    Stale,
}

type SuccessListener = Box<dyn FnMut()>;
type FailureListener = Box<dyn FnMut(&Failure)>;

pub struct MissionRunner<M: Mission> {
    config: RunnerConfig,
    episode: Option<Episode<M>>,
    generation: u64,
    armed: bool,
    pending: VecDeque<M::Control>,
    accumulator: f64,
    last_time_ms: Option<f64>,
    /// When the success notification is due
    success_due_ms: Option<f64>,
    on_success: Vec<SuccessListener>,
    on_failure: Vec<FailureListener>,
}

impl<M: Mission> MissionRunner<M> {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            episode: None,
            generation: 0,
            armed: false,
            pending: VecDeque::new(),
            accumulator: 0.0,
            last_time_ms: None,
            success_due_ms: None,
            on_success: Vec::new(),
            on_failure: Vec::new(),
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Begin a new episode, cancelling any previous loop
    pub fn start(&mut self, mission: M, seed: u64) -> LoopHandle {
        self.cancel();
        self.episode = Some(Episode::new(mission, seed));
        self.arm()
    }

    /// Restart the current mission from scratch. `None` if never started.
    pub fn reset(&mut self) -> Option<LoopHandle> {
        self.cancel();
        self.episode.as_mut()?.reset();
        Some(self.arm())
    }

    /// Deregister the tick source. Outstanding handles become stale.
    pub fn cancel(&mut self) {
        if self.armed {
            debug!("Loop {} cancelled", self.generation);
        }
        self.armed = false;
        self.generation += 1;
        self.pending.clear();
        self.success_due_ms = None;
    }

    fn arm(&mut self) -> LoopHandle {
        self.generation += 1;
        self.armed = true;
        self.pending.clear();
        self.accumulator = 0.0;
        self.last_time_ms = None;
        self.success_due_ms = None;
        LoopHandle {
            generation: self.generation,
        }
    }

    pub fn is_current(&self, handle: LoopHandle) -> bool {
        self.armed && handle.generation == self.generation
    }

    /// Queue a control intent for the next tick. Refused once the episode
    /// has ended or no loop is armed.
    pub fn apply_control(&mut self, intent: M::Control) -> bool {
        let running = self.episode.as_ref().is_some_and(Episode::is_running);
        if !self.armed || !running {
            return false;
        }
        self.pending.push_back(intent);
        true
    }

    pub fn subscribe_success(&mut self, listener: impl FnMut() + 'static) {
        self.on_success.push(Box::new(listener));
    }

    pub fn subscribe_failure(&mut self, listener: impl FnMut(&Failure) + 'static) {
        self.on_failure.push(Box::new(listener));
    }

    /// Read-only snapshot for renderers
    pub fn frame(&self) -> Option<&Frame<M::State>> {
        self.episode.as_ref().map(Episode::frame)
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.episode.as_ref().map(Episode::outcome)
    }

    pub fn episode(&self) -> Option<&Episode<M>> {
        self.episode.as_ref()
    }

    /// Timer callback
    pub fn on_frame(&mut self, handle: LoopHandle, now_ms: f64) -> FrameStatus {
        if !self.is_current(handle) {
            return FrameStatus::Stale;
        }
        let Some(episode) = self.episode.as_mut() else {
            return FrameStatus::Stale;
        };

        if self.success_due_ms.is_none() {
            let interval = self.config.tick_interval_ms.max(1.0);
            let max_substeps = self.config.max_substeps.max(1);
            // the first callback arrives one interval after arming
            let elapsed = match self.last_time_ms {
                Some(last) => (now_ms - last).max(0.0),
                None => interval,
            };
            self.last_time_ms = Some(now_ms);
            self.accumulator = (self.accumulator + elapsed).min(interval * f64::from(max_substeps));

            let dt = self.config.dt.unwrap_or_else(|| episode.mission().default_dt());
            let mut substeps = 0;
            while self.accumulator >= interval && substeps < max_substeps {
                self.accumulator -= interval;
                substeps += 1;

                let control = self.pending.pop_front();
                match episode.tick(control.as_ref(), dt) {
                    None => {}
                    Some(TerminalSignal::Succeeded) => {
                        self.pending.clear();
                        self.success_due_ms = Some(now_ms + self.config.success_delay_ms);
                        break;
                    }
                    Some(TerminalSignal::Failed(failure)) => {
                        self.pending.clear();
                        self.armed = false;
                        info!("Mission failed: {}", failure);
                        for listener in &mut self.on_failure {
                            listener(&failure);
                        }
                        return FrameStatus::Finished;
                    }
                }
            }
        }

        match self.success_due_ms {
            Some(due) if now_ms >= due => {
                self.success_due_ms = None;
                self.armed = false;
                info!("Mission accomplished");
                for listener in &mut self.on_success {
                    listener();
                }
                FrameStatus::Finished
            }
            _ => FrameStatus::Continue,
        }
    }
}

impl<M: Mission> Default for MissionRunner<M> {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}
