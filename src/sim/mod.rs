//! Deterministic simulation module
//!
//! All mini-game logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - At most one control intent per tick
//! - No rendering, timer or platform dependencies

pub mod missions;
pub mod physics;
pub mod program;
pub mod state;
pub mod tick;

pub use missions::{Command, ControlError, Controller};
pub use physics::{circles_overlap, drain, inverse_square_pull, spend};
pub use program::{LandingProgram, ProgramError};
pub use state::{
    Failure, FailureKind, Outcome, Rejection, RngState, SimRng, TickEvent, Trail, Verdict,
};
pub use tick::{Advance, Episode, Frame, Mission, Step, TerminalSignal, advance};
