//! Space Mission - physics mini-games for a story-driven learning game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (tick engine, mission variants, landing programs)
//! - `runner`: Host adapter that drives a simulation from a timer/frame callback
//! - `persistence`: Key-value store abstraction (LocalStorage on web)
//! - `progress`: Phase progress for the four mission phases
//! - `settings`: Player preferences and loop timing
//! - `scores`: Fuel-optimization leaderboard
//! - `help`: Subject help with a guaranteed canned fallback
//! - `platform`: Browser/native differences (clock, logger)

pub mod help;
pub mod persistence;
pub mod platform;
pub mod progress;
pub mod runner;
pub mod scores;
pub mod settings;
pub mod sim;

pub use runner::{FrameStatus, LoopHandle, MissionRunner, RunnerConfig};
pub use scores::HighScores;
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Loop timing constants
pub mod consts {
    /// Default delay between ticks of a fixed-delay tick source (ms)
    pub const TICK_INTERVAL_MS: u32 = 50;
    /// Fastest tick source observed in the mini-games (ms)
    pub const MIN_TICK_INTERVAL_MS: u32 = 20;
    /// Delay between a success and the host notification (ms)
    pub const SUCCESS_DELAY_MS: u32 = 1500;
    /// Longest "mission accomplished" display delay (ms)
    pub const MAX_SUCCESS_DELAY_MS: u32 = 2000;
    /// Maximum ticks per host callback to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
}

/// Normalized angle to [-180, 180) degrees
#[inline]
pub fn normalize_degrees(mut degrees: f32) -> f32 {
    while degrees >= 180.0 {
        degrees -= 360.0;
    }
    while degrees < -180.0 {
        degrees += 360.0;
    }
    degrees
}

/// Unit vector for a heading in degrees (0 = +x, 90 = +y, screen coordinates)
#[inline]
pub fn heading(degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians())
}

/// Wrap a position into [0, width) x [0, height)
#[inline]
pub fn wrap_position(pos: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new(pos.x.rem_euclid(width), pos.y.rem_euclid(height))
}
