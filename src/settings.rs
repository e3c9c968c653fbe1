//! Player settings and loop timing
//!
//! Persisted as JSON in the key-value store, separately from progress.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::persistence::{self, KeyValueStore};
use crate::runner::RunnerConfig;
use crate::sim::Trail;

/// How much of each orbit or entry trail gets drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    /// Share of a full trail kept on screen, newest points first
    pub fn trail_fraction(self) -> f32 {
        match self {
            QualityPreset::Low => 0.25,
            QualityPreset::Medium => 0.5,
            QualityPreset::High => 1.0,
        }
    }
}

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Draw orbit and entry trails
    pub show_trails: bool,
    /// Minimize animation (instant success banner)
    pub reduced_motion: bool,

    // === Loop timing ===
    /// Delay between simulation ticks (ms)
    pub tick_interval_ms: u32,
    /// Delay before "mission accomplished" is reported (ms)
    pub success_delay_ms: u32,
    /// Ticks allowed per host callback
    pub max_substeps: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            show_trails: true,
            reduced_motion: false,
            tick_interval_ms: TICK_INTERVAL_MS,
            success_delay_ms: SUCCESS_DELAY_MS,
            max_substeps: MAX_SUBSTEPS,
        }
    }
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "space_mission_settings";

    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Pull out-of-range values back into the supported window
    pub fn sanitized(mut self) -> Self {
        self.tick_interval_ms = self
            .tick_interval_ms
            .clamp(MIN_TICK_INTERVAL_MS, TICK_INTERVAL_MS);
        self.success_delay_ms = self
            .success_delay_ms
            .clamp(SUCCESS_DELAY_MS, MAX_SUCCESS_DELAY_MS);
        self.max_substeps = self.max_substeps.clamp(1, MAX_SUBSTEPS);
        self
    }

    /// The tail of `trail` a renderer should draw, oldest first
    pub fn visible_trail<'a>(&self, trail: &'a Trail) -> impl Iterator<Item = Vec2> + 'a {
        let count = if self.show_trails {
            (trail.len() as f32 * self.quality.trail_fraction()).ceil() as usize
        } else {
            0
        };
        trail.recent(count)
    }

    /// Timing handed to the mission runner
    pub fn runner_config(&self) -> RunnerConfig {
        let settings = self.clone().sanitized();
        RunnerConfig {
            tick_interval_ms: f64::from(settings.tick_interval_ms),
            success_delay_ms: if settings.reduced_motion {
                0.0
            } else {
                f64::from(settings.success_delay_ms)
            },
            max_substeps: settings.max_substeps,
            dt: None,
        }
    }

    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        match persistence::load::<Self, _>(store, Self::STORAGE_KEY) {
            Some(settings) => {
                log::info!("Loaded settings");
                settings.sanitized()
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) {
        if persistence::save(store, Self::STORAGE_KEY, self) {
            log::info!("Settings saved");
        }
    }
}
