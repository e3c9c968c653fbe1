//! Mini-game variants
//!
//! Each module parameterizes the tick engine with its own state, control
//! intents, physics and terminal predicates.

pub mod analysis;
pub mod asteroid;
pub mod entry;
pub mod fuel;
pub mod landing;
pub mod orbital;
pub mod parachute;
pub mod zero_g;

pub use analysis::{AnalysisConfig, AnalysisControl, AnalysisState, PlanetaryAnalysis};
pub use asteroid::{Asteroid, AsteroidConfig, AsteroidControl, AsteroidDeflection, RocketState};
pub use entry::{AngleBand, AtmosphericEntry, EntryConfig, EntryState};
pub use fuel::{BurnRecord, FuelConfig, FuelControl, FuelOptimization, FuelState};
pub use landing::{Command, ControlError, Controller, LanderState, LandingConfig, LandingControl};
pub use orbital::{OrbitalConfig, OrbitalPuzzle, SatelliteState};
pub use parachute::{DescentState, ParachuteConfig, ParachuteControl, ParachuteDeployment};
pub use zero_g::{NavControl, NavState, Target, ZeroGConfig, ZeroGravityNavigation};
