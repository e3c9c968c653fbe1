//! Phase progress
//!
//! The learning game has four phases. Phases three and four each host four
//! mini-games; finishing all four completes the phase. Keys and value shapes
//! match what the web client already stores, so existing saves keep working.

use std::collections::BTreeMap;

use log::info;
use serde::{Deserialize, Serialize};

use crate::persistence::{self, KeyValueStore};

pub const DEFAULT_PLAYER_NAME: &str = "Explorer";

const PLAYER_NAME_KEY: &str = "playerName";
const PHASE1_POSITION_KEY: &str = "phase1Position";
const PHASE2_PROGRESS_KEY: &str = "phase2Progress";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    One,
    Two,
    Three,
    Four,
}

impl Phase {
    /// Key holding the completed mini-games of this phase
    fn completed_key(self) -> Option<&'static str> {
        match self {
            Phase::Three => Some("phase3CompletedGames"),
            Phase::Four => Some("phase4CompletedGames"),
            Phase::One | Phase::Two => None,
        }
    }

    pub fn missions(self) -> &'static [MissionId] {
        match self {
            Phase::Three => &[
                MissionId::Navigation,
                MissionId::Asteroid,
                MissionId::Orbital,
                MissionId::Fuel,
            ],
            Phase::Four => &[
                MissionId::Atmospheric,
                MissionId::Parachute,
                MissionId::Landing,
                MissionId::Analysis,
            ],
            Phase::One | Phase::Two => &[],
        }
    }
}

/// The eight mini-games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissionId {
    Navigation,
    Asteroid,
    Orbital,
    Fuel,
    Atmospheric,
    Parachute,
    Landing,
    Analysis,
}

impl MissionId {
    pub const ALL: [MissionId; 8] = [
        MissionId::Navigation,
        MissionId::Asteroid,
        MissionId::Orbital,
        MissionId::Fuel,
        MissionId::Atmospheric,
        MissionId::Parachute,
        MissionId::Landing,
        MissionId::Analysis,
    ];

    pub fn phase(self) -> Phase {
        match self {
            MissionId::Navigation | MissionId::Asteroid | MissionId::Orbital | MissionId::Fuel => {
                Phase::Three
            }
            _ => Phase::Four,
        }
    }

    /// Help-desk subject for this mini-game
    pub fn subject(self) -> &'static str {
        match self {
            MissionId::Navigation => "physics",
            MissionId::Asteroid => "mathematics",
            MissionId::Orbital => "astronomy",
            MissionId::Fuel => "chemistry",
            MissionId::Atmospheric => "thermodynamics",
            MissionId::Parachute => "aerodynamics",
            MissionId::Landing => "propulsion",
            MissionId::Analysis => "exobiology",
        }
    }

    /// Name used inside the completed-games object
    pub fn storage_name(self) -> &'static str {
        match self {
            MissionId::Navigation => "navigation",
            MissionId::Asteroid => "asteroid",
            MissionId::Orbital => "orbital",
            MissionId::Fuel => "fuel",
            MissionId::Atmospheric => "atmospheric",
            MissionId::Parachute => "parachute",
            MissionId::Landing => "landing",
            MissionId::Analysis => "analysis",
        }
    }
}

/// Reads and writes progress through a key-value store
pub struct ProgressBook<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> ProgressBook<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn player_name(&self) -> String {
        persistence::load_raw(&self.store, PLAYER_NAME_KEY)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_PLAYER_NAME.to_string())
    }

    pub fn set_player_name(&mut self, name: &str) {
        persistence::save_raw(&mut self.store, PLAYER_NAME_KEY, name.trim());
    }

    pub fn phase1_position(&self) -> u32 {
        persistence::load_or(&self.store, PHASE1_POSITION_KEY, 0)
    }

    pub fn set_phase1_position(&mut self, position: u32) {
        persistence::save(&mut self.store, PHASE1_POSITION_KEY, &position);
    }

    /// Percentage, 0..=100
    pub fn phase2_progress(&self) -> u8 {
        persistence::load_or::<u32, _>(&self.store, PHASE2_PROGRESS_KEY, 0).min(100) as u8
    }

    pub fn set_phase2_progress(&mut self, progress: u32) {
        let progress = progress.min(100);
        persistence::save(&mut self.store, PHASE2_PROGRESS_KEY, &progress);
    }

    /// Completion flags for a phase's mini-games, every one present
    pub fn completed(&self, phase: Phase) -> BTreeMap<String, bool> {
        let mut flags: BTreeMap<String, bool> = phase
            .missions()
            .iter()
            .map(|m| (m.storage_name().to_string(), false))
            .collect();
        if let Some(key) = phase.completed_key() {
            let stored: BTreeMap<String, bool> =
                persistence::load_or(&self.store, key, BTreeMap::new());
            for (name, done) in stored {
                if let Some(flag) = flags.get_mut(&name) {
                    *flag = done;
                }
            }
        }
        flags
    }

    pub fn is_complete(&self, mission: MissionId) -> bool {
        self.completed(mission.phase())
            .get(mission.storage_name())
            .copied()
            .unwrap_or(false)
    }

    pub fn phase_complete(&self, phase: Phase) -> bool {
        let flags = self.completed(phase);
        !flags.is_empty() && flags.values().all(|&done| done)
    }

    /// Record a finished mini-game. Returns true when this completes its phase.
    pub fn mark_complete(&mut self, mission: MissionId) -> bool {
        let phase = mission.phase();
        let mut flags = self.completed(phase);
        flags.insert(mission.storage_name().to_string(), true);
        if let Some(key) = phase.completed_key() {
            persistence::save(&mut self.store, key, &flags);
        }
        let done = flags.values().all(|&done| done);
        if done {
            info!("Phase {:?} complete", phase);
        }
        done
    }

    /// Forget everything except the player name
    pub fn reset(&mut self) {
        for key in [
            PHASE1_POSITION_KEY,
            PHASE2_PROGRESS_KEY,
            "phase3CompletedGames",
            "phase4CompletedGames",
        ] {
            if let Err(e) = self.store.remove(key) {
                log::warn!("Failed to clear {key}: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, UnavailableStore};

    fn book() -> ProgressBook<MemoryStore> {
        ProgressBook::new(MemoryStore::new())
    }

    #[test]
    fn test_subjects_and_phases() {
        assert_eq!(MissionId::Asteroid.subject(), "mathematics");
        assert_eq!(MissionId::Analysis.subject(), "exobiology");
        assert_eq!(MissionId::Fuel.phase(), Phase::Three);
        assert_eq!(MissionId::Landing.phase(), Phase::Four);
        assert_eq!(Phase::Three.missions().len(), 4);
        assert_eq!(Phase::Four.missions()[0], MissionId::Atmospheric);
    }

    #[test]
    fn test_player_name_default() {
        let mut book = book();
        assert_eq!(book.player_name(), "Explorer");
        book.set_player_name("  Ada ");
        assert_eq!(book.player_name(), "Ada");
    }

    #[test]
    fn test_phase2_progress_is_clamped() {
        let mut book = book();
        book.set_phase2_progress(250);
        assert_eq!(book.phase2_progress(), 100);
        let mut store = book.into_store();
        store.set("phase2Progress", "80").unwrap();
        assert_eq!(ProgressBook::new(store).phase2_progress(), 80);
    }

    #[test]
    fn test_mark_complete_reports_phase_completion() {
        let mut book = book();
        assert!(!book.mark_complete(MissionId::Navigation));
        assert!(!book.mark_complete(MissionId::Asteroid));
        assert!(!book.mark_complete(MissionId::Orbital));
        assert!(book.is_complete(MissionId::Orbital));
        assert!(!book.phase_complete(Phase::Three));
        assert!(book.mark_complete(MissionId::Fuel));
        assert!(book.phase_complete(Phase::Three));
        assert!(!book.phase_complete(Phase::Four));
    }

    #[test]
    fn test_reads_existing_client_saves() {
        let mut store = MemoryStore::new();
        store
            .set(
                "phase4CompletedGames",
                r#"{"atmospheric":true,"parachute":false,"landing":true,"analysis":false}"#,
            )
            .unwrap();
        store.set("playerName", "Zoe").unwrap();
        store.set("phase1Position", "3").unwrap();
        let book = ProgressBook::new(store);
        assert!(book.is_complete(MissionId::Landing));
        assert!(!book.is_complete(MissionId::Parachute));
        assert_eq!(book.player_name(), "Zoe");
        assert_eq!(book.phase1_position(), 3);
    }

    #[test]
    fn test_reset_keeps_name() {
        let mut book = book();
        book.set_player_name("Ada");
        book.mark_complete(MissionId::Fuel);
        book.set_phase1_position(4);
        book.reset();
        assert!(!book.is_complete(MissionId::Fuel));
        assert_eq!(book.phase1_position(), 0);
        assert_eq!(book.player_name(), "Ada");
    }

    #[test]
    fn test_unavailable_store_degrades() {
        let mut book = ProgressBook::new(UnavailableStore);
        assert_eq!(book.player_name(), "Explorer");
        assert!(!book.mark_complete(MissionId::Navigation));
        assert!(!book.is_complete(MissionId::Navigation));
    }
}
