//! Fuel-optimization leaderboard
//!
//! Persisted through the key-value store, tracks the top 10 scores.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, KeyValueStore};
use crate::sim::missions::FuelState;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub player: String,
    pub score: u64,
    /// Distance covered (km)
    pub distance: f32,
    /// Number of burns used
    pub burns: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// High score leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    const STORAGE_KEY: &'static str = "space_mission_fuel_scores";

    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Slot a score would take. Ties go below existing entries.
    fn slot(&self, score: u64) -> Option<usize> {
        let slot = self.entries.partition_point(|e| e.score >= score);
        (score > 0 && slot < MAX_HIGH_SCORES).then_some(slot)
    }

    pub fn qualifies(&self, score: u64) -> bool {
        self.slot(score).is_some()
    }

    /// 1-based rank a score would reach, if it makes the board
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        self.slot(score).map(|slot| slot + 1)
    }

    /// Insert an entry, dropping whatever falls off the bottom. Returns the
    /// 1-based rank reached.
    pub fn add(&mut self, entry: HighScoreEntry) -> Option<usize> {
        let slot = self.slot(entry.score)?;
        self.entries.insert(slot, entry);
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(slot + 1)
    }

    /// Record a finished fuel run. Runs still in progress are ignored.
    pub fn record_run(&mut self, player: &str, run: &FuelState, timestamp: f64) -> Option<usize> {
        let score = run.score?;
        self.add(HighScoreEntry {
            player: player.to_string(),
            score,
            distance: run.distance,
            burns: run.burns.len() as u32,
            timestamp,
        })
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let mut scores: Self = persistence::load_or(store, Self::STORAGE_KEY, Self::new());
        // stored data may come from an older client
        scores.entries.sort_by(|a, b| b.score.cmp(&a.score));
        scores.entries.truncate(MAX_HIGH_SCORES);
        log::info!("Loaded {} high scores", scores.entries.len());
        scores
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) {
        if persistence::save(store, Self::STORAGE_KEY, self) {
            log::info!("High scores saved ({} entries)", self.entries.len());
        }
    }
}

/// Leaderboard age label for `timestamp` as seen at `now` (both Unix ms)
pub fn format_age(timestamp: f64, now: f64) -> String {
    const MINUTE: f64 = 60_000.0;
    const HOUR: f64 = 60.0 * MINUTE;
    const DAY: f64 = 24.0 * HOUR;

    let age = (now - timestamp).max(0.0);
    let (count, unit) = match age {
        a if a >= DAY => ((a / DAY) as u64, "day"),
        a if a >= HOUR => ((a / HOUR) as u64, "hour"),
        a if a >= MINUTE => ((a / MINUTE) as u64, "min"),
        _ => return "Just now".to_string(),
    };
    match (count, unit) {
        (1, "day") => "Yesterday".to_string(),
        (1, unit) => format!("1 {unit} ago"),
        (n, unit) => format!("{n} {unit}s ago"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn entry(score: u64) -> HighScoreEntry {
        HighScoreEntry {
            player: "Explorer".into(),
            score,
            distance: score as f32 / 1.2,
            burns: 5,
            timestamp: 0.0,
        }
    }

    #[test]
    fn test_sorted_descending() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add(entry(3000)), Some(1));
        assert_eq!(scores.add(entry(5000)), Some(1));
        assert_eq!(scores.add(entry(4000)), Some(2));
        let ordered: Vec<u64> = scores.entries.iter().map(|e| e.score).collect();
        assert_eq!(ordered, vec![5000, 4000, 3000]);
        assert_eq!(scores.top_score(), Some(5000));
    }

    #[test]
    fn test_capped_at_ten() {
        let mut scores = HighScores::new();
        for i in 1..=12 {
            scores.add(entry(i * 100));
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert!(!scores.qualifies(250));
        assert_eq!(scores.potential_rank(5000), Some(1));
        assert_eq!(scores.potential_rank(350), Some(10));
        assert_eq!(scores.add(entry(100)), None);
    }

    #[test]
    fn test_ties_rank_below_existing() {
        let mut scores = HighScores::new();
        scores.add(entry(4000));
        assert_eq!(scores.potential_rank(4000), Some(2));
        assert_eq!(scores.add(entry(4000)), Some(2));
    }

    #[test]
    fn test_zero_never_qualifies() {
        assert!(!HighScores::new().qualifies(0));
    }

    #[test]
    fn test_record_run_needs_finished_episode() {
        let mut scores = HighScores::new();
        let mut run = FuelState {
            fuel: 0.0,
            distance: 2500.0,
            burns: Vec::new(),
            spikes: 0,
            score: None,
        };
        assert_eq!(scores.record_run("Ada", &run, 1.0), None);
        run.score = Some(3000);
        assert_eq!(scores.record_run("Ada", &run, 1.0), Some(1));
        assert_eq!(scores.entries[0].player, "Ada");
    }

    #[test]
    fn test_persisted() {
        let mut store = MemoryStore::new();
        let mut scores = HighScores::new();
        scores.add(entry(1200));
        scores.save(&mut store);
        assert_eq!(HighScores::load(&store), scores);
    }

    #[test]
    fn test_format_age() {
        let now = 10.0 * 86_400_000.0;
        assert_eq!(format_age(now - 10_000.0, now), "Just now");
        assert_eq!(format_age(now - 90_000.0, now), "1 min ago");
        assert_eq!(format_age(now - 3.0 * 3_600_000.0, now), "3 hours ago");
        assert_eq!(format_age(now - 86_400_000.0, now), "Yesterday");
        assert_eq!(format_age(now - 4.0 * 86_400_000.0, now), "4 days ago");
    }
}
