//! High score leaderboard system
//!
//! Top 10 completed runs, highest score first. Stored as a plain JSON array;
//! anything unreadable is treated as an empty board.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hud::RunSummary;
use crate::persistence::{self, Storage};
use crate::sim::RunStats;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// Storage key for the board
pub const STORAGE_KEY: &str = "decoherence-highscores";

/// A completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Whole points
    pub score: u64,
    #[serde(default)]
    pub stats: RunStats,
    #[serde(default)]
    pub tier: u32,
    /// Whole metres
    #[serde(default)]
    pub distance: u64,
    /// Unix timestamp (ms) when the run ended
    #[serde(default)]
    pub timestamp: f64,
}

impl RunRecord {
    pub fn from_summary(summary: &RunSummary, timestamp: f64) -> Self {
        Self {
            score: summary.score.max(0.0).floor() as u64,
            stats: summary.stats,
            tier: summary.tier,
            distance: summary.distance.max(0.0).floor() as u64,
            timestamp,
        }
    }
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct HighScores {
    entries: Vec<RunRecord>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the board, tolerating missing or corrupt data
    pub fn load(storage: &dyn Storage) -> Self {
        let mut scores: HighScores = persistence::load_or_default(storage, STORAGE_KEY);
        scores.normalize();
        log::info!("Loaded {} high scores", scores.entries.len());
        scores
    }

    pub fn save(&self, storage: &mut dyn Storage) -> Result<()> {
        persistence::save(storage, STORAGE_KEY, self)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }

    /// Sort descending (stable) and cap, in case the stored list was edited
    fn normalize(&mut self) {
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(MAX_HIGH_SCORES);
    }

    /// Check if a score would make the board
    pub fn qualifies(&self, score: u64) -> bool {
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert a record after any equal scores. Returns the rank achieved
    /// (1-indexed) or None if it fell off the end.
    pub fn add_record(&mut self, record: RunRecord) -> Option<usize> {
        let pos = self
            .entries
            .iter()
            .position(|e| record.score > e.score)
            .unwrap_or(self.entries.len());
        if pos >= MAX_HIGH_SCORES {
            return None;
        }
        self.entries.insert(pos, record);
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(pos + 1)
    }

    /// Add and persist. A failed write is logged; the in-memory board keeps
    /// the record.
    pub fn record(&mut self, record: RunRecord, storage: &mut dyn Storage) -> Option<usize> {
        let rank = self.add_record(record);
        if let Err(e) = self.save(storage) {
            log::error!("Failed to save high scores: {}", e);
        }
        rank
    }

    pub fn entries(&self) -> &[RunRecord] {
        &self.entries
    }

    /// The best `n` runs
    pub fn top(&self, n: usize) -> &[RunRecord] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;
    use proptest::prelude::*;

    fn run(score: u64, timestamp: f64) -> RunRecord {
        RunRecord {
            score,
            stats: RunStats::default(),
            tier: 1,
            distance: 0,
            timestamp,
        }
    }

    #[test]
    fn test_corrupt_store_loads_empty() {
        let mut store = MemoryStorage::new();
        store.set(STORAGE_KEY, "{\"oops\": [1, 2").unwrap();
        let scores = HighScores::load(&store);
        assert!(scores.is_empty());
        assert_eq!(scores.top_score(), None);
    }

    #[test]
    fn test_wrong_shape_loads_empty() {
        let mut store = MemoryStorage::new();
        store.set(STORAGE_KEY, "{\"score\": 5}").unwrap();
        assert!(HighScores::load(&store).is_empty());
    }

    #[test]
    fn test_missing_store_loads_empty() {
        assert!(HighScores::load(&MemoryStorage::new()).is_empty());
    }

    #[test]
    fn test_add_keeps_descending_and_caps() {
        let mut scores = HighScores::new();
        for (i, s) in [50, 300, 10, 300, 75, 20, 90, 5, 400, 60, 70, 1].iter().enumerate() {
            scores.add_record(run(*s, i as f64));
        }
        assert_eq!(scores.len(), MAX_HIGH_SCORES);
        let listed: Vec<u64> = scores.entries().iter().map(|e| e.score).collect();
        assert_eq!(listed, vec![400, 300, 300, 90, 75, 70, 60, 50, 20, 10]);
        // Ties keep arrival order
        assert_eq!(scores.entries()[1].timestamp, 1.0);
        assert_eq!(scores.entries()[2].timestamp, 3.0);
    }

    #[test]
    fn test_rank_and_qualify() {
        let mut scores = HighScores::new();
        assert_eq!(scores.potential_rank(0), Some(1));
        for s in 1..=10 {
            scores.add_record(run(s * 10, 0.0));
        }
        assert!(!scores.qualifies(10));
        assert!(scores.qualifies(11));
        assert_eq!(scores.potential_rank(55), Some(6));
        assert_eq!(scores.add_record(run(10, 1.0)), None);
        assert_eq!(scores.add_record(run(1000, 1.0)), Some(1));
        assert_eq!(scores.top_score(), Some(1000));
        assert_eq!(scores.top(3).len(), 3);
    }

    #[test]
    fn test_record_persists_as_array() {
        let mut store = MemoryStorage::new();
        let mut scores = HighScores::load(&store);
        assert_eq!(scores.record(run(120, 5.0), &mut store), Some(1));
        let raw = store.get(STORAGE_KEY).unwrap().unwrap();
        assert!(raw.starts_with('['));

        let reloaded = HighScores::load(&store);
        assert_eq!(reloaded.entries(), scores.entries());
    }

    #[test]
    fn test_unsorted_store_is_normalized() {
        let mut store = MemoryStorage::new();
        store
            .set(STORAGE_KEY, r#"[{"score": 3}, {"score": 9}, {"score": 5}]"#)
            .unwrap();
        let scores = HighScores::load(&store);
        let listed: Vec<u64> = scores.entries().iter().map(|e| e.score).collect();
        assert_eq!(listed, vec![9, 5, 3]);
    }

    #[test]
    fn test_from_summary_floors() {
        let summary = RunSummary {
            score: 99.9,
            tier: 2,
            distance: 12.7,
            stats: RunStats::default(),
        };
        let record = RunRecord::from_summary(&summary, 1.0);
        assert_eq!(record.score, 99);
        assert_eq!(record.distance, 12);
    }

    proptest! {
        #[test]
        fn test_board_always_sorted_and_capped(list in prop::collection::vec(0u64..1000, 0..40)) {
            let mut scores = HighScores::new();
            for s in list {
                scores.add_record(run(s, 0.0));
                prop_assert!(scores.len() <= MAX_HIGH_SCORES);
                prop_assert!(scores.entries().windows(2).all(|w| w[0].score >= w[1].score));
            }
        }
    }
}
