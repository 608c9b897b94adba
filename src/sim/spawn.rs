//! Spawn pattern generator
//!
//! Each spawn tick draws a pattern from the tier-gated prefix of the bank,
//! places its obstacles staggered from the spawn line, then rolls extra
//! walls further ahead. RNG draw order is fixed so a day's seed always
//! yields the same run:
//! 1. pattern index
//! 2. per pattern entry: quantum roll (plus a pad draw if the gap is violated)
//! 3. extra-wall roll, wall lanes, one x draw per wall

use serde::{Deserialize, Serialize};

use super::hazard::HazardKind;
use super::rng::DailyRng;
use crate::tuning::Tuning;

/// One obstacle slot of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternEntry {
    pub lane: u32,
    /// Offset ahead of the spawn line
    pub stagger: f32,
}

/// Ordered lane set with per-entry stagger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPattern {
    pub entries: Vec<PatternEntry>,
}

impl SpawnPattern {
    fn from_pairs(pairs: &[(u32, f32)]) -> Self {
        Self {
            entries: pairs
                .iter()
                .map(|&(lane, stagger)| PatternEntry { lane, stagger })
                .collect(),
        }
    }

    pub fn lanes(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.lane).collect()
    }
}

/// Pattern bank; higher tiers unlock a longer prefix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnBank {
    patterns: Vec<SpawnPattern>,
}

impl Default for SpawnBank {
    fn default() -> Self {
        Self {
            patterns: vec![
                SpawnPattern::from_pairs(&[(2, 0.0)]),
                SpawnPattern::from_pairs(&[(0, 0.0), (5, 0.0)]),
                SpawnPattern::from_pairs(&[(1, 0.0), (3, 40.0)]),
                SpawnPattern::from_pairs(&[(4, 0.0), (2, 60.0), (0, 120.0)]),
                SpawnPattern::from_pairs(&[(1, 0.0), (2, 0.0)]),
                SpawnPattern::from_pairs(&[(0, 0.0), (2, 0.0), (4, 0.0)]),
                SpawnPattern::from_pairs(&[(5, 0.0), (3, 50.0), (1, 100.0), (4, 150.0)]),
            ],
        }
    }
}

impl SpawnBank {
    pub fn new(patterns: Vec<SpawnPattern>) -> Self {
        Self { patterns }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SpawnPattern> {
        self.patterns.get(index)
    }

    /// Patterns selectable at `tier`: `bank[0..=min(len-1, 2 + min(4, tier+1))]`
    pub fn unlocked(&self, tier: u32) -> usize {
        if self.patterns.is_empty() {
            return 0;
        }
        let hi = (2 + (tier + 1).min(4)) as usize;
        hi.min(self.patterns.len() - 1) + 1
    }
}

/// A hazard the orchestrator should acquire and place
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedHazard {
    pub kind: HazardKind,
    pub lane: u32,
    pub x: f32,
    pub quantum: bool,
}

/// Everything one spawn tick produces
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnPlan {
    pub pattern_index: usize,
    pub hazards: Vec<PlannedHazard>,
}

impl SpawnPlan {
    pub fn obstacle_lanes(&self) -> Vec<u32> {
        self.hazards
            .iter()
            .filter(|h| h.kind == HazardKind::Obstacle)
            .map(|h| h.lane)
            .collect()
    }

    pub fn wall_count(&self) -> usize {
        self.hazards.iter().filter(|h| h.kind == HazardKind::Wall).count()
    }
}

/// Draw the hazards for one spawn tick
pub fn plan_spawn(
    bank: &SpawnBank,
    rng: &mut DailyRng,
    tier: u32,
    player_x: f32,
    tuning: &Tuning,
) -> SpawnPlan {
    let spawn = &tuning.spawn;
    let lane_count = tuning.layout.lane_count.max(1);
    let tier_idx = Tuning::tier_index(tier);
    let base_x = tuning.layout.view_width + spawn.spawn_margin;
    let min_x = player_x + spawn.min_gap;

    let pattern_index = rng.pick(bank.unlocked(tier));
    let mut hazards = Vec::new();
    let mut furthest = base_x;

    if let Some(pattern) = bank.get(pattern_index) {
        for entry in &pattern.entries {
            let quantum = rng.chance(spawn.quantum_chance[tier_idx]);
            let mut x = base_x + entry.stagger;
            if x < min_x {
                x = min_x + rng.unit() as f32 * spawn.gap_pad;
            }
            furthest = furthest.max(x);
            hazards.push(PlannedHazard {
                kind: HazardKind::Obstacle,
                lane: entry.lane % lane_count,
                x,
                quantum,
            });
        }
    }

    let rule = spawn.walls[tier_idx];
    let walls = rule.guaranteed + u32::from(rng.chance(rule.extra_chance));
    let wall_lanes = rng.distinct(lane_count, walls as usize);
    let wall_floor = (furthest + tuning.hazard.wall_width).max(min_x);
    for lane in wall_lanes {
        let x = base_x + spawn.wall_ahead + rng.unit() as f32 * spawn.wall_spread;
        hazards.push(PlannedHazard {
            kind: HazardKind::Wall,
            lane,
            x: x.max(wall_floor),
            quantum: false,
        });
    }

    SpawnPlan {
        pattern_index,
        hazards,
    }
}

/// Interval after a spawn: `max(floor, interval - (base + per_tier * tier))`
pub fn next_interval(interval_ms: f32, tier: u32, tuning: &Tuning) -> f32 {
    let spawn = &tuning.spawn;
    let decay = spawn.decrease_base_ms + spawn.decrease_per_tier_ms * tier as f32;
    (interval_ms - decay).max(spawn.min_interval_ms)
}
