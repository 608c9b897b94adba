//! Run state and simulation I/O types
//!
//! Everything one run accumulates lives in [`RunState`]; the orchestrator is
//! the only writer.

use serde::{Deserialize, Serialize};

use super::pool::PoolId;
use crate::tuning::Tuning;

/// Aggregate statistics carried into the run summary and the score record
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunStats {
    pub time_alive: f32,
    pub obstacles_dodged: u32,
    pub near_misses: u32,
    pub max_combo: u32,
    pub phase_modes_triggered: u32,
}

/// Per-run scalar state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub score: f64,
    pub tier: u32,
    pub distance: f64,
    pub time_since_start: f32,
    pub last_tier_up: f32,
    /// Accumulated since the last spawn (ms)
    pub spawn_timer: f32,
    /// Current gap between spawns (ms)
    pub spawn_interval: f32,
    pub game_over: bool,
    pub run_active: bool,
    /// Background parallax offset
    pub scroll_offset: f32,
    pub stats: RunStats,
}

impl RunState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            score: 0.0,
            tier: 1,
            distance: 0.0,
            time_since_start: 0.0,
            last_tier_up: 0.0,
            spawn_timer: 0.0,
            spawn_interval: tuning.spawn.initial_interval_ms,
            game_over: false,
            run_active: false,
            scroll_offset: 0.0,
            stats: RunStats::default(),
        }
    }

    /// Credit `base` points scaled by the flow at the moment of the event
    pub fn award(&mut self, base: f32, flow: f32) -> f64 {
        let points = (base * flow).max(0.0) as f64;
        self.score += points;
        points
    }

    pub fn end(&mut self) {
        self.game_over = true;
        self.run_active = false;
    }
}

/// Direction of a classified swipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwipeDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Classified input intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    LaneUp,
    LaneDown,
    JumpPressed,
    JumpReleased,
    Swipe(SwipeDirection),
}

/// Intents gathered since the previous frame, applied in order
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub intents: Vec<Intent>,
}

impl FrameInput {
    pub fn new(intents: impl IntoIterator<Item = Intent>) -> Self {
        Self {
            intents: intents.into_iter().collect(),
        }
    }

    pub fn push(&mut self, intent: Intent) {
        self.intents.push(intent);
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

/// Discrete outcomes of a tick, drained by the session into audio/HUD
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    RunStarted { seed: u32 },
    LaneSwitch { lane: u32 },
    Jump,
    Landed,
    NearMiss { hazard: PoolId, points: f64, flow: f32, combo: u32 },
    ObstaclePassed { hazard: PoolId, points: f64 },
    CollapseStarted { hazard: PoolId, lane: u32 },
    Solidified { hazard: PoolId },
    TierUp { tier: u32 },
    PhaseEnter,
    PhaseExit,
    /// A near-miss chain of `combo` timed out
    ComboBreak { combo: u32 },
    /// Collision ignored during phase mode
    HitAbsorbed { hazard: PoolId },
    Hit { hazard: PoolId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_state() {
        let state = RunState::new(&Tuning::default());
        assert_eq!(state.tier, 1);
        assert_eq!(state.spawn_interval, 1300.0);
        assert!(!state.run_active);
        assert!(!state.game_over);
    }

    #[test]
    fn test_award_scales_by_flow() {
        let mut state = RunState::new(&Tuning::default());
        assert_eq!(state.award(25.0, 2.5), 62.5);
        assert_eq!(state.award(10.0, 1.0), 10.0);
        assert_eq!(state.score, 72.5);
    }

    #[test]
    fn test_end_clears_active() {
        let mut state = RunState::new(&Tuning::default());
        state.run_active = true;
        state.end();
        assert!(state.game_over);
        assert!(!state.run_active);
    }

    #[test]
    fn test_stats_tolerate_missing_fields() {
        let stats: RunStats = serde_json::from_str(r#"{"near_misses": 4}"#).unwrap();
        assert_eq!(stats.near_misses, 4);
        assert_eq!(stats.max_combo, 0);
    }
}
