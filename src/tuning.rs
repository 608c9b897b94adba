//! Data-driven game balance
//!
//! Every gameplay constant lives in [`Tuning`]. Documents are JSON, every
//! field is optional and falls back to the reference tuning.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Error, Result};

/// Lane layout in the core's logical viewport
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutTuning {
    pub lane_count: u32,
    pub lane_spacing: f32,
    pub view_width: f32,
    pub view_height: f32,
    /// Player baseline x as a fraction of view width
    pub player_x_frac: f32,
    /// First lane y as a fraction of view height
    pub ground_y_frac: f32,
    pub start_lane: u32,
}

impl Default for LayoutTuning {
    fn default() -> Self {
        Self {
            lane_count: LANE_COUNT,
            lane_spacing: LANE_SPACING,
            view_width: VIEW_WIDTH,
            view_height: VIEW_HEIGHT,
            player_x_frac: 0.25,
            ground_y_frac: 0.25,
            start_lane: START_LANE,
        }
    }
}

impl LayoutTuning {
    /// Baseline x of the player
    pub fn player_x(&self) -> f32 {
        self.view_width * self.player_x_frac
    }

    /// Baseline y of a lane
    pub fn lane_y(&self, lane: u32) -> f32 {
        self.view_height * self.ground_y_frac + lane as f32 * self.lane_spacing
    }

    /// Highest valid lane index
    pub fn max_lane(&self) -> u32 {
        self.lane_count.saturating_sub(1)
    }
}

/// Extra WALL hazards rolled per spawn tick
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WallRule {
    /// Walls always spawned
    pub guaranteed: u32,
    /// Chance of one more
    pub extra_chance: f64,
}

/// Spawn cadence and placement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Starting spawn interval (ms)
    pub initial_interval_ms: f32,
    /// Interval never drops below this (ms)
    pub min_interval_ms: f32,
    /// Interval decrease per spawn, before the tier term (ms)
    pub decrease_base_ms: f32,
    /// Interval decrease per tier per spawn (ms)
    pub decrease_per_tier_ms: f32,
    /// Spawn x beyond the right edge of the view
    pub spawn_margin: f32,
    /// Pattern obstacles never spawn closer than this ahead of the player
    pub min_gap: f32,
    /// Largest random push applied when the gap would be violated
    pub gap_pad: f32,
    /// Walls sit at least this far past the pattern base
    pub wall_ahead: f32,
    /// Random spread added to wall placement
    pub wall_spread: f32,
    /// Wall rules indexed by tier - 1
    pub walls: [WallRule; 4],
    /// Chance a pattern obstacle is a quantum variant, indexed by tier - 1
    pub quantum_chance: [f64; 4],
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            initial_interval_ms: 1300.0,
            min_interval_ms: 850.0,
            decrease_base_ms: 30.0,
            decrease_per_tier_ms: 10.0,
            spawn_margin: 60.0,
            min_gap: 220.0,
            gap_pad: 40.0,
            wall_ahead: 200.0,
            wall_spread: 150.0,
            walls: [
                WallRule { guaranteed: 0, extra_chance: 0.15 },
                WallRule { guaranteed: 0, extra_chance: 0.40 },
                WallRule { guaranteed: 1, extra_chance: 0.30 },
                WallRule { guaranteed: 1, extra_chance: 0.70 },
            ],
            quantum_chance: [0.0, 0.25, 0.40, 0.50],
        }
    }
}

/// Hazard geometry, collapse policy and score bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardTuning {
    /// Hazards left of this x are recycled
    pub trailing_x: f32,
    pub pass_bonus: f32,
    pub near_miss_bonus: f32,
    pub near_miss_dx: f32,
    pub near_miss_dy: f32,
    /// Near-miss window while the player is mid-jump
    pub jump_window: f32,
    /// Quantum hazards collapse when this close ahead of the player
    pub collapse_distance: f32,
    /// Seconds spent COLLAPSING before turning SOLID
    pub collapse_duration: f32,
    pub obstacle_size: f32,
    pub wall_width: f32,
    /// Wall height as a fraction of lane spacing
    pub wall_height_frac: f32,
    pub obstacle_pool_max: usize,
}

impl Default for HazardTuning {
    fn default() -> Self {
        Self {
            trailing_x: -100.0,
            pass_bonus: 10.0,
            near_miss_bonus: 25.0,
            near_miss_dx: 50.0,
            near_miss_dy: 30.0,
            jump_window: 42.0,
            collapse_distance: 160.0,
            collapse_duration: 0.25,
            obstacle_size: 18.0,
            wall_width: 40.0,
            wall_height_frac: 0.85,
            obstacle_pool_max: 50,
        }
    }
}

/// Variable-height jump and lane tween
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTuning {
    pub jump_impulse: f32,
    /// Gravity after the sustain window or following a cut
    pub gravity: f32,
    /// Gravity while the hold is sustained
    pub sustain_gravity: f32,
    /// Gravity once the arc has peaked
    pub return_gravity: f32,
    pub hold_max: f32,
    /// Outward velocity is clamped to this on an early release
    pub cut_velocity: f32,
    pub lane_move_duration: f32,
    pub player_size: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            jump_impulse: 300.0,
            gravity: -700.0,
            sustain_gravity: -420.0,
            return_gravity: -950.0,
            hold_max: 0.18,
            cut_velocity: 120.0,
            lane_move_duration: 0.12,
            player_size: 24.0,
        }
    }
}

/// Flow multiplier, combo and phase mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowTuning {
    pub start: f32,
    pub max: f32,
    pub near_miss_increment: f32,
    pub phase_duration: f32,
    /// Seconds flow takes to ease back to start after phase mode
    pub ease_duration: f32,
    pub combo_timeout: f32,
}

impl Default for FlowTuning {
    fn default() -> Self {
        Self {
            start: 1.0,
            max: FLOW_MAX,
            near_miss_increment: 0.5,
            phase_duration: 3.0,
            ease_duration: 0.5,
            combo_timeout: 3.0,
        }
    }
}

/// Cosmetic feedback timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackTuning {
    pub hit_slowmo: f32,
    pub hit_time_scale: f32,
    pub hud_pulse: f32,
    pub flow_flash: f32,
    /// Quantum burst cadence around the player during phase mode
    pub phase_particle_interval: f32,
    pub particle_pool_max: usize,
}

impl Default for FeedbackTuning {
    fn default() -> Self {
        Self {
            hit_slowmo: 0.11,
            hit_time_scale: 0.05,
            hud_pulse: 0.4,
            flow_flash: 0.16,
            phase_particle_interval: 0.05,
            particle_pool_max: 100,
        }
    }
}

/// Complete tuning document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub layout: LayoutTuning,
    /// World scroll speed (px/sec)
    pub world_speed: f32,
    /// Largest integrated step (seconds)
    pub max_step: f32,
    /// Distance units per scrolled pixel
    pub distance_scale: f32,
    /// Seconds between tier-ups
    pub tier_interval: f32,
    pub max_tier: u32,
    pub spawn: SpawnTuning,
    pub hazard: HazardTuning,
    pub motion: MotionTuning,
    pub flow: FlowTuning,
    pub feedback: FeedbackTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            layout: LayoutTuning::default(),
            world_speed: BASE_SPEED,
            max_step: MAX_STEP,
            distance_scale: 0.05,
            tier_interval: 20.0,
            max_tier: MAX_TIER,
            spawn: SpawnTuning::default(),
            hazard: HazardTuning::default(),
            motion: MotionTuning::default(),
            flow: FlowTuning::default(),
            feedback: FeedbackTuning::default(),
        }
    }
}

impl Tuning {
    /// Parse and validate a tuning document
    pub fn from_json(json: &str) -> Result<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject documents the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.layout.lane_count == 0 {
            return Err(Error::Tuning("lane_count must be at least 1".into()));
        }
        if self.layout.start_lane >= self.layout.lane_count {
            return Err(Error::Tuning(format!(
                "start_lane {} outside {} lanes",
                self.layout.start_lane, self.layout.lane_count
            )));
        }
        if !(self.max_step > 0.0) {
            return Err(Error::Tuning("max_step must be positive".into()));
        }
        if !(self.spawn.min_interval_ms > 0.0)
            || self.spawn.initial_interval_ms < self.spawn.min_interval_ms
        {
            return Err(Error::Tuning(
                "spawn interval floor must be positive and below the initial interval".into(),
            ));
        }
        if self.spawn.decrease_base_ms < 0.0 || self.spawn.decrease_per_tier_ms < 0.0 {
            return Err(Error::Tuning("spawn interval decay must not be negative".into()));
        }
        if self.flow.start < 1.0 || self.flow.max < self.flow.start {
            return Err(Error::Tuning("flow must satisfy 1.0 <= start <= max".into()));
        }
        if self.max_tier == 0 || self.max_tier > 4 {
            return Err(Error::Tuning("max_tier must be within 1..=4".into()));
        }
        if self.motion.jump_impulse <= 0.0 || self.motion.return_gravity >= 0.0 {
            return Err(Error::Tuning(
                "jump needs a positive impulse and a negative return gravity".into(),
            ));
        }
        if self.motion.gravity >= 0.0 || self.motion.sustain_gravity >= 0.0 {
            return Err(Error::Tuning(
                "gravity and sustain_gravity must be negative".into(),
            ));
        }
        Ok(())
    }

    /// Index into per-tier tables
    pub fn tier_index(tier: u32) -> usize {
        (tier.clamp(1, 4) - 1) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_document_falls_back_to_defaults() {
        let tuning = Tuning::from_json(r#"{ "world_speed": 300.0, "spawn": { "min_interval_ms": 900.0 } }"#)
            .unwrap();
        assert_eq!(tuning.world_speed, 300.0);
        assert_eq!(tuning.spawn.min_interval_ms, 900.0);
        assert_eq!(tuning.spawn.initial_interval_ms, 1300.0);
        assert_eq!(tuning.layout.lane_count, 6);
    }

    #[test]
    fn test_rejects_bad_floor() {
        let result = Tuning::from_json(r#"{ "spawn": { "min_interval_ms": 2000.0 } }"#);
        assert!(matches!(result, Err(Error::Tuning(_))));
    }

    #[test]
    fn test_rejects_non_negative_gravity() {
        let result = Tuning::from_json(r#"{ "motion": { "gravity": 0.0 } }"#);
        assert!(matches!(result, Err(Error::Tuning(_))));

        let mut tuning = Tuning::default();
        tuning.motion.sustain_gravity = 50.0;
        assert!(matches!(tuning.validate(), Err(Error::Tuning(_))));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let result = Tuning::from_json("{ not json");
        assert!(matches!(result, Err(Error::CorruptState(_))));
    }

    #[test]
    fn test_lane_layout() {
        let layout = LayoutTuning::default();
        assert_eq!(layout.player_x(), 320.0);
        assert_eq!(layout.lane_y(0), 180.0);
        assert_eq!(layout.lane_y(2), 300.0);
        assert_eq!(layout.max_lane(), 5);
    }
}
