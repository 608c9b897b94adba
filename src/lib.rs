//! Decoherence - endless-lane dodge run simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (player motion, hazards, spawning, flow)
//! - `session`: Explicit context wiring the core to its collaborators
//! - `meta`: Coarse run lifecycle state machine
//! - `audio` / `hud`: Feedback collaborators fed from simulation events
//! - `highscores` / `persistence`: Top-10 leaderboard and storage back-ends
//! - `platform`: Browser/native logging, clock and date
//! - `tuning` / `settings`: Data-driven game balance and player preferences

pub mod audio;
pub mod error;
pub mod highscores;
pub mod hud;
pub mod meta;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::{Error, Result};
pub use highscores::{HighScores, RunRecord};
pub use meta::{MetaMachine, MetaState};
pub use session::Session;
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

/// Game configuration constants (reference tuning)
pub mod consts {
    /// Number of lanes
    pub const LANE_COUNT: u32 = 6;
    /// Pixels between lane baselines
    pub const LANE_SPACING: f32 = 60.0;
    /// World scroll speed (px/sec)
    pub const BASE_SPEED: f32 = 220.0;
    /// Largest step a single frame may integrate (seconds)
    pub const MAX_STEP: f32 = 0.05;
    /// Host frame rate the headless runner drives at
    pub const TARGET_FPS: f32 = 60.0;

    /// Logical viewport the core lays lanes out in
    pub const VIEW_WIDTH: f32 = 1280.0;
    pub const VIEW_HEIGHT: f32 = 720.0;

    /// Lane the player starts each run on
    pub const START_LANE: u32 = 2;
    /// Highest difficulty tier
    pub const MAX_TIER: u32 = 4;
    /// Flow multiplier cap
    pub const FLOW_MAX: f32 = 5.0;
}

/// Sine ease-out over normalized time `t` in [0, 1]
#[inline]
pub fn ease_sine_out(t: f32) -> f32 {
    (t.clamp(0.0, 1.0) * std::f32::consts::FRAC_PI_2).sin()
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
