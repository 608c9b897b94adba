//! HUD collaborator
//!
//! The core pushes a snapshot every tick and a one-shot summary when the run
//! ends. How either is drawn is up to the sink.

use serde::{Deserialize, Serialize};

use crate::sim::RunStats;

/// Per-tick readout
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub score: f64,
    pub flow: f32,
    pub tier: u32,
    pub distance: f64,
}

impl HudSnapshot {
    /// Score as shown (whole points)
    pub fn score_text(&self) -> String {
        format!("{}", self.score.floor() as u64)
    }

    /// Flow multiplier to one decimal, e.g. `x2.5`
    pub fn flow_text(&self) -> String {
        format!("x{:.1}", self.flow)
    }

    pub fn distance_text(&self) -> String {
        format!("{}m", self.distance.floor() as u64)
    }
}

/// End-of-run summary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub score: f64,
    pub tier: u32,
    pub distance: f64,
    pub stats: RunStats,
}

impl RunSummary {
    /// Label/value rows for the game-over breakdown
    pub fn breakdown(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Time Survived", format_clock(self.stats.time_alive)),
            ("Obstacles Dodged", self.stats.obstacles_dodged.to_string()),
            ("Near-Misses", self.stats.near_misses.to_string()),
            ("Max Combo", format!("{}x", self.stats.max_combo)),
            ("Phase Modes", self.stats.phase_modes_triggered.to_string()),
            ("Final Tier", self.tier.to_string()),
            ("Distance", format!("{}m", self.distance.floor() as u64)),
        ]
    }
}

/// `m:ss` from seconds
pub fn format_clock(seconds: f32) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Display side of the HUD
pub trait HudSink {
    fn update(&mut self, snapshot: &HudSnapshot);

    fn run_ended(&mut self, summary: &RunSummary);

    /// Hidden while loading
    fn set_visible(&mut self, _visible: bool) {}
}

/// Surface for start-up failures the player can retry
pub trait ErrorBanner {
    fn show(&mut self, message: &str);

    fn clear(&mut self);
}

/// Headless HUD: remembers the last snapshot and logs the summary
#[derive(Debug, Default)]
pub struct LogHud {
    last: HudSnapshot,
    last_tier: u32,
    visible: bool,
}

impl LogHud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> &HudSnapshot {
        &self.last
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl HudSink for LogHud {
    fn update(&mut self, snapshot: &HudSnapshot) {
        if snapshot.tier != self.last_tier {
            log::debug!(
                "HUD tier {} score {} flow {}",
                snapshot.tier,
                snapshot.score_text(),
                snapshot.flow_text()
            );
            self.last_tier = snapshot.tier;
        }
        self.last = *snapshot;
    }

    fn run_ended(&mut self, summary: &RunSummary) {
        log::info!("Final score: {} points", summary.score.floor() as u64);
        for (label, value) in summary.breakdown() {
            log::info!("  {:<18}{}", label, value);
        }
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

/// Banner that writes to the log and keeps the current message
#[derive(Debug, Default)]
pub struct LogBanner {
    message: Option<String>,
}

impl LogBanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl ErrorBanner for LogBanner {
    fn show(&mut self, message: &str) {
        log::error!("{}", message);
        self.message = Some(message.to_string());
    }

    fn clear(&mut self) {
        self.message = None;
    }
}
