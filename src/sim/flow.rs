//! Flow multiplier, combo counter and phase mode
//!
//! Near-misses raise flow by a fixed step up to the cap. Hitting the cap
//! opens a phase window (invulnerable, flow pinned at the cap); when the
//! window closes flow eases back to its start value.

use serde::{Deserialize, Serialize};

use super::timer::{TimerKey, Timers};
use crate::tuning::FlowTuning;
use crate::{ease_sine_out, lerp};

/// What a near-miss did to the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearMissOutcome {
    /// Flow after the event
    pub flow: f32,
    /// Flow actually moved (false while phase mode pins it)
    pub flow_gained: bool,
    /// This near-miss filled the meter
    pub phase_entered: bool,
    pub combo: u32,
}

/// Observable result of a fired flow timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowSignal {
    PhaseEnded,
    /// A chain of two or more near-misses timed out
    ComboBroken { combo: u32 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct FlowEase {
    from: f32,
    elapsed: f32,
}

/// Flow/combo state for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowController {
    flow: f32,
    phase_active: bool,
    phase_ends_at: Option<f32>,
    ease: Option<FlowEase>,
    combo: u32,
    max_combo: u32,
    phase_count: u32,
    tuning: FlowTuning,
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

impl FlowController {
    pub fn new(tuning: &FlowTuning) -> Self {
        Self {
            flow: tuning.start,
            phase_active: false,
            phase_ends_at: None,
            ease: None,
            combo: 0,
            max_combo: 0,
            phase_count: 0,
            tuning: tuning.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(&self.tuning);
    }

    /// Current score multiplier
    pub fn flow(&self) -> f32 {
        self.flow
    }

    /// Meter fill in [0, 1]
    pub fn fill(&self) -> f32 {
        let span = self.tuning.max - self.tuning.start;
        if span <= 0.0 {
            return 1.0;
        }
        ((self.flow - self.tuning.start) / span).clamp(0.0, 1.0)
    }

    pub fn is_phase_active(&self) -> bool {
        self.phase_active
    }

    /// Run time the phase window closes, only while active
    pub fn phase_ends_at(&self) -> Option<f32> {
        self.phase_ends_at
    }

    pub fn is_easing(&self) -> bool {
        self.ease.is_some()
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn phase_count(&self) -> u32 {
        self.phase_count
    }

    /// Register a qualifying near-miss at run time `now`
    pub fn near_miss(&mut self, now: f32, timers: &mut Timers) -> NearMissOutcome {
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        timers.schedule(TimerKey::ComboTimeout, self.tuning.combo_timeout);

        if self.phase_active {
            return NearMissOutcome {
                flow: self.flow,
                flow_gained: false,
                phase_entered: false,
                combo: self.combo,
            };
        }

        // A near-miss during the post-phase ease picks up from wherever it is
        self.ease = None;
        let before = self.flow;
        self.flow = round2(self.flow + self.tuning.near_miss_increment)
            .clamp(self.tuning.start, self.tuning.max);

        let phase_entered = self.flow >= self.tuning.max && self.enter_phase(now, timers);
        NearMissOutcome {
            flow: self.flow,
            flow_gained: self.flow > before,
            phase_entered,
            combo: self.combo,
        }
    }

    fn enter_phase(&mut self, now: f32, timers: &mut Timers) -> bool {
        if self.phase_active {
            return false;
        }
        self.phase_active = true;
        self.phase_ends_at = Some(now + self.tuning.phase_duration);
        self.flow = self.tuning.max;
        self.phase_count += 1;
        timers.schedule(TimerKey::PhaseMode, self.tuning.phase_duration);
        log::info!("Phase mode for {:.1}s", self.tuning.phase_duration);
        true
    }

    /// Handle a fired timer
    pub fn on_timer(&mut self, key: TimerKey) -> Option<FlowSignal> {
        match key {
            TimerKey::ComboTimeout => {
                let combo = std::mem::take(&mut self.combo);
                (combo >= 2).then_some(FlowSignal::ComboBroken { combo })
            }
            TimerKey::PhaseMode if self.phase_active => {
                self.phase_active = false;
                self.phase_ends_at = None;
                self.ease = Some(FlowEase {
                    from: self.flow,
                    elapsed: 0.0,
                });
                log::info!("Phase mode over");
                Some(FlowSignal::PhaseEnded)
            }
            _ => None,
        }
    }

    /// Advance the post-phase ease
    pub fn update(&mut self, dt: f32) {
        if self.phase_active {
            self.flow = self.tuning.max;
            return;
        }
        let Some(ease) = self.ease.as_mut() else {
            return;
        };
        ease.elapsed += dt;
        let t = if self.tuning.ease_duration > 0.0 {
            ease.elapsed / self.tuning.ease_duration
        } else {
            1.0
        };
        if t >= 1.0 {
            self.flow = self.tuning.start;
            self.ease = None;
        } else {
            self.flow = lerp(ease.from, self.tuning.start, ease_sine_out(t));
        }
    }
}
