//! Player motion state machine
//!
//! Lanes quantise the y axis; lane changes are short eased tweens. The jump
//! is a hop along the free x axis away from the pre-jump baseline with
//! three gravity regimes:
//! - sustain: low gravity while the input is held inside the hold window
//! - cut: an early release clamps outward velocity, then base gravity
//! - return: once the arc peaks, a stronger gravity snaps back to baseline

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tuning::{LayoutTuning, MotionTuning};
use crate::{ease_sine_out, lerp};

/// Slack on the hold window so accumulated steps that land on `hold_max`
/// count as a full hold
const HOLD_EPSILON: f32 = 1e-4;

/// Discrete motion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionState {
    Idle,
    LaneMove,
    Jump,
    /// Hit taken; all intents are frozen until the run resets
    Hitstun,
}

/// Gravity regime applied to a jump tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpRegime {
    /// Hold input, inside the hold window
    Sustain,
    /// Released inside the hold window before the peak
    Cut,
    /// Rising after the hold window ran out
    Base,
    /// Past the peak, heading back
    Return,
}

/// Result of a lane-change intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneRequest {
    /// Tween toward this lane began
    Started(u32),
    /// A tween is in flight; this lane runs next
    Queued(u32),
    /// Already there (or already heading there)
    Unchanged,
    /// Frozen in hitstun
    Rejected,
}

/// Per-tick motion outcomes the orchestrator turns into events
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionStep {
    /// A lane tween finished on this lane
    pub lane_switched: Option<u32>,
    /// A jump touched back down this tick
    pub landed: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct LaneTween {
    from_y: f32,
    to_y: f32,
    target: u32,
    elapsed: f32,
}

/// Player lane + jump motion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerMotion {
    /// Committed lane (updates when a lane tween completes)
    pub lane: u32,
    pub pos: Vec2,
    pub state: MotionState,
    pub jump_velocity: f32,
    pub jump_hold: bool,
    pub jump_hold_elapsed: f32,
    baseline_x: f32,
    peak_offset: f32,
    tween: Option<LaneTween>,
    queued_lane: Option<u32>,
    layout: LayoutTuning,
    motion: MotionTuning,
}

impl PlayerMotion {
    pub fn new(layout: &LayoutTuning, motion: &MotionTuning) -> Self {
        let lane = layout.start_lane.min(layout.max_lane());
        Self {
            lane,
            pos: Vec2::new(layout.player_x(), layout.lane_y(lane)),
            state: MotionState::Idle,
            jump_velocity: 0.0,
            jump_hold: false,
            jump_hold_elapsed: 0.0,
            baseline_x: layout.player_x(),
            peak_offset: 0.0,
            tween: None,
            queued_lane: None,
            layout: layout.clone(),
            motion: motion.clone(),
        }
    }

    /// Back to the start lane, idle
    pub fn reset(&mut self) {
        *self = Self::new(&self.layout, &self.motion);
    }

    /// Lane the player will end up on once queued motion settles
    pub fn intended_lane(&self) -> u32 {
        self.queued_lane
            .or(self.tween.map(|t| t.target))
            .unwrap_or(self.lane)
    }

    pub fn is_lane_tweening(&self) -> bool {
        self.tween.is_some()
    }

    pub fn is_airborne(&self) -> bool {
        self.state == MotionState::Jump
    }

    /// Current hop displacement from the pre-jump baseline
    pub fn jump_offset(&self) -> f32 {
        if self.state == MotionState::Jump {
            self.pos.x - self.baseline_x
        } else {
            0.0
        }
    }

    /// Highest displacement reached by the current (or last) jump
    pub fn peak_offset(&self) -> f32 {
        self.peak_offset
    }

    pub fn size(&self) -> f32 {
        self.motion.player_size
    }

    /// Move one lane toward index 0
    pub fn lane_up(&mut self) -> LaneRequest {
        self.request_lane(self.intended_lane() as i64 - 1)
    }

    /// Move one lane toward the last index
    pub fn lane_down(&mut self) -> LaneRequest {
        self.request_lane(self.intended_lane() as i64 + 1)
    }

    /// Request a lane change; the target is clamped to the lane range
    pub fn request_lane(&mut self, lane: i64) -> LaneRequest {
        if self.state == MotionState::Hitstun {
            return LaneRequest::Rejected;
        }
        let target = lane.clamp(0, self.layout.max_lane() as i64) as u32;

        if let Some(tween) = self.tween {
            if target == tween.target {
                self.queued_lane = None;
                return LaneRequest::Unchanged;
            }
            self.queued_lane = Some(target);
            return LaneRequest::Queued(target);
        }

        if target == self.lane {
            return LaneRequest::Unchanged;
        }

        // Tweens only begin from IDLE or JUMP; LANE_MOVE always has a tween
        self.tween = Some(LaneTween {
            from_y: self.pos.y,
            to_y: self.layout.lane_y(target),
            target,
            elapsed: 0.0,
        });
        if self.state == MotionState::Idle {
            self.state = MotionState::LaneMove;
        }
        LaneRequest::Started(target)
    }

    /// Jump pressed. Re-pressing mid-air re-arms the hold.
    pub fn press_jump(&mut self) -> bool {
        match self.state {
            MotionState::Hitstun => false,
            MotionState::Jump => {
                self.jump_hold = true;
                false
            }
            MotionState::Idle | MotionState::LaneMove => {
                self.state = MotionState::Jump;
                self.jump_velocity = self.motion.jump_impulse;
                self.jump_hold = true;
                self.jump_hold_elapsed = 0.0;
                self.baseline_x = self.pos.x;
                self.peak_offset = 0.0;
                true
            }
        }
    }

    /// Jump released
    pub fn release_jump(&mut self) {
        self.jump_hold = false;
    }

    /// Freeze on a hit
    pub fn hitstun(&mut self) {
        self.state = MotionState::Hitstun;
        self.queued_lane = None;
    }

    /// Regime the next jump tick will integrate under
    pub fn regime(&self) -> JumpRegime {
        if self.jump_velocity > 0.0 {
            let in_window = self.jump_hold_elapsed < self.motion.hold_max - HOLD_EPSILON;
            match (self.jump_hold, in_window) {
                (true, true) => JumpRegime::Sustain,
                (false, true) => JumpRegime::Cut,
                _ => JumpRegime::Base,
            }
        } else {
            JumpRegime::Return
        }
    }

    /// Advance lane tween and jump arc by `dt` seconds
    pub fn update(&mut self, dt: f32) -> MotionStep {
        let mut step = MotionStep::default();
        if self.state == MotionState::Hitstun {
            return step;
        }

        if self.state == MotionState::Jump {
            step.landed = self.integrate_jump(dt);
        }

        if let Some(target) = self.advance_tween(dt) {
            step.lane_switched = Some(target);
            if let Some(next) = self.queued_lane.take() {
                self.request_lane(next as i64);
            }
        }

        step
    }

    fn integrate_jump(&mut self, dt: f32) -> bool {
        let gravity = match self.regime() {
            JumpRegime::Sustain => {
                self.jump_hold_elapsed = (self.jump_hold_elapsed + dt).min(self.motion.hold_max);
                self.motion.sustain_gravity
            }
            JumpRegime::Cut => {
                self.jump_velocity = self.jump_velocity.min(self.motion.cut_velocity);
                self.motion.gravity
            }
            JumpRegime::Base => self.motion.gravity,
            JumpRegime::Return => self.motion.return_gravity,
        };

        self.jump_velocity += gravity * dt;
        self.pos.x += self.jump_velocity * dt;
        self.peak_offset = self.peak_offset.max(self.pos.x - self.baseline_x);

        if self.pos.x <= self.baseline_x {
            self.pos.x = self.baseline_x;
            self.jump_velocity = 0.0;
            self.jump_hold = false;
            self.jump_hold_elapsed = 0.0;
            // A lane tween started mid-air keeps running after touchdown
            self.state = if self.tween.is_some() {
                MotionState::LaneMove
            } else {
                MotionState::Idle
            };
            return true;
        }
        false
    }

    fn advance_tween(&mut self, dt: f32) -> Option<u32> {
        let duration = self.motion.lane_move_duration;
        let tween = self.tween.as_mut()?;
        tween.elapsed += dt;
        let t = if duration > 0.0 { tween.elapsed / duration } else { 1.0 };
        self.pos.y = lerp(tween.from_y, tween.to_y, ease_sine_out(t));
        if t < 1.0 {
            return None;
        }

        let target = tween.target;
        self.pos.y = tween.to_y;
        self.lane = target;
        self.tween = None;
        if self.state == MotionState::LaneMove {
            self.state = MotionState::Idle;
        }
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn player() -> PlayerMotion {
        PlayerMotion::new(&LayoutTuning::default(), &MotionTuning::default())
    }

    /// Run a jump to completion, releasing after `hold_ticks` (None = never)
    fn jump_peak(hold_ticks: Option<usize>) -> f32 {
        jump_peak_at(DT, hold_ticks)
    }

    fn jump_peak_at(dt: f32, hold_ticks: Option<usize>) -> f32 {
        let mut p = player();
        assert!(p.press_jump());
        let mut ticks = 0;
        while p.state == MotionState::Jump {
            if Some(ticks) == hold_ticks {
                p.release_jump();
            }
            p.update(dt);
            ticks += 1;
            assert!(ticks < 10_000, "jump never landed");
        }
        p.peak_offset()
    }

    #[test]
    fn test_starts_idle_on_start_lane() {
        let p = player();
        assert_eq!(p.lane, 2);
        assert_eq!(p.state, MotionState::Idle);
        assert_eq!(p.pos, Vec2::new(320.0, 300.0));
    }

    #[test]
    fn test_lane_move_tweens_then_idles() {
        let mut p = player();
        assert_eq!(p.lane_down(), LaneRequest::Started(3));
        assert_eq!(p.state, MotionState::LaneMove);
        // Lane commits only when the tween completes
        p.update(0.05);
        assert_eq!(p.lane, 2);
        assert!(p.pos.y > 300.0 && p.pos.y < 360.0);

        let step = p.update(0.1);
        assert_eq!(step.lane_switched, Some(3));
        assert_eq!(p.lane, 3);
        assert_eq!(p.pos.y, 360.0);
        assert_eq!(p.state, MotionState::Idle);
    }

    #[test]
    fn test_lane_request_clamps() {
        let mut p = player();
        assert_eq!(p.request_lane(-5), LaneRequest::Started(0));
        p.update(1.0);
        assert_eq!(p.lane, 0);
        assert_eq!(p.lane_up(), LaneRequest::Unchanged);

        assert_eq!(p.request_lane(99), LaneRequest::Started(5));
        p.update(1.0);
        assert_eq!(p.lane, 5);
        assert_eq!(p.lane_down(), LaneRequest::Unchanged);
    }

    #[test]
    fn test_same_lane_is_noop() {
        let mut p = player();
        assert_eq!(p.request_lane(2), LaneRequest::Unchanged);
        assert_eq!(p.state, MotionState::Idle);
    }

    #[test]
    fn test_lane_intent_during_move_is_queued() {
        let mut p = player();
        p.lane_down();
        assert_eq!(p.lane_down(), LaneRequest::Queued(4));
        assert_eq!(p.intended_lane(), 4);

        let step = p.update(0.13);
        assert_eq!(step.lane_switched, Some(3));
        // Queued intent starts straight away from IDLE
        assert_eq!(p.state, MotionState::LaneMove);
        p.update(0.13);
        assert_eq!(p.lane, 4);
        assert_eq!(p.state, MotionState::Idle);
    }

    #[test]
    fn test_jump_from_lane_move() {
        let mut p = player();
        p.lane_down();
        assert!(p.press_jump());
        assert_eq!(p.state, MotionState::Jump);
        // Lane tween continues underneath the jump
        p.update(0.13);
        assert_eq!(p.lane, 3);
        assert_eq!(p.state, MotionState::Jump);
    }

    #[test]
    fn test_lane_change_mid_jump_keeps_jump_state() {
        let mut p = player();
        p.press_jump();
        p.update(DT);
        assert_eq!(p.lane_up(), LaneRequest::Started(1));
        assert_eq!(p.state, MotionState::Jump);
    }

    #[test]
    fn test_jump_lands_back_on_baseline() {
        let mut p = player();
        let baseline = p.pos.x;
        p.press_jump();
        let mut landed = false;
        for _ in 0..600 {
            if p.update(DT).landed {
                landed = true;
                break;
            }
        }
        assert!(landed);
        assert_eq!(p.state, MotionState::Idle);
        assert_eq!(p.pos.x, baseline);
        assert_eq!(p.jump_velocity, 0.0);
        assert!(!p.jump_hold);
        assert_eq!(p.jump_hold_elapsed, 0.0);
    }

    #[test]
    fn test_regimes() {
        let mut p = player();
        p.press_jump();
        assert_eq!(p.regime(), JumpRegime::Sustain);
        p.release_jump();
        assert_eq!(p.regime(), JumpRegime::Cut);

        let mut p = player();
        p.press_jump();
        p.jump_hold_elapsed = 1.0;
        assert_eq!(p.regime(), JumpRegime::Base);
        p.jump_velocity = -1.0;
        assert_eq!(p.regime(), JumpRegime::Return);
    }

    #[test]
    fn test_cut_clamps_outward_velocity() {
        let mut p = player();
        p.press_jump();
        p.update(DT);
        p.release_jump();
        p.update(DT);
        assert!(p.jump_velocity <= MotionTuning::default().cut_velocity);
    }

    #[test]
    fn test_full_hold_window_then_release_matches_full_hold_arc() {
        // 11 ticks at 60 Hz is just over the 0.18 s hold window
        let released_after_window = jump_peak(Some(11));
        let held_throughout = jump_peak(None);
        assert_eq!(released_after_window, held_throughout);
    }

    #[test]
    fn test_exact_hold_window_matches_full_hold() {
        for (dt, ticks) in [(0.02, 9), (0.03, 6), (0.01, 18)] {
            let held = jump_peak_at(dt, Some(ticks));
            let full = jump_peak_at(dt, None);
            assert!(
                (held - full).abs() < 1e-3,
                "dt {} x{}: held {} vs full {}",
                dt,
                ticks,
                held,
                full
            );
        }
    }

    #[test]
    fn test_hold_elapsed_capped_at_window() {
        let mut p = player();
        p.press_jump();
        p.update(0.05);
        p.update(0.05);
        p.update(0.05);
        p.update(0.05);
        assert_eq!(p.jump_hold_elapsed, MotionTuning::default().hold_max);
        assert_eq!(p.regime(), JumpRegime::Base);
    }

    #[test]
    fn test_landing_mid_tween_stays_lane_move() {
        let mut p = player();
        p.press_jump();
        p.release_jump();
        // Step until the next tick would touch down
        loop {
            let mut ahead = p.clone();
            if ahead.update(DT).landed {
                break;
            }
            p.update(DT);
            assert_eq!(p.state, MotionState::Jump);
        }
        assert_eq!(p.lane_down(), LaneRequest::Started(3));
        let step = p.update(DT);
        assert!(step.landed);
        assert_eq!(p.state, MotionState::LaneMove);
        assert!(p.is_lane_tweening());

        let step = p.update(0.2);
        assert_eq!(step.lane_switched, Some(3));
        assert_eq!(p.state, MotionState::Idle);
        assert!(!p.is_lane_tweening());
    }

    #[test]
    fn test_early_release_cuts_arc() {
        let cut = jump_peak(Some(3));
        let full = jump_peak(None);
        assert!(cut < full * 0.8, "cut {} vs full {}", cut, full);
    }

    #[test]
    fn test_return_is_faster_than_rise() {
        let mut p = player();
        p.press_jump();
        let mut rise_ticks = 0;
        while p.jump_velocity > 0.0 {
            p.update(DT);
            rise_ticks += 1;
        }
        let mut fall_ticks = 0;
        while p.state == MotionState::Jump {
            p.update(DT);
            fall_ticks += 1;
        }
        assert!(fall_ticks < rise_ticks);
    }

    #[test]
    fn test_hitstun_freezes_intents() {
        let mut p = player();
        p.lane_down();
        p.hitstun();
        assert_eq!(p.lane_up(), LaneRequest::Rejected);
        assert!(!p.press_jump());
        let pos = p.pos;
        let step = p.update(1.0);
        assert_eq!(step, MotionStep::default());
        assert_eq!(p.pos, pos);
        assert_eq!(p.state, MotionState::Hitstun);
    }

    #[test]
    fn test_hitstun_mid_jump() {
        let mut p = player();
        p.press_jump();
        p.update(DT);
        p.hitstun();
        assert_eq!(p.state, MotionState::Hitstun);
        assert_eq!(p.jump_offset(), 0.0);
    }

    #[test]
    fn test_reset_restores_start() {
        let mut p = player();
        p.lane_down();
        p.press_jump();
        p.update(0.5);
        p.hitstun();
        p.reset();
        assert_eq!(p.lane, 2);
        assert_eq!(p.state, MotionState::Idle);
        assert!(!p.is_lane_tweening());
    }
}
