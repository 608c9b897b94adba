//! Cancellable one-shot timers
//!
//! Timed effects (phase window, collapse transition, slow-motion, HUD
//! pulse) are keyed by what they drive. Scheduling a key that is already
//! pending replaces the earlier timer, so effects never stack.

use super::pool::PoolId;

/// The logical effect a timer drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// Hit slow-motion window
    HitSlowMo,
    /// Phase mode invulnerability window
    PhaseMode,
    /// Tier-up HUD pulse
    HudPulse,
    /// Flow readout flash after a near-miss
    FlowFlash,
    /// Combo breaks when no near-miss follows in time
    ComboTimeout,
    /// Hazard COLLAPSING -> SOLID
    Collapse(PoolId),
}

/// Handle returned by [`Timers::schedule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    key: TimerKey,
    id: u64,
}

impl TimerHandle {
    pub fn key(&self) -> TimerKey {
        self.key
    }
}

#[derive(Debug, Clone)]
struct Pending {
    handle: TimerHandle,
    fires_at: f32,
}

/// Timer set advanced by simulation time
#[derive(Debug, Clone, Default)]
pub struct Timers {
    pending: Vec<Pending>,
    next_id: u64,
    now: f32,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `key` to fire after `delay` seconds, cancelling any pending
    /// timer with the same key.
    pub fn schedule(&mut self, key: TimerKey, delay: f32) -> TimerHandle {
        self.cancel_key(key);
        self.next_id += 1;
        let handle = TimerHandle { key, id: self.next_id };
        self.pending.push(Pending {
            handle,
            fires_at: self.now + delay.max(0.0),
        });
        handle
    }

    /// Cancel a specific handle. Stale handles are ignored.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        self.pending.len() != before
    }

    /// Cancel whatever is pending for `key`
    pub fn cancel_key(&mut self, key: TimerKey) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle.key != key);
        self.pending.len() != before
    }

    pub fn is_pending(&self, key: TimerKey) -> bool {
        self.pending.iter().any(|p| p.handle.key == key)
    }

    /// Seconds left before `key` fires
    pub fn remaining(&self, key: TimerKey) -> Option<f32> {
        self.pending
            .iter()
            .find(|p| p.handle.key == key)
            .map(|p| (p.fires_at - self.now).max(0.0))
    }

    /// Advance by `dt` and return the keys that fired, earliest first
    pub fn advance(&mut self, dt: f32) -> Vec<TimerKey> {
        self.now += dt;
        let now = self.now;
        let mut fired: Vec<Pending> = Vec::new();
        self.pending.retain(|p| {
            if p.fires_at <= now {
                fired.push(p.clone());
                false
            } else {
                true
            }
        });
        fired.sort_by(|a, b| {
            a.fires_at
                .partial_cmp(&b.fires_at)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.handle.id.cmp(&b.handle.id))
        });
        fired.into_iter().map(|p| p.handle.key).collect()
    }

    /// Drop every pending timer and restart the clock
    pub fn clear(&mut self) {
        self.pending.clear();
        self.now = 0.0;
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
