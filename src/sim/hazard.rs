//! Hazards: point obstacles and lane walls
//!
//! Quantum variants start INTANGIBLE and collapse to SOLID at most once per
//! active lifetime, when they close on a grounded player in their lane.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::player::PlayerMotion;
use super::pool::Poolable;
use crate::tuning::HazardTuning;

/// Hazard variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HazardKind {
    #[default]
    Obstacle,
    /// Tall lane-spanning "hard air"
    Wall,
}

/// Collider state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionState {
    /// No collision, drawn translucent
    Intangible,
    /// Timed transition toward SOLID, still no collision
    Collapsing,
    #[default]
    Solid,
}

/// A pooled hazard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hazard {
    pub kind: HazardKind,
    pub lane: u32,
    /// Center; x is world x, y is the lane baseline
    pub pos: Vec2,
    pub size: Vec2,
    pub collision: CollisionState,
    /// Spawned intangible, may collapse
    pub quantum: bool,
    /// Near-miss already claimed for this lifetime
    pub near_miss_consumed: bool,
    /// Claimed but not paid until the hazard clears the player unhit
    pub near_miss_pending: bool,
    /// Collapse already fired for this lifetime
    pub collapse_fired: bool,
    pub hit: bool,
}

impl Poolable for Hazard {
    fn reset(&mut self) {
        *self = Hazard::default();
    }
}

impl Hazard {
    /// Prepare a freshly acquired hazard
    pub fn activate(&mut self, kind: HazardKind, lane: u32, pos: Vec2, size: Vec2, quantum: bool) {
        *self = Hazard {
            kind,
            lane,
            pos,
            size,
            collision: if quantum {
                CollisionState::Intangible
            } else {
                CollisionState::Solid
            },
            quantum,
            ..Hazard::default()
        };
    }

    /// Only SOLID hazards take part in broad-phase overlap
    pub fn collider_enabled(&self) -> bool {
        self.collision == CollisionState::Solid
    }

    /// Render opacity
    pub fn alpha(&self) -> f32 {
        match (self.collision, self.kind) {
            (CollisionState::Intangible, _) => 0.35,
            (CollisionState::Collapsing, _) => 0.6,
            (CollisionState::Solid, HazardKind::Wall) => 0.7,
            (CollisionState::Solid, HazardKind::Obstacle) => 1.0,
        }
    }

    pub fn scroll(&mut self, dx: f32) {
        self.pos.x -= dx;
    }

    /// Past the trailing edge
    pub fn is_past(&self, trailing_x: f32) -> bool {
        self.pos.x < trailing_x
    }

    /// Proximity collapse trigger: same lane, closing within `distance`,
    /// player grounded (a jumping player keeps the hazard intangible).
    pub fn should_collapse(&self, player: &PlayerMotion, distance: f32) -> bool {
        if !self.quantum || self.collapse_fired || self.collision != CollisionState::Intangible {
            return false;
        }
        let dx = self.pos.x - player.pos.x;
        self.lane == player.lane && (0.0..=distance).contains(&dx) && !player.is_airborne()
    }

    pub fn begin_collapse(&mut self) {
        self.collision = CollisionState::Collapsing;
        self.collapse_fired = true;
    }

    /// COLLAPSING -> SOLID; returns false if the hazard was not collapsing
    pub fn finish_collapse(&mut self) -> bool {
        if self.collision != CollisionState::Collapsing {
            return false;
        }
        self.collision = CollisionState::Solid;
        true
    }

    /// Near-miss predicate. Same lane, not yet past the player, and either
    /// tight on both axes or inside the jump window while airborne.
    pub fn is_near_miss(&self, player: &PlayerMotion, tuning: &HazardTuning) -> bool {
        if self.near_miss_consumed || self.hit || self.lane != player.lane {
            return false;
        }
        if self.pos.x < player.pos.x {
            return false;
        }
        let dx = (self.pos.x - player.pos.x).abs();
        let dy = (self.pos.y - player.pos.y).abs();
        let close = dx < tuning.near_miss_dx && dy < tuning.near_miss_dy;
        let jumping_through = player.is_airborne() && dx < tuning.jump_window;
        close || jumping_through
    }

    /// Claim the near-miss; the award waits for [`Hazard::settle_near_miss`]
    pub fn claim_near_miss(&mut self) {
        self.near_miss_consumed = true;
        self.near_miss_pending = true;
    }

    /// True once, when a claimed hazard has gone past `player_x` without a hit
    pub fn settle_near_miss(&mut self, player_x: f32) -> bool {
        if !self.near_miss_pending || self.hit || self.pos.x >= player_x {
            return false;
        }
        self.near_miss_pending = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::{LayoutTuning, MotionTuning};

    fn player() -> PlayerMotion {
        PlayerMotion::new(&LayoutTuning::default(), &MotionTuning::default())
    }

    fn hazard_at(x: f32, lane: u32, quantum: bool) -> Hazard {
        let layout = LayoutTuning::default();
        let mut h = Hazard::default();
        h.activate(
            HazardKind::Obstacle,
            lane,
            Vec2::new(x, layout.lane_y(lane)),
            Vec2::splat(18.0),
            quantum,
        );
        h
    }

    #[test]
    fn test_quantum_starts_intangible() {
        let h = hazard_at(900.0, 2, true);
        assert_eq!(h.collision, CollisionState::Intangible);
        assert!(!h.collider_enabled());
        assert!(h.alpha() < 1.0);

        let solid = hazard_at(900.0, 2, false);
        assert!(solid.collider_enabled());
    }

    #[test]
    fn test_collapse_requires_lane_proximity_and_ground() {
        let mut p = player();
        let far = hazard_at(p.pos.x + 400.0, 2, true);
        assert!(!far.should_collapse(&p, 160.0));

        let other_lane = hazard_at(p.pos.x + 100.0, 3, true);
        assert!(!other_lane.should_collapse(&p, 160.0));

        let near = hazard_at(p.pos.x + 100.0, 2, true);
        assert!(near.should_collapse(&p, 160.0));

        p.press_jump();
        assert!(!near.should_collapse(&p, 160.0));
    }

    #[test]
    fn test_collapse_fires_once() {
        let p = player();
        let mut h = hazard_at(p.pos.x + 100.0, 2, true);
        h.begin_collapse();
        assert!(!h.should_collapse(&p, 160.0));
        assert!(h.finish_collapse());
        assert!(h.collider_enabled());
        assert!(!h.finish_collapse());
        assert!(!h.should_collapse(&p, 160.0));
    }

    #[test]
    fn test_reset_clears_lifetime_flags() {
        let mut h = hazard_at(500.0, 1, true);
        h.begin_collapse();
        h.claim_near_miss();
        h.reset();
        assert!(!h.collapse_fired);
        assert!(!h.near_miss_consumed);
        assert!(!h.near_miss_pending);
        assert!(!h.quantum);
    }

    #[test]
    fn test_near_miss_tight_pass() {
        let tuning = HazardTuning::default();
        let p = player();
        let h = hazard_at(p.pos.x + 20.0, 2, false);
        assert!(h.is_near_miss(&p, &tuning));

        // Already passed the player
        let behind = hazard_at(p.pos.x - 5.0, 2, false);
        assert!(!behind.is_near_miss(&p, &tuning));

        // Wrong lane
        let other = hazard_at(p.pos.x + 20.0, 3, false);
        assert!(!other.is_near_miss(&p, &tuning));
    }

    #[test]
    fn test_near_miss_single_count() {
        let tuning = HazardTuning::default();
        let p = player();
        let mut h = hazard_at(p.pos.x + 20.0, 2, false);
        assert!(h.is_near_miss(&p, &tuning));
        h.near_miss_consumed = true;
        assert!(!h.is_near_miss(&p, &tuning));
    }

    #[test]
    fn test_near_miss_settles_after_pass() {
        let tuning = HazardTuning::default();
        let p = player();
        let mut h = hazard_at(p.pos.x + 20.0, 2, false);
        assert!(h.is_near_miss(&p, &tuning));
        h.claim_near_miss();
        assert!(!h.is_near_miss(&p, &tuning));
        // Still ahead of the player
        assert!(!h.settle_near_miss(p.pos.x));
        h.scroll(25.0);
        assert!(h.settle_near_miss(p.pos.x));
        assert!(!h.settle_near_miss(p.pos.x));
    }

    #[test]
    fn test_hit_hazard_never_settles() {
        let p = player();
        let mut h = hazard_at(p.pos.x + 20.0, 2, false);
        h.claim_near_miss();
        h.hit = true;
        h.scroll(40.0);
        assert!(!h.settle_near_miss(p.pos.x));
    }

    #[test]
    fn test_near_miss_jump_window() {
        let tuning = HazardTuning::default();
        let mut p = player();
        p.press_jump();
        // Vertical separation beyond the tight threshold but within jump window on x
        let mut h = hazard_at(p.pos.x + 30.0, 2, true);
        h.pos.y += 40.0;
        assert!(h.is_near_miss(&p, &tuning));

        let mut grounded = player();
        grounded.release_jump();
        assert!(!h.is_near_miss(&grounded, &tuning));
    }
}
