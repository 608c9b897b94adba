//! Broad-phase overlap for the headless session
//!
//! A renderer's physics would normally report player/hazard overlaps. This
//! is the same contract with axis-aligned boxes: the core only decides
//! which hazards have an enabled collider.

use glam::Vec2;

use super::hazard::Hazard;
use super::pool::{Pool, PoolId};

/// Axis-aligned box around a center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half: size * 0.5,
        }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    /// Strict overlap; touching edges do not count
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.half + other.half;
        d.x < reach.x && d.y < reach.y
    }
}

/// Hazards with an enabled collider overlapping `player`, in pool order
pub fn overlapping(player: &Aabb, hazards: &Pool<Hazard>) -> Vec<PoolId> {
    hazards
        .iter()
        .filter(|(_, h)| h.collider_enabled())
        .filter(|(_, h)| player.overlaps(&Aabb::new(h.pos, h.size)))
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::hazard::HazardKind;

    #[test]
    fn test_overlap() {
        let a = Aabb::new(Vec2::ZERO, Vec2::splat(24.0));
        assert!(a.overlaps(&Aabb::new(Vec2::new(20.0, 0.0), Vec2::splat(18.0))));
        assert!(!a.overlaps(&Aabb::new(Vec2::new(21.0, 0.0), Vec2::splat(18.0))));
        assert!(!a.overlaps(&Aabb::new(Vec2::new(0.0, 60.0), Vec2::splat(18.0))));
        assert_eq!(a.min(), Vec2::splat(-12.0));
        assert_eq!(a.max(), Vec2::splat(12.0));
    }

    #[test]
    fn test_only_enabled_colliders_report() {
        let mut pool: Pool<Hazard> = Pool::new(8);
        let (solid, h) = pool.acquire();
        h.activate(HazardKind::Obstacle, 2, Vec2::new(5.0, 0.0), Vec2::splat(18.0), false);
        let (_, h) = pool.acquire();
        h.activate(HazardKind::Obstacle, 2, Vec2::new(-5.0, 0.0), Vec2::splat(18.0), true);
        let (_, h) = pool.acquire();
        h.activate(HazardKind::Wall, 4, Vec2::new(0.0, 120.0), Vec2::new(40.0, 51.0), false);

        let player = Aabb::new(Vec2::ZERO, Vec2::splat(24.0));
        assert_eq!(overlapping(&player, &pool), vec![solid]);
    }
}
