//! Cosmetic particle bursts
//!
//! Particles never feed back into gameplay. Jitter comes from a separate
//! PCG stream so bursts never consume daily RNG draws.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::pool::{Pool, PoolId, Poolable};

/// A particle for visual effects
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds left; dead at or below zero
    pub life: f32,
    pub max_life: f32,
    pub color: u32,
    pub size: f32,
    /// Alpha at birth
    pub alpha: f32,
}

impl Poolable for Particle {
    fn reset(&mut self) {
        *self = Particle::default();
    }
}

impl Particle {
    pub fn is_dead(&self) -> bool {
        self.life <= 0.0
    }

    /// Remaining life in [0, 1]
    pub fn life_ratio(&self) -> f32 {
        if self.max_life <= 0.0 {
            return 0.0;
        }
        (self.life / self.max_life).clamp(0.0, 1.0)
    }

    pub fn display_alpha(&self) -> f32 {
        self.alpha * self.life_ratio()
    }

    pub fn display_size(&self) -> f32 {
        self.size * self.life_ratio()
    }
}

/// Burst parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstParams {
    pub count: u32,
    pub life: f32,
    pub speed: f32,
    pub color: u32,
    pub size: f32,
    pub alpha: f32,
}

impl BurstParams {
    /// Collapse and phase-mode shimmer
    pub const QUANTUM: BurstParams = BurstParams {
        count: 8,
        life: 0.6,
        speed: 150.0,
        color: 0xaa_44_ff,
        size: 4.0,
        alpha: 0.8,
    };

    pub const NEAR_MISS: BurstParams = BurstParams {
        count: 12,
        life: 0.8,
        speed: 120.0,
        color: 0xff_66_cc,
        size: 3.0,
        alpha: 0.9,
    };

    /// Lane dodge completed
    pub const DODGE: BurstParams = BurstParams {
        count: 6,
        life: 0.5,
        speed: 100.0,
        color: 0x00_ff_ff,
        size: 2.0,
        alpha: 0.7,
    };
}

/// Pool occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticleStats {
    pub active: usize,
    pub pooled: usize,
    pub total: usize,
}

/// Pooled particle emitter
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    pool: Pool<Particle>,
    intensity: f32,
    rng: Pcg32,
}

impl ParticleSystem {
    pub fn new(max_pooled: usize, intensity: f32, seed: u64) -> Self {
        Self {
            pool: Pool::new(max_pooled),
            intensity: intensity.clamp(0.0, 1.0),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = if intensity.is_nan() { 0.0 } else { intensity.clamp(0.0, 1.0) };
    }

    /// Restart the jitter stream (run reset)
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Pcg32::seed_from_u64(seed);
    }

    /// Emit `floor(count * intensity)` particles radially from `pos`
    pub fn spawn_burst(&mut self, pos: Vec2, params: &BurstParams) -> usize {
        let n = (params.count as f32 * self.intensity).floor() as usize;
        if n == 0 {
            return 0;
        }
        let step = std::f32::consts::TAU / n as f32;
        let phase = self.rng.random_range(0.0..step);
        for i in 0..n {
            let angle = phase + step * i as f32;
            let speed = params.speed * self.rng.random_range(0.8..1.2);
            let life = params.life * self.rng.random_range(0.85..1.0);
            let (_, particle) = self.pool.acquire();
            *particle = Particle {
                pos,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                life,
                max_life: life,
                color: params.color,
                size: params.size,
                alpha: params.alpha,
            };
        }
        n
    }

    /// Age every live particle and recycle the dead ones
    pub fn update(&mut self, dt: f32) -> usize {
        for (_, p) in self.pool.iter_mut() {
            p.pos += p.vel * dt;
            p.vel *= 0.96;
            p.life -= dt;
        }
        self.pool.release_where(|_, p| p.is_dead()).len()
    }

    /// Release every live particle
    pub fn clear(&mut self) -> usize {
        self.pool.release_all()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoolId, &Particle)> {
        self.pool.iter()
    }

    pub fn stats(&self) -> ParticleStats {
        ParticleStats {
            active: self.pool.active_count(),
            pooled: self.pool.available_count(),
            total: self.pool.active_count() + self.pool.available_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_count_scales_with_intensity() {
        let mut fx = ParticleSystem::new(100, 1.0, 1);
        assert_eq!(fx.spawn_burst(Vec2::ZERO, &BurstParams::NEAR_MISS), 12);

        fx.set_intensity(0.5);
        assert_eq!(fx.spawn_burst(Vec2::ZERO, &BurstParams::NEAR_MISS), 6);

        fx.set_intensity(0.7);
        assert_eq!(fx.spawn_burst(Vec2::ZERO, &BurstParams::QUANTUM), 5);
        assert_eq!(fx.stats().active, 23);
    }

    #[test]
    fn test_zero_intensity_spawns_nothing() {
        let mut fx = ParticleSystem::new(100, 0.0, 1);
        assert_eq!(fx.spawn_burst(Vec2::ZERO, &BurstParams::QUANTUM), 0);
        assert_eq!(fx.stats().active, 0);
    }

    #[test]
    fn test_intensity_clamped() {
        let mut fx = ParticleSystem::new(10, 3.0, 1);
        assert_eq!(fx.intensity(), 1.0);
        fx.set_intensity(-1.0);
        assert_eq!(fx.intensity(), 0.0);
        fx.set_intensity(f32::NAN);
        assert_eq!(fx.intensity(), 0.0);
    }

    #[test]
    fn test_particles_die_and_recycle() {
        let mut fx = ParticleSystem::new(100, 1.0, 9);
        fx.spawn_burst(Vec2::new(10.0, 10.0), &BurstParams::DODGE);
        assert_eq!(fx.update(0.1), 0);
        for (_, p) in fx.iter() {
            assert!(p.life <= p.max_life);
            assert!(p.display_alpha() < p.alpha);
        }
        assert_eq!(fx.update(1.0), 6);
        let stats = fx.stats();
        assert_eq!(stats.active, 0);
        assert_eq!(stats.pooled, 6);
        assert_eq!(stats.total, 6);
    }

    #[test]
    fn test_pool_retains_at_most_max() {
        let mut fx = ParticleSystem::new(4, 1.0, 3);
        fx.spawn_burst(Vec2::ZERO, &BurstParams::NEAR_MISS);
        assert_eq!(fx.clear(), 12);
        assert_eq!(fx.stats().pooled, 4);
    }

    #[test]
    fn test_same_seed_same_burst() {
        let mut a = ParticleSystem::new(16, 1.0, 42);
        let mut b = ParticleSystem::new(16, 1.0, 42);
        a.spawn_burst(Vec2::ZERO, &BurstParams::QUANTUM);
        b.spawn_burst(Vec2::ZERO, &BurstParams::QUANTUM);
        let va: Vec<Vec2> = a.iter().map(|(_, p)| p.vel).collect();
        let vb: Vec<Vec2> = b.iter().map(|(_, p)| p.vel).collect();
        assert_eq!(va, vb);
    }
}
