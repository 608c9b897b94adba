//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Clamped step only
//! - Daily seeded RNG only (particles draw from their own stream)
//! - Stable iteration order (pool acquisition order)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod collision;
pub mod flow;
pub mod hazard;
pub mod particles;
pub mod player;
pub mod pool;
pub mod rng;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod timer;

pub use autopilot::Autopilot;
pub use collision::Aabb;
pub use flow::{FlowController, FlowSignal};
pub use hazard::{CollisionState, Hazard, HazardKind};
pub use particles::{BurstParams, Particle, ParticleSystem};
pub use player::{MotionState, PlayerMotion};
pub use pool::{Pool, PoolId, Poolable};
pub use rng::DailyRng;
pub use spawn::{SpawnBank, SpawnPattern};
pub use state::{FrameInput, GameEvent, Intent, RunState, RunStats, SwipeDirection};
pub use tick::{Feedback, HitOutcome, Simulation};
pub use timer::{TimerHandle, TimerKey, Timers};
