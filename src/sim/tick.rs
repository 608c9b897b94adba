//! Frame orchestrator
//!
//! One call to [`Simulation::tick`] advances the run by a clamped step in a
//! fixed order: timers, intents, player motion, world scroll, tier, spawn,
//! hazard bookkeeping, particles, flow ease, distance. Hazards spawned in a
//! tick first move on the next one.

use glam::Vec2;

use super::collision::{self, Aabb};
use super::flow::{FlowController, FlowSignal};
use super::hazard::{Hazard, HazardKind};
use super::particles::{BurstParams, ParticleSystem};
use super::player::{LaneRequest, PlayerMotion};
use super::pool::{Pool, PoolId};
use super::rng::DailyRng;
use super::spawn::{SpawnBank, next_interval, plan_spawn};
use super::state::{FrameInput, GameEvent, Intent, RunState, SwipeDirection};
use super::timer::{TimerKey, Timers};
use crate::hud::HudSnapshot;
use crate::tuning::Tuning;

/// Share of world speed the background scrolls at
const BACKGROUND_PARALLAX: f32 = 0.25;

fn log_lane(request: LaneRequest) {
    if request == LaneRequest::Rejected {
        log::debug!("Lane intent rejected in hitstun");
    }
}

/// Outcome of an overlap report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// No run, run already over, or the hazard is not an active solid collider
    Ignored,
    /// Phase mode swallowed the collision
    Absorbed,
    /// Player is in hitstun and the run is over
    Fatal,
}

/// Cosmetic feedback the renderer reads each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feedback {
    /// World time scale (slow-motion right after a hit)
    pub time_scale: f32,
    /// Tier-up HUD pulse, 1 at the start fading to 0
    pub hud_pulse: f32,
    pub flow_flash: bool,
}

/// The deterministic run core
#[derive(Debug, Clone)]
pub struct Simulation {
    tuning: Tuning,
    bank: SpawnBank,
    rng: DailyRng,
    state: RunState,
    player: PlayerMotion,
    hazards: Pool<Hazard>,
    particles: ParticleSystem,
    flow: FlowController,
    timers: Timers,
    events: Vec<GameEvent>,
    phase_burst_elapsed: f32,
}

impl Simulation {
    pub fn new(tuning: Tuning, seed: u32) -> Self {
        let player = PlayerMotion::new(&tuning.layout, &tuning.motion);
        let flow = FlowController::new(&tuning.flow);
        let particles = ParticleSystem::new(tuning.feedback.particle_pool_max, 1.0, seed as u64);
        Self {
            bank: SpawnBank::default(),
            rng: DailyRng::new(seed),
            state: RunState::new(&tuning),
            player,
            hazards: Pool::new(tuning.hazard.obstacle_pool_max),
            particles,
            flow,
            timers: Timers::new(),
            events: Vec::new(),
            phase_burst_elapsed: 0.0,
            tuning,
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn seed(&self) -> u32 {
        self.rng.seed()
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn player(&self) -> &PlayerMotion {
        &self.player
    }

    pub fn hazards(&self) -> &Pool<Hazard> {
        &self.hazards
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn flow(&self) -> &FlowController {
        &self.flow
    }

    pub fn is_phase_active(&self) -> bool {
        self.flow.is_phase_active()
    }

    pub fn set_particle_intensity(&mut self, intensity: f32) {
        self.particles.set_intensity(intensity);
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Per-tick HUD readout
    pub fn hud_snapshot(&self) -> HudSnapshot {
        HudSnapshot {
            score: self.state.score,
            flow: self.flow.flow(),
            tier: self.state.tier,
            distance: self.state.distance,
        }
    }

    pub fn feedback(&self) -> Feedback {
        let fb = &self.tuning.feedback;
        let time_scale = if self.timers.is_pending(TimerKey::HitSlowMo) {
            fb.hit_time_scale
        } else {
            1.0
        };
        let hud_pulse = match self.timers.remaining(TimerKey::HudPulse) {
            Some(left) if fb.hud_pulse > 0.0 => (left / fb.hud_pulse).clamp(0.0, 1.0),
            _ => 0.0,
        };
        Feedback {
            time_scale,
            hud_pulse,
            flow_flash: self.timers.is_pending(TimerKey::FlowFlash),
        }
    }

    /// Recycle everything from the previous run and rewind to a fresh state.
    /// Pending timers are dropped so nothing stale reaches the next run.
    pub fn reset_run(&mut self) {
        let hazards = self.hazards.release_all();
        let particles = self.particles.clear();
        self.timers.clear();
        self.rng.reseed();
        self.particles.reseed(self.rng.seed() as u64);
        self.player.reset();
        self.flow.reset();
        self.state = RunState::new(&self.tuning);
        self.events.clear();
        self.phase_burst_elapsed = 0.0;
        log::debug!("Run reset: recycled {} hazards, {} particles", hazards, particles);
    }

    /// Reset and go live
    pub fn start_run(&mut self) {
        self.reset_run();
        self.state.run_active = true;
        self.events.push(GameEvent::RunStarted { seed: self.rng.seed() });
        log::info!("Run started (seed {:#010x})", self.rng.seed());
    }

    /// Advance by `elapsed` seconds of wall time, returning the step taken
    pub fn tick(&mut self, elapsed: f32, input: &FrameInput) -> f32 {
        let dt = if elapsed.is_finite() {
            elapsed.clamp(0.0, self.tuning.max_step)
        } else {
            0.0
        };

        if !self.state.run_active {
            // Feedback keeps animating over the game-over screen
            if self.state.game_over {
                self.advance_timers(dt);
                self.particles.update(dt);
            }
            return 0.0;
        }

        self.state.time_since_start += dt;
        self.state.stats.time_alive = self.state.time_since_start;

        self.advance_timers(dt);
        self.apply_intents(input);

        let step = self.player.update(dt);
        if let Some(lane) = step.lane_switched {
            self.events.push(GameEvent::LaneSwitch { lane });
            self.particles.spawn_burst(self.player.pos, &BurstParams::DODGE);
        }
        if step.landed {
            self.events.push(GameEvent::Landed);
        }

        let dx = self.tuning.world_speed * dt;
        self.state.scroll_offset += dx * BACKGROUND_PARALLAX;
        for (_, hazard) in self.hazards.iter_mut() {
            hazard.scroll(dx);
        }

        self.update_tier();
        self.update_spawner(dt);
        self.update_hazards();
        self.update_phase_particles(dt);
        self.particles.update(dt);
        self.flow.update(dt);

        self.state.distance += (dx * self.tuning.distance_scale) as f64;
        dt
    }

    /// Built-in broad phase: report every enabled collider overlapping the
    /// player. Stops at the first fatal hit.
    pub fn check_collisions(&mut self) -> HitOutcome {
        if !self.state.run_active {
            return HitOutcome::Ignored;
        }
        let size = self.player.size();
        let player_box = Aabb::new(self.player.pos, Vec2::splat(size));
        let mut outcome = HitOutcome::Ignored;
        for id in collision::overlapping(&player_box, &self.hazards) {
            outcome = self.on_overlap(id);
            if outcome == HitOutcome::Fatal {
                break;
            }
        }
        outcome
    }

    /// Collision policy for a player/hazard overlap
    pub fn on_overlap(&mut self, hazard: PoolId) -> HitOutcome {
        if self.state.game_over || !self.state.run_active {
            return HitOutcome::Ignored;
        }
        // Reports against intangible or collapsing hazards do not count
        if !self.hazards.get(hazard).is_some_and(Hazard::collider_enabled) {
            return HitOutcome::Ignored;
        }
        if self.flow.is_phase_active() {
            self.events.push(GameEvent::HitAbsorbed { hazard });
            return HitOutcome::Absorbed;
        }

        if let Some(h) = self.hazards.get_mut(hazard) {
            h.hit = true;
        }
        self.hazards.release(hazard);
        self.timers.cancel_key(TimerKey::Collapse(hazard));

        self.player.hitstun();
        self.timers.schedule(TimerKey::HitSlowMo, self.tuning.feedback.hit_slowmo);
        self.state.stats.max_combo = self.flow.max_combo();
        self.state.end();
        self.events.push(GameEvent::Hit { hazard });
        log::info!(
            "Run over: score {:.0}, tier {}, distance {:.1}m",
            self.state.score,
            self.state.tier,
            self.state.distance
        );
        HitOutcome::Fatal
    }

    fn advance_timers(&mut self, dt: f32) {
        for key in self.timers.advance(dt) {
            match key {
                TimerKey::Collapse(id) => {
                    let solidified = self
                        .hazards
                        .get_mut(id)
                        .is_some_and(|h| h.finish_collapse());
                    if solidified {
                        self.events.push(GameEvent::Solidified { hazard: id });
                    }
                }
                TimerKey::PhaseMode | TimerKey::ComboTimeout => match self.flow.on_timer(key) {
                    Some(FlowSignal::PhaseEnded) => self.events.push(GameEvent::PhaseExit),
                    Some(FlowSignal::ComboBroken { combo }) => {
                        log::debug!("Combo x{} broken", combo);
                        self.events.push(GameEvent::ComboBreak { combo });
                    }
                    None => {}
                },
                TimerKey::HitSlowMo | TimerKey::HudPulse | TimerKey::FlowFlash => {}
            }
        }
    }

    fn apply_intents(&mut self, input: &FrameInput) {
        for intent in &input.intents {
            match intent {
                Intent::LaneUp | Intent::Swipe(SwipeDirection::Up) => {
                    log_lane(self.player.lane_up());
                }
                Intent::LaneDown | Intent::Swipe(SwipeDirection::Down) => {
                    log_lane(self.player.lane_down());
                }
                Intent::JumpPressed => self.press_jump(),
                Intent::JumpReleased => self.player.release_jump(),
                Intent::Swipe(SwipeDirection::Right) => {
                    self.press_jump();
                    self.player.release_jump();
                }
                Intent::Swipe(SwipeDirection::Left) => {}
            }
        }
    }

    fn press_jump(&mut self) {
        if self.player.press_jump() {
            self.events.push(GameEvent::Jump);
        }
    }

    fn update_tier(&mut self) {
        let state = &mut self.state;
        if state.tier >= self.tuning.max_tier
            || state.time_since_start - state.last_tier_up <= self.tuning.tier_interval
        {
            return;
        }
        state.tier += 1;
        state.last_tier_up = state.time_since_start;
        self.timers.schedule(TimerKey::HudPulse, self.tuning.feedback.hud_pulse);
        self.events.push(GameEvent::TierUp { tier: state.tier });
        log::info!("Tier {} at {:.1}s", state.tier, state.time_since_start);
    }

    fn update_spawner(&mut self, dt: f32) {
        self.state.spawn_timer += dt * 1000.0;
        if self.state.spawn_timer < self.state.spawn_interval {
            return;
        }
        self.spawn();
        self.state.spawn_timer = 0.0;
        self.state.spawn_interval =
            next_interval(self.state.spawn_interval, self.state.tier, &self.tuning);
    }

    /// Acquire and place one hazard
    fn place(&mut self, kind: HazardKind, lane: u32, x: f32, quantum: bool) -> PoolId {
        let ht = &self.tuning.hazard;
        let layout = &self.tuning.layout;
        let size = match kind {
            HazardKind::Obstacle => Vec2::splat(ht.obstacle_size),
            HazardKind::Wall => Vec2::new(ht.wall_width, layout.lane_spacing * ht.wall_height_frac),
        };
        let pos = Vec2::new(x, layout.lane_y(lane));
        let (id, hazard) = self.hazards.acquire();
        hazard.activate(kind, lane, pos, size, quantum);
        id
    }

    #[cfg(test)]
    pub(crate) fn place_hazard(&mut self, kind: HazardKind, lane: u32, x: f32, quantum: bool) -> PoolId {
        self.place(kind, lane, x, quantum)
    }

    fn spawn(&mut self) {
        let plan = plan_spawn(
            &self.bank,
            &mut self.rng,
            self.state.tier,
            self.player.pos.x,
            &self.tuning,
        );
        for planned in &plan.hazards {
            self.place(planned.kind, planned.lane, planned.x, planned.quantum);
        }
        log::debug!(
            "Spawned pattern {} ({} hazards) at tier {}",
            plan.pattern_index,
            plan.hazards.len(),
            self.state.tier
        );
    }

    fn update_hazards(&mut self) {
        let trailing_x = self.tuning.hazard.trailing_x;
        let passed: Vec<(PoolId, HazardKind, bool)> = self
            .hazards
            .iter()
            .filter(|(_, h)| h.is_past(trailing_x))
            .map(|(id, h)| (id, h.kind, h.hit))
            .collect();
        for (id, kind, hit) in passed {
            self.hazards.release(id);
            self.timers.cancel_key(TimerKey::Collapse(id));
            if kind == HazardKind::Obstacle && !hit {
                let points = self.state.award(self.tuning.hazard.pass_bonus, self.flow.flow());
                self.state.stats.obstacles_dodged += 1;
                self.events.push(GameEvent::ObstaclePassed { hazard: id, points });
            }
        }

        let mut collapsing = Vec::new();
        let mut near_misses = Vec::new();
        // Grounded player x
        let player_x = self.tuning.layout.player_x();
        for (id, hazard) in self.hazards.iter_mut() {
            if hazard.should_collapse(&self.player, self.tuning.hazard.collapse_distance) {
                hazard.begin_collapse();
                collapsing.push((id, hazard.lane, hazard.pos));
            }
            if hazard.is_near_miss(&self.player, &self.tuning.hazard) {
                hazard.claim_near_miss();
            }
            if hazard.settle_near_miss(player_x) {
                near_misses.push((id, hazard.pos));
            }
        }

        for (id, lane, pos) in collapsing {
            self.timers
                .schedule(TimerKey::Collapse(id), self.tuning.hazard.collapse_duration);
            self.particles.spawn_burst(pos, &BurstParams::QUANTUM);
            self.events.push(GameEvent::CollapseStarted { hazard: id, lane });
        }
        for (id, pos) in near_misses {
            self.register_near_miss(id, pos);
        }
    }

    fn register_near_miss(&mut self, hazard: PoolId, pos: Vec2) {
        let outcome = self.flow.near_miss(self.state.time_since_start, &mut self.timers);
        let points = self.state.award(self.tuning.hazard.near_miss_bonus, outcome.flow);
        let stats = &mut self.state.stats;
        stats.near_misses += 1;
        stats.max_combo = self.flow.max_combo();

        if outcome.flow_gained {
            self.timers.schedule(TimerKey::FlowFlash, self.tuning.feedback.flow_flash);
        }
        self.particles.spawn_burst(pos, &BurstParams::NEAR_MISS);
        self.events.push(GameEvent::NearMiss {
            hazard,
            points,
            flow: outcome.flow,
            combo: outcome.combo,
        });

        if outcome.phase_entered {
            self.state.stats.phase_modes_triggered += 1;
            self.phase_burst_elapsed = 0.0;
            self.events.push(GameEvent::PhaseEnter);
        }
    }

    fn update_phase_particles(&mut self, dt: f32) {
        if !self.flow.is_phase_active() {
            return;
        }
        let interval = self.tuning.feedback.phase_particle_interval;
        if interval <= 0.0 {
            return;
        }
        self.phase_burst_elapsed += dt;
        while self.phase_burst_elapsed >= interval {
            self.phase_burst_elapsed -= interval;
            self.particles.spawn_burst(self.player.pos, &BurstParams::QUANTUM);
        }
    }
}
