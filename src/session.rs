//! Explicit game context
//!
//! Owns the collaborators and the simulation core. Collaborators are built
//! first and the core last; [`Session::shutdown`] tears down in reverse.
//! Every host (headless binary, browser shell, tests) drives the game
//! through this type.

use serde_json::{Map, Value, json};

use crate::audio::{AudioBackend, AudioManager, LogBackend};
use crate::error::Result;
use crate::highscores::{HighScores, RunRecord};
use crate::hud::{ErrorBanner, HudSink, LogBanner, LogHud, RunSummary};
use crate::meta::{MetaMachine, MetaState};
use crate::persistence::Storage;
use crate::platform;
use crate::settings::Settings;
use crate::sim::{Feedback, FrameInput, GameEvent, HitOutcome, PoolId, Simulation};
use crate::tuning::Tuning;

const START_FAILED: &str = "Unable to start the run. Please try again.";
const RESTART_FAILED: &str = "Unable to restart the run. Please reload the page.";

/// Everything the core talks to
pub struct Collaborators {
    pub audio: Box<dyn AudioBackend>,
    pub hud: Box<dyn HudSink>,
    pub banner: Box<dyn ErrorBanner>,
    pub storage: Box<dyn Storage>,
}

impl Collaborators {
    /// Log-only audio and HUD over the given storage
    pub fn headless(storage: Box<dyn Storage>) -> Self {
        Self {
            audio: Box::new(LogBackend),
            hud: Box::new(LogHud::new()),
            banner: Box::new(LogBanner::new()),
            storage,
        }
    }
}

/// What a frame did, for hosts that care
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Seconds actually simulated
    pub step: f32,
    pub hit: HitOutcome,
    /// The run ended during this frame
    pub ended: bool,
}

pub struct Session {
    storage: Box<dyn Storage>,
    settings: Settings,
    audio: AudioManager,
    hud: Box<dyn HudSink>,
    banner: Box<dyn ErrorBanner>,
    high_scores: HighScores,
    meta: MetaMachine,
    sim: Simulation,
    builtin_collisions: bool,
    last_summary: Option<RunSummary>,
    last_rank: Option<usize>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("meta", &self.meta)
            .field("settings", &self.settings)
            .field("high_scores", &self.high_scores.len())
            .field("last_summary", &self.last_summary)
            .finish()
    }
}

impl Session {
    /// Wire collaborators, then the core. The session starts in LOADING.
    pub fn new(collaborators: Collaborators, tuning: Tuning, seed: u32) -> Self {
        let Collaborators {
            audio,
            mut hud,
            banner,
            storage,
        } = collaborators;

        let settings = Settings::load(storage.as_ref());
        let mut audio = AudioManager::new(audio);
        audio.set_master_volume(settings.master_volume);
        audio.set_sfx_volume(settings.sfx_volume);
        audio.set_muted(settings.muted);
        let high_scores = HighScores::load(storage.as_ref());

        let mut meta = MetaMachine::new();
        let mut context = Map::new();
        context.insert("seed".to_string(), json!(seed));
        meta.init(MetaState::Loading, context);
        hud.set_visible(false);

        let mut sim = Simulation::new(tuning, seed);
        sim.set_particle_intensity(settings.particle_intensity());
        log::info!("Session ready (seed {:#010x})", seed);

        Self {
            storage,
            settings,
            audio,
            hud,
            banner,
            high_scores,
            meta,
            sim,
            builtin_collisions: true,
            last_summary: None,
            last_rank: None,
        }
    }

    pub fn sim(&self) -> &Simulation {
        &self.sim
    }

    pub fn meta(&self) -> &MetaMachine {
        &self.meta
    }

    pub fn state(&self) -> Option<MetaState> {
        self.meta.current()
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn last_summary(&self) -> Option<&RunSummary> {
        self.last_summary.as_ref()
    }

    /// Board position of the last finished run
    pub fn last_rank(&self) -> Option<usize> {
        self.last_rank
    }

    /// Hosts with their own physics turn this off and call [`Self::report_hit`]
    pub fn set_builtin_collisions(&mut self, enabled: bool) {
        self.builtin_collisions = enabled;
    }

    /// Apply and persist new preferences
    pub fn apply_settings(&mut self, settings: Settings) {
        self.audio.set_master_volume(settings.master_volume);
        self.audio.set_sfx_volume(settings.sfx_volume);
        self.audio.set_muted(settings.muted);
        self.sim.set_particle_intensity(settings.particle_intensity());
        if let Err(e) = settings.save(self.storage.as_mut()) {
            log::error!("Failed to save settings: {}", e);
        }
        self.settings = settings;
    }

    /// Renderer feedback with reduced motion honoured
    pub fn feedback(&self) -> Feedback {
        let mut fb = self.sim.feedback();
        if !self.settings.effective_slowmo() {
            fb.time_scale = 1.0;
            fb.flow_flash = false;
        }
        fb
    }

    /// Assets are in; show the start screen
    pub fn finish_loading(&mut self) {
        if self.meta.is_in(MetaState::Loading) {
            self.meta.go(MetaState::Ready);
            self.hud.set_visible(true);
        }
    }

    /// Start a run from the start screen
    pub fn start(&mut self) -> Result<()> {
        self.begin(START_FAILED)
    }

    /// Start over, from game over or mid-run
    pub fn restart(&mut self) -> Result<()> {
        self.begin(RESTART_FAILED)
    }

    fn begin(&mut self, failure: &str) -> Result<()> {
        self.banner.clear();
        if matches!(self.meta.current(), None | Some(MetaState::Loading)) {
            log::warn!("Run requested while loading; ignored");
            return Ok(());
        }

        if let Err(e) = self.audio.start(1) {
            log::error!("{}: {}", failure, e);
            self.banner.show(failure);
            self.meta.go(MetaState::Ready);
            return Err(e);
        }

        self.sim.start_run();
        self.last_summary = None;
        self.last_rank = None;
        // RunStarted only matters to the log
        self.sim.drain_events();

        let mut patch = Map::new();
        patch.insert("seed".to_string(), json!(self.sim.seed()));
        self.meta.go_with(MetaState::Playing, patch);
        self.hud.update(&self.sim.hud_snapshot());
        Ok(())
    }

    /// One host frame of `elapsed_ms` wall time
    pub fn frame(&mut self, elapsed_ms: f64, input: &FrameInput) -> FrameReport {
        let mut report = FrameReport {
            step: 0.0,
            hit: HitOutcome::Ignored,
            ended: false,
        };
        if self.meta.flags().physics_paused {
            return report;
        }

        let live = self.sim.state().run_active;
        report.step = self.sim.tick((elapsed_ms / 1000.0) as f32, input);
        if live && self.builtin_collisions {
            report.hit = self.sim.check_collisions();
        }
        report.ended = self.sync(live);
        report
    }

    /// Overlap reported by an external broad phase
    pub fn report_hit(&mut self, hazard: PoolId) -> HitOutcome {
        let live = self.sim.state().run_active;
        let outcome = self.sim.on_overlap(hazard);
        self.sync(live);
        outcome
    }

    /// Route drained events to collaborators; true when the run just ended
    fn sync(&mut self, was_live: bool) -> bool {
        for event in self.sim.drain_events() {
            self.audio.on_event(&event);
            match event {
                GameEvent::PhaseEnter if self.meta.is_in(MetaState::Playing) => {
                    self.meta.go(MetaState::PhaseMode);
                }
                GameEvent::PhaseExit if self.meta.is_in(MetaState::PhaseMode) => {
                    self.meta.go(MetaState::Playing);
                }
                _ => {}
            }
        }

        if !was_live {
            return false;
        }
        self.hud.update(&self.sim.hud_snapshot());
        if self.sim.state().game_over {
            self.end_run();
            return true;
        }
        false
    }

    fn end_run(&mut self) {
        let state = self.sim.state();
        let summary = RunSummary {
            score: state.score,
            tier: state.tier,
            distance: state.distance,
            stats: state.stats,
        };
        self.hud.run_ended(&summary);

        let record = RunRecord::from_summary(&summary, platform::now_ms());
        let score = record.score;
        let rank = self.high_scores.record(record, self.storage.as_mut());
        if let Some(rank) = rank {
            log::info!("New high score #{}: {}", rank, score);
        }

        let mut patch = Map::new();
        patch.insert("score".to_string(), json!(score));
        patch.insert(
            "rank".to_string(),
            rank.map_or(Value::Null, |r| json!(r)),
        );
        self.meta.go_with(MetaState::GameOver, patch);
        self.last_summary = Some(summary);
        self.last_rank = rank;
    }

    pub fn pause(&mut self) {
        if self.meta.is_in(MetaState::Playing) || self.meta.is_in(MetaState::PhaseMode) {
            self.meta.go(MetaState::Paused);
        }
    }

    /// Back to whatever was running before the pause
    pub fn resume(&mut self) {
        if !self.meta.is_in(MetaState::Paused) {
            return;
        }
        let target = match self.meta.previous() {
            Some(MetaState::PhaseMode) if self.sim.is_phase_active() => MetaState::PhaseMode,
            _ => MetaState::Playing,
        };
        self.meta.go(target);
    }

    /// Core first, then collaborators
    pub fn shutdown(self) {
        let Session {
            mut storage,
            settings,
            mut audio,
            mut hud,
            mut banner,
            high_scores,
            meta,
            sim,
            ..
        } = self;

        drop(sim);
        drop(meta);
        log::debug!("Core torn down");

        audio.shutdown();
        hud.set_visible(false);
        banner.clear();
        if let Err(e) = settings.save(storage.as_mut()) {
            log::error!("Failed to save settings: {}", e);
        }
        log::info!("Session closed ({} high scores on file)", high_scores.len());
    }
}
