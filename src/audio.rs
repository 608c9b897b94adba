//! Audio collaborator
//!
//! The core never waits on audio: game events become cues and a layer mix,
//! and the backend renders them however it can. A backend that fails to
//! start keeps the run from starting.

use crate::error::{Error, Result};
use crate::sim::GameEvent;

/// One-shot sounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioCue {
    /// Run begins
    Start,
    /// Near-miss blip; pitch rises with the combo
    Blip { pitch: f32 },
    /// Lane switch
    Whoosh,
    /// Fatal collision (master ducks briefly)
    Hit,
    /// Near-miss chain timed out; descending sweep
    ComboBreak,
}

/// Oscillator recipe for a cue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub freq_start: f32,
    pub freq_end: f32,
    /// Seconds to peak
    pub attack: f32,
    /// Seconds from peak to silence
    pub decay: f32,
    pub peak: f32,
}

impl AudioCue {
    pub fn tone(&self) -> Tone {
        match *self {
            AudioCue::Start => Tone {
                freq_start: 220.0,
                freq_end: 440.0,
                attack: 0.02,
                decay: 0.25,
                peak: 0.2,
            },
            AudioCue::Blip { pitch } => Tone {
                freq_start: 440.0 * pitch,
                freq_end: 440.0 * pitch,
                attack: 0.02,
                decay: 0.16,
                peak: 0.25,
            },
            AudioCue::Whoosh => Tone {
                freq_start: 1200.0,
                freq_end: 1200.0,
                attack: 0.05,
                decay: 0.10,
                peak: 0.15,
            },
            AudioCue::Hit => Tone {
                freq_start: 160.0,
                freq_end: 60.0,
                attack: 0.01,
                decay: 0.2,
                peak: 0.35,
            },
            AudioCue::ComboBreak => Tone {
                freq_start: 800.0,
                freq_end: 200.0,
                attack: 0.01,
                decay: 0.3,
                peak: 0.2,
            },
        }
    }
}

/// Blip pitch for a combo count: +10% per link, capped at 2x
pub fn blip_pitch(combo: u32) -> f32 {
    1.0 + 0.1 * combo.saturating_sub(1).min(10) as f32
}

/// Gains of the continuous music layers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerMix {
    pub pad: f32,
    pub arp: f32,
    pub noise: f32,
}

/// Layer gains for a tier; phase mode brings the arp forward
pub fn layer_mix(tier: u32, phase: bool) -> LayerMix {
    let tier = tier.max(1);
    let arp = if phase {
        0.15
    } else if tier >= 2 {
        0.08
    } else {
        0.0
    };
    LayerMix {
        pad: 0.16 + 0.06 * (tier - 1).min(3) as f32,
        arp,
        noise: if tier >= 3 { 0.05 } else { 0.0 },
    }
}

/// Something that can make noise
pub trait AudioBackend {
    /// Acquire the device. Called on a user gesture, may be called again
    /// after a failure.
    fn start(&mut self) -> Result<()>;

    fn play(&mut self, cue: AudioCue, volume: f32);

    fn set_mix(&mut self, mix: LayerMix, volume: f32);

    fn stop(&mut self) {}
}

/// Headless backend: cues go to the debug log
#[derive(Debug, Default)]
pub struct LogBackend;

impl AudioBackend for LogBackend {
    fn start(&mut self) -> Result<()> {
        log::debug!("Audio: log backend started");
        Ok(())
    }

    fn play(&mut self, cue: AudioCue, volume: f32) {
        log::debug!("Audio: {:?} at {:.2}", cue, volume);
    }

    fn set_mix(&mut self, mix: LayerMix, volume: f32) {
        log::debug!(
            "Audio mix: pad {:.2} arp {:.2} noise {:.2} (x{:.2})",
            mix.pad,
            mix.arp,
            mix.noise,
            volume
        );
    }
}

/// Audio manager for the game
pub struct AudioManager {
    backend: Box<dyn AudioBackend>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    started: bool,
    tier: u32,
    phase: bool,
}

impl std::fmt::Debug for AudioManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioManager")
            .field("master_volume", &self.master_volume)
            .field("sfx_volume", &self.sfx_volume)
            .field("muted", &self.muted)
            .field("started", &self.started)
            .field("tier", &self.tier)
            .field("phase", &self.phase)
            .finish()
    }
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(Box::new(LogBackend))
    }
}

impl AudioManager {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            started: false,
            tier: 1,
            phase: false,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
        self.apply_mix();
    }

    /// Set sound effects volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.apply_mix();
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Volume applied to one-shot cues
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    fn music_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master_volume }
    }

    /// Bring the backend up for a run at `tier`
    pub fn start(&mut self, tier: u32) -> Result<()> {
        if !self.started {
            self.backend
                .start()
                .map_err(|e| Error::Initialization(format!("audio: {}", e)))?;
            self.started = true;
            log::info!("Audio started");
        }
        self.tier = tier;
        self.phase = false;
        self.apply_mix();
        self.play(AudioCue::Start);
        Ok(())
    }

    pub fn play(&mut self, cue: AudioCue) {
        let vol = self.effective_volume();
        if !self.started || vol <= 0.0 {
            return;
        }
        self.backend.play(cue, vol);
    }

    pub fn set_tier(&mut self, tier: u32) {
        self.tier = tier;
        self.apply_mix();
    }

    pub fn set_phase(&mut self, phase: bool) {
        self.phase = phase;
        self.apply_mix();
    }

    pub fn mix(&self) -> LayerMix {
        layer_mix(self.tier, self.phase)
    }

    fn apply_mix(&mut self) {
        if self.started {
            let mix = self.mix();
            let vol = self.music_volume();
            self.backend.set_mix(mix, vol);
        }
    }

    /// Translate a simulation event into sound
    pub fn on_event(&mut self, event: &GameEvent) {
        match *event {
            GameEvent::Hit { .. } => self.play(AudioCue::Hit),
            GameEvent::NearMiss { combo, .. } => self.play(AudioCue::Blip {
                pitch: blip_pitch(combo),
            }),
            GameEvent::LaneSwitch { .. } => self.play(AudioCue::Whoosh),
            GameEvent::ComboBreak { .. } => self.play(AudioCue::ComboBreak),
            GameEvent::TierUp { tier } => self.set_tier(tier),
            GameEvent::PhaseEnter => self.set_phase(true),
            GameEvent::PhaseExit => self.set_phase(false),
            _ => {}
        }
    }

    pub fn shutdown(&mut self) {
        if self.started {
            self.backend.stop();
            self.started = false;
            log::info!("Audio stopped");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Default)]
    pub struct Recorded {
        pub starts: u32,
        pub cues: Vec<(AudioCue, f32)>,
        pub mixes: Vec<(LayerMix, f32)>,
        pub stopped: bool,
    }

    /// Backend that records calls; `failures` start attempts fail first
    pub struct Recorder {
        pub log: Rc<RefCell<Recorded>>,
        pub failures: u32,
    }

    impl Recorder {
        pub fn new(failures: u32) -> (Self, Rc<RefCell<Recorded>>) {
            let log = Rc::new(RefCell::new(Recorded::default()));
            (
                Self {
                    log: Rc::clone(&log),
                    failures,
                },
                log,
            )
        }
    }

    impl AudioBackend for Recorder {
        fn start(&mut self) -> Result<()> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(Error::Initialization("device busy".to_string()));
            }
            self.log.borrow_mut().starts += 1;
            Ok(())
        }

        fn play(&mut self, cue: AudioCue, volume: f32) {
            self.log.borrow_mut().cues.push((cue, volume));
        }

        fn set_mix(&mut self, mix: LayerMix, volume: f32) {
            self.log.borrow_mut().mixes.push((mix, volume));
        }

        fn stop(&mut self) {
            self.log.borrow_mut().stopped = true;
        }
    }
}
