//! Run lifecycle state machine
//!
//! Coarse states around the simulation. Each state's enter/exit hooks are a
//! match over [`MetaState`] that toggles [`MetaFlags`]; listeners hear about
//! every completed transition.

use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaState {
    Loading,
    Ready,
    Playing,
    PhaseMode,
    GameOver,
    Paused,
}

impl MetaState {
    pub const ALL: [MetaState; 6] = [
        MetaState::Loading,
        MetaState::Ready,
        MetaState::Playing,
        MetaState::PhaseMode,
        MetaState::GameOver,
        MetaState::Paused,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MetaState::Loading => "loading",
            MetaState::Ready => "ready",
            MetaState::Playing => "playing",
            MetaState::PhaseMode => "phase_mode",
            MetaState::GameOver => "game_over",
            MetaState::Paused => "paused",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }
}

/// Which full-screen overlay is up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Overlay {
    #[default]
    None,
    Loading,
    Start,
    GameOver,
    Paused,
}

/// Collaborator switches driven by the state hooks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetaFlags {
    pub run_active: bool,
    pub game_over: bool,
    pub phase_mode: bool,
    pub physics_paused: bool,
    pub hud_visible: bool,
    pub overlay: Overlay,
}

fn on_enter(state: MetaState, flags: &mut MetaFlags) {
    log::debug!("[State] Entering {}", state.name());
    match state {
        MetaState::Loading => {
            flags.overlay = Overlay::Loading;
            flags.hud_visible = false;
        }
        MetaState::Ready => {
            flags.run_active = false;
            flags.overlay = Overlay::Start;
            flags.hud_visible = true;
        }
        MetaState::Playing => {
            flags.run_active = true;
            flags.game_over = false;
            flags.overlay = Overlay::None;
            flags.hud_visible = true;
        }
        MetaState::PhaseMode => flags.phase_mode = true,
        MetaState::GameOver => {
            flags.run_active = false;
            flags.game_over = true;
            flags.overlay = Overlay::GameOver;
        }
        MetaState::Paused => {
            flags.physics_paused = true;
            flags.overlay = Overlay::Paused;
        }
    }
}

fn on_exit(state: MetaState, flags: &mut MetaFlags) {
    log::debug!("[State] Exiting {}", state.name());
    match state {
        MetaState::PhaseMode => flags.phase_mode = false,
        MetaState::Paused => {
            flags.physics_paused = false;
            flags.overlay = Overlay::None;
        }
        MetaState::Loading | MetaState::Ready | MetaState::Playing | MetaState::GameOver => {}
    }
}

/// Transition observer: (from, to, patch)
pub type Listener = Box<dyn FnMut(Option<MetaState>, MetaState, &Map<String, Value>) -> Result<()>>;

/// Handle for removing a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u32);

/// The lifecycle machine
pub struct MetaMachine {
    current: Option<MetaState>,
    previous: Option<MetaState>,
    flags: MetaFlags,
    context: Map<String, Value>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u32,
}

impl std::fmt::Debug for MetaMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaMachine")
            .field("current", &self.current)
            .field("previous", &self.previous)
            .field("flags", &self.flags)
            .field("context", &self.context)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for MetaMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaMachine {
    /// A machine in no state yet
    pub fn new() -> Self {
        Self {
            current: None,
            previous: None,
            flags: MetaFlags::default(),
            context: Map::new(),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Seed the context and enter the first state
    pub fn init(&mut self, initial: MetaState, context: Map<String, Value>) {
        self.context = context;
        self.enter(initial, &Map::new());
    }

    pub fn current(&self) -> Option<MetaState> {
        self.current
    }

    /// State before the latest transition
    pub fn previous(&self) -> Option<MetaState> {
        self.previous
    }

    pub fn is_in(&self, state: MetaState) -> bool {
        self.current == Some(state)
    }

    pub fn flags(&self) -> &MetaFlags {
        &self.flags
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    pub fn on_transition<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(Option<MetaState>, MetaState, &Map<String, Value>) -> Result<()> + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    /// Transition by name, merge-patching `patch` into the shared context.
    /// Unknown names are logged and leave everything untouched.
    pub fn transition(&mut self, name: &str, patch: Map<String, Value>) -> Result<MetaState> {
        let Some(to) = MetaState::from_name(name) else {
            log::error!("[StateMachine] Invalid state: {}", name);
            return Err(Error::InvalidTransition(name.to_string()));
        };
        self.enter(to, &patch);
        Ok(to)
    }

    /// Typed transition without a patch
    pub fn go(&mut self, to: MetaState) {
        self.enter(to, &Map::new());
    }

    pub fn go_with(&mut self, to: MetaState, patch: Map<String, Value>) {
        self.enter(to, &patch);
    }

    fn enter(&mut self, to: MetaState, patch: &Map<String, Value>) {
        let from = self.current;
        if let Some(state) = from {
            on_exit(state, &mut self.flags);
        }
        self.previous = from;
        self.current = Some(to);
        for (key, value) in patch {
            self.context.insert(key.clone(), value.clone());
        }
        on_enter(to, &mut self.flags);
        self.notify(from, to, patch);
    }

    /// Every listener runs even if an earlier one fails or panics
    fn notify(&mut self, from: Option<MetaState>, to: MetaState, patch: &Map<String, Value>) {
        for (id, listener) in self.listeners.iter_mut() {
            let outcome = catch_unwind(AssertUnwindSafe(|| listener(from, to, patch)));
            let fault = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => Error::Listener(e.to_string()),
                Err(panic) => Error::Listener(panic_message(panic.as_ref())),
            };
            log::error!("[StateMachine] Error in transition callback {:?}: {}", id, fault);
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
