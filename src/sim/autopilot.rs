//! Demo driver
//!
//! Produces intents from the current simulation view, the same way a player
//! would: dodge to the nearest clear lane when something closes in, hop
//! through intangible hazards when boxed in. Pure function of the state, so
//! a demo run is as deterministic as a scripted one.

use super::hazard::{CollisionState, Hazard};
use super::state::{FrameInput, Intent};
use super::tick::Simulation;

/// Lookahead window ahead of the player
const THREAT_AHEAD: f32 = 220.0;
/// Hazards this far behind still block a lane
const THREAT_BEHIND: f32 = 30.0;

#[derive(Debug, Clone, Default)]
pub struct Autopilot {
    holding_jump: bool,
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intents for the next frame
    pub fn plan(&mut self, sim: &Simulation) -> FrameInput {
        let mut input = FrameInput::default();
        let player = sim.player();

        if self.holding_jump {
            input.push(Intent::JumpReleased);
            self.holding_jump = false;
        }
        if !sim.state().run_active || player.is_lane_tweening() {
            return input;
        }

        let px = player.pos.x;
        let blocked = |lane: u32| {
            sim.hazards()
                .iter()
                .any(|(_, h)| h.lane == lane && in_window(h, px))
        };

        let lane = player.lane;
        if !blocked(lane) {
            return input;
        }

        let max_lane = sim.tuning().layout.max_lane();
        let centre = max_lane / 2;
        let mut options: Vec<u32> = Vec::with_capacity(2);
        if lane > 0 {
            options.push(lane - 1);
        }
        if lane < max_lane {
            options.push(lane + 1);
        }
        // Prefer drifting toward the middle of the field
        options.sort_by_key(|&l| l.abs_diff(centre));

        if let Some(&target) = options.iter().find(|&&l| !blocked(l)) {
            input.push(if target < lane {
                Intent::LaneUp
            } else {
                Intent::LaneDown
            });
            return input;
        }

        let intangible_ahead = sim.hazards().iter().any(|(_, h)| {
            h.lane == lane && h.collision == CollisionState::Intangible && in_window(h, px)
        });
        if intangible_ahead && !player.is_airborne() {
            input.push(Intent::JumpPressed);
            self.holding_jump = true;
        }
        input
    }
}

fn in_window(hazard: &Hazard, player_x: f32) -> bool {
    let dx = hazard.pos.x - player_x;
    (-THREAT_BEHIND..=THREAT_AHEAD).contains(&dx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::hazard::HazardKind;
    use crate::tuning::Tuning;

    fn sim_with(hazards: &[(u32, f32, bool)]) -> Simulation {
        let mut sim = Simulation::new(Tuning::default(), 1);
        sim.start_run();
        for &(lane, dx, quantum) in hazards {
            let x = sim.player().pos.x + dx;
            sim.place_hazard(HazardKind::Obstacle, lane, x, quantum);
        }
        sim
    }

    /// Seconds survived, capped at 90
    fn survive(seed: u32, driven: bool) -> f32 {
        let mut sim = Simulation::new(Tuning::default(), seed);
        sim.start_run();
        let mut pilot = Autopilot::new();
        let mut frames = 0;
        while sim.state().run_active && frames < 60 * 90 {
            let input = if driven { pilot.plan(&sim) } else { FrameInput::default() };
            sim.tick(1.0 / 60.0, &input);
            sim.check_collisions();
            frames += 1;
        }
        sim.state().time_since_start
    }

    #[test]
    fn test_clear_lane_does_nothing() {
        let sim = sim_with(&[(4, 100.0, false)]);
        assert!(Autopilot::new().plan(&sim).is_empty());
    }

    #[test]
    fn test_dodge_prefers_centre_then_up() {
        // Lanes 1 and 3 are equally central; the upper one is tried first
        let sim = sim_with(&[(2, 120.0, false)]);
        assert_eq!(Autopilot::new().plan(&sim).intents, vec![Intent::LaneUp]);
    }

    #[test]
    fn test_picks_the_free_side() {
        let sim = sim_with(&[(2, 120.0, false), (1, 150.0, false)]);
        assert_eq!(Autopilot::new().plan(&sim).intents, vec![Intent::LaneDown]);
    }

    #[test]
    fn test_hops_through_intangible_when_boxed_in() {
        let sim = sim_with(&[(2, 150.0, true), (1, 150.0, false), (3, 150.0, false)]);
        let mut pilot = Autopilot::new();
        assert_eq!(pilot.plan(&sim).intents, vec![Intent::JumpPressed]);
        // Hold is released on the following frame
        assert_eq!(pilot.plan(&sim).intents[0], Intent::JumpReleased);
    }

    #[test]
    fn test_outlasts_idle_play() {
        let seed = 0x5eed;
        assert!(survive(seed, true) >= survive(seed, false));
    }
}
