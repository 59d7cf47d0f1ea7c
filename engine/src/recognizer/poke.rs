//! Velocity-gesture "poke" recognizer.
//!
//! A click is a short, fast jab at the screen: the distance must fall
//! steadily for `time-to-click-ms`, mostly head-on, and the click lands
//! when the finger slows down at the end of the jab. Pulling back the
//! same way releases.

use super::{FrameContext, FrameInput, InputKind, Positions, Step};
use crate::config::{require_non_negative, require_positive, require_range, ConfigError};
use crate::drag::{DragDetector, DragThresholds};
use crate::history::{Direction, HistorySample, SampleHistory};
use crate::math::distance2;
use crate::selector::SelectorPolicy;
use crate::sexp::fmt_bool;
use crate::stabiliser::{DeadzoneStabiliser, ShrinkMode};
use crate::timer::CooldownState;
use tracing::debug;

// ── Config ─────────────────────────────────────────────────

/// Configuration for the poke recognizer. Distances in meters.
///
/// The `cos-squared` limits are cos²(θ) of the widest accepted angle
/// between the motion and the screen normal: 0.5 is 45°, 0.75 is 30°.
#[derive(Debug, Clone, PartialEq)]
pub struct PokeConfig {
    pub cooldown_on_entry_ms: f64,
    /// Beyond this distance the hand is out of range and the recognizer idles.
    pub max_distance: f32,
    pub time_to_click_ms: f32,
    pub min_click_distance: f32,
    pub cos_squared_max_angle: f32,
    /// Window for the end-of-jab slowdown check.
    pub time_to_slowdown_ms: f32,
    pub slowdown_distance: f32,
    /// Presses are suppressed for this long after a release.
    pub click_cooldown_ms: f64,
    /// With dragging disabled, release on the frame after the press.
    pub immediate_unclick: bool,
    pub time_to_unclick_ms: f32,
    pub min_unclick_distance: f32,
    pub cos_squared_max_angle_unclick: f32,
    /// Deadzone growth per meter travelled once a jab is recognised.
    pub deadcone_enlargement_ratio: f32,
    pub deadcone_max_increase: f32,
    /// Time-based shrink rate (m/s) after a release or abandoned jab.
    pub deadcone_shrink_speed: f32,
    pub drag_start_distance: f32,
    pub drag_start_time_s: Option<f32>,
    pub drag_deadzone_shrink_rate: f32,
    /// Drag travel before the deadzone starts shrinking.
    pub drag_deadzone_shrink_distance: f32,
    pub selector: SelectorPolicy,
}

impl Default for PokeConfig {
    fn default() -> Self {
        Self {
            cooldown_on_entry_ms: 300.0,
            max_distance: 0.3,
            time_to_click_ms: 100.0,
            min_click_distance: 0.02,
            cos_squared_max_angle: 0.5,
            time_to_slowdown_ms: 50.0,
            slowdown_distance: 0.005,
            click_cooldown_ms: 500.0,
            immediate_unclick: true,
            time_to_unclick_ms: 100.0,
            min_unclick_distance: 0.01,
            cos_squared_max_angle_unclick: 0.5,
            deadcone_enlargement_ratio: 1.0,
            deadcone_max_increase: 0.02,
            deadcone_shrink_speed: 0.05,
            drag_start_distance: 0.04,
            drag_start_time_s: Some(0.1),
            drag_deadzone_shrink_rate: 0.5,
            drag_deadzone_shrink_distance: 0.001,
            selector: SelectorPolicy::StableIndex,
        }
    }
}

impl PokeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("poke.cooldown-on-entry-ms", self.cooldown_on_entry_ms as f32)?;
        require_positive("poke.max-distance", self.max_distance)?;
        require_positive("poke.time-to-click-ms", self.time_to_click_ms)?;
        require_non_negative("poke.min-click-distance", self.min_click_distance)?;
        require_range("poke.cos-squared-max-angle", self.cos_squared_max_angle, 0.0, 1.0)?;
        require_positive("poke.time-to-slowdown-ms", self.time_to_slowdown_ms)?;
        require_non_negative("poke.slowdown-distance", self.slowdown_distance)?;
        require_non_negative("poke.click-cooldown-ms", self.click_cooldown_ms as f32)?;
        require_positive("poke.time-to-unclick-ms", self.time_to_unclick_ms)?;
        require_non_negative("poke.min-unclick-distance", self.min_unclick_distance)?;
        require_range(
            "poke.cos-squared-max-angle-unclick",
            self.cos_squared_max_angle_unclick,
            0.0,
            1.0,
        )?;
        require_non_negative("poke.deadcone-enlargement-ratio", self.deadcone_enlargement_ratio)?;
        require_non_negative("poke.deadcone-max-increase", self.deadcone_max_increase)?;
        require_non_negative("poke.deadcone-shrink-speed", self.deadcone_shrink_speed)?;
        require_non_negative("poke.drag-start-distance", self.drag_start_distance)?;
        if let Some(t) = self.drag_start_time_s {
            require_non_negative("poke.drag-start-time", t)?;
        }
        require_non_negative("poke.drag-deadzone-shrink-rate", self.drag_deadzone_shrink_rate)?;
        require_non_negative(
            "poke.drag-deadzone-shrink-distance",
            self.drag_deadzone_shrink_distance,
        )
    }

    /// Longest window any query looks back over.
    fn history_span_ms(&self) -> f32 {
        self.time_to_click_ms
            .max(self.time_to_unclick_ms)
            .max(self.time_to_slowdown_ms)
    }

    fn drag_thresholds(&self) -> DragThresholds {
        DragThresholds {
            distance_m: self.drag_start_distance,
            time_s: self.drag_start_time_s,
        }
    }
}

// ── State ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PokePhase {
    /// No hand in range.
    Idle,
    Hovering,
    Pressing,
}

impl PokePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Hovering => "hovering",
            Self::Pressing => "pressing",
        }
    }
}

/// Poke recognizer state for one hand slot.
#[derive(Debug, Clone)]
pub struct PokeState {
    pub config: PokeConfig,
    phase: PokePhase,
    history: SampleHistory,
    /// A jab has been recognised; waiting for it to slow down.
    checking_click_end: bool,
    /// Distance at which the current jab was recognised.
    recognised_distance: f32,
    entry_cooldown: CooldownState,
    click_cooldown: CooldownState,
    dragging: bool,
    drag_shrink_triggered: bool,
    drag: DragDetector,
    /// Cursor where the press landed (pixels); holds are reported there.
    down_cursor: [f32; 2],
}

impl PokeState {
    pub fn new(config: PokeConfig) -> Self {
        let history = SampleHistory::new(config.history_span_ms());
        Self {
            config,
            phase: PokePhase::Idle,
            history,
            checking_click_end: false,
            recognised_distance: 0.0,
            entry_cooldown: CooldownState::default(),
            click_cooldown: CooldownState::default(),
            dragging: false,
            drag_shrink_triggered: false,
            drag: DragDetector::new(),
            down_cursor: [0.0, 0.0],
        }
    }

    /// Replace the configuration, resizing the history window to match.
    pub fn set_config(&mut self, config: PokeConfig) {
        self.history.set_span_ms(config.history_span_ms());
        self.config = config;
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    pub fn phase(&self) -> PokePhase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Drop the sample history after a tracking gap so no gesture spans
    /// it. A jab waiting on its slowdown is abandoned.
    pub fn resync(&mut self, stabiliser: &mut DeadzoneStabiliser) {
        self.history.clear();
        if self.checking_click_end {
            self.checking_click_end = false;
            stabiliser.start_shrinking(ShrinkMode::TimeBased {
                rate: self.config.deadcone_shrink_speed,
            });
        }
    }

    pub(crate) fn update(
        &mut self,
        input: &FrameInput,
        stabiliser: &mut DeadzoneStabiliser,
        ctx: &FrameContext,
    ) -> Step {
        let distance = input.positions.distance;
        self.history.push(HistorySample {
            timestamp_us: input.timestamp_us,
            distance,
            position: input.cursor_m,
        });
        let dt_ms = input.dt as f64 * 1000.0;
        self.entry_cooldown.update(dt_ms);
        self.click_cooldown.update(dt_ms);

        if self.history.len() <= 1 && self.phase != PokePhase::Pressing {
            return Step::new(InputKind::Move, 0.0);
        }

        if distance > self.config.max_distance {
            return self.leave_range(stabiliser);
        }

        if self.phase == PokePhase::Idle {
            debug!("poke: hand in range at {:.3}m", distance);
            self.phase = PokePhase::Hovering;
            self.entry_cooldown.start(self.config.cooldown_on_entry_ms);
        }

        match self.phase {
            PokePhase::Pressing => self.update_pressing(input, stabiliser, ctx),
            _ if self.entry_cooldown.is_active() || self.click_cooldown.is_active() => {
                Step::new(InputKind::Move, 0.0)
            }
            _ => self.update_hovering(input, stabiliser, ctx),
        }
    }

    /// Hand went past `max-distance`. An open press is cancelled.
    fn leave_range(&mut self, stabiliser: &mut DeadzoneStabiliser) -> Step {
        let was_pressing = self.phase == PokePhase::Pressing;
        if self.phase != PokePhase::Idle {
            debug!("poke: hand out of range");
            stabiliser.start_shrinking(ShrinkMode::TimeBased {
                rate: self.config.deadcone_shrink_speed,
            });
        }
        self.phase = PokePhase::Idle;
        self.checking_click_end = false;
        self.dragging = false;
        self.drag.reset();
        self.entry_cooldown.stop();
        if was_pressing {
            Step::new(InputKind::Cancel, 0.0)
        } else {
            Step::new(InputKind::Move, 0.0)
        }
    }

    fn update_hovering(
        &mut self,
        input: &FrameInput,
        stabiliser: &mut DeadzoneStabiliser,
        ctx: &FrameContext,
    ) -> Step {
        let c = &self.config;
        let distance = input.positions.distance;
        let mut to_click = false;

        if self.checking_click_end {
            let default = stabiliser.default_radius();
            let travelled = (distance - self.recognised_distance).abs();
            let enlarged = default + c.deadcone_enlargement_ratio * travelled;
            stabiliser.set_radius(enlarged.min(default + c.deadcone_max_increase));

            let still_approaching = self.history.monotonic_motion(
                c.time_to_slowdown_ms,
                c.slowdown_distance,
                Direction::Approaching,
            );
            if !still_approaching {
                self.checking_click_end = false;
                to_click = self.history.cos_squared_angle(c.time_to_click_ms) > c.cos_squared_max_angle;
                if !to_click {
                    debug!("poke: jab ended off-axis, abandoned");
                    stabiliser.start_shrinking(ShrinkMode::TimeBased {
                        rate: c.deadcone_shrink_speed,
                    });
                }
            }
        } else if self.history.monotonic_motion(
            c.time_to_click_ms,
            c.min_click_distance,
            Direction::Approaching,
        ) && self.history.cos_squared_angle(c.time_to_click_ms) > c.cos_squared_max_angle
        {
            debug!("poke: jab recognised at {:.3}m", distance);
            self.checking_click_end = true;
            self.recognised_distance = distance;
            stabiliser.set_radius(stabiliser.default_radius());
        }

        if to_click {
            debug!("poke: down at {:.3}m", distance);
            self.phase = PokePhase::Pressing;
            self.dragging = false;
            self.drag_shrink_triggered = false;
            self.drag.begin(input.cursor_m);
            self.down_cursor = input.positions.cursor;
            Step::new(InputKind::Down, 1.0)
        } else if ctx.settings.hover_enabled {
            Step::new(InputKind::Hover, 0.0)
        } else {
            Step::new(InputKind::Move, 0.0)
        }
    }

    fn update_pressing(
        &mut self,
        input: &FrameInput,
        stabiliser: &mut DeadzoneStabiliser,
        ctx: &FrameContext,
    ) -> Step {
        let c = &self.config;
        let drag_enabled = ctx.settings.drag_enabled;
        self.drag.advance(input.dt);

        let unclick = if c.immediate_unclick && !drag_enabled {
            true
        } else {
            self.history.monotonic_motion(
                c.time_to_unclick_ms,
                c.min_unclick_distance,
                Direction::Withdrawing,
            ) && self.history.cos_squared_angle(c.time_to_unclick_ms)
                > c.cos_squared_max_angle_unclick
        };

        if unclick {
            debug!("poke: up (dragging {})", self.dragging);
            stabiliser.start_shrinking(ShrinkMode::TimeBased {
                rate: c.deadcone_shrink_speed,
            });
            self.phase = PokePhase::Hovering;
            self.dragging = false;
            self.drag.reset();
            self.click_cooldown.start(c.click_cooldown_ms);
            return Step::new(InputKind::Up, 0.0);
        }

        if self.dragging {
            let moved = self
                .drag
                .origin()
                .map_or(false, |origin| distance2(origin, input.cursor_m) > c.drag_deadzone_shrink_distance);
            if !self.drag_shrink_triggered && moved {
                stabiliser.start_shrinking(ShrinkMode::MotionBased {
                    rate: c.drag_deadzone_shrink_rate,
                });
                self.drag_shrink_triggered = true;
            }
            return Step::new(InputKind::Drag, 1.0);
        }

        if drag_enabled && self.drag.check(input.cursor_m, &c.drag_thresholds()) {
            debug!("poke: drag started after {:.2}s", self.drag.elapsed_s());
            self.dragging = true;
        }
        let held = Positions {
            cursor: self.down_cursor,
            ..input.positions
        };
        Step::new(InputKind::Hold, 1.0).at(held)
    }

    /// Generate s-expression for status output.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:phase {} :checking-click-end {} :dragging {} :cooldown {} :samples {})",
            self.phase.as_str(),
            fmt_bool(self.checking_click_end),
            fmt_bool(self.dragging),
            fmt_bool(self.entry_cooldown.is_active() || self.click_cooldown.is_active()),
            self.history.len(),
        )
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::super::{InteractionKind, PointerEvent, RecognizerState, TestRig};
    use super::*;
    use crate::config::EngineConfig;

    /// Per-frame travel for a 0.5 m/s jab at 10ms frames.
    const JAB_STEP: f32 = 0.005;

    fn rig_with(config: EngineConfig) -> TestRig {
        TestRig::new(InteractionKind::Poke, config)
    }

    fn poke_state(rig: &TestRig) -> &PokeState {
        match rig.recognizer.state() {
            RecognizerState::Poke(s) => s,
            other => panic!("Expected poke state, got {:?}", other),
        }
    }

    /// Hold still at `z` until the entry cooldown has passed.
    fn settle(rig: &mut TestRig, z: f32) {
        for _ in 0..40 {
            rig.frame_at([0.0, 0.15, z]);
        }
    }

    /// Jab straight at the screen for `frames`, then hold still for
    /// `still` frames. Returns every event and the final z.
    fn jab(rig: &mut TestRig, mut z: f32, frames: usize, still: usize) -> (Vec<PointerEvent>, f32) {
        let mut events = Vec::new();
        for _ in 0..frames {
            z -= JAB_STEP;
            events.push(rig.frame_at([0.0, 0.15, z]));
        }
        for _ in 0..still {
            events.push(rig.frame_at([0.0, 0.15, z]));
        }
        (events, z)
    }

    fn count(events: &[PointerEvent], input: InputKind) -> usize {
        events.iter().filter(|e| e.input == input).count()
    }

    #[test]
    fn test_jab_clicks_and_pullback_releases() {
        let mut rig = rig_with(EngineConfig::default());
        settle(&mut rig, 0.25);
        let (mut events, mut z) = jab(&mut rig, 0.25, 12, 20);
        assert_eq!(count(&events, InputKind::Down), 1, "events: {:?}", events);
        let down_at = events.iter().position(|e| e.input == InputKind::Down).unwrap();
        assert!(down_at >= 12, "Down before the jab ended, at {}", down_at);
        assert_eq!(events[down_at + 1].input, InputKind::Hold);
        assert!(count(&events, InputKind::Drag) > 0, "held press should become a drag");

        for _ in 0..15 {
            z += JAB_STEP;
            events.push(rig.frame_at([0.0, 0.15, z]));
        }
        assert_eq!(count(&events, InputKind::Up), 1, "events: {:?}", events);
        assert_eq!(poke_state(&rig).phase(), PokePhase::Hovering);
    }

    #[test]
    fn test_hold_reported_at_press_position() {
        let mut rig = rig_with(EngineConfig::default());
        settle(&mut rig, 0.25);
        let (events, _) = jab(&mut rig, 0.25, 12, 3);
        let down = events.iter().find(|e| e.input == InputKind::Down).unwrap();
        let hold = events.iter().find(|e| e.input == InputKind::Hold).unwrap();
        assert_eq!(hold.positions.cursor, down.positions.cursor);
    }

    #[test]
    fn test_angled_jab_does_not_click() {
        let mut rig = rig_with(EngineConfig::default());
        settle(&mut rig, 0.25);
        let (mut x, mut z) = (0.0, 0.25);
        for _ in 0..15 {
            // Twice as much sideways travel as forward travel.
            x += 2.0 * JAB_STEP;
            z -= JAB_STEP;
            let e = rig.frame_at([x, 0.15, z]);
            assert_ne!(e.input, InputKind::Down);
        }
        for _ in 0..10 {
            assert_ne!(rig.frame_at([x, 0.15, z]).input, InputKind::Down);
        }
    }

    #[test]
    fn test_entry_cooldown_blocks_click() {
        let mut rig = rig_with(EngineConfig::default());
        let (events, _) = jab(&mut rig, 0.3, 20, 5);
        assert_eq!(count(&events, InputKind::Down), 0, "events: {:?}", events);
        assert!(poke_state(&rig).status_sexp().contains(":cooldown t"));
    }

    #[test]
    fn test_click_cooldown_after_release() {
        let mut config = EngineConfig::default();
        config.global.drag_enabled = false;
        let mut rig = rig_with(config);
        settle(&mut rig, 0.25);
        let (events, z) = jab(&mut rig, 0.25, 12, 3);
        assert_eq!(count(&events, InputKind::Down), 1);
        // A second jab right away lands inside the click cooldown.
        let (events, _) = jab(&mut rig, z, 12, 3);
        assert_eq!(count(&events, InputKind::Down), 0, "events: {:?}", events);
    }

    #[test]
    fn test_immediate_unclick_without_drag() {
        let mut config = EngineConfig::default();
        config.global.drag_enabled = false;
        let mut rig = rig_with(config);
        settle(&mut rig, 0.25);
        let (events, _) = jab(&mut rig, 0.25, 12, 5);
        let down_at = events.iter().position(|e| e.input == InputKind::Down).unwrap();
        assert_eq!(events[down_at + 1].input, InputKind::Up, "events: {:?}", events);
        assert_eq!(count(&events, InputKind::Up), 1);
    }

    #[test]
    fn test_leaving_range_cancels_press() {
        let mut rig = rig_with(EngineConfig::default());
        settle(&mut rig, 0.25);
        let (events, _) = jab(&mut rig, 0.25, 12, 2);
        assert_eq!(count(&events, InputKind::Down), 1);

        let e = rig.frame_at([0.0, 0.15, 0.6]);
        assert_eq!(e.input, InputKind::Cancel);
        assert_eq!(poke_state(&rig).phase(), PokePhase::Idle);
        assert_eq!(rig.frame_at([0.0, 0.15, 0.6]).input, InputKind::Move);
    }

    #[test]
    fn test_hover_events_when_enabled() {
        let mut config = EngineConfig::default();
        config.global.hover_enabled = true;
        let mut rig = rig_with(config);
        settle(&mut rig, 0.25);
        assert_eq!(rig.frame_at([0.0, 0.15, 0.25]).input, InputKind::Hover);
    }

    #[test]
    fn test_resync_clears_history() {
        let mut rig = rig_with(EngineConfig::default());
        settle(&mut rig, 0.25);
        rig.recognizer.resync();
        assert!(poke_state(&rig).status_sexp().contains(":samples 0"));
        assert_eq!(rig.frame_at([0.0, 0.15, 0.25]).input, InputKind::Move);
    }

    #[test]
    fn test_jab_split_by_resync_does_not_click() {
        let mut rig = rig_with(EngineConfig::default());
        settle(&mut rig, 0.25);
        let (mut events, z) = jab(&mut rig, 0.25, 6, 0);
        rig.recognizer.resync();
        let (rest, _) = jab(&mut rig, z, 6, 5);
        events.extend(rest);
        assert_eq!(count(&events, InputKind::Down), 0, "events: {:?}", events);
    }

    #[test]
    fn test_resync_mid_press_keeps_press() {
        let mut rig = rig_with(EngineConfig::default());
        settle(&mut rig, 0.25);
        let (events, z) = jab(&mut rig, 0.25, 12, 2);
        assert_eq!(count(&events, InputKind::Down), 1);
        rig.recognizer.resync();
        let e = rig.frame_at([0.0, 0.15, z]);
        assert!(matches!(e.input, InputKind::Hold | InputKind::Drag), "got {:?}", e);
        assert!(rig.recognizer.is_pressing());
    }

    #[test]
    fn test_set_config_resizes_history() {
        let mut state = PokeState::new(PokeConfig::default());
        let config = PokeConfig {
            time_to_unclick_ms: 250.0,
            ..PokeConfig::default()
        };
        state.set_config(config);
        assert_eq!(state.config.history_span_ms(), 250.0);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(PokeConfig::default().validate().is_ok());
        let bad = PokeConfig {
            cos_squared_max_angle: 1.5,
            ..PokeConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
