//! Threshold recognizer: a press while a metric is past a fixed threshold.
//!
//! Two triggers share the state machine. `Distance` is the touch-plane:
//! the pointer crosses a virtual plane floating in front of the screen.
//! `Grab` presses while the hand is closed.

use super::{FrameContext, FrameInput, InputKind, Positions, Step};
use crate::config::{require_non_negative, require_positive, require_range, ConfigError};
use crate::curve::ResponseCurve;
use crate::drag::{DragDetector, DragThresholds};
use crate::math::clamp01;
use crate::selector::SelectorPolicy;
use crate::sexp::fmt_bool;
use crate::stabiliser::{DeadzoneStabiliser, ShrinkMode};
use tracing::debug;

/// An open grab stays pressed until the strength drops this far below
/// the threshold.
const GRAB_RELEASE_MARGIN: f32 = 0.1;

// ── Config ─────────────────────────────────────────────────

/// How the deadzone radius follows the hand while not pressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadzoneScaling {
    /// Radius stays at the default.
    Fixed,
    /// Radius grows as the pointer nears the plane.
    ByDistance,
    /// No stabilisation at all.
    Bypass,
}

impl DeadzoneScaling {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::ByDistance => "by-distance",
            Self::Bypass => "bypass",
        }
    }

    pub fn from_name(name: &str) -> Option<DeadzoneScaling> {
        match name {
            "fixed" => Some(Self::Fixed),
            "by-distance" => Some(Self::ByDistance),
            "bypass" => Some(Self::Bypass),
            _ => None,
        }
    }
}

/// Configuration shared by the touch-plane and grab recognizers.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneConfig {
    /// Distance from the screen at which the plane sits (meters).
    pub plane_distance: f32,
    /// Distance in front of the plane at which progress reaches zero.
    pub zero_progress_distance: f32,
    /// Grab strength that presses.
    pub grab_threshold: f32,
    pub drag_start_distance: f32,
    pub drag_start_time_s: Option<f32>,
    pub deadzone_max_increase: f32,
    /// Motion-based shrink rate after a release.
    pub deadzone_shrink_rate: f32,
    pub deadzone_scaling: DeadzoneScaling,
    pub selector: SelectorPolicy,
}

impl Default for PlaneConfig {
    fn default() -> Self {
        Self {
            plane_distance: 0.05,
            zero_progress_distance: 0.1,
            grab_threshold: 0.8,
            drag_start_distance: 0.01,
            drag_start_time_s: None,
            deadzone_max_increase: 0.02,
            deadzone_shrink_rate: 0.3,
            deadzone_scaling: DeadzoneScaling::Fixed,
            selector: SelectorPolicy::Nearest,
        }
    }
}

impl PlaneConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("plane.plane-distance", self.plane_distance)?;
        require_positive("plane.zero-progress-distance", self.zero_progress_distance)?;
        require_range("plane.grab-threshold", self.grab_threshold, 0.0, 1.0)?;
        require_non_negative("plane.drag-start-distance", self.drag_start_distance)?;
        if let Some(t) = self.drag_start_time_s {
            require_non_negative("plane.drag-start-time", t)?;
        }
        require_non_negative("plane.deadzone-max-increase", self.deadzone_max_increase)?;
        require_non_negative("plane.deadzone-shrink-rate", self.deadzone_shrink_rate)
    }
}

// ── State ──────────────────────────────────────────────────

/// What has to be past the threshold for a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneTrigger {
    /// Pointer closer to the screen than `plane-distance`.
    Distance,
    /// Grab strength at or above `grab-threshold`.
    Grab,
}

impl PlaneTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Distance => "touch-plane",
            Self::Grab => "grab",
        }
    }
}

/// Threshold recognizer state for one hand slot.
#[derive(Debug, Clone)]
pub struct PlaneState {
    pub config: PlaneConfig,
    trigger: PlaneTrigger,
    pressing: bool,
    /// The drag-disabled release has already been sent for this press.
    press_complete: bool,
    dragging: bool,
    /// The hand has been seen on the released side since it was acquired.
    hand_ready: bool,
    drag: DragDetector,
    down_positions: Positions,
}

impl PlaneState {
    pub fn new(config: PlaneConfig, trigger: PlaneTrigger) -> Self {
        Self {
            config,
            trigger,
            pressing: false,
            press_complete: false,
            dragging: false,
            hand_ready: false,
            drag: DragDetector::new(),
            down_positions: Positions::default(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone(), self.trigger);
    }

    pub fn trigger(&self) -> PlaneTrigger {
        self.trigger
    }

    pub fn is_pressing(&self) -> bool {
        self.pressing
    }

    pub(crate) fn update(
        &mut self,
        input: &FrameInput,
        stabiliser: &mut DeadzoneStabiliser,
        ctx: &FrameContext,
    ) -> Step {
        let distance = input.positions.distance;
        let (crossed, progress) = match self.trigger {
            PlaneTrigger::Distance => {
                let c = &self.config;
                let progress = clamp01(1.0 - (distance - c.plane_distance) / c.zero_progress_distance);
                (distance < c.plane_distance, progress)
            }
            PlaneTrigger::Grab => {
                let Some(strength) = input.hand.grab_strength() else {
                    return Step::new(InputKind::None, 0.0);
                };
                let threshold = if self.pressing {
                    self.config.grab_threshold - GRAB_RELEASE_MARGIN
                } else {
                    self.config.grab_threshold
                };
                (strength >= threshold, strength)
            }
        };

        if !self.pressing {
            self.scale_deadzone(distance, stabiliser);
        }

        if !crossed {
            return self.release(progress, input, stabiliser);
        }
        if !self.hand_ready {
            return Step::new(InputKind::Move, progress);
        }

        if !self.pressing {
            debug!("{}: down at {:.3}m", self.trigger.as_str(), distance);
            self.pressing = true;
            self.press_complete = false;
            self.dragging = false;
            self.drag.begin(input.cursor_m);
            self.down_positions = input.positions;
            return Step::new(InputKind::Down, progress);
        }

        self.drag.advance(input.dt);
        if ctx.settings.drag_enabled {
            let thresholds = DragThresholds {
                distance_m: self.config.drag_start_distance,
                time_s: self.config.drag_start_time_s,
            };
            if !self.dragging && self.drag.check(input.cursor_m, &thresholds) {
                debug!("{}: drag started", self.trigger.as_str());
                self.dragging = true;
            }
            let kind = if self.dragging { InputKind::Move } else { InputKind::None };
            Step::new(kind, progress)
        } else if !self.press_complete {
            self.press_complete = true;
            Step::new(InputKind::Up, progress).at(self.at_press(input))
        } else {
            Step::new(InputKind::None, progress)
        }
    }

    /// Back on the released side: close any open press.
    fn release(&mut self, progress: f32, input: &FrameInput, stabiliser: &mut DeadzoneStabiliser) -> Step {
        self.hand_ready = true;
        let owed = self.pressing && !self.press_complete;
        if self.pressing {
            debug!("{}: released", self.trigger.as_str());
            stabiliser.start_shrinking(ShrinkMode::MotionBased {
                rate: self.config.deadzone_shrink_rate,
            });
        }
        self.pressing = false;
        self.press_complete = false;
        self.dragging = false;
        self.drag.reset();
        if owed {
            Step::new(InputKind::Up, progress).at(self.at_press(input))
        } else {
            Step::new(InputKind::Move, progress)
        }
    }

    /// Current positions with the pointer pinned to where the press landed.
    fn at_press(&self, input: &FrameInput) -> Positions {
        Positions {
            cursor: self.down_positions.cursor,
            click: self.down_positions.click,
            distance: input.positions.distance,
        }
    }

    fn scale_deadzone(&self, distance: f32, stabiliser: &mut DeadzoneStabiliser) {
        let c = &self.config;
        match c.deadzone_scaling {
            DeadzoneScaling::Fixed => stabiliser.set_bypassed(false),
            DeadzoneScaling::Bypass => stabiliser.set_bypassed(true),
            DeadzoneScaling::ByDistance => {
                stabiliser.set_bypassed(false);
                stabiliser.scale_by_distance(
                    distance - c.plane_distance,
                    c.zero_progress_distance,
                    c.deadzone_max_increase,
                    ResponseCurve::Linear,
                );
            }
        }
    }

    /// Generate s-expression for status output.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:trigger {} :pressing {} :dragging {} :ready {} :scaling {})",
            self.trigger.as_str(),
            fmt_bool(self.pressing),
            fmt_bool(self.dragging),
            fmt_bool(self.hand_ready),
            self.config.deadzone_scaling.as_str(),
        )
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::super::{InteractionKind, RecognizerState, TestRig};
    use super::*;
    use crate::config::EngineConfig;
    use crate::hand::{make_sample, Chirality, HandJoint, HandSample};

    fn touch_rig(config: EngineConfig) -> TestRig {
        TestRig::new(InteractionKind::TouchPlane, config)
    }

    fn plane_state(rig: &TestRig) -> &PlaneState {
        match rig.recognizer.state() {
            RecognizerState::Plane(s) => s,
            other => panic!("Expected plane state, got {:?}", other),
        }
    }

    #[test]
    fn test_progress_tracks_distance() {
        let mut rig = touch_rig(EngineConfig::default());
        let far = rig.frame_at([0.0, 0.1, 0.2]);
        assert_eq!(far.input, InputKind::Move);
        assert_eq!(far.progress, 0.0);
        let mid = rig.frame_at([0.0, 0.1, 0.1]);
        assert!((mid.progress - 0.5).abs() < 1e-4, "got {}", mid.progress);
    }

    #[test]
    fn test_cross_hold_and_release() {
        let mut rig = touch_rig(EngineConfig::default());
        rig.frame_at([0.0, 0.1, 0.2]);
        let down = rig.frame_at([0.0, 0.1, 0.02]);
        assert_eq!(down.input, InputKind::Down);
        assert_eq!(down.progress, 1.0);
        // Pressed and still: nothing to report yet.
        assert_eq!(rig.frame_at([0.0, 0.1, 0.02]).input, InputKind::None);
        let up = rig.frame_at([0.0, 0.1, 0.2]);
        assert_eq!(up.input, InputKind::Up);
        assert_eq!(up.positions.cursor, down.positions.cursor);
        assert_eq!(rig.frame_at([0.0, 0.1, 0.2]).input, InputKind::Move);
    }

    #[test]
    fn test_drag_reports_move() {
        let mut rig = touch_rig(EngineConfig::default());
        rig.frame_at([0.0, 0.1, 0.2]);
        rig.frame_at([0.0, 0.1, 0.02]);
        let e = rig.frame_at([0.03, 0.1, 0.02]);
        assert_eq!(e.input, InputKind::Move);
        assert!(rig.recognizer.is_pressing());
    }

    #[test]
    fn test_drag_disabled_single_up() {
        let mut config = EngineConfig::default();
        config.global.drag_enabled = false;
        let mut rig = touch_rig(config);
        rig.frame_at([0.0, 0.1, 0.2]);
        assert_eq!(rig.frame_at([0.0, 0.1, 0.02]).input, InputKind::Down);
        assert_eq!(rig.frame_at([0.0, 0.1, 0.02]).input, InputKind::Up);
        assert_eq!(rig.frame_at([0.0, 0.1, 0.02]).input, InputKind::None);
        assert_eq!(rig.frame_at([0.0, 0.1, 0.2]).input, InputKind::Move);
    }

    #[test]
    fn test_hand_acquired_past_plane_waits() {
        let mut rig = touch_rig(EngineConfig::default());
        assert_eq!(rig.frame_at([0.0, 0.1, 0.02]).input, InputKind::Move);
        assert_eq!(rig.frame_at([0.0, 0.1, 0.02]).input, InputKind::Move);
        assert_eq!(rig.frame_at([0.0, 0.1, 0.2]).input, InputKind::Move);
        assert_eq!(rig.frame_at([0.0, 0.1, 0.02]).input, InputKind::Down);
    }

    #[test]
    fn test_deadzone_scales_by_distance() {
        let mut config = EngineConfig::default();
        config.plane.deadzone_scaling = DeadzoneScaling::ByDistance;
        let mut rig = touch_rig(config);
        rig.frame_at([0.0, 0.1, 0.3]);
        let far = rig.recognizer.stabiliser().current_radius();
        rig.frame_at([0.0, 0.1, 0.06]);
        let near = rig.recognizer.stabiliser().current_radius();
        assert!(near > far, "near {} far {}", near, far);
    }

    #[test]
    fn test_bypass_scaling() {
        let mut config = EngineConfig::default();
        config.plane.deadzone_scaling = DeadzoneScaling::Bypass;
        let mut rig = touch_rig(config);
        rig.frame_at([0.0, 0.1, 0.2]);
        assert!(rig.recognizer.stabiliser().is_bypassed());
    }

    /// Palm at `origin`, fingertips `spread` meters above it.
    fn grab_sample(ts: u64, origin: [f32; 3], spread: f32) -> HandSample {
        let mut sample = make_sample(Chirality::Right, ts, origin);
        for tip in HandJoint::fingertip_joints() {
            sample.set_joint(tip, [origin[0], origin[1] + spread, origin[2]]);
        }
        sample
    }

    #[test]
    fn test_grab_presses_on_closed_hand() {
        let mut config = EngineConfig::default();
        // Track the wrist so curling the fingers does not move the pointer.
        config.plane.selector = SelectorPolicy::Wrist;
        let mut rig = TestRig::new(InteractionKind::Grab, config);
        let open = grab_sample(rig.timestamp_us, [0.0, 0.1, 0.2], 0.1);
        let e = rig.frame(Some(&open));
        assert_eq!(e.input, InputKind::Move);
        assert_eq!(e.progress, 0.0);

        let fist = grab_sample(rig.timestamp_us, [0.0, 0.1, 0.2], 0.0);
        assert_eq!(rig.frame(Some(&fist)).input, InputKind::Down);
        assert_eq!(plane_state(&rig).trigger(), PlaneTrigger::Grab);

        // Slightly relaxed but within the release margin: still pressed.
        let relaxed = grab_sample(rig.timestamp_us, [0.0, 0.1, 0.2], 0.05);
        assert_eq!(rig.frame(Some(&relaxed)).input, InputKind::None);

        let open = grab_sample(rig.timestamp_us, [0.0, 0.1, 0.2], 0.1);
        assert_eq!(rig.frame(Some(&open)).input, InputKind::Up);
    }

    #[test]
    fn test_scaling_names() {
        for scaling in [
            DeadzoneScaling::Fixed,
            DeadzoneScaling::ByDistance,
            DeadzoneScaling::Bypass,
        ] {
            assert_eq!(DeadzoneScaling::from_name(scaling.as_str()), Some(scaling));
        }
    }

    #[test]
    fn test_status_sexp() {
        let state = PlaneState::new(PlaneConfig::default(), PlaneTrigger::Distance);
        let s = state.status_sexp();
        assert!(s.contains(":trigger touch-plane"), "got {}", s);
        assert!(s.contains(":ready nil"), "got {}", s);
    }
}
