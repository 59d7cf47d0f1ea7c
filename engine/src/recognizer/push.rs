//! Force-spring "push" recognizer.
//!
//! Finger motion toward the screen charges a virtual spring. The
//! stiffness depends on approach speed, so a quick short jab and a slow
//! long press both reach full force. Sideways motion bleeds the force
//! away. Full force clicks; falling back below the unclick threshold
//! releases.

use super::{FrameContext, FrameInput, InputKind, Step};
use crate::config::{require_non_negative, require_ordered, require_positive, require_range, ConfigError};
use crate::curve::ResponseCurve;
use crate::drag::{DragDetector, DragThresholds};
use crate::filter::FilterConfig;
use crate::math::{clamp01, distance2, lerp};
use crate::selector::SelectorPolicy;
use crate::sexp::fmt_bool;
use crate::stabiliser::{DeadzoneStabiliser, ShrinkMode};
use crate::timer::CooldownState;
use tracing::debug;

/// Frames shorter than this integrate no force.
const MIN_DT_S: f32 = 1e-5;
/// Force changes smaller than this neither grow nor shrink the deadzone.
const FORCE_EPSILON: f32 = 1e-4;
/// Decay keeps running until the force is this far under the unclick threshold.
const DECAY_MARGIN: f32 = 0.1;

// ── Config ─────────────────────────────────────────────────

/// Configuration for the push recognizer. Distances in meters,
/// speeds in meters per second.
#[derive(Debug, Clone, PartialEq)]
pub struct PushConfig {
    /// Approach speeds are clamped into speed-min..=speed-max.
    pub speed_min: f32,
    pub speed_max: f32,
    /// Travel needed for a full click at speed-min.
    pub dist_at_speed_min: f32,
    /// Travel needed for a full click at speed-max.
    pub dist_at_speed_max: f32,
    /// Sideways travel that drains a full charge.
    pub horizontal_decay_dist: f32,
    /// Motion within theta-one of straight-on counts as a press.
    pub theta_one_deg: f32,
    /// Motion beyond theta-two (i.e. withdrawing) counts as a release.
    pub theta_two_deg: f32,
    pub unclick_threshold: f32,
    pub unclick_threshold_drag: f32,
    /// Actively drain force after a release. Every release blocks
    /// re-charging until the force falls clear of the unclick threshold.
    pub decay_force_on_click: bool,
    pub force_decay_time_s: f32,
    /// Past the touch plane, approach speed charges at a fixed stiffness.
    pub use_touch_plane_force: bool,
    pub touch_plane_distance: f32,
    pub dist_past_touch_plane: f32,
    pub drag_start_distance: f32,
    pub drag_deadzone_shrink_rate: f32,
    pub deadzone_max_increase: f32,
    pub deadzone_shrink_rate: f32,
    /// Shapes the speed-to-stiffness ratio.
    pub curve: ResponseCurve,
    pub cooldown_on_entry_ms: f64,
    /// A press that has not become a drag releases after this long.
    pub click_hold_ms: f64,
    /// Smooth the projected pointer before the deadzone.
    pub position_filter: bool,
    pub filter: FilterConfig,
    pub selector: SelectorPolicy,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            speed_min: 0.15,
            speed_max: 0.5,
            dist_at_speed_min: 0.042,
            dist_at_speed_max: 0.008,
            horizontal_decay_dist: 0.05,
            theta_one_deg: 65.0,
            theta_two_deg: 135.0,
            unclick_threshold: 0.97,
            unclick_threshold_drag: 0.97,
            decay_force_on_click: true,
            force_decay_time_s: 0.1,
            use_touch_plane_force: true,
            touch_plane_distance: 0.0,
            dist_past_touch_plane: 0.02,
            drag_start_distance: 0.03,
            drag_deadzone_shrink_rate: 0.9,
            deadzone_max_increase: 0.02,
            deadzone_shrink_rate: 0.8,
            curve: ResponseCurve::Quadratic,
            cooldown_on_entry_ms: 300.0,
            click_hold_ms: 1500.0,
            position_filter: false,
            filter: FilterConfig::default(),
            selector: SelectorPolicy::StableIndex,
        }
    }
}

impl PushConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("push.speed-min", self.speed_min)?;
        require_ordered("push.speed-min", self.speed_min, "push.speed-max", self.speed_max)?;
        require_positive("push.dist-at-speed-min", self.dist_at_speed_min)?;
        require_positive("push.dist-at-speed-max", self.dist_at_speed_max)?;
        require_positive("push.horizontal-decay-dist", self.horizontal_decay_dist)?;
        require_range("push.theta-one", self.theta_one_deg, 0.0, 180.0)?;
        require_range("push.theta-two", self.theta_two_deg, 0.0, 180.0)?;
        require_ordered("push.theta-one", self.theta_one_deg, "push.theta-two", self.theta_two_deg)?;
        require_range("push.unclick-threshold", self.unclick_threshold, 0.0, 1.0)?;
        require_range("push.unclick-threshold-drag", self.unclick_threshold_drag, 0.0, 1.0)?;
        require_positive("push.force-decay-time", self.force_decay_time_s)?;
        require_positive("push.dist-past-touch-plane", self.dist_past_touch_plane)?;
        require_non_negative("push.drag-start-distance", self.drag_start_distance)?;
        require_non_negative("push.drag-deadzone-shrink-rate", self.drag_deadzone_shrink_rate)?;
        require_non_negative("push.deadzone-max-increase", self.deadzone_max_increase)?;
        require_non_negative("push.deadzone-shrink-rate", self.deadzone_shrink_rate)?;
        require_non_negative("push.cooldown-on-entry-ms", self.cooldown_on_entry_ms as f32)?;
        require_non_negative("push.click-hold-ms", self.click_hold_ms as f32)?;
        self.filter.validate("push")
    }
}

// ── State ──────────────────────────────────────────────────

/// Push recognizer state for one hand slot.
#[derive(Debug, Clone)]
pub struct PushState {
    pub config: PushConfig,
    /// Spring charge, 0.0-1.0.
    applied_force: f32,
    pressing: bool,
    dragging: bool,
    /// Set by a release; blocks re-charging until the force has drained.
    decaying_force: bool,
    /// Distance and cursor (screen meters) from the previous frame.
    previous: Option<(f32, [f32; 2])>,
    entry_cooldown: CooldownState,
    press_held_ms: f64,
    drag: DragDetector,
}

impl PushState {
    pub fn new(config: PushConfig) -> Self {
        Self {
            config,
            applied_force: 0.0,
            pressing: false,
            dragging: false,
            decaying_force: false,
            previous: None,
            entry_cooldown: CooldownState::default(),
            press_held_ms: 0.0,
            drag: DragDetector::new(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    pub fn applied_force(&self) -> f32 {
        self.applied_force
    }

    pub fn is_pressing(&self) -> bool {
        self.pressing
    }

    pub fn is_decaying(&self) -> bool {
        self.decaying_force
    }

    /// Forget the previous frame after a tracking gap. Velocity across
    /// the gap is meaningless, so the next frame starts a new baseline.
    pub fn resync(&mut self) {
        self.previous = None;
    }

    pub(crate) fn update(
        &mut self,
        input: &FrameInput,
        stabiliser: &mut DeadzoneStabiliser,
        ctx: &FrameContext,
    ) -> Step {
        let distance = input.positions.distance;
        let Some((prev_distance, prev_cursor)) = self.previous.replace((distance, input.cursor_m))
        else {
            if self.pressing {
                return Step::new(InputKind::None, self.applied_force);
            }
            self.entry_cooldown.start(self.config.cooldown_on_entry_ms);
            return Step::new(InputKind::Move, self.applied_force);
        };

        let dt_ms = input.dt as f64 * 1000.0;
        self.entry_cooldown.update(dt_ms);
        if self.entry_cooldown.is_active() {
            return Step::new(InputKind::Move, self.applied_force);
        }

        let d_perp = distance2(input.cursor_m, prev_cursor);
        let delta = self.force_change(prev_distance - distance, d_perp, distance, input.dt)
            * input.hand.confidence.clamp(0.0, 1.0);
        self.applied_force = clamp01(self.applied_force + delta);

        if self.decaying_force
            && self.applied_force <= self.config.unclick_threshold - DECAY_MARGIN
        {
            self.decaying_force = false;
        }

        if !self.pressing {
            self.adjust_deadzone(delta, stabiliser);
        }

        if self.pressing {
            self.update_pressing(input, dt_ms, stabiliser, ctx)
        } else if !self.decaying_force && self.applied_force >= 1.0 {
            self.pressing = true;
            self.dragging = false;
            self.press_held_ms = 0.0;
            self.drag.begin(input.click_m);
            stabiliser.set_radius(self.config.drag_start_distance);
            debug!("push: down at force {:.2}", self.applied_force);
            Step::new(InputKind::Down, self.applied_force)
        } else {
            Step::new(InputKind::Move, self.applied_force)
        }
    }

    fn update_pressing(
        &mut self,
        input: &FrameInput,
        dt_ms: f64,
        stabiliser: &mut DeadzoneStabiliser,
        ctx: &FrameContext,
    ) -> Step {
        self.press_held_ms += dt_ms;
        self.drag.advance(input.dt);

        let threshold = if self.dragging {
            self.config.unclick_threshold_drag
        } else {
            self.config.unclick_threshold
        };
        let drag_enabled = ctx.settings.drag_enabled;
        let held_too_long =
            drag_enabled && !self.dragging && self.press_held_ms >= self.config.click_hold_ms;

        if self.applied_force < threshold || !drag_enabled || held_too_long {
            debug!(
                "push: up at force {:.2} (dragging {}, held {:.0}ms)",
                self.applied_force, self.dragging, self.press_held_ms
            );
            self.pressing = false;
            self.dragging = false;
            self.drag.reset();
            self.decaying_force = true;
            stabiliser.start_shrinking(ShrinkMode::MotionBased {
                rate: self.config.deadzone_shrink_rate,
            });
            return Step::new(InputKind::Up, self.applied_force);
        }

        if !self.dragging {
            let thresholds = DragThresholds {
                distance_m: self.config.drag_start_distance,
                time_s: None,
            };
            if self.drag.check(input.click_m, &thresholds) {
                debug!("push: drag started");
                self.dragging = true;
                stabiliser.start_shrinking(ShrinkMode::MotionBased {
                    rate: self.config.drag_deadzone_shrink_rate,
                });
            }
        }

        if self.dragging {
            Step::new(InputKind::Drag, self.applied_force)
        } else {
            Step::new(InputKind::None, self.applied_force)
        }
    }

    /// Signed force change for one frame.
    ///
    /// `dz` is travel toward the screen (positive approaching), `d_perp`
    /// travel across it, both in meters.
    fn force_change(&self, dz: f32, d_perp: f32, distance: f32, dt: f32) -> f32 {
        if dt < MIN_DT_S {
            return 0.0;
        }
        let c = &self.config;
        let velocity = dz / dt;
        // Past the plane force only grows and never drains.
        if c.use_touch_plane_force && distance < c.touch_plane_distance {
            return velocity.max(0.0) * dt / c.dist_past_touch_plane;
        }

        let angle = d_perp.atan2(dz).to_degrees();
        let delta = if angle < c.theta_one_deg || angle > c.theta_two_deg {
            let clamped = velocity.abs().clamp(c.speed_min, c.speed_max);
            let ratio = (clamped - c.speed_min) / (c.speed_max - c.speed_min);
            let stiffness = lerp(
                1.0 / c.dist_at_speed_min,
                1.0 / c.dist_at_speed_max,
                c.curve.evaluate(ratio),
            );
            stiffness * velocity * dt
        } else if self.pressing {
            0.0
        } else {
            -d_perp / c.horizontal_decay_dist
        };

        if !self.decaying_force {
            delta
        } else if delta > 0.0 {
            0.0
        } else if c.decay_force_on_click {
            delta - (1.0 - (c.unclick_threshold - DECAY_MARGIN)) * (dt / c.force_decay_time_s)
        } else {
            delta
        }
    }

    /// Charging grows the deadzone so the pointer holds still for the
    /// click; discharging lets it shrink back with motion.
    fn adjust_deadzone(&self, delta: f32, stabiliser: &mut DeadzoneStabiliser) {
        if delta < -FORCE_EPSILON {
            stabiliser.start_shrinking(ShrinkMode::MotionBased {
                rate: self.config.deadzone_shrink_rate,
            });
        } else if delta > FORCE_EPSILON {
            stabiliser.enlarge_by(delta, self.config.deadzone_max_increase);
        }
    }

    /// Generate s-expression for status output.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:force {:.3} :pressing {} :dragging {} :decaying {} :cooldown {})",
            self.applied_force,
            fmt_bool(self.pressing),
            fmt_bool(self.dragging),
            fmt_bool(self.decaying_force),
            fmt_bool(self.entry_cooldown.is_active()),
        )
    }
}

// ── Tests ──────────────────────────────────────────────────
