//! Deadzone stabilisation of the on-screen pointer position.
//!
//! The stabilised position only follows the raw position once the raw
//! position leaves a circle of `radius` around it, and then trails it at
//! exactly that radius. Recognizers grow the radius while a click is
//! building so the pointer holds still, and shrink it back afterwards.
//!
//! All positions here are in screen meters, not pixels.

use crate::curve::ResponseCurve;
use crate::math::{distance2, dot2, length2, lerp, sub2};
use tracing::trace;

/// The motion-based shrink never leaves the current radius further
/// than this many default radii outside the default-radius position.
const INTERNAL_SHRINK_FACTOR: f32 = 2.0;

/// Sliding deadzone filter.
///
/// Returns `previous` while `raw` stays within `radius` of it, otherwise
/// drags `previous` toward `raw` until it sits exactly `radius` away.
/// With no previous position, or a zero radius, the raw position passes
/// through unchanged.
pub fn apply_deadzone(previous: Option<[f32; 2]>, raw: [f32; 2], radius: f32) -> [f32; 2] {
    let Some(previous) = previous else {
        return raw;
    };
    if radius <= 0.0 {
        return raw;
    }
    let delta = sub2(raw, previous);
    let d = length2(delta);
    if d <= radius {
        return previous;
    }
    let t = (d - radius) / d;
    [previous[0] + delta[0] * t, previous[1] + delta[1] * t]
}

/// How an enlarged deadzone returns to its default size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShrinkMode {
    Off,
    /// Shrinks only while the hand moves away from the held position;
    /// `rate` is meters of radius lost per meter moved.
    MotionBased { rate: f32 },
    /// Shrinks at a constant `rate` in meters per second.
    TimeBased { rate: f32 },
}

impl ShrinkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::MotionBased { .. } => "motion",
            Self::TimeBased { .. } => "time",
        }
    }
}

/// Stateful deadzone with a resizable radius.
#[derive(Debug, Clone)]
pub struct DeadzoneStabiliser {
    default_radius: f32,
    current_radius: f32,
    shrink: ShrinkMode,
    /// When set, positions pass through untouched (but are still tracked).
    bypassed: bool,
    /// Last output of a deadzone held at the default radius.
    previous_default: Option<[f32; 2]>,
    /// Last output at the current radius; this is what callers see.
    previous_current: Option<[f32; 2]>,
    previous_raw: Option<[f32; 2]>,
}

impl DeadzoneStabiliser {
    pub fn new(default_radius: f32) -> Self {
        let default_radius = default_radius.max(0.0);
        Self {
            default_radius,
            current_radius: default_radius,
            shrink: ShrinkMode::Off,
            bypassed: false,
            previous_default: None,
            previous_current: None,
            previous_raw: None,
        }
    }

    pub fn default_radius(&self) -> f32 {
        self.default_radius
    }

    pub fn current_radius(&self) -> f32 {
        self.current_radius
    }

    pub fn shrink_mode(&self) -> ShrinkMode {
        self.shrink
    }

    /// Filter one raw position. `dt` drives a time-based shrink.
    pub fn apply(&mut self, raw: [f32; 2], dt: f32) -> [f32; 2] {
        if let ShrinkMode::TimeBased { rate } = self.shrink {
            self.shrink_over_time(rate, dt);
        }

        if self.bypassed || self.previous_current.is_none() {
            self.previous_default = Some(raw);
            self.previous_current = Some(raw);
            self.previous_raw = Some(raw);
            return raw;
        }

        let default_pos = apply_deadzone(self.previous_default, raw, self.default_radius);
        if let ShrinkMode::MotionBased { rate } = self.shrink {
            self.shrink_by_motion(default_pos, rate);
        }
        let current_pos = apply_deadzone(self.previous_current, raw, self.current_radius);

        self.previous_default = Some(default_pos);
        self.previous_current = Some(current_pos);
        self.previous_raw = Some(raw);
        current_pos
    }

    /// Set the radius directly. Cancels any shrink in progress.
    pub fn set_radius(&mut self, radius: f32) {
        self.current_radius = radius.max(0.0);
        self.shrink = ShrinkMode::Off;
    }

    /// Interpolate between default and `default + max_increase` by a
    /// 0..=1 progress signal shaped by `curve`.
    pub fn scale_by_progress(&mut self, progress: f32, max_increase: f32, curve: ResponseCurve) {
        let target = self.default_radius + max_increase.max(0.0);
        self.set_radius(lerp(self.default_radius, target, curve.evaluate(progress)));
    }

    /// Grow (or shrink) the radius by `delta` of the full enlargement,
    /// staying within default..=default + max_increase.
    pub fn enlarge_by(&mut self, delta: f32, max_increase: f32) {
        let max = self.default_radius + max_increase.max(0.0);
        let radius = (self.current_radius + max_increase * delta).clamp(self.default_radius, max);
        self.set_radius(radius);
    }

    /// Enlarge the radius as the hand approaches the screen. At
    /// `reference_distance` or beyond the radius is the default; at the
    /// surface it is `default + max_increase`.
    pub fn scale_by_distance(
        &mut self,
        distance: f32,
        reference_distance: f32,
        max_increase: f32,
        curve: ResponseCurve,
    ) {
        let closeness = if reference_distance > 0.0 {
            1.0 - (distance / reference_distance).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.scale_by_progress(closeness, max_increase, curve);
    }

    /// Begin returning to the default radius. A new mode replaces any
    /// shrink already running; nothing happens at the default radius.
    pub fn start_shrinking(&mut self, mode: ShrinkMode) {
        if self.current_radius <= self.default_radius {
            return;
        }
        if let ShrinkMode::TimeBased { .. } = mode {
            // Jump straight to the smallest radius that does not move the pointer.
            if let (Some(raw), Some(current)) = (self.previous_raw, self.previous_current) {
                self.current_radius = distance2(raw, current).max(self.default_radius);
            }
        }
        trace!(
            "deadzone shrink {} from {:.4}",
            mode.as_str(),
            self.current_radius
        );
        self.shrink = mode;
    }

    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// Change the default radius; resets the filter.
    pub fn set_default_radius(&mut self, radius: f32) {
        self.default_radius = radius.max(0.0);
        self.reset();
    }

    /// Forget history and return to the default radius.
    pub fn reset(&mut self) {
        self.current_radius = self.default_radius;
        self.shrink = ShrinkMode::Off;
        self.previous_default = None;
        self.previous_current = None;
        self.previous_raw = None;
    }

    fn shrink_over_time(&mut self, rate: f32, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.current_radius -= rate * dt;
        if self.current_radius < self.default_radius || rate == 0.0 {
            self.current_radius = self.default_radius;
            self.shrink = ShrinkMode::Off;
        }
    }

    fn shrink_by_motion(&mut self, default_pos: [f32; 2], rate: f32) {
        let (Some(prev_default), Some(prev_current)) = (self.previous_default, self.previous_current)
        else {
            return;
        };
        let constraint = sub2(prev_default, prev_current);
        let constraint_len = length2(constraint);
        let internal = constraint_len + INTERNAL_SHRINK_FACTOR * self.default_radius;

        if internal < self.current_radius {
            self.current_radius = internal;
        } else if constraint_len > f32::EPSILON {
            let change = sub2(default_pos, prev_default);
            let away = (dot2(change, constraint) / constraint_len).max(0.0);
            self.current_radius -= away * rate;
        }

        if self.current_radius <= self.default_radius {
            self.current_radius = self.default_radius;
            self.shrink = ShrinkMode::Off;
        }
    }

    /// Generate s-expression for status output.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:default-radius {:.4} :current-radius {:.4} :shrink {} :bypassed {})",
            self.default_radius,
            self.current_radius,
            self.shrink.as_str(),
            if self.bypassed { "t" } else { "nil" },
        )
    }
}

// ── Tests ──────────────────────────────────────────────────
