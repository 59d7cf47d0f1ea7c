//! Click-versus-drag arbitration during a press.

use crate::math::distance2;

/// Thresholds for deciding that a press has become a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragThresholds {
    /// Pointer travel from the press origin, in screen meters.
    pub distance_m: f32,
    /// Time since the press began; `None` disables the time rule.
    pub time_s: Option<f32>,
}

/// Latching drag-start detector for one press.
#[derive(Debug, Clone, Default)]
pub struct DragDetector {
    origin: Option<[f32; 2]>,
    elapsed_s: f32,
    started: bool,
}

impl DragDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a new press at `origin` (screen meters).
    pub fn begin(&mut self, origin: [f32; 2]) {
        self.origin = Some(origin);
        self.elapsed_s = 0.0;
        self.started = false;
    }

    /// Advance the press timer.
    pub fn advance(&mut self, dt: f32) {
        if self.origin.is_some() && dt > 0.0 {
            self.elapsed_s += dt;
        }
    }

    /// Whether the press has turned into a drag. Once true it stays
    /// true until the next [`begin`](Self::begin) or [`reset`](Self::reset).
    pub fn check(&mut self, current: [f32; 2], thresholds: &DragThresholds) -> bool {
        if self.started {
            return true;
        }
        let Some(origin) = self.origin else {
            return false;
        };
        let moved = distance2(current, origin) > thresholds.distance_m;
        let held = thresholds.time_s.map_or(false, |t| self.elapsed_s >= t);
        self.started = moved || held;
        self.started
    }

    pub fn origin(&self) -> Option<[f32; 2]> {
        self.origin
    }

    pub fn elapsed_s(&self) -> f32 {
        self.elapsed_s
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLDS: DragThresholds = DragThresholds {
        distance_m: 0.01,
        time_s: None,
    };

    #[test]
    fn test_distance_starts_drag() {
        let mut drag = DragDetector::new();
        drag.begin([0.1, 0.1]);
        assert!(!drag.check([0.105, 0.1], &THRESHOLDS));
        assert!(drag.check([0.115, 0.1], &THRESHOLDS));
    }

    #[test]
    fn test_drag_latches() {
        let mut drag = DragDetector::new();
        drag.begin([0.1, 0.1]);
        assert!(drag.check([0.2, 0.1], &THRESHOLDS));
        // Back at the origin: still dragging.
        assert!(drag.check([0.1, 0.1], &THRESHOLDS));
    }

    #[test]
    fn test_time_starts_drag() {
        let thresholds = DragThresholds {
            distance_m: 0.04,
            time_s: Some(0.1),
        };
        let mut drag = DragDetector::new();
        drag.begin([0.0, 0.0]);
        drag.advance(0.05);
        assert!(!drag.check([0.0, 0.0], &thresholds));
        drag.advance(0.05);
        assert!(drag.check([0.0, 0.0], &thresholds));
    }

    #[test]
    fn test_no_press_no_drag() {
        let mut drag = DragDetector::new();
        drag.advance(10.0);
        assert!(!drag.check([1.0, 1.0], &THRESHOLDS));
        assert_eq!(drag.elapsed_s(), 0.0);
    }

    #[test]
    fn test_begin_clears_latch() {
        let mut drag = DragDetector::new();
        drag.begin([0.0, 0.0]);
        assert!(drag.check([1.0, 0.0], &THRESHOLDS));
        drag.begin([1.0, 0.0]);
        assert_eq!(drag.origin(), Some([1.0, 0.0]));
        assert!(!drag.check([1.0, 0.0], &THRESHOLDS));
    }
}
