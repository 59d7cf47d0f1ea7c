//! Rolling window of recent pointer samples for velocity-style gestures.
//!
//! The window always keeps exactly one sample older than its span, so a
//! query over the full span still has a starting point that brackets it.

use crate::math::distance2;
use std::collections::VecDeque;

/// One frame's worth of pointer state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySample {
    pub timestamp_us: u64,
    /// Distance from the screen plane in meters.
    pub distance: f32,
    /// Pointer position on the screen plane in meters.
    pub position: [f32; 2],
}

/// Which way the distance must move for a gesture to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Distance shrinking: the finger is approaching the screen.
    Approaching,
    /// Distance growing: the finger is withdrawing.
    Withdrawing,
}

impl Direction {
    fn sign(&self) -> f32 {
        match self {
            Self::Approaching => -1.0,
            Self::Withdrawing => 1.0,
        }
    }
}

/// Sliding window of [`HistorySample`]s.
#[derive(Debug, Clone)]
pub struct SampleHistory {
    samples: VecDeque<HistorySample>,
    span_us: u64,
}

impl SampleHistory {
    pub fn new(span_ms: f32) -> Self {
        Self {
            samples: VecDeque::new(),
            span_us: ms_to_us(span_ms),
        }
    }

    /// Change the retained span; takes effect on the next push.
    pub fn set_span_ms(&mut self, span_ms: f32) {
        self.span_us = ms_to_us(span_ms);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&HistorySample> {
        self.samples.back()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Append a sample and evict everything older than the span,
    /// keeping one sample beyond it.
    pub fn push(&mut self, sample: HistorySample) {
        self.samples.push_back(sample);
        let now = sample.timestamp_us;
        while self.samples.len() >= 2
            && now.saturating_sub(self.samples[1].timestamp_us) > self.span_us
        {
            self.samples.pop_front();
        }
    }

    /// Oldest sample that still falls inside the last `window_ms`.
    fn window_start(&self, window_ms: f32) -> Option<&HistorySample> {
        let now = self.latest()?.timestamp_us;
        let window = ms_to_us(window_ms);
        self.samples
            .iter()
            .find(|s| now.saturating_sub(s.timestamp_us) <= window)
    }

    /// Whether the distance moved strictly monotonically in `direction`
    /// over the last `window_ms`, covering at least `min_distance` meters,
    /// with the retained history spanning at least the whole window.
    pub fn monotonic_motion(&self, window_ms: f32, min_distance: f32, direction: Direction) -> bool {
        let (Some(oldest), Some(latest)) = (self.samples.front(), self.latest()) else {
            return false;
        };
        let window = ms_to_us(window_ms);
        let now = latest.timestamp_us;
        let sign = direction.sign();

        let mut previous: Option<f32> = None;
        for sample in &self.samples {
            if now.saturating_sub(sample.timestamp_us) > window {
                continue;
            }
            let signed = sample.distance * sign;
            if previous.map_or(false, |p| signed <= p) {
                return false;
            }
            previous = Some(signed);
        }

        let Some(start) = self.window_start(window_ms) else {
            return false;
        };
        let spanned = now.saturating_sub(oldest.timestamp_us) >= window;
        let travelled = (latest.distance - start.distance) * sign;
        spanned && travelled >= min_distance
    }

    /// Squared cosine of the angle between the recent motion and the
    /// screen normal over the last `window_ms`: 1.0 is straight at the
    /// screen, 0.0 is parallel to it (or no motion at all).
    pub fn cos_squared_angle(&self, window_ms: f32) -> f32 {
        let (Some(start), Some(latest)) = (self.window_start(window_ms), self.latest()) else {
            return 0.0;
        };
        let parallel = latest.distance - start.distance;
        let perpendicular = distance2(latest.position, start.position);
        let denom = parallel * parallel + perpendicular * perpendicular;
        if denom <= f32::EPSILON * f32::EPSILON {
            return 0.0;
        }
        parallel * parallel / denom
    }
}

fn ms_to_us(ms: f32) -> u64 {
    (ms.max(0.0) * 1000.0).round() as u64
}

// ── Tests ──────────────────────────────────────────────────
