//! One-euro smoothing for the projected pointer.
//!
//! A low-pass filter whose cutoff rises with pointer speed: a resting
//! finger is smoothed hard, a fast sweep passes through with little lag.
//! Runs on screen-plane meters, before the deadzone.

use crate::config::{require_non_negative, require_positive, ConfigError};
use std::f32::consts::PI;

/// Cutoffs in Hz; `beta` in Hz per m/s of pointer speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterConfig {
    pub min_cutoff_hz: f32,
    pub beta: f32,
    /// Cutoff for the speed estimate that drives `beta`.
    pub d_cutoff_hz: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_cutoff_hz: 0.5,
            beta: 6.0,
            d_cutoff_hz: 0.5,
        }
    }
}

impl FilterConfig {
    pub fn validate(&self, section: &str) -> Result<(), ConfigError> {
        require_positive(&format!("{}.filter-min-cutoff", section), self.min_cutoff_hz)?;
        require_non_negative(&format!("{}.filter-beta", section), self.beta)?;
        require_positive(&format!("{}.filter-d-cutoff", section), self.d_cutoff_hz)
    }
}

/// Smoothing factor for an exponential filter at `cutoff_hz`.
fn alpha(cutoff_hz: f32, dt: f32) -> f32 {
    let tau = 1.0 / (2.0 * PI * cutoff_hz);
    1.0 / (1.0 + tau / dt)
}

#[derive(Debug, Clone, Copy, Default)]
struct LowPass {
    value: Option<f32>,
}

impl LowPass {
    fn filter(&mut self, raw: f32, alpha: f32) -> f32 {
        let out = match self.value {
            Some(prev) => alpha * raw + (1.0 - alpha) * prev,
            None => raw,
        };
        self.value = Some(out);
        out
    }
}

/// Per-axis one-euro filter over a 2D point.
#[derive(Debug, Clone)]
pub struct PositionFilter {
    config: FilterConfig,
    last_raw: Option<[f32; 2]>,
    speed: [LowPass; 2],
    position: [LowPass; 2],
}

impl PositionFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            last_raw: None,
            speed: [LowPass::default(); 2],
            position: [LowPass::default(); 2],
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: FilterConfig) {
        self.config = config;
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    /// Filter one sample taken `dt` seconds after the previous one.
    /// The first sample passes through unchanged.
    pub fn apply(&mut self, raw: [f32; 2], dt: f32) -> [f32; 2] {
        let Some(last) = self.last_raw.replace(raw) else {
            for axis in 0..2 {
                self.position[axis].filter(raw[axis], 1.0);
            }
            return raw;
        };
        if dt <= 0.0 {
            return [
                self.position[0].value.unwrap_or(raw[0]),
                self.position[1].value.unwrap_or(raw[1]),
            ];
        }

        let c = &self.config;
        let mut out = raw;
        for axis in 0..2 {
            let velocity = (raw[axis] - last[axis]) / dt;
            let speed = self.speed[axis]
                .filter(velocity, alpha(c.d_cutoff_hz, dt))
                .abs();
            let cutoff = c.min_cutoff_hz + c.beta * speed;
            out[axis] = self.position[axis].filter(raw[axis], alpha(cutoff, dt));
        }
        out
    }
}

// ── Tests ──────────────────────────────────────────────────
