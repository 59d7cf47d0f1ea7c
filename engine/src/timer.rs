//! Frame-driven timers. Nothing here reads a clock; callers advance
//! them by the frame delta.

/// Countdown that blocks an action until it expires.
#[derive(Debug, Clone, Default)]
pub struct CooldownState {
    /// Whether cooldown is currently active.
    active: bool,
    /// Remaining cooldown time in milliseconds.
    remaining_ms: f64,
}

impl CooldownState {
    /// Start (or restart) the cooldown.
    pub fn start(&mut self, duration_ms: f64) {
        self.active = duration_ms > 0.0;
        self.remaining_ms = duration_ms.max(0.0);
    }

    /// Tick the cooldown timer by dt_ms milliseconds.
    pub fn update(&mut self, dt_ms: f64) {
        if !self.active {
            return;
        }
        self.remaining_ms -= dt_ms;
        if self.remaining_ms <= 0.0 {
            self.remaining_ms = 0.0;
            self.active = false;
        }
    }

    pub fn stop(&mut self) {
        self.active = false;
        self.remaining_ms = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Accumulates elapsed time toward a fixed duration.
#[derive(Debug, Clone, Default)]
pub struct ProgressTimer {
    running: bool,
    elapsed_ms: f64,
}

impl ProgressTimer {
    /// Start from zero.
    pub fn start(&mut self) {
        self.running = true;
        self.elapsed_ms = 0.0;
    }

    pub fn update(&mut self, dt_ms: f64) {
        if self.running && dt_ms > 0.0 {
            self.elapsed_ms += dt_ms;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Fraction of `duration_ms` elapsed, clamped to 0.0-1.0.
    pub fn progress(&self, duration_ms: f64) -> f32 {
        if duration_ms <= 0.0 {
            return if self.running || self.elapsed_ms > 0.0 { 1.0 } else { 0.0 };
        }
        (self.elapsed_ms / duration_ms).clamp(0.0, 1.0) as f32
    }
}

// ── Tests ──────────────────────────────────────────────────
