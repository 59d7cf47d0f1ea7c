//! Hover-and-hold ("dwell") recognizer.
//!
//! Holding the pointer still arms a click; holding it still for a further
//! period fills a progress ring and clicks. Any movement abandons the
//! attempt. Stillness is judged on a second, wider deadzone layered over
//! the stabiliser output so ordinary tremor does not reset the timers.

use super::{FrameContext, FrameInput, InputKind, Positions, Step};
use crate::config::{require_non_negative, ConfigError};
use crate::math::lerp;
use crate::selector::SelectorPolicy;
use crate::stabiliser::{apply_deadzone, DeadzoneStabiliser, ShrinkMode};
use crate::timer::ProgressTimer;
use tracing::debug;

// ── Config ─────────────────────────────────────────────────

/// Configuration for the dwell recognizer. Distances in meters.
#[derive(Debug, Clone, PartialEq)]
pub struct DwellConfig {
    /// Stillness needed before the progress timer starts.
    pub hover_trigger_ms: f64,
    /// Stillness after triggering needed to click.
    pub hover_complete_ms: f64,
    /// How long the click is held before releasing.
    pub click_hold_ms: f64,
    /// Extra radius of the stillness deadzone over the default radius.
    pub hover_enlargement: f32,
    /// Extra stabiliser radius reached when progress completes.
    pub timer_enlargement: f32,
    /// Motion-based shrink rate after an abandoned attempt.
    pub deadzone_shrink_rate: f32,
    pub selector: SelectorPolicy,
}

impl Default for DwellConfig {
    fn default() -> Self {
        Self {
            hover_trigger_ms: 500.0,
            hover_complete_ms: 600.0,
            click_hold_ms: 200.0,
            hover_enlargement: 0.005,
            timer_enlargement: 0.005,
            deadzone_shrink_rate: 0.3,
            selector: SelectorPolicy::StableIndex,
        }
    }
}

impl DwellConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("dwell.hover-trigger-ms", self.hover_trigger_ms as f32)?;
        require_non_negative("dwell.hover-complete-ms", self.hover_complete_ms as f32)?;
        require_non_negative("dwell.click-hold-ms", self.click_hold_ms as f32)?;
        require_non_negative("dwell.hover-enlargement", self.hover_enlargement)?;
        require_non_negative("dwell.timer-enlargement", self.timer_enlargement)?;
        require_non_negative("dwell.deadzone-shrink-rate", self.deadzone_shrink_rate)
    }
}

// ── Phases ─────────────────────────────────────────────────

/// Where the dwell state machine is.
#[derive(Debug, Clone)]
pub enum DwellPhase {
    /// Waiting for the pointer to come to rest.
    Idle {
        /// How long the pointer has been still, if it is.
        still_ms: Option<f64>,
    },
    /// Armed: the progress ring is filling while the pointer stays on `anchor`.
    HoverTriggered {
        anchor: [f32; 2],
        /// Stabiliser radius when the hover triggered; the ring grows from it.
        start_radius: f32,
        timer: ProgressTimer,
    },
    /// Clicked; `Up` follows after the hold time.
    ClickHeld {
        anchor: [f32; 2],
        held_ms: f64,
        up_sent: bool,
    },
}

impl DwellPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle { .. } => "idle",
            Self::HoverTriggered { .. } => "hover-triggered",
            Self::ClickHeld { .. } => "click-held",
        }
    }
}

// ── State ──────────────────────────────────────────────────

/// Dwell recognizer state for one hand slot.
#[derive(Debug, Clone)]
pub struct DwellState {
    pub config: DwellConfig,
    phase: DwellPhase,
    /// Output of the stillness deadzone last frame (screen meters).
    hover_position: Option<[f32; 2]>,
}

impl DwellState {
    pub fn new(config: DwellConfig) -> Self {
        Self {
            config,
            phase: DwellPhase::Idle { still_ms: None },
            hover_position: None,
        }
    }

    pub fn reset(&mut self) {
        self.phase = DwellPhase::Idle { still_ms: None };
        self.hover_position = None;
    }

    pub fn phase(&self) -> &DwellPhase {
        &self.phase
    }

    pub(crate) fn update(
        &mut self,
        input: &FrameInput,
        stabiliser: &mut DeadzoneStabiliser,
        ctx: &FrameContext,
    ) -> Step {
        let dt_ms = input.dt as f64 * 1000.0;
        let radius = stabiliser.default_radius() + self.config.hover_enlargement;
        let hover = apply_deadzone(self.hover_position, input.cursor_m, radius);
        let still = self.hover_position == Some(hover);
        self.hover_position = Some(hover);

        let positions = Positions {
            cursor: ctx.screen.meters_to_pixels(hover),
            ..input.positions
        };
        let max_radius = stabiliser.default_radius() + self.config.timer_enlargement;

        let (next, step) = match &mut self.phase {
            DwellPhase::Idle { still_ms } => {
                let mut next = None;
                if !still {
                    *still_ms = None;
                } else if let Some(ms) = still_ms {
                    *ms += dt_ms;
                    if *ms >= self.config.hover_trigger_ms {
                        debug!("dwell: hover triggered");
                        next = Some(DwellPhase::HoverTriggered {
                            anchor: hover,
                            start_radius: stabiliser.current_radius(),
                            timer: ProgressTimer::default(),
                        });
                    }
                } else {
                    *still_ms = Some(0.0);
                }
                (next, Step::new(InputKind::Move, 0.0))
            }
            DwellPhase::HoverTriggered {
                anchor,
                start_radius,
                timer,
            } => {
                if hover != *anchor {
                    let idle = Self::abandon(self.config.deadzone_shrink_rate, stabiliser);
                    (Some(idle), Step::new(InputKind::Move, 0.0))
                } else {
                    if timer.is_running() {
                        timer.update(dt_ms);
                    } else {
                        timer.start();
                    }
                    let progress = timer.progress(self.config.hover_complete_ms);
                    if progress >= 1.0 {
                        stabiliser.set_radius(max_radius);
                        debug!("dwell: click");
                        let held = DwellPhase::ClickHeld {
                            anchor: *anchor,
                            held_ms: 0.0,
                            up_sent: false,
                        };
                        (Some(held), Step::new(InputKind::Down, 1.0))
                    } else {
                        stabiliser.set_radius(lerp(*start_radius, max_radius, progress));
                        (None, Step::new(InputKind::Move, progress))
                    }
                }
            }
            DwellPhase::ClickHeld {
                anchor,
                held_ms,
                up_sent,
            } => {
                if hover != *anchor {
                    let owed = !*up_sent;
                    let kind = if owed { InputKind::Up } else { InputKind::Move };
                    let idle = Self::abandon(self.config.deadzone_shrink_rate, stabiliser);
                    (Some(idle), Step::new(kind, 0.0))
                } else if *up_sent {
                    (None, Step::new(InputKind::Move, 1.0))
                } else {
                    *held_ms += dt_ms;
                    if *held_ms >= self.config.click_hold_ms {
                        *up_sent = true;
                        debug!("dwell: release after {:.0}ms", held_ms);
                        (None, Step::new(InputKind::Up, 1.0))
                    } else {
                        (None, Step::new(InputKind::Hold, 1.0))
                    }
                }
            }
        };

        if let Some(phase) = next {
            self.phase = phase;
        }
        step.at(positions)
    }

    /// Pointer moved off the anchor: start over and let the deadzone relax.
    fn abandon(shrink_rate: f32, stabiliser: &mut DeadzoneStabiliser) -> DwellPhase {
        stabiliser.start_shrinking(ShrinkMode::MotionBased { rate: shrink_rate });
        DwellPhase::Idle { still_ms: None }
    }

    /// Generate s-expression for status output.
    pub fn status_sexp(&self) -> String {
        let detail = match &self.phase {
            DwellPhase::Idle { still_ms } => format!(":still-ms {:.0}", still_ms.unwrap_or(0.0)),
            DwellPhase::HoverTriggered { timer, .. } => format!(
                ":progress {:.2}",
                timer.progress(self.config.hover_complete_ms)
            ),
            DwellPhase::ClickHeld { held_ms, .. } => format!(":held-ms {:.0}", held_ms),
        };
        format!("(:phase {} {})", self.phase.as_str(), detail)
    }
}

// ── Tests ──────────────────────────────────────────────────
