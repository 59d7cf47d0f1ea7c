//! Pointer recognizers: per-frame state machines that turn a tracked hand
//! into exactly one [`PointerEvent`] per frame.
//!
//! Every recognizer instance runs the same pipeline each frame:
//! select a point on the hand, project it onto the screen, stabilise the
//! projected position, then hand the result to its kind-specific state
//! machine. The kinds form a closed set ([`RecognizerState`]).

pub mod dwell;
pub mod plane;
pub mod poke;
pub mod push;

use crate::config::{EngineConfig, GlobalSettings};
use crate::filter::PositionFilter;
use crate::hand::{Chirality, HandSample};
use crate::screen::VirtualScreen;
use crate::selector::PointSelector;
use crate::stabiliser::DeadzoneStabiliser;
use tracing::{debug, trace};

use self::dwell::DwellState;
use self::plane::{PlaneState, PlaneTrigger};
use self::poke::PokeState;
use self::push::PushState;

// ── Event types ────────────────────────────────────────────

/// The recognizer family that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    /// Force-spring press.
    Push,
    /// Velocity-gesture poke.
    Poke,
    /// Hover-and-hold dwell click.
    Dwell,
    /// Crossing a virtual touch plane.
    TouchPlane,
    /// Closing the hand.
    Grab,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Poke => "poke",
            Self::Dwell => "dwell",
            Self::TouchPlane => "touch-plane",
            Self::Grab => "grab",
        }
    }

    pub fn from_name(name: &str) -> Option<InteractionKind> {
        match name {
            "push" => Some(Self::Push),
            "poke" => Some(Self::Poke),
            "dwell" => Some(Self::Dwell),
            "touch-plane" => Some(Self::TouchPlane),
            "grab" => Some(Self::Grab),
            _ => None,
        }
    }
}

/// What the pointer did this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// Telemetry only: nothing actionable happened.
    None,
    /// A press was abandoned without a click (hand lost).
    Cancel,
    Down,
    Move,
    Up,
    /// Pressed and not yet dragging.
    Hold,
    Drag,
    Hover,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Cancel => "cancel",
            Self::Down => "down",
            Self::Move => "move",
            Self::Up => "up",
            Self::Hold => "hold",
            Self::Drag => "drag",
            Self::Hover => "hover",
        }
    }
}

/// Which tracked-hand slot an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandSlot {
    Primary,
    Secondary,
}

impl HandSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

/// Pointer positions for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Positions {
    /// Stabilised pointer position in pixels.
    pub cursor: [f32; 2],
    /// Unstabilised pointer position in pixels.
    pub click: [f32; 2],
    /// Signed distance from the screen plane in meters.
    pub distance: f32,
}

/// The single event a recognizer emits each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub timestamp_us: u64,
    pub interaction: InteractionKind,
    pub slot: HandSlot,
    /// Chirality of the hand driving the slot; `None` if never seen.
    pub chirality: Option<Chirality>,
    pub input: InputKind,
    pub positions: Positions,
    /// How close the current gesture is to clicking, 0.0-1.0.
    pub progress: f32,
}

// ── Per-frame plumbing ─────────────────────────────────────

/// Everything shared by all recognizers for one frame.
pub struct FrameContext<'a> {
    pub screen: &'a VirtualScreen,
    pub settings: &'a GlobalSettings,
}

/// A tracked, projected and stabilised hand, ready for a state machine.
pub(crate) struct FrameInput<'a> {
    pub hand: &'a HandSample,
    pub timestamp_us: u64,
    /// Seconds since the previous frame; 0.0 on the frame the hand appears.
    pub dt: f32,
    pub positions: Positions,
    /// `positions.cursor` in screen meters.
    pub cursor_m: [f32; 2],
    /// `positions.click` in screen meters.
    pub click_m: [f32; 2],
}

/// A state machine's verdict for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Step {
    pub input: InputKind,
    pub progress: f32,
    /// Replaces the pipeline's positions when set (e.g. hold at press origin).
    pub positions: Option<Positions>,
}

impl Step {
    pub fn new(input: InputKind, progress: f32) -> Self {
        Self {
            input,
            progress,
            positions: None,
        }
    }

    pub fn at(mut self, positions: Positions) -> Self {
        self.positions = Some(positions);
        self
    }
}

// ── Recognizer ─────────────────────────────────────────────

/// Kind-specific state, one variant per recognizer family.
#[derive(Debug, Clone)]
pub enum RecognizerState {
    Push(PushState),
    Poke(PokeState),
    Dwell(DwellState),
    Plane(PlaneState),
}

impl RecognizerState {
    fn new(kind: InteractionKind, config: &EngineConfig) -> Self {
        match kind {
            InteractionKind::Push => Self::Push(PushState::new(config.push.clone())),
            InteractionKind::Poke => Self::Poke(PokeState::new(config.poke.clone())),
            InteractionKind::Dwell => Self::Dwell(DwellState::new(config.dwell.clone())),
            InteractionKind::TouchPlane => {
                Self::Plane(PlaneState::new(config.plane.clone(), PlaneTrigger::Distance))
            }
            InteractionKind::Grab => {
                Self::Plane(PlaneState::new(config.plane.clone(), PlaneTrigger::Grab))
            }
        }
    }

    fn update(
        &mut self,
        input: &FrameInput,
        stabiliser: &mut DeadzoneStabiliser,
        ctx: &FrameContext,
    ) -> Step {
        match self {
            Self::Push(s) => s.update(input, stabiliser, ctx),
            Self::Poke(s) => s.update(input, stabiliser, ctx),
            Self::Dwell(s) => s.update(input, stabiliser, ctx),
            Self::Plane(s) => s.update(input, stabiliser, ctx),
        }
    }

    /// Velocity-based kinds drop their motion baseline; position-based
    /// kinds have nothing to forget.
    fn resync(&mut self, stabiliser: &mut DeadzoneStabiliser) {
        match self {
            Self::Push(s) => s.resync(),
            Self::Poke(s) => s.resync(stabiliser),
            Self::Dwell(_) | Self::Plane(_) => {}
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Push(s) => s.reset(),
            Self::Poke(s) => s.reset(),
            Self::Dwell(s) => s.reset(),
            Self::Plane(s) => s.reset(),
        }
    }

    fn apply_config(&mut self, config: &EngineConfig) {
        match self {
            Self::Push(s) => s.config = config.push.clone(),
            Self::Poke(s) => s.set_config(config.poke.clone()),
            Self::Dwell(s) => s.config = config.dwell.clone(),
            Self::Plane(s) => s.config = config.plane.clone(),
        }
    }

    fn status_sexp(&self) -> String {
        match self {
            Self::Push(s) => s.status_sexp(),
            Self::Poke(s) => s.status_sexp(),
            Self::Dwell(s) => s.status_sexp(),
            Self::Plane(s) => s.status_sexp(),
        }
    }
}

fn position_filter_for(kind: InteractionKind, config: &EngineConfig) -> Option<PositionFilter> {
    (kind == InteractionKind::Push && config.push.position_filter)
        .then(|| PositionFilter::new(config.push.filter))
}

/// One recognizer instance bound to one hand slot.
#[derive(Debug, Clone)]
pub struct Recognizer {
    kind: InteractionKind,
    slot: HandSlot,
    selector: PointSelector,
    stabiliser: DeadzoneStabiliser,
    /// Optional smoothing ahead of the deadzone (push only).
    filter: Option<PositionFilter>,
    state: RecognizerState,
    /// A `Down` has been emitted without its `Up`/`Cancel` yet.
    press_owed: bool,
    had_hand: bool,
    last_positions: Positions,
    last_chirality: Option<Chirality>,
}

impl Recognizer {
    pub fn new(kind: InteractionKind, slot: HandSlot, config: &EngineConfig) -> Self {
        Self {
            kind,
            slot,
            selector: PointSelector::new(config.selector_for(kind)),
            stabiliser: DeadzoneStabiliser::new(config.global.deadzone_radius_m),
            filter: position_filter_for(kind, config),
            state: RecognizerState::new(kind, config),
            press_owed: false,
            had_hand: false,
            last_positions: Positions::default(),
            last_chirality: None,
        }
    }

    pub fn kind(&self) -> InteractionKind {
        self.kind
    }

    pub fn slot(&self) -> HandSlot {
        self.slot
    }

    pub fn is_pressing(&self) -> bool {
        self.press_owed
    }

    pub fn state(&self) -> &RecognizerState {
        &self.state
    }

    pub fn stabiliser(&self) -> &DeadzoneStabiliser {
        &self.stabiliser
    }

    /// Take on a new configuration. Kind state is kept; the deadzone
    /// filter starts over.
    pub fn apply_config(&mut self, config: &EngineConfig) {
        self.selector.set_policy(config.selector_for(self.kind));
        self.stabiliser
            .set_default_radius(config.global.deadzone_radius_m);
        match (self.filter.as_mut(), position_filter_for(self.kind, config)) {
            (Some(filter), Some(fresh)) => filter.set_config(*fresh.config()),
            (_, fresh) => self.filter = fresh,
        }
        self.state.apply_config(config);
    }

    /// The slot's frame clock jumped. Motion measured across the jump is
    /// not trusted; open presses stay open.
    pub fn resync(&mut self) {
        debug!("{} {}: tracking gap, resyncing", self.kind.as_str(), self.slot.as_str());
        self.state.resync(&mut self.stabiliser);
    }

    /// Run one frame.
    ///
    /// `dt` is `None` when the frame timing is unusable; such frames
    /// change nothing and report the previous positions.
    pub fn update(
        &mut self,
        hand: Option<&HandSample>,
        timestamp_us: u64,
        dt: Option<f32>,
        ctx: &FrameContext,
    ) -> PointerEvent {
        let Some(hand) = hand else {
            return self.hand_lost(timestamp_us);
        };
        self.last_chirality = Some(hand.chirality);

        let Some(dt) = dt else {
            trace!("{} {}: unusable frame timing", self.kind.as_str(), self.slot.as_str());
            return self.event(timestamp_us, InputKind::None, 0.0, self.last_positions);
        };
        let Some(world) = self.selector.select(hand, ctx.screen) else {
            trace!("{} {}: pointer joint missing", self.kind.as_str(), self.slot.as_str());
            return self.event(timestamp_us, InputKind::None, 0.0, self.last_positions);
        };

        let projected = ctx.screen.world_to_screen(world);
        if !ctx.settings.interaction_zone.contains(projected.distance) {
            return self.hand_lost(timestamp_us);
        }

        let click_m = ctx.screen.pixels_to_meters(projected.pixel);
        let smoothed_m = match self.filter.as_mut() {
            Some(filter) => filter.apply(click_m, dt),
            None => click_m,
        };
        let cursor_m = self.stabiliser.apply(smoothed_m, dt);
        let positions = Positions {
            cursor: ctx.screen.meters_to_pixels(cursor_m),
            click: projected.pixel,
            distance: projected.distance,
        };
        let input = FrameInput {
            hand,
            timestamp_us,
            dt,
            positions,
            cursor_m,
            click_m,
        };

        self.had_hand = true;
        let step = self.state.update(&input, &mut self.stabiliser, ctx);
        let positions = step.positions.unwrap_or(positions);
        self.last_positions = positions;
        self.event(timestamp_us, step.input, step.progress, positions)
    }

    /// The hand is gone (or outside the interaction zone).
    fn hand_lost(&mut self, timestamp_us: u64) -> PointerEvent {
        let input = if self.press_owed {
            debug!(
                "{} {}: hand lost mid-press, cancelling",
                self.kind.as_str(),
                self.slot.as_str()
            );
            InputKind::Cancel
        } else {
            InputKind::None
        };
        if self.had_hand {
            self.state.reset();
            self.selector.reset();
            self.stabiliser.reset();
            if let Some(filter) = self.filter.as_mut() {
                filter.reset();
            }
            self.had_hand = false;
        }
        self.event(timestamp_us, input, 0.0, self.last_positions)
    }

    fn event(
        &mut self,
        timestamp_us: u64,
        input: InputKind,
        progress: f32,
        positions: Positions,
    ) -> PointerEvent {
        match input {
            InputKind::Down => {
                debug_assert!(!self.press_owed, "Down emitted while a press is open");
                self.press_owed = true;
            }
            InputKind::Up | InputKind::Cancel => {
                debug_assert!(self.press_owed, "{:?} emitted without a press", input);
                self.press_owed = false;
            }
            _ => {}
        }
        PointerEvent {
            timestamp_us,
            interaction: self.kind,
            slot: self.slot,
            chirality: self.last_chirality,
            input,
            positions,
            progress: progress.clamp(0.0, 1.0),
        }
    }

    /// Generate s-expression for status output.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:kind {} :slot {} :selector {} :pressing {} :filter {} :deadzone {} :state {})",
            self.kind.as_str(),
            self.slot.as_str(),
            self.selector.policy().as_str(),
            if self.press_owed { "t" } else { "nil" },
            if self.filter.is_some() { "t" } else { "nil" },
            self.stabiliser.status_sexp(),
            self.state.status_sexp(),
        )
    }
}

// ── Test helpers ───────────────────────────────────────────

/// Drives a single recognizer through synthetic frames at a fixed rate.
#[cfg(test)]
pub(crate) struct TestRig {
    pub config: EngineConfig,
    pub screen: VirtualScreen,
    pub recognizer: Recognizer,
    pub timestamp_us: u64,
    pub frame_us: u64,
    started: bool,
}

#[cfg(test)]
impl TestRig {
    pub fn new(kind: InteractionKind, config: EngineConfig) -> Self {
        let screen = config.screen.build();
        let recognizer = Recognizer::new(kind, HandSlot::Primary, &config);
        Self {
            config,
            screen,
            recognizer,
            timestamp_us: 0,
            frame_us: 10_000,
            started: false,
        }
    }

    /// Feed a hand whose every joint sits at `position`.
    pub fn frame_at(&mut self, position: [f32; 3]) -> PointerEvent {
        let sample = crate::hand::make_sample(Chirality::Right, self.timestamp_us, position);
        self.frame(Some(&sample))
    }

    pub fn frame(&mut self, hand: Option<&HandSample>) -> PointerEvent {
        let dt = if self.started && hand.is_some() {
            Some(self.frame_us as f32 / 1_000_000.0)
        } else {
            Some(0.0)
        };
        self.started = hand.is_some();
        let ctx = FrameContext {
            screen: &self.screen,
            settings: &self.config.global,
        };
        let event = self.recognizer.update(hand, self.timestamp_us, dt, &ctx);
        self.timestamp_us += self.frame_us;
        event
    }

    pub fn no_hand(&mut self) -> PointerEvent {
        self.frame(None)
    }
}

// ── Tests ──────────────────────────────────────────────────
