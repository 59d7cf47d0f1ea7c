//! The interaction engine: hand slots, frame timing and configuration swaps.
//!
//! The engine owns one set of recognizers per hand slot. Each submitted
//! frame runs every active recognizer exactly once and hands the
//! resulting events to an [`EventSink`] in order. Configuration changes
//! are validated when queued and applied at the start of the next frame,
//! never in the middle of one.

use crate::config::{ConfigError, EngineConfig};
use crate::hand::HandSample;
use crate::recognizer::{FrameContext, HandSlot, InputKind, PointerEvent, Recognizer};
use crate::screen::VirtualScreen;
use tracing::{debug, info, warn};

// ── Frame input ────────────────────────────────────────────

/// One tracking frame: a timestamp and whatever hands were seen.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Monotonic capture time in microseconds.
    pub timestamp_us: u64,
    pub primary: Option<HandSample>,
    pub secondary: Option<HandSample>,
}

impl Frame {
    fn hand(&self, slot: HandSlot) -> Option<&HandSample> {
        match slot {
            HandSlot::Primary => self.primary.as_ref(),
            HandSlot::Secondary => self.secondary.as_ref(),
        }
    }
}

/// Receives pointer events as the engine produces them.
pub trait EventSink {
    fn dispatch(&mut self, event: &PointerEvent);
}

impl EventSink for Vec<PointerEvent> {
    fn dispatch(&mut self, event: &PointerEvent) {
        self.push(event.clone());
    }
}

// ── Slots ──────────────────────────────────────────────────

/// How a frame's timestamp relates to the slot's previous one.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FrameTiming {
    /// Seconds since the previous frame; 0.0 when the hand just appeared.
    Step(f32),
    /// Not after the previous frame. Skipped; the clock is left alone.
    Stale,
    /// Too long since the previous frame. Skipped; the clock restarts here.
    Gap,
}

/// Recognizers driven by one hand slot, plus that slot's frame clock.
#[derive(Debug, Clone)]
struct SlotState {
    slot: HandSlot,
    recognizers: Vec<Recognizer>,
    last_timestamp_us: Option<u64>,
}

impl SlotState {
    fn new(slot: HandSlot, config: &EngineConfig) -> Self {
        let recognizers = config
            .global
            .recognizers
            .iter()
            .map(|kind| Recognizer::new(*kind, slot, config))
            .collect();
        Self {
            slot,
            recognizers,
            last_timestamp_us: None,
        }
    }

    fn frame_timing(&mut self, timestamp_us: u64, max_gap_s: f32) -> FrameTiming {
        let Some(previous) = self.last_timestamp_us else {
            self.last_timestamp_us = Some(timestamp_us);
            return FrameTiming::Step(0.0);
        };
        if timestamp_us <= previous {
            debug!(
                "{}: non-increasing timestamp {} after {}",
                self.slot.as_str(),
                timestamp_us,
                previous
            );
            return FrameTiming::Stale;
        }
        self.last_timestamp_us = Some(timestamp_us);
        let dt = (timestamp_us - previous) as f32 / 1_000_000.0;
        if dt > max_gap_s {
            debug!("{}: frame gap of {:.3}s ignored", self.slot.as_str(), dt);
            FrameTiming::Gap
        } else {
            FrameTiming::Step(dt)
        }
    }
}

fn build_slots(config: &EngineConfig) -> Vec<SlotState> {
    let mut slots = vec![SlotState::new(HandSlot::Primary, config)];
    if config.global.secondary_enabled {
        slots.push(SlotState::new(HandSlot::Secondary, config));
    }
    slots
}

// ── Engine ─────────────────────────────────────────────────

pub struct Engine {
    config: EngineConfig,
    screen: VirtualScreen,
    /// Validated configuration waiting for the next frame.
    pending: Option<EngineConfig>,
    slots: Vec<SlotState>,
    frames: u64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let kinds: Vec<&str> = config.global.recognizers.iter().map(|k| k.as_str()).collect();
        info!(
            "Interaction engine initialized: recognizers [{}], secondary {}",
            kinds.join(" "),
            config.global.secondary_enabled
        );
        Ok(Self {
            screen: config.screen.build(),
            slots: build_slots(&config),
            config,
            pending: None,
            frames: 0,
        })
    }

    /// The configuration currently in effect.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn screen(&self) -> &VirtualScreen {
        &self.screen
    }

    pub fn has_pending_config(&self) -> bool {
        self.pending.is_some()
    }

    /// All recognizers, primary slot first.
    pub fn recognizers(&self) -> impl Iterator<Item = &Recognizer> {
        self.slots.iter().flat_map(|s| s.recognizers.iter())
    }

    /// Validate `config` and schedule it for the next frame. A rejected
    /// configuration leaves both the active and any pending one in place.
    pub fn queue_config(&mut self, config: EngineConfig) -> Result<(), ConfigError> {
        if let Err(e) = config.validate() {
            warn!("Configuration rejected: {}", e);
            return Err(e);
        }
        self.pending = Some(config);
        Ok(())
    }

    /// Run one frame and collect its events.
    pub fn submit_frame(&mut self, frame: &Frame) -> Vec<PointerEvent> {
        let mut events = Vec::new();
        self.submit_frame_to(frame, &mut events);
        events
    }

    /// Run one frame, dispatching each event to `sink` as it is produced.
    pub fn submit_frame_to(&mut self, frame: &Frame, sink: &mut dyn EventSink) {
        self.apply_pending(frame.timestamp_us, sink);
        self.frames += 1;

        let ctx = FrameContext {
            screen: &self.screen,
            settings: &self.config.global,
        };
        let max_gap_s = self.config.global.max_frame_gap_s;
        for slot in &mut self.slots {
            let hand = frame.hand(slot.slot);
            let dt = match hand {
                Some(_) => match slot.frame_timing(frame.timestamp_us, max_gap_s) {
                    FrameTiming::Step(dt) => Some(dt),
                    FrameTiming::Stale => None,
                    FrameTiming::Gap => {
                        slot.recognizers.iter_mut().for_each(Recognizer::resync);
                        None
                    }
                },
                None => {
                    slot.last_timestamp_us = None;
                    None
                }
            };
            for recognizer in &mut slot.recognizers {
                let event = recognizer.update(hand, frame.timestamp_us, dt, &ctx);
                sink.dispatch(&event);
            }
        }
    }

    /// Swap in a queued configuration. When the set of recognizers
    /// changes, the old ones are retired first, cancelling any open press.
    fn apply_pending(&mut self, timestamp_us: u64, sink: &mut dyn EventSink) {
        let Some(config) = self.pending.take() else {
            return;
        };
        let rebuild = config.global.recognizers != self.config.global.recognizers
            || config.global.secondary_enabled != self.config.global.secondary_enabled;

        self.screen = config.screen.build();
        if rebuild {
            let ctx = FrameContext {
                screen: &self.screen,
                settings: &self.config.global,
            };
            for recognizer in self.slots.iter_mut().flat_map(|s| s.recognizers.iter_mut()) {
                if recognizer.is_pressing() {
                    let event = recognizer.update(None, timestamp_us, None, &ctx);
                    debug_assert_eq!(event.input, InputKind::Cancel);
                    sink.dispatch(&event);
                }
            }
            self.slots = build_slots(&config);
            debug!("Recognizer set rebuilt");
        } else {
            for recognizer in self.slots.iter_mut().flat_map(|s| s.recognizers.iter_mut()) {
                recognizer.apply_config(&config);
            }
        }
        self.config = config;
        info!("Configuration applied: {}", self.config.config_sexp());
    }

    /// Generate s-expression for status output.
    pub fn status_sexp(&self) -> String {
        let recognizers: Vec<String> = self.recognizers().map(|r| r.status_sexp()).collect();
        format!(
            "(:frames {} :pending {} :screen {} :config {} :recognizers ({}))",
            self.frames,
            if self.pending.is_some() { "t" } else { "nil" },
            self.screen.status_sexp(),
            self.config.config_sexp(),
            recognizers.join(" "),
        )
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::{make_sample, Chirality};
    use crate::recognizer::InteractionKind;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn config_with(kinds: &[InteractionKind]) -> EngineConfig {
        let mut config = EngineConfig::default();
        config.global.recognizers = kinds.to_vec();
        config
    }

    fn frame_at(timestamp_us: u64, z: f32) -> Frame {
        Frame {
            timestamp_us,
            primary: Some(make_sample(Chirality::Right, timestamp_us, [0.0, 0.1, z])),
            secondary: None,
        }
    }

    fn empty(timestamp_us: u64) -> Frame {
        Frame {
            timestamp_us,
            ..Frame::default()
        }
    }

    #[test]
    fn test_one_event_per_recognizer_per_frame() {
        let mut engine =
            Engine::new(config_with(&[InteractionKind::Push, InteractionKind::Dwell])).unwrap();
        let events = engine.submit_frame(&frame_at(0, 0.2));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].interaction, InteractionKind::Push);
        assert_eq!(events[1].interaction, InteractionKind::Dwell);
        assert!(events.iter().all(|e| e.slot == HandSlot::Primary));
        assert_eq!(engine.submit_frame(&empty(10_000)).len(), 2);
    }

    #[test]
    fn test_rejects_invalid_initial_config() {
        let mut config = EngineConfig::default();
        config.push.speed_max = config.push.speed_min;
        assert!(Engine::new(config).is_err());
    }

    #[test]
    fn test_hand_loss_cancels_press() {
        let mut engine = Engine::new(config_with(&[InteractionKind::TouchPlane])).unwrap();
        engine.submit_frame(&frame_at(0, 0.2));
        let down = engine.submit_frame(&frame_at(10_000, 0.02));
        assert_eq!(down[0].input, InputKind::Down);
        let lost = engine.submit_frame(&empty(20_000));
        assert_eq!(lost[0].input, InputKind::Cancel);
        assert_eq!(engine.submit_frame(&empty(30_000))[0].input, InputKind::None);
    }

    #[test]
    fn test_pending_config_applies_on_next_frame() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine
            .queue_config(config_with(&[InteractionKind::Dwell, InteractionKind::Poke]))
            .unwrap();
        assert!(engine.has_pending_config());
        assert_eq!(engine.config().global.recognizers, vec![InteractionKind::Push]);

        let events = engine.submit_frame(&frame_at(0, 0.2));
        assert!(!engine.has_pending_config());
        let kinds: Vec<InteractionKind> = events.iter().map(|e| e.interaction).collect();
        assert_eq!(kinds, vec![InteractionKind::Dwell, InteractionKind::Poke]);
    }

    #[test]
    fn test_rejected_config_keeps_previous() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let mut bad = config_with(&[InteractionKind::Dwell]);
        bad.screen.height_m = 0.0;
        let err = engine.queue_config(bad).unwrap_err();
        assert!(matches!(err, ConfigError::NotPositive { .. }), "got {:?}", err);
        assert!(!engine.has_pending_config());
        let events = engine.submit_frame(&frame_at(0, 0.2));
        assert_eq!(events[0].interaction, InteractionKind::Push);
    }

    #[test]
    fn test_reconfigure_cancels_open_press() {
        let mut engine = Engine::new(config_with(&[InteractionKind::TouchPlane])).unwrap();
        engine.submit_frame(&frame_at(0, 0.2));
        engine.submit_frame(&frame_at(10_000, 0.02));
        engine.queue_config(config_with(&[InteractionKind::Dwell])).unwrap();

        let events = engine.submit_frame(&frame_at(20_000, 0.02));
        assert_eq!(events.len(), 2, "events: {:?}", events);
        assert_eq!(events[0].interaction, InteractionKind::TouchPlane);
        assert_eq!(events[0].input, InputKind::Cancel);
        assert_eq!(events[1].interaction, InteractionKind::Dwell);
    }

    #[test]
    fn test_same_recognizers_keep_state_across_config() {
        let mut engine = Engine::new(config_with(&[InteractionKind::TouchPlane])).unwrap();
        engine.submit_frame(&frame_at(0, 0.2));
        engine.submit_frame(&frame_at(10_000, 0.02));
        let mut config = config_with(&[InteractionKind::TouchPlane]);
        config.global.deadzone_radius_m = 0.005;
        engine.queue_config(config).unwrap();

        let events = engine.submit_frame(&frame_at(20_000, 0.2));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].input, InputKind::Up);
    }

    #[test]
    fn test_secondary_slot() {
        let mut config = config_with(&[InteractionKind::TouchPlane]);
        config.global.secondary_enabled = true;
        let mut engine = Engine::new(config).unwrap();
        let mut frame = frame_at(0, 0.2);
        frame.secondary = Some(make_sample(Chirality::Left, 0, [0.05, 0.1, 0.2]));
        let events = engine.submit_frame(&frame);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].slot, HandSlot::Primary);
        assert_eq!(events[1].slot, HandSlot::Secondary);
        assert_eq!(events[1].chirality, Some(Chirality::Left));
    }

    #[test]
    fn test_secondary_ignored_when_disabled() {
        let mut engine = Engine::new(config_with(&[InteractionKind::TouchPlane])).unwrap();
        let mut frame = empty(0);
        frame.secondary = Some(make_sample(Chirality::Left, 0, [0.0, 0.1, 0.2]));
        let events = engine.submit_frame(&frame);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].input, InputKind::None);
    }

    #[test]
    fn test_frame_gap_is_zero_update() {
        let mut engine = Engine::new(config_with(&[InteractionKind::TouchPlane])).unwrap();
        engine.submit_frame(&frame_at(0, 0.2));
        let before = engine.submit_frame(&frame_at(10_000, 0.2));
        // Two seconds later, already past the plane: the frame is skipped.
        let gap = engine.submit_frame(&frame_at(2_010_000, 0.02));
        assert_eq!(gap[0].input, InputKind::None);
        assert_eq!(gap[0].positions, before[0].positions);
        let next = engine.submit_frame(&frame_at(2_020_000, 0.02));
        assert_eq!(next[0].input, InputKind::Down);
    }

    #[test]
    fn test_push_gap_does_not_fake_a_click() {
        let mut engine = Engine::new(config_with(&[InteractionKind::Push])).unwrap();
        let mut t = 0;
        for _ in 0..40 {
            engine.submit_frame(&frame_at(t, 0.3));
            t += 10_000;
        }
        // 5cm closer after a second without tracking.
        t += 1_000_000;
        let gap = engine.submit_frame(&frame_at(t, 0.25));
        assert_eq!(gap[0].input, InputKind::None);
        for _ in 0..40 {
            t += 10_000;
            let events = engine.submit_frame(&frame_at(t, 0.25));
            assert_ne!(events[0].input, InputKind::Down, "click at {}us", t);
        }
    }

    #[test]
    fn test_poke_jab_across_gap_does_not_click() {
        let mut engine = Engine::new(config_with(&[InteractionKind::Poke])).unwrap();
        let (mut t, mut z) = (0, 0.25);
        for _ in 0..40 {
            engine.submit_frame(&frame_at(t, z));
            t += 10_000;
        }
        let mut inputs = Vec::new();
        for frame in 0..17 {
            if frame == 6 {
                t += 1_000_000;
            }
            if frame < 12 {
                z -= 0.005;
            }
            inputs.push(engine.submit_frame(&frame_at(t, z))[0].input);
            t += 10_000;
        }
        assert!(!inputs.contains(&InputKind::Down), "inputs: {:?}", inputs);
    }

    #[test]
    fn test_repeated_timestamp_is_zero_update() {
        let mut engine = Engine::new(config_with(&[InteractionKind::TouchPlane])).unwrap();
        engine.submit_frame(&frame_at(10_000, 0.2));
        let repeat = engine.submit_frame(&frame_at(10_000, 0.02));
        assert_eq!(repeat[0].input, InputKind::None);
    }

    struct Counter {
        downs: usize,
        total: usize,
    }

    impl EventSink for Counter {
        fn dispatch(&mut self, event: &PointerEvent) {
            self.total += 1;
            if event.input == InputKind::Down {
                self.downs += 1;
            }
        }
    }

    #[test]
    fn test_custom_sink() {
        let mut engine = Engine::new(config_with(&[InteractionKind::TouchPlane])).unwrap();
        let mut sink = Counter { downs: 0, total: 0 };
        engine.submit_frame_to(&frame_at(0, 0.2), &mut sink);
        engine.submit_frame_to(&frame_at(10_000, 0.02), &mut sink);
        assert_eq!(sink.total, 2);
        assert_eq!(sink.downs, 1);
    }

    #[test]
    fn test_status_sexp() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.submit_frame(&frame_at(0, 0.2));
        let s = engine.status_sexp();
        assert!(s.contains(":frames 1"), "got {}", s);
        assert!(s.contains(":pending nil"), "got {}", s);
        assert!(s.contains(":kind push"), "got {}", s);
    }

    proptest! {
        #[test]
        fn test_every_down_pairs_with_one_release(
            steps in prop::collection::vec(
                (
                    prop::bool::weighted(0.95),
                    -0.01f32..0.01,
                    -0.01f32..0.01,
                    prop_oneof![20 => 5u64..25, 1 => Just(0u64), 1 => 600u64..900],
                ),
                1..400,
            )
        ) {
            let mut config = config_with(&[
                InteractionKind::Push,
                InteractionKind::Poke,
                InteractionKind::Dwell,
                InteractionKind::TouchPlane,
                InteractionKind::Grab,
            ]);
            config.global.secondary_enabled = true;
            let mut engine = Engine::new(config).unwrap();
            let mut open: HashMap<(InteractionKind, HandSlot), bool> = HashMap::new();
            let (mut t, mut x, mut z) = (0u64, 0.0f32, 0.15f32);

            for (present, dx, dz, dt_ms) in steps {
                t += dt_ms * 1000;
                x = (x + dx).clamp(-0.1, 0.1);
                z = (z + dz).clamp(-0.02, 0.35);
                let hand = present.then(|| make_sample(Chirality::Right, t, [x, 0.1, z]));
                let frame = Frame {
                    timestamp_us: t,
                    secondary: hand.clone(),
                    primary: hand,
                };
                for event in engine.submit_frame(&frame) {
                    let pressed = open.entry((event.interaction, event.slot)).or_insert(false);
                    match event.input {
                        InputKind::Down => {
                            prop_assert!(!*pressed, "second Down: {:?}", event);
                            *pressed = true;
                        }
                        InputKind::Up | InputKind::Cancel => {
                            prop_assert!(*pressed, "release without a press: {:?}", event);
                            *pressed = false;
                        }
                        _ => {}
                    }
                }
            }

            // Losing both hands settles every open press with one Cancel.
            for event in engine.submit_frame(&empty(t + 10_000)) {
                let pressed = open.get(&(event.interaction, event.slot)).copied().unwrap_or(false);
                prop_assert_eq!(event.input == InputKind::Cancel, pressed, "{:?}", event);
            }
        }
    }
}
