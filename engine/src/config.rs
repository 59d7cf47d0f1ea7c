//! Engine configuration: defaults, validation and s-expression loading.
//!
//! A configuration is a plain value. The engine validates it when it is
//! queued and swaps it in between frames; a rejected configuration never
//! replaces the active one.
//!
//! File format is a keyword plist; every key is optional and falls back
//! to its default:
//!
//! ```text
//! (:screen (:width-px 1920 :height-px 1080 :height-m 0.3 :tilt-deg 0)
//!  :deadzone-radius 0.003 :drag-enabled t :hover-enabled nil
//!  :recognizers (push)
//!  :push (:speed-max 0.5 :selector stable-index)
//!  :plane (:plane-distance 0.05))
//! ```

use crate::curve::ResponseCurve;
use crate::recognizer::dwell::DwellConfig;
use crate::recognizer::plane::{DeadzoneScaling, PlaneConfig};
use crate::recognizer::poke::PokeConfig;
use crate::recognizer::push::PushConfig;
use crate::recognizer::InteractionKind;
use crate::screen::VirtualScreen;
use crate::selector::SelectorPolicy;
use crate::sexp::{self, fmt_bool};
use lexpr::Value;
use thiserror::Error;

// ── Errors ─────────────────────────────────────────────────

/// Why a configuration was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: String, value: f64 },

    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{high} must be greater than {low}")]
    Ordering { low: String, high: String },

    #[error("no recognizers enabled")]
    NoRecognizers,

    #[error("recognizer {0} listed more than once")]
    DuplicateRecognizer(String),

    #[error("unknown value for {field}: {value}")]
    UnknownValue { field: String, value: String },

    #[error("malformed configuration: {0}")]
    Malformed(String),
}

pub(crate) fn require_positive(field: &str, value: f32) -> Result<(), ConfigError> {
    // Written so that NaN fails too.
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive {
            field: field.to_string(),
            value: value as f64,
        })
    }
}

pub(crate) fn require_range(field: &str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field: field.to_string(),
            value: value as f64,
            min: min as f64,
            max: max as f64,
        })
    }
}

pub(crate) fn require_non_negative(field: &str, value: f32) -> Result<(), ConfigError> {
    require_range(field, value, 0.0, f32::MAX)
}

pub(crate) fn require_ordered(low: &str, low_value: f32, high: &str, high_value: f32) -> Result<(), ConfigError> {
    if high_value > low_value {
        Ok(())
    } else {
        Err(ConfigError::Ordering {
            low: low.to_string(),
            high: high.to_string(),
        })
    }
}

// ── Screen ─────────────────────────────────────────────────

/// Physical screen description.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenConfig {
    pub width_px: u32,
    pub height_px: u32,
    /// Physical height of the display area in meters.
    pub height_m: f32,
    /// 0 is upright; positive leans the top away from the user.
    pub tilt_deg: f32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width_px: 1920,
            height_px: 1080,
            height_m: 0.3,
            tilt_deg: 0.0,
        }
    }
}

impl ScreenConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("screen.width-px", self.width_px as f32)?;
        require_positive("screen.height-px", self.height_px as f32)?;
        require_positive("screen.height-m", self.height_m)?;
        require_range("screen.tilt-deg", self.tilt_deg, 0.0, 89.9)
    }

    pub fn build(&self) -> VirtualScreen {
        VirtualScreen::new(self.width_px, self.height_px, self.height_m, self.tilt_deg)
    }
}

// ── Global settings ────────────────────────────────────────

/// Distance band in which a hand is considered present.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionZone {
    pub enabled: bool,
    pub min_m: f32,
    pub max_m: f32,
}

impl Default for InteractionZone {
    fn default() -> Self {
        Self {
            enabled: false,
            min_m: 0.0,
            max_m: 0.25,
        }
    }
}

impl InteractionZone {
    /// Whether a hand at `distance` takes part in interactions.
    pub fn contains(&self, distance: f32) -> bool {
        !self.enabled || (distance >= self.min_m && distance <= self.max_m)
    }
}

/// Settings shared by every recognizer.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSettings {
    /// Default deadzone radius in screen meters.
    pub deadzone_radius_m: f32,
    pub drag_enabled: bool,
    pub hover_enabled: bool,
    /// Frame gaps longer than this are treated as unusable.
    pub max_frame_gap_s: f32,
    pub interaction_zone: InteractionZone,
    /// Run recognizers for the secondary hand slot as well.
    pub secondary_enabled: bool,
    /// Active recognizers, in event order.
    pub recognizers: Vec<InteractionKind>,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            deadzone_radius_m: 0.003,
            drag_enabled: true,
            hover_enabled: false,
            max_frame_gap_s: 0.5,
            interaction_zone: InteractionZone::default(),
            secondary_enabled: false,
            recognizers: vec![InteractionKind::Push],
        }
    }
}

impl GlobalSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("deadzone-radius", self.deadzone_radius_m)?;
        require_positive("max-frame-gap-s", self.max_frame_gap_s)?;
        if self.interaction_zone.enabled {
            require_ordered(
                "interaction-zone.min-m",
                self.interaction_zone.min_m,
                "interaction-zone.max-m",
                self.interaction_zone.max_m,
            )?;
        }
        if self.recognizers.is_empty() {
            return Err(ConfigError::NoRecognizers);
        }
        for (i, kind) in self.recognizers.iter().enumerate() {
            if self.recognizers[..i].contains(kind) {
                return Err(ConfigError::DuplicateRecognizer(kind.as_str().to_string()));
            }
        }
        Ok(())
    }
}

// ── Engine config ──────────────────────────────────────────

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineConfig {
    pub screen: ScreenConfig,
    pub global: GlobalSettings,
    pub push: PushConfig,
    pub poke: PokeConfig,
    pub dwell: DwellConfig,
    /// Shared by the touch-plane and grab recognizers.
    pub plane: PlaneConfig,
}

impl EngineConfig {
    /// Check every section; the first problem found is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.screen.validate()?;
        self.global.validate()?;
        self.push.validate()?;
        self.poke.validate()?;
        self.dwell.validate()?;
        self.plane.validate()
    }

    /// Point selection policy configured for a recognizer kind.
    pub fn selector_for(&self, kind: InteractionKind) -> SelectorPolicy {
        match kind {
            InteractionKind::Push => self.push.selector,
            InteractionKind::Poke => self.poke.selector,
            InteractionKind::Dwell => self.dwell.selector,
            InteractionKind::TouchPlane | InteractionKind::Grab => self.plane.selector,
        }
    }

    /// Parse and validate a configuration plist.
    pub fn from_sexp(text: &str) -> Result<Self, ConfigError> {
        let value = lexpr::from_str(text).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Build from an already parsed plist, starting from defaults.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.merge_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay the keys present in `value` onto this configuration.
    /// Does not validate.
    pub fn merge_value(&mut self, value: &Value) -> Result<(), ConfigError> {
        if let Some(screen) = sexp::get_value(value, "screen") {
            self.merge_screen(&Section::new("screen", screen))?;
        }
        self.merge_global(&Section::new("", value))?;
        if let Some(push) = sexp::get_value(value, "push") {
            self.merge_push(&Section::new("push", push))?;
        }
        if let Some(poke) = sexp::get_value(value, "poke") {
            self.merge_poke(&Section::new("poke", poke))?;
        }
        if let Some(dwell) = sexp::get_value(value, "dwell") {
            self.merge_dwell(&Section::new("dwell", dwell))?;
        }
        if let Some(plane) = sexp::get_value(value, "plane") {
            self.merge_plane(&Section::new("plane", plane))?;
        }
        Ok(())
    }

    fn merge_screen(&mut self, s: &Section) -> Result<(), ConfigError> {
        let c = &mut self.screen;
        s.u32("width-px", &mut c.width_px)?;
        s.u32("height-px", &mut c.height_px)?;
        s.f32("height-m", &mut c.height_m)?;
        s.f32("tilt-deg", &mut c.tilt_deg)
    }

    fn merge_global(&mut self, s: &Section) -> Result<(), ConfigError> {
        let g = &mut self.global;
        s.f32("deadzone-radius", &mut g.deadzone_radius_m)?;
        s.bool("drag-enabled", &mut g.drag_enabled)?;
        s.bool("hover-enabled", &mut g.hover_enabled)?;
        s.f32("max-frame-gap-s", &mut g.max_frame_gap_s)?;
        s.bool("secondary-enabled", &mut g.secondary_enabled)?;
        if let Some(zone) = s.get("interaction-zone") {
            let zone = Section::new("interaction-zone", zone);
            zone.bool("enabled", &mut g.interaction_zone.enabled)?;
            zone.f32("min-m", &mut g.interaction_zone.min_m)?;
            zone.f32("max-m", &mut g.interaction_zone.max_m)?;
        }
        if let Some(list) = s.get("recognizers") {
            g.recognizers = sexp::list_items(list)
                .into_iter()
                .map(|v| {
                    let name = sexp::atom_string(v);
                    InteractionKind::from_name(&name).ok_or(ConfigError::UnknownValue {
                        field: "recognizers".to_string(),
                        value: name,
                    })
                })
                .collect::<Result<_, _>>()?;
        }
        Ok(())
    }

    fn merge_push(&mut self, s: &Section) -> Result<(), ConfigError> {
        let c = &mut self.push;
        s.f32("speed-min", &mut c.speed_min)?;
        s.f32("speed-max", &mut c.speed_max)?;
        s.f32("dist-at-speed-min", &mut c.dist_at_speed_min)?;
        s.f32("dist-at-speed-max", &mut c.dist_at_speed_max)?;
        s.f32("horizontal-decay-dist", &mut c.horizontal_decay_dist)?;
        s.f32("theta-one", &mut c.theta_one_deg)?;
        s.f32("theta-two", &mut c.theta_two_deg)?;
        s.f32("unclick-threshold", &mut c.unclick_threshold)?;
        s.f32("unclick-threshold-drag", &mut c.unclick_threshold_drag)?;
        s.bool("decay-force-on-click", &mut c.decay_force_on_click)?;
        s.f32("force-decay-time", &mut c.force_decay_time_s)?;
        s.bool("use-touch-plane-force", &mut c.use_touch_plane_force)?;
        s.f32("touch-plane-distance", &mut c.touch_plane_distance)?;
        s.f32("dist-past-touch-plane", &mut c.dist_past_touch_plane)?;
        s.f32("drag-start-distance", &mut c.drag_start_distance)?;
        s.f32("drag-deadzone-shrink-rate", &mut c.drag_deadzone_shrink_rate)?;
        s.f32("deadzone-max-increase", &mut c.deadzone_max_increase)?;
        s.f32("deadzone-shrink-rate", &mut c.deadzone_shrink_rate)?;
        s.curve("curve", &mut c.curve)?;
        s.f64("cooldown-on-entry-ms", &mut c.cooldown_on_entry_ms)?;
        s.f64("click-hold-ms", &mut c.click_hold_ms)?;
        s.bool("position-filter", &mut c.position_filter)?;
        s.f32("filter-min-cutoff", &mut c.filter.min_cutoff_hz)?;
        s.f32("filter-beta", &mut c.filter.beta)?;
        s.f32("filter-d-cutoff", &mut c.filter.d_cutoff_hz)?;
        s.selector("selector", &mut c.selector)
    }

    fn merge_poke(&mut self, s: &Section) -> Result<(), ConfigError> {
        let c = &mut self.poke;
        s.f64("cooldown-on-entry-ms", &mut c.cooldown_on_entry_ms)?;
        s.f32("max-distance", &mut c.max_distance)?;
        s.f32("time-to-click-ms", &mut c.time_to_click_ms)?;
        s.f32("min-click-distance", &mut c.min_click_distance)?;
        s.f32("cos-squared-max-angle", &mut c.cos_squared_max_angle)?;
        s.f32("time-to-slowdown-ms", &mut c.time_to_slowdown_ms)?;
        s.f32("slowdown-distance", &mut c.slowdown_distance)?;
        s.f64("click-cooldown-ms", &mut c.click_cooldown_ms)?;
        s.bool("immediate-unclick", &mut c.immediate_unclick)?;
        s.f32("time-to-unclick-ms", &mut c.time_to_unclick_ms)?;
        s.f32("min-unclick-distance", &mut c.min_unclick_distance)?;
        s.f32("cos-squared-max-angle-unclick", &mut c.cos_squared_max_angle_unclick)?;
        s.f32("deadcone-enlargement-ratio", &mut c.deadcone_enlargement_ratio)?;
        s.f32("deadcone-max-increase", &mut c.deadcone_max_increase)?;
        s.f32("deadcone-shrink-speed", &mut c.deadcone_shrink_speed)?;
        s.f32("drag-start-distance", &mut c.drag_start_distance)?;
        s.opt_f32("drag-start-time", &mut c.drag_start_time_s)?;
        s.f32("drag-deadzone-shrink-rate", &mut c.drag_deadzone_shrink_rate)?;
        s.f32("drag-deadzone-shrink-distance", &mut c.drag_deadzone_shrink_distance)?;
        s.selector("selector", &mut c.selector)
    }

    fn merge_dwell(&mut self, s: &Section) -> Result<(), ConfigError> {
        let c = &mut self.dwell;
        s.f64("hover-trigger-ms", &mut c.hover_trigger_ms)?;
        s.f64("hover-complete-ms", &mut c.hover_complete_ms)?;
        s.f64("click-hold-ms", &mut c.click_hold_ms)?;
        s.f32("hover-enlargement", &mut c.hover_enlargement)?;
        s.f32("timer-enlargement", &mut c.timer_enlargement)?;
        s.f32("deadzone-shrink-rate", &mut c.deadzone_shrink_rate)?;
        s.selector("selector", &mut c.selector)
    }

    fn merge_plane(&mut self, s: &Section) -> Result<(), ConfigError> {
        let c = &mut self.plane;
        s.f32("plane-distance", &mut c.plane_distance)?;
        s.f32("zero-progress-distance", &mut c.zero_progress_distance)?;
        s.f32("grab-threshold", &mut c.grab_threshold)?;
        s.f32("drag-start-distance", &mut c.drag_start_distance)?;
        s.opt_f32("drag-start-time", &mut c.drag_start_time_s)?;
        s.f32("deadzone-max-increase", &mut c.deadzone_max_increase)?;
        s.f32("deadzone-shrink-rate", &mut c.deadzone_shrink_rate)?;
        if let Some(name) = s.keyword("deadzone-scaling") {
            c.deadzone_scaling =
                DeadzoneScaling::from_name(&name).ok_or_else(|| s.unknown("deadzone-scaling", name))?;
        }
        s.selector("selector", &mut c.selector)
    }

    /// Generate s-expression for the active configuration (global part).
    pub fn config_sexp(&self) -> String {
        let recognizers: Vec<&str> = self.global.recognizers.iter().map(|k| k.as_str()).collect();
        format!(
            "(:screen (:width-px {} :height-px {} :height-m {:.4} :tilt-deg {:.1}) :deadzone-radius {:.4} :drag-enabled {} :hover-enabled {} :secondary-enabled {} :recognizers ({}))",
            self.screen.width_px,
            self.screen.height_px,
            self.screen.height_m,
            self.screen.tilt_deg,
            self.global.deadzone_radius_m,
            fmt_bool(self.global.drag_enabled),
            fmt_bool(self.global.hover_enabled),
            fmt_bool(self.global.secondary_enabled),
            recognizers.join(" "),
        )
    }
}

// ── Plist section reader ───────────────────────────────────

/// One plist section with typed setters that leave a field untouched
/// when its key is absent.
struct Section<'a> {
    name: &'static str,
    value: &'a Value,
}

impl<'a> Section<'a> {
    fn new(name: &'static str, value: &'a Value) -> Self {
        Self { name, value }
    }

    fn field(&self, key: &str) -> String {
        if self.name.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.name, key)
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        sexp::get_value(self.value, key)
    }

    fn keyword(&self, key: &str) -> Option<String> {
        self.get(key).map(sexp::atom_string)
    }

    fn unknown(&self, key: &str, value: String) -> ConfigError {
        ConfigError::UnknownValue {
            field: self.field(key),
            value,
        }
    }

    fn number(&self, key: &str) -> Result<Option<f64>, ConfigError> {
        match self.keyword(key) {
            None => Ok(None),
            Some(raw) => raw.parse::<f64>().map(Some).map_err(|_| {
                ConfigError::Malformed(format!("{} expects a number, got {}", self.field(key), raw))
            }),
        }
    }

    fn f32(&self, key: &str, slot: &mut f32) -> Result<(), ConfigError> {
        if let Some(v) = self.number(key)? {
            *slot = v as f32;
        }
        Ok(())
    }

    fn f64(&self, key: &str, slot: &mut f64) -> Result<(), ConfigError> {
        if let Some(v) = self.number(key)? {
            *slot = v;
        }
        Ok(())
    }

    fn u32(&self, key: &str, slot: &mut u32) -> Result<(), ConfigError> {
        if let Some(v) = self.number(key)? {
            if v < 0.0 || v > u32::MAX as f64 || v.fract() != 0.0 {
                return Err(ConfigError::Malformed(format!(
                    "{} expects a whole number of pixels, got {}",
                    self.field(key),
                    v
                )));
            }
            *slot = v as u32;
        }
        Ok(())
    }

    /// `nil` clears the option.
    fn opt_f32(&self, key: &str, slot: &mut Option<f32>) -> Result<(), ConfigError> {
        match self.get(key) {
            None => Ok(()),
            Some(v) if sexp::is_nil(v) => {
                *slot = None;
                Ok(())
            }
            Some(_) => {
                *slot = self.number(key)?.map(|v| v as f32);
                Ok(())
            }
        }
    }

    fn bool(&self, key: &str, slot: &mut bool) -> Result<(), ConfigError> {
        if let Some(v) = self.get(key) {
            *slot = !sexp::is_nil(v);
        }
        Ok(())
    }

    fn selector(&self, key: &str, slot: &mut SelectorPolicy) -> Result<(), ConfigError> {
        if let Some(name) = self.keyword(key) {
            *slot = SelectorPolicy::from_name(&name).ok_or_else(|| self.unknown(key, name))?;
        }
        Ok(())
    }

    fn curve(&self, key: &str, slot: &mut ResponseCurve) -> Result<(), ConfigError> {
        if let Some(name) = self.keyword(key) {
            *slot = ResponseCurve::from_name(&name).ok_or_else(|| self.unknown(key, name))?;
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok(), "{:?}", config.validate());
        assert_eq!(config.global.recognizers, vec![InteractionKind::Push]);
        assert!((config.global.deadzone_radius_m - 0.003).abs() < 1e-9);
    }

    #[test]
    fn test_from_sexp_overrides() {
        let config = EngineConfig::from_sexp(
            "(:screen (:width-px 1080 :height-px 1920 :height-m 0.4 :tilt-deg 15)
              :drag-enabled nil :hover-enabled t
              :recognizers (poke dwell)
              :push (:speed-max 0.6 :curve linear :selector index-tip)
              :poke (:drag-start-time nil)
              :plane (:deadzone-scaling by-distance))",
        )
        .unwrap();
        assert_eq!(config.screen.width_px, 1080);
        assert!((config.screen.tilt_deg - 15.0).abs() < 1e-6);
        assert!(!config.global.drag_enabled);
        assert!(config.global.hover_enabled);
        assert_eq!(
            config.global.recognizers,
            vec![InteractionKind::Poke, InteractionKind::Dwell]
        );
        assert!((config.push.speed_max - 0.6).abs() < 1e-6);
        assert_eq!(config.push.curve, ResponseCurve::Linear);
        assert_eq!(config.selector_for(InteractionKind::Push), SelectorPolicy::IndexTip);
        assert_eq!(config.poke.drag_start_time_s, None);
        assert_eq!(config.plane.deadzone_scaling, DeadzoneScaling::ByDistance);
    }

    #[test]
    fn test_push_position_filter_keys() {
        let config = EngineConfig::default();
        assert!(!config.push.position_filter);

        let config = EngineConfig::from_sexp(
            "(:push (:position-filter t :filter-min-cutoff 1.0 :filter-beta 2.5))",
        )
        .unwrap();
        assert!(config.push.position_filter);
        assert!((config.push.filter.min_cutoff_hz - 1.0).abs() < 1e-6);
        assert!((config.push.filter.beta - 2.5).abs() < 1e-6);

        let err = EngineConfig::from_sexp("(:push (:filter-d-cutoff 0))").unwrap_err();
        assert!(err.to_string().contains("push.filter-d-cutoff"), "got {}", err);
    }

    #[test]
    fn test_rejects_equal_speeds() {
        let err = EngineConfig::from_sexp("(:push (:speed-min 0.5 :speed-max 0.5))").unwrap_err();
        assert!(matches!(err, ConfigError::Ordering { .. }), "got {:?}", err);
    }

    #[test]
    fn test_rejects_zero_screen_height() {
        let err = EngineConfig::from_sexp("(:screen (:height-m 0))").unwrap_err();
        assert!(matches!(err, ConfigError::NotPositive { .. }), "got {:?}", err);
        assert!(err.to_string().contains("screen.height-m"), "got {}", err);
    }

    #[test]
    fn test_rejects_unknown_recognizer_and_selector() {
        let err = EngineConfig::from_sexp("(:recognizers (push swipe))").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownValue { .. }), "got {:?}", err);
        let err = EngineConfig::from_sexp("(:dwell (:selector thumb))").unwrap_err();
        assert!(err.to_string().contains("dwell.selector"), "got {}", err);
    }

    #[test]
    fn test_rejects_duplicate_and_empty_recognizers() {
        let err = EngineConfig::from_sexp("(:recognizers (push push))").unwrap_err();
        assert_eq!(err, ConfigError::DuplicateRecognizer("push".to_string()));
        let err = EngineConfig::from_sexp("(:recognizers ())").unwrap_err();
        assert_eq!(err, ConfigError::NoRecognizers);
    }

    #[test]
    fn test_rejects_non_numeric() {
        let err = EngineConfig::from_sexp("(:deadzone-radius wide)").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)), "got {:?}", err);
        let err = EngineConfig::from_sexp("(:screen (:width-px 10.5))").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)), "got {:?}", err);
    }

    #[test]
    fn test_rejects_bad_zone_only_when_enabled() {
        let mut config = EngineConfig::default();
        config.global.interaction_zone.min_m = 0.3;
        config.global.interaction_zone.max_m = 0.1;
        assert!(config.validate().is_ok());
        config.global.interaction_zone.enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_interaction_zone_contains() {
        let mut zone = InteractionZone::default();
        assert!(zone.contains(5.0));
        zone.enabled = true;
        assert!(zone.contains(0.1));
        assert!(!zone.contains(0.3));
        assert!(!zone.contains(-0.01));
    }

    #[test]
    fn test_config_sexp() {
        let s = EngineConfig::default().config_sexp();
        assert!(s.contains(":recognizers (push)"), "got {}", s);
        assert!(s.contains(":drag-enabled t"), "got {}", s);
    }
}
