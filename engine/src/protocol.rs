//! Line protocol for replaying tracking data through the engine.
//!
//! Every line is one s-expression plist:
//!
//! ```text
//! (:type :frame :timestamp 16000
//!  :primary (:chirality :right :confidence 0.9
//!            :joints (:index-tip (0.01 0.12 0.08) :wrist (0.0 0.05 0.15)))
//!  :secondary nil)
//! (:type :config :recognizers (poke dwell) :drag-enabled nil)
//! (:type :status)
//! ```
//!
//! A `:config` message overlays its keys onto the active configuration.

use crate::config::{ConfigError, EngineConfig};
use crate::engine::{Engine, EventSink, Frame};
use crate::hand::{Chirality, HandJoint, HandSample};
use crate::recognizer::PointerEvent;
use crate::sexp::{self, format_event};
use lexpr::Value;
use std::io::{self, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed s-expression: {0}")]
    Parse(#[from] lexpr::parse::Error),

    #[error("missing {0}")]
    Missing(&'static str),

    #[error("unknown message type: {0}")]
    UnknownType(String),

    #[error("invalid {field}: {value}")]
    Invalid { field: &'static str, value: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A decoded input line.
#[derive(Debug, Clone)]
pub enum Message {
    Frame(Frame),
    /// Complete configuration to queue; not yet validated.
    Config(EngineConfig),
    Status,
}

/// Decode one line. `active` is the base a `:config` message overlays.
pub fn parse_message(raw: &str, active: &EngineConfig) -> Result<Message, ProtocolError> {
    let value = lexpr::from_str(raw)?;
    match sexp::get_keyword(&value, "type").as_deref() {
        Some("frame") => parse_frame(&value).map(Message::Frame),
        Some("config") => {
            let mut config = active.clone();
            config.merge_value(&value)?;
            Ok(Message::Config(config))
        }
        Some("status") => Ok(Message::Status),
        Some(other) => Err(ProtocolError::UnknownType(other.to_string())),
        None => Err(ProtocolError::Missing(":type")),
    }
}

fn parse_frame(value: &Value) -> Result<Frame, ProtocolError> {
    let raw = sexp::get_keyword(value, "timestamp").ok_or(ProtocolError::Missing(":timestamp"))?;
    let timestamp_us = raw.parse::<u64>().map_err(|_| ProtocolError::Invalid {
        field: "timestamp",
        value: raw,
    })?;
    let hand = |key| match sexp::get_value(value, key) {
        Some(v) => parse_hand(v, timestamp_us),
        None => Ok(None),
    };
    Ok(Frame {
        timestamp_us,
        primary: hand("primary")?,
        secondary: hand("secondary")?,
    })
}

/// `nil` (or an empty list) is an untracked hand.
fn parse_hand(value: &Value, timestamp_us: u64) -> Result<Option<HandSample>, ProtocolError> {
    if sexp::is_nil(value) {
        return Ok(None);
    }
    let name = sexp::get_keyword(value, "chirality").ok_or(ProtocolError::Missing(":chirality"))?;
    let chirality = Chirality::from_name(&name).ok_or(ProtocolError::Invalid {
        field: "chirality",
        value: name,
    })?;

    let mut sample = HandSample::new(chirality, timestamp_us);
    if let Some(confidence) = sexp::get_float(value, "confidence") {
        sample.confidence = (confidence as f32).clamp(0.0, 1.0);
    }
    let joints = sexp::get_value(value, "joints").ok_or(ProtocolError::Missing(":joints"))?;
    for (name, position) in sexp::plist_pairs(joints) {
        let joint = HandJoint::from_name(&name).ok_or_else(|| ProtocolError::Invalid {
            field: "joint",
            value: name.clone(),
        })?;
        let position = parse_vec3(position).ok_or_else(|| ProtocolError::Invalid {
            field: "joint position",
            value: format!("{} {}", name, position),
        })?;
        sample.set_joint(joint, position);
    }
    Ok(Some(sample))
}

fn parse_vec3(value: &Value) -> Option<[f32; 3]> {
    let items = sexp::list_items(value);
    let [x, y, z] = items.as_slice() else {
        return None;
    };
    let coord = |v: &Value| v.as_f64().map(|n| n as f32);
    Some([coord(*x)?, coord(*y)?, coord(*z)?])
}

// ── Output ─────────────────────────────────────────────────

/// Format a pointer event as an IPC event s-expression.
pub fn format_pointer_event(event: &PointerEvent) -> String {
    let chirality = event
        .chirality
        .map(|c| format!(":{}", c.as_str()))
        .unwrap_or_else(|| "nil".to_string());
    format_event(
        "pointer",
        &[
            ("timestamp", event.timestamp_us.to_string()),
            ("interaction", format!(":{}", event.interaction.as_str())),
            ("hand", format!(":{}", event.slot.as_str())),
            ("chirality", chirality),
            ("input", format!(":{}", event.input.as_str())),
            ("x", format!("{:.1}", event.positions.cursor[0])),
            ("y", format!("{:.1}", event.positions.cursor[1])),
            ("click-x", format!("{:.1}", event.positions.click[0])),
            ("click-y", format!("{:.1}", event.positions.click[1])),
            ("distance", format!("{:.4}", event.positions.distance)),
            ("progress", format!("{:.3}", event.progress)),
        ],
    )
}

pub fn status_response(engine: &Engine) -> String {
    format!("(:type :response :status :ok :engine {})", engine.status_sexp())
}

/// Writes each event as one line. The first write error is kept and
/// later events are dropped.
pub struct EventPrinter<W: Write> {
    out: W,
    error: Option<io::Error>,
    written: u64,
}

impl<W: Write> EventPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            error: None,
            written: 0,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Surface a write error from an earlier event, if any.
    pub fn take_error(&mut self) -> io::Result<()> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{}", line)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for EventPrinter<W> {
    fn dispatch(&mut self, event: &PointerEvent) {
        if self.error.is_some() {
            return;
        }
        match writeln!(self.out, "{}", format_pointer_event(event)) {
            Ok(()) => self.written += 1,
            Err(e) => self.error = Some(e),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────
