//! Response curves mapping a normalized 0..=1 input onto 0..=1.

/// Shape applied to a normalized ratio before it drives a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCurve {
    Linear,
    Quadratic,
    Cubic,
    SmoothStep,
}

impl ResponseCurve {
    /// Evaluate the curve; input is clamped to 0..=1.
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Quadratic => t * t,
            Self::Cubic => t * t * t,
            Self::SmoothStep => t * t * (3.0 - 2.0 * t),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Quadratic => "quadratic",
            Self::Cubic => "cubic",
            Self::SmoothStep => "smoothstep",
        }
    }

    pub fn from_name(name: &str) -> Option<ResponseCurve> {
        match name {
            "linear" => Some(Self::Linear),
            "quadratic" => Some(Self::Quadratic),
            "cubic" => Some(Self::Cubic),
            "smoothstep" => Some(Self::SmoothStep),
            _ => None,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────
