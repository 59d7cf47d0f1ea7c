//! Tracked hand samples as delivered by the skeletal solver.
//!
//! Models the 26 joints of XR_EXT_hand_tracking. A sample is one
//! hand in one frame; an absent sample means the hand was not seen.
//!
//! World space: meters, origin at the bottom-center of the physical
//! screen, +x right, +y up, +z out of the screen toward the user.

// ── Joint definitions ──────────────────────────────────────

/// The 26 hand joints defined by XR_EXT_hand_tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandJoint {
    Palm,
    Wrist,
    ThumbMetacarpal,
    ThumbProximal,
    ThumbDistal,
    ThumbTip,
    IndexMetacarpal,
    IndexProximal,
    IndexIntermediate,
    IndexDistal,
    IndexTip,
    MiddleMetacarpal,
    MiddleProximal,
    MiddleIntermediate,
    MiddleDistal,
    MiddleTip,
    RingMetacarpal,
    RingProximal,
    RingIntermediate,
    RingDistal,
    RingTip,
    LittleMetacarpal,
    LittleProximal,
    LittleIntermediate,
    LittleDistal,
    LittleTip,
}

/// Total number of joints per hand.
pub const JOINT_COUNT: usize = 26;

impl HandJoint {
    /// Every joint, in index order.
    pub const ALL: [HandJoint; JOINT_COUNT] = [
        Self::Palm,
        Self::Wrist,
        Self::ThumbMetacarpal,
        Self::ThumbProximal,
        Self::ThumbDistal,
        Self::ThumbTip,
        Self::IndexMetacarpal,
        Self::IndexProximal,
        Self::IndexIntermediate,
        Self::IndexDistal,
        Self::IndexTip,
        Self::MiddleMetacarpal,
        Self::MiddleProximal,
        Self::MiddleIntermediate,
        Self::MiddleDistal,
        Self::MiddleTip,
        Self::RingMetacarpal,
        Self::RingProximal,
        Self::RingIntermediate,
        Self::RingDistal,
        Self::RingTip,
        Self::LittleMetacarpal,
        Self::LittleProximal,
        Self::LittleIntermediate,
        Self::LittleDistal,
        Self::LittleTip,
    ];

    /// Convert joint enum to array index (0-25).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Wire name, e.g. `index-tip`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Palm => "palm",
            Self::Wrist => "wrist",
            Self::ThumbMetacarpal => "thumb-metacarpal",
            Self::ThumbProximal => "thumb-proximal",
            Self::ThumbDistal => "thumb-distal",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMetacarpal => "index-metacarpal",
            Self::IndexProximal => "index-proximal",
            Self::IndexIntermediate => "index-intermediate",
            Self::IndexDistal => "index-distal",
            Self::IndexTip => "index-tip",
            Self::MiddleMetacarpal => "middle-metacarpal",
            Self::MiddleProximal => "middle-proximal",
            Self::MiddleIntermediate => "middle-intermediate",
            Self::MiddleDistal => "middle-distal",
            Self::MiddleTip => "middle-tip",
            Self::RingMetacarpal => "ring-metacarpal",
            Self::RingProximal => "ring-proximal",
            Self::RingIntermediate => "ring-intermediate",
            Self::RingDistal => "ring-distal",
            Self::RingTip => "ring-tip",
            Self::LittleMetacarpal => "little-metacarpal",
            Self::LittleProximal => "little-proximal",
            Self::LittleIntermediate => "little-intermediate",
            Self::LittleDistal => "little-distal",
            Self::LittleTip => "little-tip",
        }
    }

    /// Parse a wire name back into a joint.
    pub fn from_name(name: &str) -> Option<HandJoint> {
        Self::ALL.iter().copied().find(|j| j.as_str() == name)
    }

    /// Fingertip joints for convenience.
    pub fn fingertip_joints() -> [HandJoint; 5] {
        [
            Self::ThumbTip,
            Self::IndexTip,
            Self::MiddleTip,
            Self::RingTip,
            Self::LittleTip,
        ]
    }

    /// Whether this joint belongs to a finger (everything but palm and wrist).
    pub fn is_finger(&self) -> bool {
        !matches!(self, Self::Palm | Self::Wrist)
    }
}

// ── Chirality ──────────────────────────────────────────────

/// Which physical hand a sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chirality {
    Left,
    Right,
}

impl Chirality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn from_name(name: &str) -> Option<Chirality> {
        match name {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

// ── Joint pose ─────────────────────────────────────────────

/// Position data for a single joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointPose {
    /// Position in meters (x, y, z).
    pub position: [f32; 3],
    /// Whether this joint has valid tracking data.
    pub valid: bool,
}

impl Default for JointPose {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            valid: false,
        }
    }
}

// ── Hand sample ────────────────────────────────────────────

/// One tracked hand in one frame.
#[derive(Debug, Clone)]
pub struct HandSample {
    pub chirality: Chirality,
    /// 26 joint poses indexed by HandJoint.
    pub joints: Vec<JointPose>,
    /// Monotonic capture time in microseconds.
    pub timestamp_us: u64,
    /// Overall tracking confidence (0.0-1.0).
    pub confidence: f32,
}

impl HandSample {
    /// Create a sample with every joint marked invalid.
    pub fn new(chirality: Chirality, timestamp_us: u64) -> Self {
        Self {
            chirality,
            joints: vec![JointPose::default(); JOINT_COUNT],
            timestamp_us,
            confidence: 1.0,
        }
    }

    /// Set a joint position and mark it valid.
    pub fn set_joint(&mut self, joint: HandJoint, position: [f32; 3]) {
        if let Some(pose) = self.joints.get_mut(joint.index()) {
            *pose = JointPose {
                position,
                valid: true,
            };
        }
    }

    /// Position of a joint, or `None` if it is missing, invalid or not finite.
    pub fn joint(&self, joint: HandJoint) -> Option<[f32; 3]> {
        let pose = self.joints.get(joint.index())?;
        if pose.valid && pose.position.iter().all(|c| c.is_finite()) {
            Some(pose.position)
        } else {
            None
        }
    }

    /// How closed the hand is, 0.0 (open) to 1.0 (fist).
    ///
    /// Average fingertip-to-palm distance mapped between the open and
    /// closed reference spans. `None` when the palm or any tip is missing.
    pub fn grab_strength(&self) -> Option<f32> {
        let palm = self.joint(HandJoint::Palm)?;
        let mut total = 0.0;
        for tip in HandJoint::fingertip_joints() {
            total += joint_distance(&palm, &self.joint(tip)?);
        }
        let avg = total / 5.0;
        let t = (GRAB_OPEN_SPAN_M - avg) / (GRAB_OPEN_SPAN_M - GRAB_CLOSED_SPAN_M);
        Some(t.clamp(0.0, 1.0))
    }
}

/// Average fingertip-to-palm distance of a relaxed open hand.
const GRAB_OPEN_SPAN_M: f32 = 0.09;
/// Average fingertip-to-palm distance of a closed fist.
const GRAB_CLOSED_SPAN_M: f32 = 0.04;

/// Euclidean distance between two joints (in meters).
pub fn joint_distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let dz = b[2] - a[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

// ── Test helpers ───────────────────────────────────────────

/// Build a sample whose every joint is valid and sits at `origin`.
#[cfg(test)]
pub(crate) fn make_sample(chirality: Chirality, timestamp_us: u64, origin: [f32; 3]) -> HandSample {
    let mut sample = HandSample::new(chirality, timestamp_us);
    for joint in HandJoint::ALL {
        sample.set_joint(joint, origin);
    }
    sample
}

// ── Tests ──────────────────────────────────────────────────
