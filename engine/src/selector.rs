//! Picks the single 3D point of a hand that drives the cursor.

use crate::hand::{HandJoint, HandSample};
use crate::math::{lerp, scale3, sub3};
use crate::screen::VirtualScreen;
use tracing::trace;

/// How far the stable index point is pushed toward the screen, in meters.
const STABLE_INDEX_OFFSET_M: f32 = 0.0533;
/// Advantage given to the previously chosen joint by the nearest policy.
const NEAREST_JOINT_BIAS_M: f32 = 0.01;

/// Which part of the hand represents the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorPolicy {
    /// The index fingertip.
    IndexTip,
    /// Midpoint of the two lower index knuckles, projected to where the
    /// tip would be. Rides through fingertip tremor.
    StableIndex,
    /// Whichever joint is currently closest to the screen plane.
    Nearest,
    Wrist,
}

impl SelectorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IndexTip => "index-tip",
            Self::StableIndex => "stable-index",
            Self::Nearest => "nearest",
            Self::Wrist => "wrist",
        }
    }

    pub fn from_name(name: &str) -> Option<SelectorPolicy> {
        match name {
            "index-tip" => Some(Self::IndexTip),
            "stable-index" => Some(Self::StableIndex),
            "nearest" => Some(Self::Nearest),
            "wrist" => Some(Self::Wrist),
            _ => None,
        }
    }
}

/// Applies a [`SelectorPolicy`] frame by frame.
#[derive(Debug, Clone)]
pub struct PointSelector {
    policy: SelectorPolicy,
    /// Joint chosen by the nearest policy last frame.
    last_nearest: Option<HandJoint>,
}

impl PointSelector {
    pub fn new(policy: SelectorPolicy) -> Self {
        Self {
            policy,
            last_nearest: None,
        }
    }

    pub fn policy(&self) -> SelectorPolicy {
        self.policy
    }

    /// Swap the policy without touching any other recognizer state.
    pub fn set_policy(&mut self, policy: SelectorPolicy) {
        if policy != self.policy {
            self.policy = policy;
            self.last_nearest = None;
        }
    }

    /// Forget per-hand memory after the hand is lost.
    pub fn reset(&mut self) {
        self.last_nearest = None;
    }

    /// World position of the pointer, or `None` when the joints the
    /// policy needs are missing from this sample.
    pub fn select(&mut self, hand: &HandSample, screen: &VirtualScreen) -> Option<[f32; 3]> {
        match self.policy {
            SelectorPolicy::IndexTip => hand.joint(HandJoint::IndexTip),
            SelectorPolicy::Wrist => hand.joint(HandJoint::Wrist),
            SelectorPolicy::StableIndex => {
                let knuckle = hand.joint(HandJoint::IndexProximal)?;
                let middle = hand.joint(HandJoint::IndexIntermediate)?;
                let mid = [
                    lerp(knuckle[0], middle[0], 0.5),
                    lerp(knuckle[1], middle[1], 0.5),
                    lerp(knuckle[2], middle[2], 0.5),
                ];
                Some(sub3(mid, scale3(screen.normal(), STABLE_INDEX_OFFSET_M)))
            }
            SelectorPolicy::Nearest => self.select_nearest(hand, screen),
        }
    }

    fn select_nearest(&mut self, hand: &HandSample, screen: &VirtualScreen) -> Option<[f32; 3]> {
        let mut best: Option<(HandJoint, [f32; 3], f32)> = None;
        for joint in HandJoint::ALL.iter().copied().filter(|j| j.is_finger()) {
            let Some(pos) = hand.joint(joint) else {
                continue;
            };
            let mut distance = screen.distance_from_plane(pos);
            if Some(joint) == self.last_nearest {
                distance -= NEAREST_JOINT_BIAS_M;
            }
            if best.map_or(true, |(_, _, d)| distance < d) {
                best = Some((joint, pos, distance));
            }
        }

        let (joint, pos, _) = best?;
        if self.last_nearest != Some(joint) {
            trace!("nearest joint now {}", joint.as_str());
        }
        self.last_nearest = Some(joint);
        Some(pos)
    }
}

// ── Tests ──────────────────────────────────────────────────
