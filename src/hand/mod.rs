use glam::Quat;
use strum::{Display, EnumCount, EnumIter, EnumString};

pub mod ecs;
pub mod overlay;
pub mod pose;
pub mod skeleton;

pub use overlay::{AttachOutcome, AttachedSkeleton, OverlayError, PoseOverlayController};
pub use pose::{HandSkeletonPose, PoseError};
pub use skeleton::{HandRig, HandSkeleton, SkeletonStore};

pub type BoneIndex = usize;

#[derive(
    Clone, Copy, Debug, Display, EnumCount, EnumIter, EnumString, Eq, Hash, PartialEq,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[repr(usize)]
pub enum HandSide {
    Left = 0,
    Right = 1,
}

impl HandSide {
    /// Index into per-side tables.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// The target local rotation for a single bone of a hand rig.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneRotation {
    bone_index: BoneIndex,
    local_rotation: Quat,
}

impl BoneRotation {
    /// Create a new bone rotation. The rotation is normalized; rotations that can not be
    /// normalized (zero length, NaN or infinite components) are rejected.
    pub fn new(bone_index: BoneIndex, local_rotation: Quat) -> Option<Self> {
        let length = local_rotation.length();
        if !length.is_finite() || length <= f32::EPSILON {
            return None;
        }

        Some(Self {
            bone_index,
            local_rotation: local_rotation / length,
        })
    }

    #[inline]
    pub fn bone_index(&self) -> BoneIndex {
        self.bone_index
    }

    #[inline]
    pub fn local_rotation(&self) -> Quat {
        self.local_rotation
    }
}
