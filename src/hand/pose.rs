use glam::{Quat, Vec3};

use crate::engine::transform::Transform;

use super::{BoneIndex, BoneRotation, skeleton::HandSkeleton};

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum PoseError {
    #[error("Pose \"{name}\" has {actual} bones, the rig has {expected}")]
    BoneCountMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Pose \"{name}\" references bone {bone_index}, the rig has {bone_count} bones")]
    BoneOutOfRange {
        name: String,
        bone_index: BoneIndex,
        bone_count: usize,
    },

    #[error("Pose \"{name}\" sets bone {bone_index} more than once")]
    DuplicateBone { name: String, bone_index: BoneIndex },

    #[error("Pose \"{name}\" has a degenerate root rotation")]
    DegenerateRootRotation { name: String },
}

/// A static hand pose that is overlaid on a skeleton while it holds an object.
#[derive(Clone, Debug, PartialEq)]
pub struct HandSkeletonPose {
    pub name: String,
    /// Offset of the skeleton root in the attach point's local frame.
    pub root_local_position: Vec3,
    pub root_local_rotation: Quat,
    pub bone_rotations: Vec<BoneRotation>,
}

impl HandSkeletonPose {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root_local_position: Vec3::ZERO,
            root_local_rotation: Quat::IDENTITY,
            bone_rotations: Vec::new(),
        }
    }

    pub fn with_root(mut self, position: Vec3, rotation: Quat) -> Self {
        self.root_local_position = position;
        self.root_local_rotation = rotation;
        self
    }

    pub fn with_bone(mut self, bone_rotation: BoneRotation) -> Self {
        self.bone_rotations.push(bone_rotation);
        self
    }

    /// The root offset relative to the attach point.
    #[inline]
    pub fn root_offset(&self) -> Transform {
        Transform::new(self.root_local_position, self.root_local_rotation)
    }

    /// Check the pose against a rig with `rig_bone_count` bones. Every bone must be set exactly
    /// once.
    pub fn validate(&self, rig_bone_count: usize) -> Result<(), PoseError> {
        if !self.root_local_rotation.is_finite()
            || self.root_local_rotation.length() <= f32::EPSILON
        {
            return Err(PoseError::DegenerateRootRotation {
                name: self.name.clone(),
            });
        }

        let mut seen = vec![false; rig_bone_count];
        for bone_rotation in self.bone_rotations.iter() {
            let bone_index = bone_rotation.bone_index();
            let Some(slot) = seen.get_mut(bone_index) else {
                return Err(PoseError::BoneOutOfRange {
                    name: self.name.clone(),
                    bone_index,
                    bone_count: rig_bone_count,
                });
            };

            if *slot {
                return Err(PoseError::DuplicateBone {
                    name: self.name.clone(),
                    bone_index,
                });
            }
            *slot = true;
        }

        if self.bone_rotations.len() != rig_bone_count {
            return Err(PoseError::BoneCountMismatch {
                name: self.name.clone(),
                expected: rig_bone_count,
                actual: self.bone_rotations.len(),
            });
        }

        Ok(())
    }

    /// Write the pose's bone rotations onto `skeleton`, matching bones by index. Bones the pose does
    /// not mention keep their rotation. Returns the number of bones written.
    pub fn apply_bones(&self, skeleton: &mut dyn HandSkeleton) -> usize {
        let bone_count = skeleton.bone_count();

        let mut written = 0;
        for bone_rotation in self.bone_rotations.iter() {
            if bone_rotation.bone_index() >= bone_count {
                tracing::debug!(
                    "Pose \"{}\" skipping bone {} (skeleton has {} bones)",
                    self.name,
                    bone_rotation.bone_index(),
                    bone_count,
                );
                continue;
            }

            skeleton.set_bone_rotation(bone_rotation.bone_index(), bone_rotation.local_rotation());
            written += 1;
        }

        written
    }
}
