use bevy_ecs::prelude::*;
use glam::Quat;

use crate::engine::{
    storage::{Handle, Storage},
    transform::Transform,
};

use super::{BoneIndex, HandSide};

/// The view of a live, articulated hand model that pose overlays read and write.
///
/// Implementors own the object graph. Overlays only toggle animation playback, move the root and
/// rotate bones.
pub trait HandSkeleton {
    /// Which hand the model belongs to.
    fn side(&self) -> HandSide;

    /// Whether the animation playback system is driving this skeleton.
    fn animation_enabled(&self) -> bool;
    fn set_animation_enabled(&mut self, enabled: bool);

    /// Root transform relative to its parent.
    fn root_local(&self) -> Transform;
    fn set_root_local(&mut self, local: Transform);

    /// Place the root in world space.
    fn set_root_world(&mut self, world: Transform);

    /// Number of bones in the rig. Fixed for the lifetime of the skeleton.
    fn bone_count(&self) -> usize;
    fn bone_rotation(&self, bone_index: BoneIndex) -> Option<Quat>;
    /// Set the local rotation of a bone. Out of range indices are ignored.
    fn set_bone_rotation(&mut self, bone_index: BoneIndex, rotation: Quat);
}

/// Resolves handles to skeletons that are owned elsewhere.
pub trait SkeletonStore {
    type Handle: Copy + Eq + std::fmt::Debug;

    fn skeleton_mut(&mut self, handle: Self::Handle) -> Option<&mut dyn HandSkeleton>;
}

impl<T: HandSkeleton> SkeletonStore for Storage<T> {
    type Handle = Handle<T>;

    fn skeleton_mut(&mut self, handle: Self::Handle) -> Option<&mut dyn HandSkeleton> {
        self.get_mut(handle).map(|skeleton| skeleton as &mut dyn HandSkeleton)
    }
}

/// An in-memory hand model: a root hanging under a tracked parent (usually the controller) and a
/// flat list of finger bones.
#[derive(Clone, Component, Debug)]
pub struct HandRig {
    pub side: HandSide,
    /// World transform of the root's parent.
    pub parent_world: Transform,
    pub root: Transform,
    pub bones: Vec<Transform>,
    pub animation_enabled: bool,
}

impl HandRig {
    /// Create a rig at rest: identity root and bones, animation playing.
    pub fn new(side: HandSide, bone_count: usize) -> Self {
        Self {
            side,
            parent_world: Transform::IDENTITY,
            root: Transform::IDENTITY,
            bones: vec![Transform::IDENTITY; bone_count],
            animation_enabled: true,
        }
    }

    pub fn with_root(mut self, root: Transform) -> Self {
        self.root = root;
        self
    }

    pub fn with_parent_world(mut self, parent_world: Transform) -> Self {
        self.parent_world = parent_world;
        self
    }

    /// World transform of the root.
    pub fn root_world(&self) -> Transform {
        self.parent_world.mul_transform(&self.root)
    }
}

impl HandSkeleton for HandRig {
    fn side(&self) -> HandSide {
        self.side
    }

    fn animation_enabled(&self) -> bool {
        self.animation_enabled
    }

    fn set_animation_enabled(&mut self, enabled: bool) {
        self.animation_enabled = enabled;
    }

    fn root_local(&self) -> Transform {
        self.root
    }

    fn set_root_local(&mut self, local: Transform) {
        self.root = local;
    }

    fn set_root_world(&mut self, world: Transform) {
        self.root = self.parent_world.inverse().mul_transform(&world);
    }

    fn bone_count(&self) -> usize {
        self.bones.len()
    }

    fn bone_rotation(&self, bone_index: BoneIndex) -> Option<Quat> {
        self.bones.get(bone_index).map(|bone| bone.rotation)
    }

    fn set_bone_rotation(&mut self, bone_index: BoneIndex, rotation: Quat) {
        if let Some(bone) = self.bones.get_mut(bone_index) {
            bone.rotation = rotation;
        }
    }
}
