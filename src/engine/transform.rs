use glam::{Quat, Vec3};

/// A translation followed by a rotation, relative to some parent space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Create a new transform from a translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation,
        }
    }

    /// Create a new transform from euler angles (radians) as a rotation.
    pub fn from_euler_rotation(rotation: Vec3) -> Self {
        Self::from_rotation(euler_to_quat(rotation))
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Transform a point from this transform's local space into its parent space.
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.translation + self.rotation * point
    }

    /// Compose `self` (parent) with `local` (child), returning the child in the parent's space.
    #[inline]
    pub fn mul_transform(&self, local: &Transform) -> Transform {
        Transform {
            translation: self.transform_point(local.translation),
            rotation: self.rotation * local.rotation,
        }
    }

    pub fn inverse(&self) -> Transform {
        let rotation = self.rotation.inverse();
        Transform {
            translation: rotation * -self.translation,
            rotation,
        }
    }
}

#[inline]
fn euler_to_quat(rotation: Vec3) -> Quat {
    Quat::from_euler(glam::EulerRot::XYZ, rotation.x, rotation.y, rotation.z)
}
