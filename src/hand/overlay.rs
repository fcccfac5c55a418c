use glam::Quat;
use strum::EnumCount;

use crate::engine::transform::Transform;

use super::{
    HandSide,
    pose::{HandSkeletonPose, PoseError},
    skeleton::SkeletonStore,
};

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum OverlayError {
    #[error("No pose template configured for the {0} hand")]
    MissingTemplate(HandSide),

    #[error("Invalid skeleton reference for the {side} hand ({reason})")]
    InvalidSkeletonReference {
        side: HandSide,
        reason: &'static str,
    },
}

/// What happened to the slot of a hand side when a skeleton was attached to it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AttachOutcome<H> {
    /// The slot was empty.
    Attached,
    /// The slot still held an attachment whose release was never reported. It was released before
    /// the new skeleton was attached.
    ReplacedStale { previous: H },
}

/// Runtime state for a hand that is currently holding an object.
#[derive(Clone, Debug, PartialEq)]
pub struct AttachedSkeleton<H> {
    pub skeleton: H,
    /// Mirrors the skeleton's animation playback flag. Always false while attached.
    pub animation_enabled: bool,
    /// Root local transform from just before the pose was applied.
    pub baseline: Transform,
    /// Root offset from the attach point, taken from the template.
    pub root_offset: Transform,
    pub bone_count: usize,
}

/// Overlays static pose templates on hand skeletons while they hold an object and restores them
/// when they let go.
///
/// Each [HandSide] has one template slot and one attachment slot. A side cycles between detached
/// and attached through [Self::on_attach] and [Self::on_detach]; [Self::tick] re-anchors attached
/// skeletons to their attach points once per frame.
pub struct PoseOverlayController<H> {
    templates: [Option<HandSkeletonPose>; HandSide::COUNT],
    attached: [Option<AttachedSkeleton<H>>; HandSide::COUNT],
}

impl<H> Default for PoseOverlayController<H> {
    fn default() -> Self {
        Self {
            templates: Default::default(),
            attached: [None, None],
        }
    }
}

impl<H: Copy + Eq + std::fmt::Debug> PoseOverlayController<H> {
    /// Install the pose template for `side`, validated against a rig with `rig_bone_count` bones.
    /// An invalid template leaves the side without one, so no overlay is applied until it is
    /// corrected.
    pub fn set_template(
        &mut self,
        side: HandSide,
        mut template: HandSkeletonPose,
        rig_bone_count: usize,
    ) -> Result<(), PoseError> {
        let slot = &mut self.templates[side.index()];

        if let Err(err) = template.validate(rig_bone_count) {
            tracing::warn!("Disabling pose overlay for the {side} hand: {err}");
            *slot = None;
            return Err(err);
        }

        // The root rotation is written straight into the skeleton on every tick.
        template.root_local_rotation = template.root_local_rotation.normalize();

        tracing::debug!("Using pose \"{}\" for the {side} hand", template.name);
        *slot = Some(template);

        Ok(())
    }

    pub fn clear_template(&mut self, side: HandSide) -> Option<HandSkeletonPose> {
        self.templates[side.index()].take()
    }

    #[inline]
    pub fn template(&self, side: HandSide) -> Option<&HandSkeletonPose> {
        self.templates[side.index()].as_ref()
    }

    #[inline]
    pub fn attached(&self, side: HandSide) -> Option<&AttachedSkeleton<H>> {
        self.attached[side.index()].as_ref()
    }

    #[inline]
    pub fn is_attached(&self, side: HandSide) -> bool {
        self.attached[side.index()].is_some()
    }

    pub fn attached_count(&self) -> usize {
        self.attached.iter().filter(|slot| slot.is_some()).count()
    }

    /// A hand started holding the object.
    ///
    /// Stops animation playback on `skeleton`, remembers its root transform and overlays the
    /// side's template bone rotations. Nothing changes if the references are invalid, including a
    /// skeleton of the other hand. A stale attachment on `side` is released first, even when the
    /// side has no template and the grab is refused.
    pub fn on_attach<S>(
        &mut self,
        skeletons: &mut S,
        side: HandSide,
        skeleton: Option<H>,
        attach_point: Option<&Transform>,
    ) -> Result<AttachOutcome<H>, OverlayError>
    where
        S: SkeletonStore<Handle = H>,
    {
        let Some(handle) = skeleton else {
            return Err(OverlayError::InvalidSkeletonReference {
                side,
                reason: "no skeleton",
            });
        };

        if attach_point.is_none() {
            return Err(OverlayError::InvalidSkeletonReference {
                side,
                reason: "no attach point",
            });
        }

        match skeletons.skeleton_mut(handle) {
            None => {
                return Err(OverlayError::InvalidSkeletonReference {
                    side,
                    reason: "skeleton does not exist",
                });
            }
            Some(target) if target.side() != side => {
                return Err(OverlayError::InvalidSkeletonReference {
                    side,
                    reason: "skeleton belongs to the other hand",
                });
            }
            Some(_) => {}
        }

        // A release that was never reported is undone even if this grab is refused below.
        let outcome = match self.release(skeletons, side) {
            Some(previous) => {
                tracing::warn!(
                    "The {side} hand attached {handle:?} while still holding {previous:?}, released the stale attachment"
                );
                AttachOutcome::ReplacedStale { previous }
            }
            None => AttachOutcome::Attached,
        };

        let Some(template) = self.templates[side.index()].as_ref() else {
            tracing::warn!("Grab with the {side} hand has no pose template, keeping animation");
            return Err(OverlayError::MissingTemplate(side));
        };

        let Some(target) = skeletons.skeleton_mut(handle) else {
            return Err(OverlayError::InvalidSkeletonReference {
                side,
                reason: "skeleton does not exist",
            });
        };

        target.set_animation_enabled(false);

        // Must be taken before anything from the template is written.
        let baseline = target.root_local();

        let written = template.apply_bones(target);
        let bone_count = target.bone_count();

        tracing::info!(
            "The {side} hand attached {handle:?} with pose \"{}\" ({written}/{bone_count} bones)",
            template.name
        );

        self.attached[side.index()] = Some(AttachedSkeleton {
            skeleton: handle,
            animation_enabled: false,
            baseline,
            root_offset: template.root_offset(),
            bone_count,
        });

        Ok(outcome)
    }

    /// Move the root of the skeleton attached to `side` to `attach_point`, offset by the template
    /// root. `attach_point` must already be updated for the current frame.
    pub fn tick<S>(&self, skeletons: &mut S, side: HandSide, attach_point: &Transform)
    where
        S: SkeletonStore<Handle = H>,
    {
        let Some(attached) = self.attached[side.index()].as_ref() else {
            return;
        };

        let Some(skeleton) = skeletons.skeleton_mut(attached.skeleton) else {
            tracing::warn!(
                "Skeleton {:?} held by the {side} hand no longer exists",
                attached.skeleton
            );
            return;
        };

        skeleton.set_root_world(attach_point.mul_transform(&attached.root_offset));
    }

    /// A hand let go of the object. Restores the skeleton attached to `side` and returns its
    /// handle, if there was one.
    pub fn on_detach<S>(&mut self, skeletons: &mut S, side: HandSide) -> Option<H>
    where
        S: SkeletonStore<Handle = H>,
    {
        let released = self.release(skeletons, side);
        if let Some(handle) = released {
            tracing::info!("The {side} hand released {handle:?}");
        }
        released
    }

    fn release<S>(&mut self, skeletons: &mut S, side: HandSide) -> Option<H>
    where
        S: SkeletonStore<Handle = H>,
    {
        let attached = self.attached[side.index()].take()?;

        let Some(skeleton) = skeletons.skeleton_mut(attached.skeleton) else {
            tracing::warn!(
                "Skeleton {:?} held by the {side} hand no longer exists, nothing to restore",
                attached.skeleton
            );
            return Some(attached.skeleton);
        };

        skeleton.set_animation_enabled(true);
        skeleton.set_root_local(attached.baseline);

        // Back to the rest pose; animation playback takes over from there.
        for bone_index in 0..skeleton.bone_count() {
            skeleton.set_bone_rotation(bone_index, Quat::IDENTITY);
        }

        Some(attached.skeleton)
    }
}
