use bevy_ecs::{message::Messages, prelude::*};
use strum::{EnumCount, IntoEnumIterator};

use crate::engine::transform::Transform;

use super::{
    HandSide,
    overlay::PoseOverlayController,
    skeleton::{HandRig, HandSkeleton, SkeletonStore},
};

/// Systems that apply grab messages and re-anchor held hands. Hosts should order the systems
/// that track controllers (and so move [AttachPoint]s) before this set.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandPoseSystems;

/// The world-space transform a held hand is anchored to, usually the grip point on the held
/// object.
#[derive(Clone, Component, Debug, Default)]
pub struct AttachPoint {
    pub world: Transform,
}

/// A message sent by the interaction toolkit when a hand grabs or lets go of an object.
#[derive(Clone, Copy, Debug, Message, PartialEq)]
pub enum GrabEvent {
    /// A hand started holding an object. The skeleton and attach point are whatever the toolkit
    /// resolved from its interactor, which might be nothing.
    Selected {
        side: HandSide,
        skeleton: Option<Entity>,
        attach_point: Option<Entity>,
    },
    /// A hand let go.
    Released { side: HandSide },
}

/// The pose overlay state for the world, along with the attach point each held hand follows.
#[derive(Default, Resource)]
pub struct HandPoseOverlay {
    pub controller: PoseOverlayController<Entity>,
    attach_points: [Option<Entity>; HandSide::COUNT],
}

impl HandPoseOverlay {
    pub fn new(controller: PoseOverlayController<Entity>) -> Self {
        Self {
            controller,
            attach_points: [None, None],
        }
    }

    /// The attach point the hand on `side` follows, if it is holding something.
    #[inline]
    pub fn attach_point(&self, side: HandSide) -> Option<Entity> {
        self.attach_points[side.index()]
    }
}

/// Lets the overlay controller reach [HandRig] components through a query.
struct RigQuery<'a, 'w, 's, 'r>(&'a mut Query<'w, 's, &'r mut HandRig>);

impl SkeletonStore for RigQuery<'_, '_, '_, '_> {
    type Handle = Entity;

    fn skeleton_mut(&mut self, handle: Entity) -> Option<&mut dyn HandSkeleton> {
        self.0
            .get_mut(handle)
            .ok()
            .map(|rig| rig.into_inner() as &mut dyn HandSkeleton)
    }
}

pub fn setup_ecs(world: &mut World, schedule: &mut Schedule) {
    world.init_resource::<Messages<GrabEvent>>();
    world.init_resource::<HandPoseOverlay>();

    schedule.add_systems(
        (
            process_grab_events,
            reanchor_held_hands,
            update_grab_messages,
        )
            .chain()
            .in_set(HandPoseSystems),
    );
}

pub fn process_grab_events(
    mut grab_events: MessageReader<GrabEvent>,
    mut overlay: ResMut<HandPoseOverlay>,
    mut rigs: Query<&mut HandRig>,
    attach_points: Query<&AttachPoint>,
) {
    if grab_events.is_empty() {
        return;
    }

    let overlay = &mut *overlay;
    let mut rigs = RigQuery(&mut rigs);

    for event in grab_events.read() {
        match *event {
            GrabEvent::Selected {
                side,
                skeleton,
                attach_point,
            } => {
                let attach_transform = attach_point
                    .and_then(|entity| attach_points.get(entity).ok())
                    .map(|attach_point| attach_point.world);

                match overlay.controller.on_attach(
                    &mut rigs,
                    side,
                    skeleton,
                    attach_transform.as_ref(),
                ) {
                    Ok(_) => overlay.attach_points[side.index()] = attach_point,
                    Err(err) => {
                        tracing::warn!("Pose overlay not applied: {err}");
                        // A refused grab can still release a stale attachment.
                        if !overlay.controller.is_attached(side) {
                            overlay.attach_points[side.index()] = None;
                        }
                    }
                }
            }

            GrabEvent::Released { side } => {
                overlay.controller.on_detach(&mut rigs, side);
                overlay.attach_points[side.index()] = None;
            }
        }
    }
}

pub fn reanchor_held_hands(
    overlay: Res<HandPoseOverlay>,
    mut rigs: Query<&mut HandRig>,
    attach_points: Query<&AttachPoint>,
) {
    let mut rigs = RigQuery(&mut rigs);

    for side in HandSide::iter() {
        let Some(entity) = overlay.attach_point(side) else {
            continue;
        };

        let Ok(attach_point) = attach_points.get(entity) else {
            tracing::warn!("Attach point {entity} for the {side} hand no longer exists");
            continue;
        };

        overlay.controller.tick(&mut rigs, side, &attach_point.world);
    }
}

/// Grab messages are double buffered; they are dropped after two updates.
fn update_grab_messages(mut grab_events: ResMut<Messages<GrabEvent>>) {
    grab_events.update();
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;
    use crate::hand::{BoneRotation, HandSkeletonPose};

    const BONE_COUNT: usize = 3;
    const EPSILON: f32 = 1.0e-5;

    struct Scene {
        world: World,
        schedule: Schedule,
        hand: Entity,
        grip: Entity,
    }

    fn scene() -> Scene {
        let mut world = World::default();
        let mut schedule = Schedule::default();
        setup_ecs(&mut world, &mut schedule);

        let pose = (0..BONE_COUNT).fold(
            HandSkeletonPose::new("grip").with_root(Vec3::new(0.0, 0.0, 0.1), Quat::IDENTITY),
            |pose, i| pose.with_bone(BoneRotation::new(i, Quat::from_rotation_x(0.5)).unwrap()),
        );
        world
            .resource_mut::<HandPoseOverlay>()
            .controller
            .set_template(HandSide::Right, pose, BONE_COUNT)
            .unwrap();

        let hand = world
            .spawn(
                HandRig::new(HandSide::Right, BONE_COUNT)
                    .with_root(Transform::from_translation(Vec3::new(0.0, -0.05, 0.0))),
            )
            .id();
        let grip = world
            .spawn(AttachPoint {
                world: Transform::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            })
            .id();

        Scene {
            world,
            schedule,
            hand,
            grip,
        }
    }

    fn send(scene: &mut Scene, event: GrabEvent) {
        scene
            .world
            .resource_mut::<Messages<GrabEvent>>()
            .write(event);
    }

    fn grab(scene: &mut Scene) {
        let (hand, grip) = (scene.hand, scene.grip);
        send(
            scene,
            GrabEvent::Selected {
                side: HandSide::Right,
                skeleton: Some(hand),
                attach_point: Some(grip),
            },
        );
    }

    fn release(scene: &mut Scene) {
        send(
            scene,
            GrabEvent::Released {
                side: HandSide::Right,
            },
        );
    }

    fn rig(scene: &Scene) -> &HandRig {
        scene.world.get::<HandRig>(scene.hand).unwrap()
    }

    #[test]
    fn grab_hold_and_release() {
        let mut scene = scene();

        grab(&mut scene);
        scene.schedule.run(&mut scene.world);

        assert!(
            scene
                .world
                .resource::<HandPoseOverlay>()
                .controller
                .is_attached(HandSide::Right)
        );
        assert!(!rig(&scene).animation_enabled);
        assert!(
            rig(&scene)
                .root_world()
                .translation
                .abs_diff_eq(Vec3::new(1.0, 2.0, 3.1), EPSILON)
        );

        // Move the grip and update again.
        scene
            .world
            .get_mut::<AttachPoint>(scene.grip)
            .unwrap()
            .world
            .translation = Vec3::new(-1.0, 0.0, 0.0);
        scene.schedule.run(&mut scene.world);
        assert!(
            rig(&scene)
                .root_world()
                .translation
                .abs_diff_eq(Vec3::new(-1.0, 0.0, 0.1), EPSILON)
        );

        release(&mut scene);
        scene.schedule.run(&mut scene.world);

        let rig = rig(&scene);
        assert!(rig.animation_enabled);
        assert_eq!(
            rig.root,
            Transform::from_translation(Vec3::new(0.0, -0.05, 0.0))
        );
        assert!(rig.bones.iter().all(|bone| bone.rotation == Quat::IDENTITY));
        assert_eq!(
            scene
                .world
                .resource::<HandPoseOverlay>()
                .attach_point(HandSide::Right),
            None
        );
    }

    #[test]
    fn reanchor_runs_after_controller_tracking() {
        let mut scene = scene();

        let grip = scene.grip;
        scene.schedule.add_systems(
            (move |mut attach_points: Query<&mut AttachPoint>| {
                if let Ok(mut attach_point) = attach_points.get_mut(grip) {
                    attach_point.world.translation.x += 1.0;
                }
            })
            .before(HandPoseSystems),
        );

        grab(&mut scene);
        scene.schedule.run(&mut scene.world);

        // No lag: the hand follows the grip position of this frame.
        assert!(
            rig(&scene)
                .root_world()
                .translation
                .abs_diff_eq(Vec3::new(2.0, 2.0, 3.1), EPSILON)
        );

        scene.schedule.run(&mut scene.world);
        assert!(
            rig(&scene)
                .root_world()
                .translation
                .abs_diff_eq(Vec3::new(3.0, 2.0, 3.1), EPSILON)
        );
    }

    #[test]
    fn unresolved_grab_is_ignored() {
        let mut scene = scene();

        let grip = scene.grip;
        send(
            &mut scene,
            GrabEvent::Selected {
                side: HandSide::Right,
                skeleton: None,
                attach_point: Some(grip),
            },
        );
        scene.schedule.run(&mut scene.world);

        let overlay = scene.world.resource::<HandPoseOverlay>();
        assert_eq!(overlay.controller.attached_count(), 0);
        assert_eq!(overlay.attach_point(HandSide::Right), None);
        assert!(rig(&scene).animation_enabled);
    }

    #[test]
    fn grab_without_template_keeps_animation() {
        let mut scene = scene();
        let left_hand = scene
            .world
            .spawn(HandRig::new(HandSide::Left, BONE_COUNT))
            .id();
        let grip = scene.grip;

        send(
            &mut scene,
            GrabEvent::Selected {
                side: HandSide::Left,
                skeleton: Some(left_hand),
                attach_point: Some(grip),
            },
        );
        scene.schedule.run(&mut scene.world);

        assert!(scene.world.get::<HandRig>(left_hand).unwrap().animation_enabled);
        let overlay = scene.world.resource::<HandPoseOverlay>();
        assert!(!overlay.controller.is_attached(HandSide::Left));
        assert_eq!(overlay.attach_point(HandSide::Left), None);
    }

    #[test]
    fn grab_uses_the_side_of_the_hand_model() {
        let mut scene = scene();
        let left_pose = (0..BONE_COUNT).fold(HandSkeletonPose::new("left_grip"), |pose, i| {
            pose.with_bone(BoneRotation::new(i, Quat::from_rotation_x(0.9)).unwrap())
        });
        scene
            .world
            .resource_mut::<HandPoseOverlay>()
            .controller
            .set_template(HandSide::Left, left_pose, BONE_COUNT)
            .unwrap();

        // The toolkit reports the left hand, but the skeleton is a right hand model.
        let (hand, grip) = (scene.hand, scene.grip);
        send(
            &mut scene,
            GrabEvent::Selected {
                side: HandSide::Left,
                skeleton: Some(hand),
                attach_point: Some(grip),
            },
        );
        scene.schedule.run(&mut scene.world);

        let rig = rig(&scene);
        assert!(rig.animation_enabled);
        assert!(rig.bones.iter().all(|bone| bone.rotation == Quat::IDENTITY));
        let overlay = scene.world.resource::<HandPoseOverlay>();
        assert_eq!(overlay.controller.attached_count(), 0);
        assert_eq!(overlay.attach_point(HandSide::Left), None);
    }

    #[test]
    fn grab_messages_are_applied_once() {
        let mut scene = scene();

        grab(&mut scene);
        scene.schedule.run(&mut scene.world);
        release(&mut scene);
        for _ in 0..3 {
            scene.schedule.run(&mut scene.world);
        }

        let rig = rig(&scene);
        assert!(rig.animation_enabled);
        assert_eq!(
            rig.root,
            Transform::from_translation(Vec3::new(0.0, -0.05, 0.0))
        );
        assert!(
            !scene
                .world
                .resource::<HandPoseOverlay>()
                .controller
                .is_attached(HandSide::Right)
        );
    }

    #[test]
    fn release_without_grab_is_ignored() {
        let mut scene = scene();

        release(&mut scene);
        scene.schedule.run(&mut scene.world);

        let rig = rig(&scene);
        assert!(rig.animation_enabled);
        assert_eq!(
            rig.root,
            Transform::from_translation(Vec3::new(0.0, -0.05, 0.0))
        );
    }

    #[test]
    fn despawned_attach_point_stops_reanchoring() {
        let mut scene = scene();

        grab(&mut scene);
        scene.schedule.run(&mut scene.world);
        let held_root = rig(&scene).root;

        scene.world.despawn(scene.grip);
        scene.schedule.run(&mut scene.world);

        assert_eq!(rig(&scene).root, held_root);
        assert!(
            scene
                .world
                .resource::<HandPoseOverlay>()
                .controller
                .is_attached(HandSide::Right)
        );
    }
}
