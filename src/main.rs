use std::path::PathBuf;

use bevy_ecs::{message::Messages, prelude::*};
use clap::Parser;
use hand_pose::{
    config::{ConfigError, HandPoseDefs},
    engine::prelude::*,
    hand::{
        HandRig, HandSide, PoseOverlayController,
        ecs::{AttachPoint, GrabEvent, HandPoseOverlay, HandPoseSystems, setup_ecs},
    },
};
use strum::IntoEnumIterator;
use tracing::{error, info, warn};

#[derive(clap::Parser)]
struct Opts {
    /// Path to the hand pose definitions file.
    path: PathBuf,

    /// Number of frames the object is held for.
    #[arg(long, default_value_t = 3)]
    frames: u32,

    /// Pose for the left hand. Uses the first left hand pose if not set.
    #[arg(long)]
    left: Option<String>,

    /// Pose for the right hand. Uses the first right hand pose if not set.
    #[arg(long)]
    right: Option<String>,
}

/// Where a hand grips the held object, relative to the object.
#[derive(Component)]
struct Grip {
    local: Transform,
}

#[derive(Default, Resource)]
struct FrameCount(u32);

/// Stands in for physics: the held object drifts forward and turns a little every frame.
fn move_held_object(
    mut frame_count: ResMut<FrameCount>,
    mut grips: Query<(&Grip, &mut AttachPoint)>,
) {
    let frame = frame_count.0 as f32;
    let object = Transform::from_translation(Vec3::new(0.0, 1.0, 0.3 + 0.05 * frame))
        .with_rotation(Quat::from_rotation_y((10.0 * frame).to_radians()));

    for (grip, mut attach_point) in grips.iter_mut() {
        attach_point.world = object.mul_transform(&grip.local);
    }

    frame_count.0 += 1;
}

fn log_hands(world: &mut World, label: &str) {
    let mut rigs = world.query::<&HandRig>();
    for rig in rigs.iter(world) {
        let root_world = rig.root_world();
        info!(
            "{label}: {} hand root at {:.3} (animation {})",
            rig.side,
            root_world.translation,
            if rig.animation_enabled { "on" } else { "off" },
        );
    }
}

fn run(opts: Opts) -> Result<(), ConfigError> {
    let defs = HandPoseDefs::load(&opts.path)?;

    let mut controller = PoseOverlayController::<Entity>::default();
    for side in HandSide::iter() {
        let name = match side {
            HandSide::Left => opts.left.as_deref(),
            HandSide::Right => opts.right.as_deref(),
        };
        if let Err(err) = defs.configure(&mut controller, side, name) {
            warn!("No pose overlay for the {side} hand: {err}");
        }
    }

    let mut world = World::default();
    let mut schedule = Schedule::default();
    setup_ecs(&mut world, &mut schedule);
    world.insert_resource(HandPoseOverlay::new(controller));
    world.init_resource::<FrameCount>();
    schedule.add_systems(move_held_object.before(HandPoseSystems));

    let mut grabs = Vec::new();
    for side in HandSide::iter() {
        let x = match side {
            HandSide::Left => -0.2,
            HandSide::Right => 0.2,
        };

        let hand = world
            .spawn(
                HandRig::new(side, defs.rig_bone_count)
                    .with_parent_world(Transform::from_translation(Vec3::new(x, 1.0, 0.0)))
                    .with_root(Transform::from_translation(Vec3::new(0.0, -0.03, 0.05))),
            )
            .id();

        let grip = world
            .spawn((
                Grip {
                    local: Transform::from_translation(Vec3::new(x * 0.25, 0.0, 0.0)),
                },
                AttachPoint::default(),
            ))
            .id();

        grabs.push(GrabEvent::Selected {
            side,
            skeleton: Some(hand),
            attach_point: Some(grip),
        });
    }

    log_hands(&mut world, "before grab");

    for grab in grabs {
        world.resource_mut::<Messages<GrabEvent>>().write(grab);
    }

    for frame in 0..opts.frames {
        schedule.run(&mut world);
        log_hands(&mut world, &format!("frame {frame}"));
    }

    for side in HandSide::iter() {
        world
            .resource_mut::<Messages<GrabEvent>>()
            .write(GrabEvent::Released { side });
    }
    schedule.run(&mut world);

    log_hands(&mut world, "after release");

    Ok(())
}

fn main() {
    tracing_subscriber::fmt().init();

    let opts = Opts::parse();

    if let Err(err) = run(opts) {
        error!("{err}");
        std::process::exit(1);
    }
}
