use std::{path::Path, str::FromStr};

use ahash::HashMap;
use glam::{Quat, Vec3};
use strum::EnumCount;

use crate::{
    engine::transform::Transform,
    hand::{BoneIndex, BoneRotation, HandSide, HandSkeletonPose, PoseOverlayController},
};

use super::{
    ConfigError,
    parser::{ConfigLine, ConfigLines},
};

/// Pose templates for both hands, along with the bone count of the rig they were authored for.
///
/// ```text
/// RIG_BONE_COUNT 15
///
/// HAND_POSE right mug_grip
/// ROOT_POSITION 0.0 -0.02 0.1
/// ROOT_ROTATION 0.0 90.0 0.0    ; Euler XYZ in degrees.
/// BONE 0 10.0 0.0 0.0           ; Bone index followed by Euler XYZ in degrees.
/// END_HAND_POSE
/// ```
#[derive(Debug, Default)]
pub struct HandPoseDefs {
    pub rig_bone_count: usize,
    poses: [Vec<HandSkeletonPose>; HandSide::COUNT],
    by_name: HashMap<(HandSide, String), usize>,
}

impl HandPoseDefs {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!("Loading hand poses: {}", path.display());

        Self::try_from(ConfigLines::parse(&data))
    }

    /// All poses for `side` in the order they were defined.
    pub fn poses(&self, side: HandSide) -> &[HandSkeletonPose] {
        &self.poses[side.index()]
    }

    /// Look up a pose by name, or the first pose defined for `side` if no name is given.
    pub fn find(&self, side: HandSide, name: Option<&str>) -> Option<&HandSkeletonPose> {
        let poses = &self.poses[side.index()];
        match name {
            Some(name) => self
                .by_name
                .get(&(side, name.to_string()))
                .map(|&index| &poses[index]),
            None => poses.first(),
        }
    }

    /// Install the selected pose for `side` into the controller.
    pub fn configure<H>(
        &self,
        controller: &mut PoseOverlayController<H>,
        side: HandSide,
        name: Option<&str>,
    ) -> Result<(), ConfigError>
    where
        H: Copy + Eq + std::fmt::Debug,
    {
        let Some(pose) = self.find(side, name) else {
            return Err(ConfigError::UnknownPose {
                side,
                name: name.unwrap_or("<any>").to_string(),
            });
        };

        controller.set_template(side, pose.clone(), self.rig_bone_count)?;

        Ok(())
    }

    fn insert(&mut self, side: HandSide, pose: HandSkeletonPose) -> Result<(), ConfigError> {
        let key = (side, pose.name.clone());
        if self.by_name.contains_key(&key) {
            return Err(ConfigError::DuplicatePose {
                side,
                name: pose.name,
            });
        }

        let poses = &mut self.poses[side.index()];
        self.by_name.insert(key, poses.len());
        poses.push(pose);

        Ok(())
    }
}

fn missing(line: &ConfigLine, index: usize) -> ConfigError {
    ConfigError::MissingParam {
        line: line.line_number,
        key: line.key.clone(),
        index,
    }
}

fn vec3(line: &ConfigLine, first: usize) -> Result<Vec3, ConfigError> {
    let component = |i: usize| line.float(first + i).ok_or_else(|| missing(line, first + i));
    Ok(Vec3::new(component(0)?, component(1)?, component(2)?))
}

fn euler_degrees(line: &ConfigLine, first: usize) -> Result<Quat, ConfigError> {
    let degrees = vec3(line, first)?;
    let radians = Vec3::new(
        degrees.x.to_radians(),
        degrees.y.to_radians(),
        degrees.z.to_radians(),
    );
    Ok(Transform::from_euler_rotation(radians).rotation)
}

fn outside_pose(line: &ConfigLine) -> ConfigError {
    ConfigError::OutsidePose {
        line: line.line_number,
        key: line.key.clone(),
    }
}

impl TryFrom<ConfigLines> for HandPoseDefs {
    type Error = ConfigError;

    fn try_from(value: ConfigLines) -> Result<Self, Self::Error> {
        enum State {
            None,
            Pose(HandSide, HandSkeletonPose),
        }
        let mut state = State::None;

        let mut defs = HandPoseDefs::default();
        let mut rig_bone_count = None;

        for line in value.into_iter() {
            match line.key.as_str() {
                "RIG_BONE_COUNT" => {
                    let count = line.number(0).ok_or_else(|| missing(&line, 0))?;
                    rig_bone_count = Some(usize::try_from(count).map_err(|_| {
                        ConfigError::InvalidValue {
                            line: line.line_number,
                            message: format!("bone count can not be {count}"),
                        }
                    })?);
                }

                "HAND_POSE" => match state {
                    State::None => {
                        let side_name = line.string(0).ok_or_else(|| missing(&line, 0))?;
                        let side = HandSide::from_str(side_name).map_err(|_| {
                            ConfigError::InvalidValue {
                                line: line.line_number,
                                message: format!("\"{side_name}\" is not a hand side"),
                            }
                        })?;
                        let name = line.string(1).ok_or_else(|| missing(&line, 1))?;
                        state = State::Pose(side, HandSkeletonPose::new(name));
                    }
                    State::Pose(_, ref pose) => {
                        return Err(ConfigError::NestedPose {
                            line: line.line_number,
                            name: pose.name.clone(),
                        });
                    }
                },

                "ROOT_POSITION" => match state {
                    State::None => return Err(outside_pose(&line)),
                    State::Pose(_, ref mut pose) => {
                        pose.root_local_position = vec3(&line, 0)?;
                    }
                },

                "ROOT_ROTATION" => match state {
                    State::None => return Err(outside_pose(&line)),
                    State::Pose(_, ref mut pose) => {
                        pose.root_local_rotation = euler_degrees(&line, 0)?;
                    }
                },

                "BONE" => match state {
                    State::None => return Err(outside_pose(&line)),
                    State::Pose(_, ref mut pose) => {
                        let index = line.number(0).ok_or_else(|| missing(&line, 0))?;
                        let bone_index = BoneIndex::try_from(index).map_err(|_| {
                            ConfigError::InvalidValue {
                                line: line.line_number,
                                message: format!("bone index can not be {index}"),
                            }
                        })?;
                        let rotation = euler_degrees(&line, 1)?;
                        let bone_rotation = BoneRotation::new(bone_index, rotation).ok_or_else(
                            || ConfigError::InvalidValue {
                                line: line.line_number,
                                message: format!("bone {bone_index} has an invalid rotation"),
                            },
                        )?;
                        pose.bone_rotations.push(bone_rotation);
                    }
                },

                "END_HAND_POSE" => match std::mem::replace(&mut state, State::None) {
                    State::None => return Err(outside_pose(&line)),
                    State::Pose(side, pose) => defs.insert(side, pose)?,
                },

                _ => {
                    tracing::warn!(
                        "Unknown hand pose key {} on line {}",
                        line.key,
                        line.line_number
                    );
                }
            }
        }

        if let State::Pose(_, pose) = state {
            return Err(ConfigError::UnterminatedPose { name: pose.name });
        }

        defs.rig_bone_count = rig_bone_count.ok_or(ConfigError::MissingBoneCount)?;

        Ok(defs)
    }
}
