use std::path::PathBuf;

use crate::hand::{HandSide, PoseError};

mod hand_poses;
pub mod parser;

pub use hand_poses::*;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Line {line}: {key} is missing parameter {index}")]
    MissingParam {
        line: usize,
        key: String,
        index: usize,
    },

    #[error("Line {line}: {message}")]
    InvalidValue { line: usize, message: String },

    #[error("Line {line}: {key} is only allowed inside HAND_POSE")]
    OutsidePose { line: usize, key: String },

    #[error("Line {line}: HAND_POSE inside hand pose \"{name}\"")]
    NestedPose { line: usize, name: String },

    #[error("Hand pose \"{name}\" is missing END_HAND_POSE")]
    UnterminatedPose { name: String },

    #[error("Hand pose \"{name}\" is defined more than once for the {side} hand")]
    DuplicatePose { side: HandSide, name: String },

    #[error("RIG_BONE_COUNT is missing")]
    MissingBoneCount,

    #[error("No hand pose \"{name}\" for the {side} hand")]
    UnknownPose { side: HandSide, name: String },

    #[error("{0}")]
    Pose(#[from] PoseError),
}
