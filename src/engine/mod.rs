pub mod storage;
pub mod transform;

pub mod prelude {
    pub use super::transform::*;
    pub use glam::{Quat, Vec3};
}
