//! Host scene graph: the bones a chain reads and writes.
//!
//! The solver never owns bones. It talks to the host through [`SceneGraph`],
//! reading world poses and parent links and writing world poses back for the
//! bones inside its own chain window. [`Skeleton`] is a plain arena
//! implementation used by tests, the bundled rigs and the wasm surface.

pub mod id;
pub mod rig;
pub mod skeleton;

pub use id::*;
pub use rig::*;
pub use skeleton::*;

use glam::{Quat, Vec3};

use crate::constraint::JointConstraint;

/// What the solver needs from the host scene graph.
///
/// Position and rotation accessors may panic when given a bone the graph does
/// not contain; chains validate their bones with [`SceneGraph::contains`] once
/// at construction and only ever pass those ids back.
pub trait SceneGraph {
    /// True if the bone exists in this graph
    fn contains(&self, bone: BoneId) -> bool;

    /// Parent link, `None` for a top-level bone
    fn parent(&self, bone: BoneId) -> Option<BoneId>;

    fn world_position(&self, bone: BoneId) -> Vec3;

    fn world_rotation(&self, bone: BoneId) -> Quat;

    fn set_world_pose(&mut self, bone: BoneId, position: Vec3, rotation: Quat);

    /// Joint constraint attached to the bone, if any
    fn joint_constraint(&self, _bone: BoneId) -> Option<JointConstraint> {
        None
    }

    /// Human-readable name for diagnostics
    fn bone_name(&self, _bone: BoneId) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_defaults() {
        struct Bare;
        impl SceneGraph for Bare {
            fn contains(&self, bone: BoneId) -> bool {
                bone.index() == 0
            }
            fn parent(&self, _bone: BoneId) -> Option<BoneId> {
                None
            }
            fn world_position(&self, _bone: BoneId) -> Vec3 {
                Vec3::ZERO
            }
            fn world_rotation(&self, _bone: BoneId) -> Quat {
                Quat::IDENTITY
            }
            fn set_world_pose(&mut self, _bone: BoneId, _position: Vec3, _rotation: Quat) {}
        }

        let graph = Bare;
        assert!(graph.contains(BoneId(0)));
        assert!(graph.joint_constraint(BoneId(0)).is_none());
        assert!(graph.bone_name(BoneId(0)).is_none());
    }
}
