//! Chain construction: ancestor window and rest-pose geometry.
//!
//! A chain is captured once from the host. The ancestor walk happens here and
//! only here; afterwards the solver works from the stored, validated bone list
//! and never follows parent links again.

use glam::{Quat, Vec3};

use crate::bone::{BoneId, SceneGraph};
use crate::error::IkError;

/// Pose of the chain root, used to express everything root-relative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootFrame {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for RootFrame {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl RootFrame {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation: rotation.normalize(),
        }
    }

    /// Read the root's current world pose from the host
    pub fn sample<H: SceneGraph + ?Sized>(host: &H, root: BoneId) -> Self {
        Self::new(host.world_position(root), host.world_rotation(root))
    }

    #[inline]
    pub fn to_local(&self, world: Vec3) -> Vec3 {
        self.rotation.inverse() * (world - self.position)
    }

    #[inline]
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.rotation * local + self.position
    }

    #[inline]
    pub fn rotation_to_local(&self, world: Quat) -> Quat {
        self.rotation.inverse() * world
    }

    #[inline]
    pub fn rotation_to_world(&self, local: Quat) -> Quat {
        self.rotation * local
    }
}

/// Bones of a chain plus the rest geometry captured at construction.
///
/// Index 0 is the bone next to the root, the last index is the effector.
/// Rest directions and rotations are relative to the root's orientation at
/// capture time and never change afterwards.
#[derive(Debug, Clone)]
pub struct ChainGeometry {
    bones: Vec<BoneId>,
    root: BoneId,
    rest_directions: Vec<Vec3>,
    rest_rotations: Vec<Quat>,
    segment_lengths: Vec<f32>,
    total_length: f32,
}

impl ChainGeometry {
    /// Walk `chain_length` parent links up from `effector` and capture the
    /// rest pose. Nothing in the host is moved.
    pub fn capture<H: SceneGraph + ?Sized>(
        host: &H,
        effector: BoneId,
        chain_length: usize,
    ) -> Result<Self, IkError> {
        if chain_length == 0 {
            return Err(IkError::InvalidChainLength);
        }
        if !host.contains(effector) {
            return Err(IkError::UnknownBone(effector));
        }

        let mut bones = vec![effector; chain_length];
        let mut current = effector;
        for depth in 0..chain_length {
            bones[chain_length - 1 - depth] = current;
            current = match host.parent(current) {
                Some(parent) if host.contains(parent) => parent,
                _ => {
                    return Err(IkError::InsufficientAncestors {
                        requested: chain_length,
                        found: depth,
                    })
                }
            };
        }
        let root = current;

        let frame = RootFrame::sample(host, root);
        let local_positions: Vec<Vec3> = bones
            .iter()
            .map(|&bone| frame.to_local(host.world_position(bone)))
            .collect();

        let rest_rotations: Vec<Quat> = bones
            .iter()
            .map(|&bone| (host.world_rotation(bone).normalize().inverse() * frame.rotation).normalize())
            .collect();

        // The effector has no child; its slot carries no direction
        let rest_directions: Vec<Vec3> = (0..chain_length)
            .map(|i| {
                local_positions
                    .get(i + 1)
                    .map_or(Vec3::ZERO, |next| *next - local_positions[i])
            })
            .collect();

        let segment_lengths: Vec<f32> = rest_directions[..chain_length - 1]
            .iter()
            .map(|d| d.length())
            .collect();
        let total_length = segment_lengths.iter().sum();

        log::debug!(
            "Captured chain of {} bones under {} (total length {:.3})",
            chain_length,
            root,
            total_length
        );

        Ok(Self {
            bones,
            root,
            rest_directions,
            rest_rotations,
            segment_lengths,
            total_length,
        })
    }

    pub fn bones(&self) -> &[BoneId] {
        &self.bones
    }

    pub fn root(&self) -> BoneId {
        self.root
    }

    pub fn effector(&self) -> BoneId {
        self.bones[self.bones.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Root-relative vectors from each bone to its child (zero for the effector)
    pub fn rest_directions(&self) -> &[Vec3] {
        &self.rest_directions
    }

    /// Rotation taking each bone's rest orientation onto the root's orientation
    pub fn rest_rotations(&self) -> &[Quat] {
        &self.rest_rotations
    }

    /// Root-relative rest orientation of bone `i`
    pub fn rest_orientation(&self, i: usize) -> Quat {
        self.rest_rotations[i].inverse()
    }

    /// Distance between consecutive rest positions, one fewer than bones
    pub fn segment_lengths(&self) -> &[f32] {
        &self.segment_lengths
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bone::Skeleton;

    const TOL: f32 = 1e-5;

    fn line(points: &[Vec3]) -> (Skeleton, Vec<BoneId>) {
        Skeleton::from_points("line", points)
    }

    #[test]
    fn test_capture_lengths() {
        let (skeleton, ids) = line(&[
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(1.0, 2.0, 3.0),
        ]);
        let chain = ChainGeometry::capture(&skeleton, ids[4], 4).unwrap();

        assert_eq!(chain.bones(), &ids[1..]);
        assert_eq!(chain.root(), ids[0]);
        assert_eq!(chain.effector(), ids[4]);
        assert_eq!(chain.segment_lengths().len(), 3);
        assert!((chain.segment_lengths()[0] - 1.0).abs() < TOL);
        assert!((chain.segment_lengths()[1] - 2.0).abs() < TOL);
        assert!((chain.segment_lengths()[2] - 3.0).abs() < TOL);
        assert!((chain.total_length() - 6.0).abs() < TOL);
        assert_eq!(chain.rest_directions()[3], Vec3::ZERO);
    }

    #[test]
    fn test_capture_insufficient_ancestors() {
        let (skeleton, ids) = line(&[Vec3::ZERO, Vec3::X, Vec3::new(2.0, 0.0, 0.0)]);
        match ChainGeometry::capture(&skeleton, ids[2], 3) {
            Err(IkError::InsufficientAncestors { requested, found }) => {
                assert_eq!(requested, 3);
                assert_eq!(found, 2);
            }
            other => panic!("expected InsufficientAncestors, got {:?}", other),
        }
        // Exactly enough ancestors is fine
        assert!(ChainGeometry::capture(&skeleton, ids[2], 2).is_ok());
    }

    #[test]
    fn test_capture_rejects_bad_input() {
        let (skeleton, ids) = line(&[Vec3::ZERO, Vec3::X]);
        assert!(matches!(
            ChainGeometry::capture(&skeleton, ids[1], 0),
            Err(IkError::InvalidChainLength)
        ));
        assert!(matches!(
            ChainGeometry::capture(&skeleton, BoneId(42), 1),
            Err(IkError::UnknownBone(BoneId(42)))
        ));
    }

    #[test]
    fn test_single_bone_chain() {
        let (skeleton, ids) = line(&[Vec3::ZERO, Vec3::X]);
        let chain = ChainGeometry::capture(&skeleton, ids[1], 1).unwrap();
        assert_eq!(chain.len(), 1);
        assert!(chain.segment_lengths().is_empty());
        assert_eq!(chain.total_length(), 0.0);
    }

    #[test]
    fn test_rest_geometry_is_root_relative() {
        let (mut skeleton, ids) = line(&[
            Vec3::new(5.0, 5.0, 5.0),
            Vec3::new(5.0, 5.0, 5.0),
            Vec3::new(5.0, 7.0, 5.0),
        ]);
        // Root turned a quarter about Z: world +Y is root-relative +X
        let quarter = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        skeleton.set_world_pose(ids[0], Vec3::new(5.0, 5.0, 5.0), quarter);

        let chain = ChainGeometry::capture(&skeleton, ids[2], 2).unwrap();
        assert!((chain.rest_directions()[0] - Vec3::new(2.0, 0.0, 0.0)).length() < TOL);

        // Bones at identity, root at `quarter`: bone rest orientation is the inverse turn
        assert!(chain.rest_orientation(0).abs_diff_eq(quarter.inverse(), TOL));
    }

    #[test]
    fn test_capture_does_not_move_bones() {
        let (skeleton, ids) = line(&[Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0)]);
        let before = skeleton.clone();
        ChainGeometry::capture(&skeleton, ids[2], 2).unwrap();
        assert_eq!(skeleton, before);
    }

    #[test]
    fn test_root_frame_round_trip() {
        let frame = RootFrame::new(
            Vec3::new(1.0, -2.0, 0.5),
            Quat::from_euler(glam::EulerRot::XYZ, 0.3, -0.7, 1.1),
        );
        let p = Vec3::new(0.25, 4.0, -3.0);
        assert!((frame.to_world(frame.to_local(p)) - p).length() < 1e-4);
        let q = Quat::from_rotation_y(0.4);
        assert!(frame
            .rotation_to_world(frame.rotation_to_local(q))
            .abs_diff_eq(q, 1e-5));
    }
}
