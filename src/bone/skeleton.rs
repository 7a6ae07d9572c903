use glam::{Quat, Vec3};

use super::{BoneId, SceneGraph};
use crate::constraint::JointConstraint;
use crate::error::IkError;

/// A bone as the host stores it: world transform plus parent link.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    /// Parent bone (None for a top-level bone)
    pub parent: Option<BoneId>,
    /// World position of the bone's joint
    pub position: Vec3,
    /// World orientation
    pub rotation: Quat,
    /// Optional joint constraint for constrained chains
    pub constraint: Option<JointConstraint>,
}

/// Arena of bones with world transforms.
///
/// Bones are stored in insertion order and a parent must exist before its
/// children are added, so parents always precede children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    pub name: String,
    bones: Vec<Bone>,
}

impl Skeleton {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bones: Vec::new(),
        }
    }

    /// Build a straight parent chain through `points`, one bone per point.
    ///
    /// The first point becomes a top-level bone, each later point is a child
    /// of the previous one. All rotations start at identity.
    pub fn from_points(name: impl Into<String>, points: &[Vec3]) -> (Self, Vec<BoneId>) {
        let mut skeleton = Self::new(name);
        let mut ids = Vec::with_capacity(points.len());
        for (i, &point) in points.iter().enumerate() {
            let bone = Bone {
                name: format!("bone_{}", i),
                parent: ids.last().copied(),
                position: point,
                rotation: Quat::IDENTITY,
                constraint: None,
            };
            ids.push(skeleton.push(bone));
        }
        (skeleton, ids)
    }

    fn push(&mut self, bone: Bone) -> BoneId {
        let id = BoneId(self.bones.len() as u32);
        self.bones.push(bone);
        id
    }

    /// Add a bone under an existing parent
    pub fn add_bone(
        &mut self,
        name: impl Into<String>,
        parent: Option<BoneId>,
        position: Vec3,
        rotation: Quat,
    ) -> Result<BoneId, IkError> {
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(IkError::UnknownBone(parent));
            }
        }
        let name = name.into();
        if self.find(&name).is_some() {
            return Err(IkError::DuplicateBone(name));
        }
        Ok(self.push(Bone {
            name,
            parent,
            position,
            rotation,
            constraint: None,
        }))
    }

    /// Attach or clear a joint constraint
    pub fn set_constraint(
        &mut self,
        bone: BoneId,
        constraint: Option<JointConstraint>,
    ) -> Result<(), IkError> {
        if let Some(c) = &constraint {
            c.validate()?;
        }
        let entry = self
            .bones
            .get_mut(bone.index())
            .ok_or(IkError::UnknownBone(bone))?;
        entry.constraint = constraint;
        Ok(())
    }

    /// Look up a bone by name
    pub fn find(&self, name: &str) -> Option<BoneId> {
        self.bones
            .iter()
            .position(|b| b.name == name)
            .map(|i| BoneId(i as u32))
    }

    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.index())
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Move a bone and all of its descendants rigidly by `delta`
    pub fn translate_subtree(&mut self, bone: BoneId, delta: Vec3) {
        let start = bone.index();
        if start >= self.bones.len() {
            return;
        }
        // Parents precede children, so one forward sweep finds every descendant
        let mut in_subtree = vec![false; self.bones.len()];
        in_subtree[start] = true;
        for i in start..self.bones.len() {
            let inside = i == start
                || self.bones[i]
                    .parent
                    .is_some_and(|p| in_subtree[p.index()]);
            if inside {
                in_subtree[i] = true;
                self.bones[i].position += delta;
            }
        }
    }

    /// Rotate a bone and all of its descendants about the bone's joint
    pub fn rotate_subtree(&mut self, bone: BoneId, rotation: Quat) {
        let start = bone.index();
        if start >= self.bones.len() {
            return;
        }
        let pivot = self.bones[start].position;
        let mut in_subtree = vec![false; self.bones.len()];
        for i in start..self.bones.len() {
            let inside = i == start
                || self.bones[i]
                    .parent
                    .is_some_and(|p| in_subtree[p.index()]);
            if inside {
                in_subtree[i] = true;
                let b = &mut self.bones[i];
                b.position = pivot + rotation * (b.position - pivot);
                b.rotation = (rotation * b.rotation).normalize();
            }
        }
    }
}

impl SceneGraph for Skeleton {
    fn contains(&self, bone: BoneId) -> bool {
        bone.index() < self.bones.len()
    }

    fn parent(&self, bone: BoneId) -> Option<BoneId> {
        self.bones.get(bone.index()).and_then(|b| b.parent)
    }

    fn world_position(&self, bone: BoneId) -> Vec3 {
        self.bones[bone.index()].position
    }

    fn world_rotation(&self, bone: BoneId) -> Quat {
        self.bones[bone.index()].rotation
    }

    fn set_world_pose(&mut self, bone: BoneId, position: Vec3, rotation: Quat) {
        let b = &mut self.bones[bone.index()];
        b.position = position;
        b.rotation = rotation;
    }

    fn joint_constraint(&self, bone: BoneId) -> Option<JointConstraint> {
        self.bones.get(bone.index()).and_then(|b| b.constraint)
    }

    fn bone_name(&self, bone: BoneId) -> Option<&str> {
        self.bones.get(bone.index()).map(|b| b.name.as_str())
    }
}
