use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Bone, BoneId, Skeleton};
use crate::constraint::JointConstraint;
use crate::error::IkError;

/// JSON format for a single rig bone
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RigBoneJson {
    pub name: String,
    /// Name of a bone declared earlier in the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// World position as [x, y, z]
    pub position: Vec3,
    /// World rotation as [x, y, z, w]
    #[serde(default = "default_rotation")]
    pub rotation: Quat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<JointConstraint>,
}

/// JSON format for a rig
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RigJson {
    #[serde(rename = "$schema", default, skip_deserializing)]
    pub schema: Option<String>,
    #[serde(default = "default_version")]
    pub version: u32,
    pub name: String,
    pub bones: Vec<RigBoneJson>,
}

fn default_version() -> u32 {
    1
}

fn default_rotation() -> Quat {
    Quat::IDENTITY
}

impl Skeleton {
    /// Parse a rig from its JSON description.
    ///
    /// Bones must be listed parents-first; names must be unique and every
    /// attached constraint must be in range.
    pub fn from_json(json: &str) -> Result<Self, IkError> {
        let rig: RigJson = serde_json::from_str(json)?;
        Self::from_rig(rig)
    }

    pub fn from_rig(rig: RigJson) -> Result<Self, IkError> {
        let mut skeleton = Skeleton::new(rig.name);
        let mut ids: HashMap<String, BoneId> = HashMap::with_capacity(rig.bones.len());

        for bone in rig.bones {
            let parent = match &bone.parent {
                Some(parent_name) => Some(*ids.get(parent_name).ok_or_else(|| {
                    IkError::UnknownParent {
                        bone: bone.name.clone(),
                        parent: parent_name.clone(),
                    }
                })?),
                None => None,
            };
            let rotation = if bone.rotation.is_finite() && bone.rotation.length_squared() > 0.0 {
                bone.rotation.normalize()
            } else {
                Quat::IDENTITY
            };

            let id = skeleton.add_bone(bone.name.clone(), parent, bone.position, rotation)?;
            skeleton.set_constraint(id, bone.constraint)?;
            ids.insert(bone.name, id);
        }

        log::debug!(
            "Loaded rig '{}' with {} bones",
            skeleton.name,
            skeleton.len()
        );
        Ok(skeleton)
    }

    /// Current state of the skeleton as a rig description
    pub fn to_rig(&self) -> RigJson {
        let bones = self
            .bones()
            .iter()
            .map(|b: &Bone| RigBoneJson {
                name: b.name.clone(),
                parent: b
                    .parent
                    .and_then(|p| self.bone(p))
                    .map(|p| p.name.clone()),
                position: b.position,
                rotation: b.rotation,
                constraint: b.constraint,
            })
            .collect();

        RigJson {
            schema: Some("../schemas/rig.v1.schema.json".to_string()),
            version: 1,
            name: self.name.clone(),
            bones,
        }
    }

    /// Convert to JSON string
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_rig())
    }
}
