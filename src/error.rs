//! Error types for chain construction, configuration and rig loading.

use crate::bone::BoneId;

/// Errors that can occur while building or driving an IK chain.
///
/// Every variant is a configuration problem the caller has to fix; a chain
/// whose construction failed must not be used. Numerical trouble during a
/// resolve is never reported here (see the fallbacks in [`crate::math`]).
#[derive(Debug, thiserror::Error)]
pub enum IkError {
    /// The effector has fewer ancestors than the requested chain length.
    #[error("chain length {requested} is bigger than the {found} ancestor levels above the effector")]
    InsufficientAncestors { requested: usize, found: usize },

    /// A chain needs at least one bone.
    #[error("chain length must be at least 1")]
    InvalidChainLength,

    /// The solver needs at least one iteration.
    #[error("iteration limit must be at least 1")]
    InvalidIterationLimit,

    /// The convergence epsilon must be positive and finite.
    #[error("convergence epsilon must be positive and finite, got {0}")]
    InvalidEpsilon(f32),

    /// The bone is not part of the host scene graph.
    #[error("unknown bone: {0:?}")]
    UnknownBone(BoneId),

    /// `resolve` was called before any target was set.
    #[error("no target has been set for this chain")]
    TargetNotSet,

    /// A joint constraint bound is out of range.
    #[error("invalid joint constraint: {field} = {value} (must be in [0, {max}))")]
    InvalidConstraint {
        field: &'static str,
        value: f32,
        max: f32,
    },

    /// A rig bone names a parent that was not declared before it.
    #[error("bone {bone} references unknown parent {parent}")]
    UnknownParent { bone: String, parent: String },

    /// Two rig bones share a name.
    #[error("duplicate bone name: {0}")]
    DuplicateBone(String),

    /// No bone with this name exists in the rig.
    #[error("no bone named {0}")]
    UnknownBoneName(String),

    /// A rig session was asked to solve before a chain was attached.
    #[error("no chain is attached to this rig")]
    NoChainAttached,

    /// Malformed rig or configuration JSON.
    #[error("rig parse error: {0}")]
    RigParse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
