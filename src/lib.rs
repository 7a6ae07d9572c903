//! Fabrik Rig - chain inverse kinematics
//!
//! FABRIK solvers for bone chains in a host scene graph, with optional
//! per-joint cone and twist limits. The wasm build exposes a handle-based
//! rig session API to JavaScript.

pub mod bone;
pub mod chain;
pub mod config;
pub mod constrained;
pub mod constraint;
pub mod controller;
pub mod error;
pub mod ik;
mod limits;
pub mod math;
pub mod session;

#[cfg(target_arch = "wasm32")]
mod wasm;

pub use bone::{Bone, BoneId, SceneGraph, Skeleton};
pub use chain::{ChainGeometry, RootFrame};
pub use config::SolverConfig;
pub use constrained::ConstrainedFabrikSolver;
pub use constraint::{ConeBounds, ConstraintTable, JointConstraint};
pub use controller::{AxisInput, AxisTargetController, IkController, TargetProvider};
pub use error::IkError;
pub use ik::{solve_fabrik, ChainSolver, FabrikSolver, Relaxation, Target};
pub use session::{ResolveReport, RigSession};

pub use glam::{Quat, Vec3};

// Handle-based rig session functions
#[cfg(target_arch = "wasm32")]
pub use wasm::{
    attach_chain, create_rig_session, destroy_rig_session, export_rig_json, get_bone_positions,
    resolve_chain, set_chain_target,
};

/// Route `log` output somewhere visible.
///
/// In the browser this installs the console logger and panic hook; safe to
/// call more than once. Native builds leave logger setup to the host.
pub fn init_logging() {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            console_error_panic_hook::set_once();
            console_log::init_with_level(log::Level::Info).ok();
        }
    }
}
