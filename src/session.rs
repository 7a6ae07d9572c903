//! Rig session: a skeleton plus at most one attached chain.
//!
//! This is the state behind the browser surface. Everything here is plain
//! Rust and testable natively; `wasm.rs` only looks sessions up by handle and
//! forwards to these methods.

use glam::{Quat, Vec3};
use serde::Serialize;

use crate::bone::{SceneGraph, Skeleton};
use crate::chain::ChainGeometry;
use crate::config::SolverConfig;
use crate::constrained::ConstrainedFabrikSolver;
use crate::constraint::JointConstraint;
use crate::error::IkError;
use crate::ik::{ChainSolver, FabrikSolver, Relaxation};

/// Either flavour of chain solver
#[derive(Debug, Clone)]
pub enum SessionChain {
    Free(FabrikSolver),
    Constrained(ConstrainedFabrikSolver),
}

impl ChainSolver for SessionChain {
    fn set_target<H: SceneGraph + ?Sized>(&mut self, host: &H, position: Vec3, rotation: Quat) {
        match self {
            SessionChain::Free(solver) => solver.set_target(host, position, rotation),
            SessionChain::Constrained(solver) => solver.set_target(host, position, rotation),
        }
    }

    fn resolve<H: SceneGraph + ?Sized>(&mut self, host: &mut H) -> Result<Relaxation, IkError> {
        match self {
            SessionChain::Free(solver) => solver.resolve(host),
            SessionChain::Constrained(solver) => solver.resolve(host),
        }
    }

    fn geometry(&self) -> &ChainGeometry {
        match self {
            SessionChain::Free(solver) => solver.geometry(),
            SessionChain::Constrained(solver) => solver.geometry(),
        }
    }
}

/// Outcome of a resolve in a shape JavaScript can read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolveReport {
    pub outcome: &'static str,
    pub iterations: u32,
}

impl From<Relaxation> for ResolveReport {
    fn from(relaxation: Relaxation) -> Self {
        let outcome = match relaxation {
            Relaxation::Stretched => "stretched",
            Relaxation::Converged { .. } => "converged",
            Relaxation::Exhausted { .. } => "exhausted",
        };
        Self {
            outcome,
            iterations: relaxation.iterations(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RigSession {
    pub skeleton: Skeleton,
    chain: Option<SessionChain>,
}

impl RigSession {
    pub fn new(skeleton: Skeleton) -> Self {
        Self {
            skeleton,
            chain: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, IkError> {
        Ok(Self::new(Skeleton::from_json(json)?))
    }

    /// Attach a chain ending at the named bone, replacing any previous chain
    pub fn attach_chain(
        &mut self,
        effector_name: &str,
        config: SolverConfig,
        constrained: bool,
    ) -> Result<(), IkError> {
        let effector = self
            .skeleton
            .find(effector_name)
            .ok_or_else(|| IkError::UnknownBoneName(effector_name.to_string()))?;

        let chain = if constrained {
            SessionChain::Constrained(ConstrainedFabrikSolver::new(
                &self.skeleton,
                effector,
                config,
                JointConstraint::default(),
            )?)
        } else {
            SessionChain::Free(FabrikSolver::new(&self.skeleton, effector, config)?)
        };
        log::info!(
            "Attached {} chain of {} bones to '{}'",
            if constrained { "constrained" } else { "free" },
            config.chain_length,
            effector_name
        );
        self.chain = Some(chain);
        Ok(())
    }

    pub fn chain(&self) -> Option<&SessionChain> {
        self.chain.as_ref()
    }

    /// Set a world-space target on the attached chain
    pub fn set_target(&mut self, position: Vec3, rotation: Quat) -> Result<(), IkError> {
        let chain = self.chain.as_mut().ok_or(IkError::NoChainAttached)?;
        chain.set_target(&self.skeleton, position, rotation);
        Ok(())
    }

    pub fn resolve(&mut self) -> Result<Relaxation, IkError> {
        let chain = self.chain.as_mut().ok_or(IkError::NoChainAttached)?;
        chain.resolve(&mut self.skeleton)
    }

    /// World positions of every bone, flattened as [x, y, z, x, y, z, ...]
    pub fn bone_positions(&self) -> Vec<f32> {
        self.skeleton
            .bones()
            .iter()
            .flat_map(|bone| bone.position.to_array())
            .collect()
    }

    pub fn to_json(&self) -> Result<String, IkError> {
        Ok(self.skeleton.to_json_string()?)
    }
}
