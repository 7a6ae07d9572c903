//! FABRIK with per-joint cone and twist limits.
//!
//! Same outer loop as [`crate::ik::relax`]; the joint placement differs:
//! - backward pass, interior joints `n-2 ..= 1`: cone limit on bone `i`, then
//!   twist limit on bone `i - 1`
//! - forward pass, joints `1 .. n`: length enforcement, then twist limit on
//!   bone `i - 1`
//!
//! Twist corrections rotate a bone about its own segment, so they never move a
//! joint. They are kept per bone and folded into the orientations written
//! back to the host.

use glam::{Quat, Vec3};

use crate::bone::{BoneId, SceneGraph};
use crate::chain::ChainGeometry;
use crate::config::SolverConfig;
use crate::constraint::{constrain_cone, constrain_twist, ConstraintTable, JointConstraint, TwistCorrection};
use crate::error::IkError;
use crate::ik::{relax, ChainSolver, FabrikSolver, JointRule, Relaxation, Segments, Target};

/// Joint placement with cone and twist limits
struct ConstrainedJoints<'a> {
    geometry: &'a ChainGeometry,
    constraints: &'a ConstraintTable,
    corrections: &'a mut [Quat],
}

impl ConstrainedJoints<'_> {
    /// Twist check for the bone spanning `bone -> bone + 1`
    fn twist(&mut self, bone: usize, positions: &[Vec3]) -> TwistCorrection {
        let result = constrain_twist(
            positions[bone],
            positions[bone + 1],
            self.geometry.segment_lengths()[bone],
            self.geometry.rest_directions()[bone],
            self.geometry.rest_orientation(bone),
            self.constraints.get(bone).twist_limit,
        );
        self.corrections[bone] = result.correction;
        result
    }

    /// Measure every bone without moving anything
    fn sweep(&mut self, positions: &[Vec3]) {
        for bone in 0..positions.len().saturating_sub(1) {
            self.twist(bone, positions);
        }
    }
}

impl JointRule for ConstrainedJoints<'_> {
    fn backward(&mut self, i: usize, positions: &mut [Vec3], segments: Segments<'_>) {
        let interior = i >= 1 && i + 2 <= positions.len();
        if !interior {
            segments.pull_back(positions, i);
            return;
        }

        let cone = constrain_cone(
            positions[i],
            positions[i + 1],
            segments.lengths[i],
            &self.constraints.get(i).cone,
            segments.rest_direction(i),
            self.geometry.rest_orientation(i),
        );
        if cone.engaged {
            log::trace!("cone limit engaged at joint {}", i);
        }
        positions[i] = cone.position;

        let twist = self.twist(i - 1, positions);
        positions[i - 1] = twist.previous;
    }

    fn forward(&mut self, i: usize, positions: &mut [Vec3], segments: Segments<'_>) {
        segments.push_forward(positions, i);
        let twist = self.twist(i - 1, positions);
        if twist.engaged {
            // Re-derive from the anchored side so the base never drifts
            positions[i] = positions[i - 1] + (positions[i] - twist.previous);
        }
    }
}

/// Chain-bound FABRIK solver honouring per-joint [`JointConstraint`]s.
#[derive(Debug, Clone)]
pub struct ConstrainedFabrikSolver {
    solver: FabrikSolver,
    constraints: ConstraintTable,
    twist_corrections: Vec<Quat>,
}

impl ConstrainedFabrikSolver {
    /// Capture the chain and resolve each bone's constraint from the host.
    ///
    /// Bones without a constraint use `default_constraint`; see
    /// [`ConstraintTable::fallbacks`].
    pub fn new<H: SceneGraph + ?Sized>(
        host: &H,
        effector: BoneId,
        config: SolverConfig,
        default_constraint: JointConstraint,
    ) -> Result<Self, IkError> {
        default_constraint.validate()?;
        let solver = FabrikSolver::new(host, effector, config)?;
        let constraints =
            ConstraintTable::resolve(host, solver.geometry().bones(), default_constraint);
        let twist_corrections = vec![Quat::IDENTITY; solver.geometry().len()];
        Ok(Self {
            solver,
            constraints,
            twist_corrections,
        })
    }

    /// Look the per-bone constraints up again, for hosts that edit them
    pub fn refresh_constraints<H: SceneGraph + ?Sized>(&mut self, host: &H) {
        self.constraints = ConstraintTable::resolve(
            host,
            self.solver.geometry().bones(),
            *self.constraints.default_constraint(),
        );
    }

    pub fn constraints(&self) -> &ConstraintTable {
        &self.constraints
    }

    /// Per-bone twist corrections applied by the last resolve (identity for
    /// the effector and for bones within their limit)
    pub fn twist_corrections(&self) -> &[Quat] {
        &self.twist_corrections
    }

    pub fn config(&self) -> &SolverConfig {
        self.solver.config()
    }

    pub fn geometry(&self) -> &ChainGeometry {
        self.solver.geometry()
    }

    pub fn positions(&self) -> &[Vec3] {
        self.solver.positions()
    }

    pub fn target(&self) -> Option<Target> {
        self.solver.target()
    }

    pub fn set_target<H: SceneGraph + ?Sized>(&mut self, host: &H, position: Vec3, rotation: Quat) {
        self.solver.set_target(host, position, rotation);
    }

    pub fn resolve<H: SceneGraph + ?Sized>(&mut self, host: &mut H) -> Result<Relaxation, IkError> {
        let solver = &mut self.solver;
        let (frame, target) = solver.sample(host)?;
        self.twist_corrections.fill(Quat::IDENTITY);

        let geometry = &solver.geometry;
        let segments = Segments::new(geometry.segment_lengths(), geometry.rest_directions());
        let mut rule = ConstrainedJoints {
            geometry,
            constraints: &self.constraints,
            corrections: &mut self.twist_corrections,
        };
        let relaxation = relax(
            &mut solver.positions,
            segments,
            target.position,
            solver.config.iteration_limit,
            solver.config.epsilon,
            &mut rule,
        );
        // Stretching runs no pass, so nothing has measured the twist yet
        if relaxation.iterations() == 0 {
            rule.sweep(&solver.positions);
        }

        let corrections = &self.twist_corrections;
        solver.commit(host, &frame, &target, |i| corrections[i]);
        log::trace!("{} resolved: {:?}", solver.geometry.effector(), relaxation);
        Ok(relaxation)
    }
}

impl ChainSolver for ConstrainedFabrikSolver {
    fn set_target<H: SceneGraph + ?Sized>(&mut self, host: &H, position: Vec3, rotation: Quat) {
        ConstrainedFabrikSolver::set_target(self, host, position, rotation)
    }

    fn resolve<H: SceneGraph + ?Sized>(&mut self, host: &mut H) -> Result<Relaxation, IkError> {
        ConstrainedFabrikSolver::resolve(self, host)
    }

    fn geometry(&self) -> &ChainGeometry {
        self.solver.geometry()
    }
}
