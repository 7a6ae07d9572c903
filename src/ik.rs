//! FABRIK relaxation and the unconstrained chain solver.
//!
//! [`relax`] is the shared outer loop: reachability test, stretch mode, then
//! alternating backward and forward passes until the effector is within
//! epsilon of the target or the iteration limit runs out. How a single joint
//! is placed inside a pass is delegated to a [`JointRule`]; [`FreeJoints`]
//! only enforces segment lengths, the constrained solver adds cone and twist
//! limits on top.
//!
//! All chain math happens in root-relative space. Each resolve re-samples the
//! root's current world pose, so a root moved by the host between ticks
//! carries the whole chain with it.

use glam::{Quat, Vec3};

use crate::bone::{BoneId, SceneGraph};
use crate::chain::{ChainGeometry, RootFrame};
use crate::config::SolverConfig;
use crate::error::IkError;
use crate::math::{from_to_rotation, Vec3Direction, FALLBACK_DIRECTION};

/// A position and orientation to reach.
///
/// World-space when handed to a solver, root-relative once stored by one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Target {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Target {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Target with identity orientation
    pub fn at(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }
}

/// How a resolve call ended. The bone poses are written in every case.
///
/// `iterations` counts completed backward/forward passes; a reachable target
/// always gets at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relaxation {
    /// Target out of reach; the chain was laid out straight toward it
    Stretched,
    /// Effector within epsilon after this many backward/forward passes
    Converged { iterations: u32 },
    /// Iteration limit reached; the partially relaxed pose was kept
    Exhausted { iterations: u32 },
}

impl Relaxation {
    pub fn iterations(&self) -> u32 {
        match self {
            Relaxation::Stretched => 0,
            Relaxation::Converged { iterations } | Relaxation::Exhausted { iterations } => {
                *iterations
            }
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, Relaxation::Converged { .. })
    }
}

/// Segment lengths plus rest directions for degenerate fallbacks.
#[derive(Debug, Clone, Copy)]
pub struct Segments<'a> {
    pub lengths: &'a [f32],
    pub rest_directions: &'a [Vec3],
}

impl<'a> Segments<'a> {
    pub fn new(lengths: &'a [f32], rest_directions: &'a [Vec3]) -> Self {
        Self {
            lengths,
            rest_directions,
        }
    }

    pub fn total_length(&self) -> f32 {
        self.lengths.iter().sum()
    }

    /// Unit rest direction of segment `i`, or [`FALLBACK_DIRECTION`]
    pub fn rest_direction(&self, i: usize) -> Vec3 {
        self.rest_directions
            .get(i)
            .copied()
            .unwrap_or(Vec3::ZERO)
            .direction_or(FALLBACK_DIRECTION)
    }

    /// Backward placement: joint `i` at `lengths[i]` from joint `i + 1`
    pub fn pull_back(&self, positions: &mut [Vec3], i: usize) {
        let dir = (positions[i] - positions[i + 1]).direction_or(-self.rest_direction(i));
        positions[i] = positions[i + 1] + dir * self.lengths[i];
    }

    /// Forward placement: joint `i` at `lengths[i - 1]` from joint `i - 1`
    pub fn push_forward(&self, positions: &mut [Vec3], i: usize) {
        let dir = (positions[i] - positions[i - 1]).direction_or(self.rest_direction(i - 1));
        positions[i] = positions[i - 1] + dir * self.lengths[i - 1];
    }
}

/// Placement of a single joint inside a pass.
///
/// The defaults are plain FABRIK length enforcement.
pub trait JointRule {
    /// Place joint `i` after joint `i + 1` has been placed
    fn backward(&mut self, i: usize, positions: &mut [Vec3], segments: Segments<'_>) {
        segments.pull_back(positions, i);
    }

    /// Place joint `i` after joint `i - 1` has been placed
    fn forward(&mut self, i: usize, positions: &mut [Vec3], segments: Segments<'_>) {
        segments.push_forward(positions, i);
    }
}

/// Unconstrained joints
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeJoints;

impl JointRule for FreeJoints {}

/// Relax `positions` toward `target` in place.
///
/// `positions[0]` is the base and never moves. Segment `i` joins
/// `positions[i]` and `positions[i + 1]`.
pub fn relax<R: JointRule + ?Sized>(
    positions: &mut [Vec3],
    segments: Segments<'_>,
    target: Vec3,
    iteration_limit: u32,
    epsilon: f32,
    rule: &mut R,
) -> Relaxation {
    let n = positions.len();
    if n == 0 {
        return Relaxation::Stretched;
    }
    let base = positions[0];
    let total = segments.total_length();
    let to_target = target - base;

    if to_target.length_squared() >= total * total {
        let dir = to_target.direction_or(segments.rest_direction(0));
        for i in 1..n {
            positions[i] = positions[i - 1] + dir * segments.lengths[i - 1];
        }
        return Relaxation::Stretched;
    }

    // At least one full pass runs, so segment lengths hold even when the
    // sampled effector already sits on the target
    let tolerance = epsilon * epsilon;
    for iteration in 1..=iteration_limit {
        positions[n - 1] = target;
        for i in (0..n - 1).rev() {
            rule.backward(i, positions, segments);
        }

        positions[0] = base;
        for i in 1..n {
            rule.forward(i, positions, segments);
        }

        if positions[n - 1].distance_squared(target) < tolerance {
            return Relaxation::Converged {
                iterations: iteration,
            };
        }
    }

    Relaxation::Exhausted {
        iterations: iteration_limit,
    }
}

/// Solve IK for a plain list of joint positions
///
/// # Arguments
/// * `joints` - Current positions of the joints (base to end effector)
/// * `lengths` - Distance between joint i and i+1
/// * `target` - Target position for the end effector
///
/// # Returns
/// * `Vec<Vec3>` - New positions for the joints
pub fn solve_fabrik(
    mut joints: Vec<Vec3>,
    lengths: &[f32],
    target: Vec3,
    iteration_limit: u32,
    tolerance: f32,
) -> Vec<Vec3> {
    if joints.len() < 2 {
        return joints;
    }
    if lengths.len() + 1 != joints.len() {
        log::warn!(
            "solve_fabrik: {} joints need {} lengths, got {}",
            joints.len(),
            joints.len() - 1,
            lengths.len()
        );
        return joints;
    }
    relax(
        &mut joints,
        Segments::new(lengths, &[]),
        target,
        iteration_limit,
        tolerance,
        &mut FreeJoints,
    );
    joints
}

/// Common surface of the chain solvers, used by the per-tick driver.
pub trait ChainSolver {
    /// Store a world-space target, converted with the root's current pose
    fn set_target<H: SceneGraph + ?Sized>(&mut self, host: &H, position: Vec3, rotation: Quat);

    /// Relax the chain and write the pose of every chain bone back to the host
    fn resolve<H: SceneGraph + ?Sized>(&mut self, host: &mut H) -> Result<Relaxation, IkError>;

    fn geometry(&self) -> &ChainGeometry;
}

/// Chain-bound FABRIK solver without joint limits.
#[derive(Debug, Clone)]
pub struct FabrikSolver {
    pub(crate) config: SolverConfig,
    pub(crate) geometry: ChainGeometry,
    /// Root-relative working positions, reused every resolve
    pub(crate) positions: Vec<Vec3>,
    pub(crate) target: Option<Target>,
}

impl FabrikSolver {
    /// Capture the chain of `config.chain_length` bones ending at `effector`
    pub fn new<H: SceneGraph + ?Sized>(
        host: &H,
        effector: BoneId,
        config: SolverConfig,
    ) -> Result<Self, IkError> {
        config.validate()?;
        let geometry = ChainGeometry::capture(host, effector, config.chain_length)?;
        let positions = vec![Vec3::ZERO; geometry.len()];
        Ok(Self {
            config,
            geometry,
            positions,
            target: None,
        })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn geometry(&self) -> &ChainGeometry {
        &self.geometry
    }

    /// Root-relative working positions from the last resolve
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Root-relative target, if one has been set
    pub fn target(&self) -> Option<Target> {
        self.target
    }

    pub fn set_target<H: SceneGraph + ?Sized>(&mut self, host: &H, position: Vec3, rotation: Quat) {
        let frame = RootFrame::sample(host, self.geometry.root());
        self.target = Some(Target::new(
            frame.to_local(position),
            frame.rotation_to_local(rotation.normalize()),
        ));
    }

    pub fn resolve<H: SceneGraph + ?Sized>(&mut self, host: &mut H) -> Result<Relaxation, IkError> {
        let (frame, target) = self.sample(host)?;
        let segments = Segments::new(
            self.geometry.segment_lengths(),
            self.geometry.rest_directions(),
        );
        let relaxation = relax(
            &mut self.positions,
            segments,
            target.position,
            self.config.iteration_limit,
            self.config.epsilon,
            &mut FreeJoints,
        );
        self.commit(host, &frame, &target, |_| Quat::IDENTITY);
        log::trace!("{} resolved: {:?}", self.geometry.effector(), relaxation);
        Ok(relaxation)
    }

    /// Read the root frame and the chain's current root-relative positions
    pub(crate) fn sample<H: SceneGraph + ?Sized>(
        &mut self,
        host: &H,
    ) -> Result<(RootFrame, Target), IkError> {
        let target = self.target.ok_or(IkError::TargetNotSet)?;
        let frame = RootFrame::sample(host, self.geometry.root());
        for (slot, &bone) in self.positions.iter_mut().zip(self.geometry.bones()) {
            *slot = frame.to_local(host.world_position(bone));
        }
        Ok((frame, target))
    }

    /// Write positions and orientations back onto the chain bones.
    ///
    /// `correction(i)` is pre-multiplied onto the root-relative orientation of
    /// every bone but the effector, whose orientation follows the target.
    pub(crate) fn commit<H, F>(&self, host: &mut H, frame: &RootFrame, target: &Target, correction: F)
    where
        H: SceneGraph + ?Sized,
        F: Fn(usize) -> Quat,
    {
        let bones = self.geometry.bones();
        let last = bones.len() - 1;
        let rest_directions = self.geometry.rest_directions();

        for (i, &bone) in bones.iter().enumerate() {
            let rest_orientation = self.geometry.rest_orientation(i);
            let local_rotation = if i == last {
                target.rotation * rest_orientation
            } else {
                let segment = self.positions[i + 1] - self.positions[i];
                correction(i) * from_to_rotation(rest_directions[i], segment) * rest_orientation
            };
            host.set_world_pose(
                bone,
                frame.to_world(self.positions[i]),
                frame.rotation_to_world(local_rotation).normalize(),
            );
        }
    }
}

impl ChainSolver for FabrikSolver {
    fn set_target<H: SceneGraph + ?Sized>(&mut self, host: &H, position: Vec3, rotation: Quat) {
        FabrikSolver::set_target(self, host, position, rotation)
    }

    fn resolve<H: SceneGraph + ?Sized>(&mut self, host: &mut H) -> Result<Relaxation, IkError> {
        FabrikSolver::resolve(self, host)
    }

    fn geometry(&self) -> &ChainGeometry {
        &self.geometry
    }
}
