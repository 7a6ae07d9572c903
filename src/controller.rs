//! Per-tick driver: target input, then set-target, then resolve.

use glam::Vec3;

use crate::bone::SceneGraph;
use crate::error::IkError;
use crate::ik::{ChainSolver, Relaxation, Target};

/// Source of a world-space target, polled once per tick.
pub trait TargetProvider {
    fn next_target(&mut self, dt: f32) -> Target;
}

/// A fixed target
impl TargetProvider for Target {
    fn next_target(&mut self, _dt: f32) -> Target {
        *self
    }
}

/// Two input axes in [-1, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisInput {
    pub horizontal: f32,
    pub vertical: f32,
}

impl AxisInput {
    pub fn new(horizontal: f32, vertical: f32) -> Self {
        Self {
            horizontal: clamp_axis(horizontal),
            vertical: clamp_axis(vertical),
        }
    }
}

fn clamp_axis(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Moves a target in the world XY plane from two input axes.
///
/// Horizontal drives world +X, vertical drives world +Y, both scaled by
/// `speed` units per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisTargetController {
    pub target: Target,
    pub input: AxisInput,
    pub speed: f32,
}

impl AxisTargetController {
    pub fn new(target: Target, speed: f32) -> Self {
        Self {
            target,
            input: AxisInput::default(),
            speed,
        }
    }

    pub fn set_input(&mut self, horizontal: f32, vertical: f32) {
        self.input = AxisInput::new(horizontal, vertical);
    }
}

impl TargetProvider for AxisTargetController {
    fn next_target(&mut self, dt: f32) -> Target {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let step = Vec3::X * self.input.horizontal + Vec3::Y * self.input.vertical;
        self.target.position += step * self.speed * dt;
        self.target
    }
}

/// Owns one chain solver and the provider that feeds it.
#[derive(Debug, Clone)]
pub struct IkController<S, P> {
    solver: S,
    provider: P,
}

impl<S: ChainSolver, P: TargetProvider> IkController<S, P> {
    pub fn new(solver: S, provider: P) -> Self {
        Self { solver, provider }
    }

    /// Poll the provider, hand the target to the solver and resolve
    pub fn tick<H: SceneGraph + ?Sized>(&mut self, host: &mut H, dt: f32) -> Result<Relaxation, IkError> {
        let target = self.provider.next_target(dt);
        self.solver.set_target(host, target.position, target.rotation);
        self.solver.resolve(host)
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn solver_mut(&mut self) -> &mut S {
        &mut self.solver
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn into_parts(self) -> (S, P) {
        (self.solver, self.provider)
    }
}
