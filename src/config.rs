//! Immutable solver configuration.

use serde::{Deserialize, Serialize};

use crate::error::IkError;

/// Default convergence distance in root-relative units.
pub const DEFAULT_EPSILON: f32 = 0.001;

/// Default number of backward/forward passes per resolve.
pub const DEFAULT_ITERATION_LIMIT: u32 = 10;

/// Default number of bones in a chain.
pub const DEFAULT_CHAIN_LENGTH: usize = 2;

/// Solver settings fixed at construction time.
///
/// `chain_length` counts bones, effector included; the root sits
/// `chain_length` parent links above the effector and is not part of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub iteration_limit: u32,
    pub chain_length: usize,
    pub epsilon: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iteration_limit: DEFAULT_ITERATION_LIMIT,
            chain_length: DEFAULT_CHAIN_LENGTH,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl SolverConfig {
    /// Config with the default epsilon
    pub fn new(iteration_limit: u32, chain_length: usize) -> Self {
        Self {
            iteration_limit,
            chain_length,
            epsilon: DEFAULT_EPSILON,
        }
    }

    /// Return a copy with a different convergence epsilon
    pub fn with_epsilon(self, epsilon: f32) -> Self {
        Self { epsilon, ..self }
    }

    pub fn validate(&self) -> Result<(), IkError> {
        if self.chain_length == 0 {
            return Err(IkError::InvalidChainLength);
        }
        if self.iteration_limit == 0 {
            return Err(IkError::InvalidIterationLimit);
        }
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(IkError::InvalidEpsilon(self.epsilon));
        }
        Ok(())
    }

    /// Parse from JSON string; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, IkError> {
        let config: SolverConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
