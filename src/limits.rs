//! Shared constraint limits used by both build.rs and runtime code.
//!
//! This module is included by both the build script and the constraint module
//! so that bundled rig files are validated against the same bounds the solver
//! enforces when a rig is loaded at runtime.

// Some items are only used by build.rs for validation
#![allow(dead_code)]

/// Cone bounds are in degrees and must stay below a right angle,
/// since the cone limit is derived from `tan(bound)`.
pub const MAX_CONE_DEGREES: f32 = 90.0;

/// Twist limits are in degrees and must stay below a full turn.
pub const MAX_TWIST_DEGREES: f32 = 360.0;

/// Default half-angle used for every side of the default cone.
pub const DEFAULT_CONE_DEGREES: f32 = 45.0;

/// Default twist limit for the fallback joint constraint.
pub const DEFAULT_TWIST_DEGREES: f32 = 180.0;

/// Check a cone bound in degrees, returning a description of the problem if any.
pub fn check_cone_degrees(value: f32) -> Option<String> {
    if !value.is_finite() || !(0.0..MAX_CONE_DEGREES).contains(&value) {
        Some(format!(
            "cone bound {} outside [0, {})",
            value, MAX_CONE_DEGREES
        ))
    } else {
        None
    }
}

/// Check a twist limit in degrees, returning a description of the problem if any.
pub fn check_twist_degrees(value: f32) -> Option<String> {
    if !value.is_finite() || !(0.0..MAX_TWIST_DEGREES).contains(&value) {
        Some(format!(
            "twist limit {} outside [0, {})",
            value, MAX_TWIST_DEGREES
        ))
    } else {
        None
    }
}
