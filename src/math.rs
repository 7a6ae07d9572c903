//! Linear algebra primitives using glam with degenerate-safe helpers.
//!
//! The solver normalizes directions between points that can coincide and
//! builds rotations between vectors that can be zero. glam leaves those cases
//! to the caller (NaN or a debug assertion), so every such call goes through
//! the extension traits below, which return a fixed fallback instead.

pub use glam::{Quat, Vec2, Vec3};

/// Squared length below which a vector is treated as having no direction.
pub const DEGENERATE_LENGTH_SQUARED: f32 = 1e-12;

/// Direction used when neither a vector nor its fallback has a direction.
pub const FALLBACK_DIRECTION: Vec3 = Vec3::Z;

/// Extension trait for direction handling on `Vec3`.
pub trait Vec3Direction {
    /// Unit vector in the direction of `self`, or the normalized `fallback`
    /// when `self` is (nearly) zero. Falls back to [`FALLBACK_DIRECTION`] when
    /// the fallback is zero as well.
    fn direction_or(self, fallback: Vec3) -> Vec3;

    /// True if the vector is too short to carry a direction
    fn is_degenerate(self) -> bool;
}

impl Vec3Direction for Vec3 {
    #[inline]
    fn direction_or(self, fallback: Vec3) -> Vec3 {
        if !self.is_degenerate() {
            if let Some(dir) = self.try_normalize() {
                return dir;
            }
        }
        if fallback.is_degenerate() {
            return FALLBACK_DIRECTION;
        }
        fallback.try_normalize().unwrap_or(FALLBACK_DIRECTION)
    }

    #[inline]
    fn is_degenerate(self) -> bool {
        !(self.length_squared() > DEGENERATE_LENGTH_SQUARED)
    }
}

/// Shortest-arc rotation taking direction `from` onto direction `to`.
///
/// Inputs need not be normalized. If either is zero-length no rotation is
/// needed and the identity is returned.
pub fn from_to_rotation(from: Vec3, to: Vec3) -> Quat {
    if from.is_degenerate() || to.is_degenerate() {
        return Quat::IDENTITY;
    }
    match (from.try_normalize(), to.try_normalize()) {
        (Some(a), Some(b)) => Quat::from_rotation_arc(a, b),
        _ => Quat::IDENTITY,
    }
}

/// Extension trait for swing/twist decomposition on `Quat`.
pub trait QuatTwist {
    /// Twist component of the rotation about `axis`.
    ///
    /// The vector part is projected onto the axis and the result renormalized.
    /// Returns identity when the axis is zero or the rotation has no component
    /// about it (a half turn about a perpendicular axis).
    fn twist(self, axis: Vec3) -> Quat;

    /// Signed twist angle about `axis` in degrees, in [-180, 180].
    fn twist_degrees(self, axis: Vec3) -> f32;
}

impl QuatTwist for Quat {
    fn twist(self, axis: Vec3) -> Quat {
        let Some(axis) = axis.try_normalize() else {
            return Quat::IDENTITY;
        };
        let projected = self.xyz().project_onto_normalized(axis);
        let twist = Quat::from_xyzw(projected.x, projected.y, projected.z, self.w);
        if twist.length_squared() < DEGENERATE_LENGTH_SQUARED {
            Quat::IDENTITY
        } else {
            twist.normalize()
        }
    }

    fn twist_degrees(self, axis: Vec3) -> f32 {
        let Some(axis) = axis.try_normalize() else {
            return 0.0;
        };
        // q and -q are the same rotation; w >= 0 keeps the angle in [-180, 180]
        let q = if self.w < 0.0 { -self } else { self };
        let s = q.xyz().dot(axis);
        if s * s + q.w * q.w < DEGENERATE_LENGTH_SQUARED {
            return 0.0;
        }
        (2.0 * s.atan2(q.w)).to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f32 = 1e-4;

    #[test]
    fn test_direction_or_normalizes() {
        let dir = Vec3::new(3.0, 0.0, 4.0).direction_or(Vec3::X);
        assert!((dir - Vec3::new(0.6, 0.0, 0.8)).length() < TOL);
    }

    #[test]
    fn test_direction_or_falls_back() {
        assert_eq!(Vec3::ZERO.direction_or(Vec3::new(0.0, 2.0, 0.0)), Vec3::Y);
        assert_eq!(Vec3::ZERO.direction_or(Vec3::ZERO), FALLBACK_DIRECTION);
        assert_eq!(Vec3::splat(1e-9).direction_or(Vec3::X), Vec3::X);
    }

    #[test]
    fn test_from_to_rotation() {
        let q = from_to_rotation(Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 5.0, 0.0));
        assert!((q * Vec3::X - Vec3::Y).length() < TOL);

        // Opposite directions still produce a valid half turn
        let q = from_to_rotation(Vec3::X, Vec3::NEG_X);
        assert!((q * Vec3::X - Vec3::NEG_X).length() < TOL);
        assert!(q.is_finite());

        assert_eq!(from_to_rotation(Vec3::ZERO, Vec3::Y), Quat::IDENTITY);
        assert_eq!(from_to_rotation(Vec3::Y, Vec3::ZERO), Quat::IDENTITY);
    }

    #[test]
    fn test_twist_of_pure_twist_is_itself() {
        let q = Quat::from_axis_angle(Vec3::Y, 0.7);
        let twist = q.twist(Vec3::Y);
        assert!(twist.abs_diff_eq(q, TOL));
        assert!((q.twist_degrees(Vec3::Y) - 0.7f32.to_degrees()).abs() < 1e-2);
    }

    #[test]
    fn test_twist_ignores_swing() {
        let swing = Quat::from_axis_angle(Vec3::X, 0.9);
        let twist = Quat::from_axis_angle(Vec3::Z, -0.4);
        let q = swing * twist;
        assert!((q.twist_degrees(Vec3::Z) - (-0.4f32).to_degrees()).abs() < 1e-2);
        // Pure swing has no twist about the perpendicular axis
        assert!(swing.twist_degrees(Vec3::Z).abs() < 1e-3);
    }

    #[test]
    fn test_twist_sign_is_independent_of_quaternion_sign() {
        let q = Quat::from_axis_angle(Vec3::Y, 1.2);
        let a = q.twist_degrees(Vec3::Y);
        let b = (-q).twist_degrees(Vec3::Y);
        assert!((a - b).abs() < 1e-3);
    }

    #[test]
    fn test_twist_degenerate_cases() {
        // Half turn about a perpendicular axis has no twist component
        let q = Quat::from_axis_angle(Vec3::X, std::f32::consts::PI);
        assert_eq!(q.twist(Vec3::Y), Quat::IDENTITY);
        assert_eq!(q.twist_degrees(Vec3::Y), 0.0);

        let q = Quat::from_axis_angle(Vec3::Y, 0.3);
        assert_eq!(q.twist(Vec3::ZERO), Quat::IDENTITY);
        assert_eq!(q.twist_degrees(Vec3::ZERO), 0.0);
    }
}
