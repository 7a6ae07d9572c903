//! Joint constraints and their evaluation.
//!
//! A [`JointConstraint`] limits how far a bone may swing away from its rest
//! direction (an asymmetric cone, four bounds blended by quadrant) and how far
//! it may roll about its own axis relative to its rest roll.
//!
//! ## Cone
//!
//! A bone's root-relative direction is split into a reach along its rest
//! axis and a perpendicular offset. The offset is measured in the bone's own
//! rest frame: the x bounds swing toward the bone's local +X/-X and the y
//! bounds toward `axis × x` (see [`cone_frame`]). A bone resting along its
//! own X axis measures its x bounds toward local +Y instead. Rolling a bone
//! about its rest axis therefore rolls its cone with it. The offset selects
//! one x bound and one y bound by quadrant. The
//! allowed offset is `reach * (tan(bx) * |n.x| + tan(by) * |n.y|)` with `n` the
//! unit planar direction of the offset, so the limit varies smoothly between
//! the four bounds instead of clamping to a rectangle.
//!
//! ## Twist
//!
//! The twist of a bone is the part of its orientation about the segment axis,
//! extracted by projecting the quaternion's vector part onto that axis. When
//! the twist magnitude differs from the rest twist magnitude by more than the
//! limit, a corrective rotation about the segment axis brings it back to the
//! boundary. That rotation leaves the segment's direction (and length)
//! unchanged, so the correction is carried into the bone's orientation.

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::bone::{BoneId, SceneGraph};
use crate::error::IkError;
use crate::limits::{
    check_cone_degrees, check_twist_degrees, DEFAULT_CONE_DEGREES, DEFAULT_TWIST_DEGREES,
    MAX_CONE_DEGREES, MAX_TWIST_DEGREES,
};
use crate::math::{from_to_rotation, QuatTwist, Vec3Direction, FALLBACK_DIRECTION};

/// Four asymmetric cone bounds in degrees, each in [0, 90).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConeBounds {
    pub x_positive: f32,
    pub x_negative: f32,
    pub y_positive: f32,
    pub y_negative: f32,
}

impl Default for ConeBounds {
    fn default() -> Self {
        Self::uniform(DEFAULT_CONE_DEGREES)
    }
}

impl ConeBounds {
    pub fn new(x_positive: f32, x_negative: f32, y_positive: f32, y_negative: f32) -> Self {
        Self {
            x_positive,
            x_negative,
            y_positive,
            y_negative,
        }
    }

    /// Same bound on every side (a circular cone)
    pub fn uniform(degrees: f32) -> Self {
        Self::new(degrees, degrees, degrees, degrees)
    }

    /// Tangents of the x and y bounds selected by the quadrant of `planar`
    pub fn quadrant_tangents(&self, planar: Vec2) -> Vec2 {
        let x = if planar.x > 0.0 {
            self.x_positive
        } else {
            self.x_negative
        };
        let y = if planar.y > 0.0 {
            self.y_positive
        } else {
            self.y_negative
        };
        Vec2::new(x.to_radians().tan(), y.to_radians().tan())
    }
}

/// Per-joint rotational limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JointConstraint {
    pub cone: ConeBounds,
    /// Allowed roll about the bone axis relative to the rest roll, degrees in [0, 360)
    pub twist_limit: f32,
}

impl Default for JointConstraint {
    fn default() -> Self {
        Self {
            cone: ConeBounds::default(),
            twist_limit: DEFAULT_TWIST_DEGREES,
        }
    }
}

impl JointConstraint {
    pub fn new(cone: ConeBounds, twist_limit: f32) -> Self {
        Self { cone, twist_limit }
    }

    pub fn validate(&self) -> Result<(), IkError> {
        let cones = [
            ("cone.x_positive", self.cone.x_positive),
            ("cone.x_negative", self.cone.x_negative),
            ("cone.y_positive", self.cone.y_positive),
            ("cone.y_negative", self.cone.y_negative),
        ];
        for (field, value) in cones {
            if check_cone_degrees(value).is_some() {
                return Err(IkError::InvalidConstraint {
                    field,
                    value,
                    max: MAX_CONE_DEGREES,
                });
            }
        }
        if check_twist_degrees(self.twist_limit).is_some() {
            return Err(IkError::InvalidConstraint {
                field: "twist_limit",
                value: self.twist_limit,
                max: MAX_TWIST_DEGREES,
            });
        }
        Ok(())
    }
}

/// Constraint for every joint of a chain, resolved from the host once.
///
/// Bones without an attached constraint (or with an invalid one) use the
/// default. That substitution is logged and recorded in [`Self::fallbacks`].
#[derive(Debug, Clone)]
pub struct ConstraintTable {
    joints: Vec<JointConstraint>,
    fallbacks: Vec<usize>,
    default: JointConstraint,
}

impl ConstraintTable {
    /// Table from explicit per-joint constraints, no host lookups
    pub fn from_joints(joints: Vec<JointConstraint>, default: JointConstraint) -> Self {
        Self {
            joints,
            fallbacks: Vec::new(),
            default,
        }
    }

    pub fn uniform(len: usize, constraint: JointConstraint) -> Self {
        Self::from_joints(vec![constraint; len], constraint)
    }

    pub fn resolve<H: SceneGraph + ?Sized>(
        host: &H,
        bones: &[BoneId],
        default: JointConstraint,
    ) -> Self {
        let mut joints = Vec::with_capacity(bones.len());
        let mut fallbacks = Vec::new();

        for (i, &bone) in bones.iter().enumerate() {
            let name = host.bone_name(bone).unwrap_or("<unnamed>");
            let constraint = match host.joint_constraint(bone) {
                Some(c) => match c.validate() {
                    Ok(()) => c,
                    Err(e) => {
                        log::warn!("{} ({}) has an invalid joint constraint: {}", name, bone, e);
                        fallbacks.push(i);
                        default
                    }
                },
                None => {
                    log::warn!("{} ({}) is using the default joint constraint", name, bone);
                    fallbacks.push(i);
                    default
                }
            };
            joints.push(constraint);
        }

        Self {
            joints,
            fallbacks,
            default,
        }
    }

    /// Constraint for chain index `index`; out-of-range indices get the default
    pub fn get(&self, index: usize) -> &JointConstraint {
        self.joints.get(index).unwrap_or(&self.default)
    }

    /// Chain indices that fell back to the default constraint
    pub fn fallbacks(&self) -> &[usize] {
        &self.fallbacks
    }

    pub fn default_constraint(&self) -> &JointConstraint {
        &self.default
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

// --- Cone ---

/// Allowed planar offset for a target offset direction at a given reach
pub fn cone_limit(bounds: &ConeBounds, planar: Vec2, reach: f32) -> f32 {
    let tangents = bounds.quadrant_tangents(planar);
    let dir = planar.normalize_or_zero();
    reach * (tangents.x * dir.x.abs() + tangents.y * dir.y.abs())
}

/// A bone direction split against the bone's rest axis.
#[derive(Debug, Clone, Copy)]
pub struct ConeProjection {
    /// Unit rest axis
    pub axis: Vec3,
    /// Component of the direction along `axis` (negative when pointing back)
    pub reach: f32,
    /// Component of the direction perpendicular to `axis`
    pub offset: Vec3,
    /// `offset` in the bone's cone frame
    pub planar: Vec2,
}

/// Unit x and y axes of the cone plane for a bone resting along `axis` with
/// root-relative `rest_orientation`. Together with `axis` they form a
/// right-handed frame.
pub fn cone_frame(axis: Vec3, rest_orientation: Quat) -> (Vec3, Vec3) {
    let local_axis = rest_orientation.inverse() * axis;
    let reference = if local_axis.x.abs() < 0.9 {
        Vec3::X
    } else {
        Vec3::Y
    };
    let reference = rest_orientation * reference;
    let x = (reference - axis * reference.dot(axis)).direction_or(axis.any_orthonormal_vector());
    (x, axis.cross(x))
}

impl ConeProjection {
    pub fn new(direction: Vec3, rest_axis: Vec3, rest_orientation: Quat) -> Self {
        let axis = rest_axis.direction_or(FALLBACK_DIRECTION);
        let reach = direction.dot(axis);
        let offset = direction - axis * reach;
        let (x, y) = cone_frame(axis, rest_orientation);
        let planar = Vec2::new(offset.dot(x), offset.dot(y));
        Self {
            axis,
            reach,
            offset,
            planar,
        }
    }

    /// Allowed offset magnitude at this projection's reach
    pub fn limit(&self, bounds: &ConeBounds) -> f32 {
        cone_limit(bounds, self.planar, self.reach.max(0.0))
    }

    pub fn is_within(&self, bounds: &ConeBounds) -> bool {
        if self.offset.is_degenerate() {
            return self.reach >= 0.0;
        }
        self.reach > 0.0 && self.offset.length() <= self.limit(bounds)
    }

    /// Unit direction on the cone boundary on the same side as `offset`
    pub fn boundary_direction(&self, bounds: &ConeBounds) -> Vec3 {
        let Some(side) = self.offset.try_normalize() else {
            return self.axis;
        };
        let spread = cone_limit(bounds, self.planar, 1.0);
        (self.axis + side * spread).direction_or(self.axis)
    }
}

/// Result of placing a joint under a cone constraint.
#[derive(Debug, Clone, Copy)]
pub struct ConeOutcome {
    /// New joint position, `segment_length` behind the next joint
    pub position: Vec3,
    /// Unit bone direction from the new position toward the next joint
    pub direction: Vec3,
    pub engaged: bool,
}

/// Place `joint` at `segment_length` behind `next`, keeping the bone
/// direction (joint toward next) inside the cone around `rest_direction`,
/// with bounds laid out by `rest_orientation`.
///
/// Inside the cone this is plain length enforcement. Outside, the direction
/// is moved onto the cone boundary on the side it left from; a direction
/// pointing straight back snaps to the rest axis.
pub fn constrain_cone(
    joint: Vec3,
    next: Vec3,
    segment_length: f32,
    bounds: &ConeBounds,
    rest_direction: Vec3,
    rest_orientation: Quat,
) -> ConeOutcome {
    let direction = (next - joint).direction_or(rest_direction);
    let cone = ConeProjection::new(direction, rest_direction, rest_orientation);

    if cone.is_within(bounds) {
        return ConeOutcome {
            position: next - direction * segment_length,
            direction,
            engaged: false,
        };
    }

    let clamped = cone.boundary_direction(bounds);
    ConeOutcome {
        position: next - clamped * segment_length,
        direction: clamped,
        engaged: true,
    }
}

// --- Twist ---

/// Twist magnitude of `current` about `current_axis` minus the rest twist
/// magnitude, in degrees.
pub fn twist_difference(current: Quat, current_axis: Vec3, rest: Quat, rest_axis: Vec3) -> f32 {
    current.twist_degrees(current_axis).abs() - rest.twist_degrees(rest_axis).abs()
}

/// Root-relative orientation of a bone whose segment now points along
/// `segment`, before any twist correction.
pub fn swung_orientation(rest_direction: Vec3, rest_orientation: Quat, segment: Vec3) -> Quat {
    from_to_rotation(rest_direction, segment) * rest_orientation
}

/// Result of the twist check on one segment.
#[derive(Debug, Clone, Copy)]
pub struct TwistCorrection {
    /// Back-solved position of the upstream joint
    pub previous: Vec3,
    /// Rotation about the segment axis to pre-multiply onto the bone orientation
    pub correction: Quat,
    pub engaged: bool,
    /// Twist difference before correction, degrees
    pub difference: f32,
}

impl TwistCorrection {
    fn unchanged(previous: Vec3, difference: f32) -> Self {
        Self {
            previous,
            correction: Quat::IDENTITY,
            engaged: false,
            difference,
        }
    }
}

/// Clamp the twist of the bone spanning `previous -> joint`.
///
/// The bone's candidate orientation is its rest orientation swung from
/// `rest_direction` onto the current segment. If its twist differs from the
/// rest twist by more than `twist_limit` degrees, the excess becomes a
/// rotation about the segment axis and the upstream joint is re-derived as
/// `joint - correction * segment`, at exactly `segment_length`.
pub fn constrain_twist(
    previous: Vec3,
    joint: Vec3,
    segment_length: f32,
    rest_direction: Vec3,
    rest_orientation: Quat,
    twist_limit: f32,
) -> TwistCorrection {
    let segment = joint - previous;
    if segment.is_degenerate() {
        return TwistCorrection::unchanged(previous, 0.0);
    }

    let orientation = swung_orientation(rest_direction, rest_orientation, segment);
    let current = orientation.twist_degrees(segment);
    let rest = rest_orientation.twist_degrees(rest_direction).abs();
    let difference = current.abs() - rest;

    if difference.abs() <= twist_limit {
        return TwistCorrection::unchanged(previous, difference);
    }

    let target_magnitude = if difference > 0.0 {
        rest + twist_limit
    } else {
        rest - twist_limit
    };
    let sign = if current < 0.0 { -1.0 } else { 1.0 };
    let theta = sign * target_magnitude - current;

    let axis = segment.direction_or(rest_direction);
    let correction = Quat::from_axis_angle(axis, theta.to_radians());
    let dir = (correction * segment).direction_or(axis);

    TwistCorrection {
        previous: joint - dir * segment_length,
        correction,
        engaged: true,
        difference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bone::Skeleton;

    const TOL: f32 = 1e-4;

    #[test]
    fn test_default_constraint_is_valid() {
        assert!(JointConstraint::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bounds() {
        let c = JointConstraint::new(ConeBounds::new(30.0, 90.0, 10.0, 10.0), 45.0);
        match c.validate() {
            Err(IkError::InvalidConstraint { field, .. }) => assert_eq!(field, "cone.x_negative"),
            other => panic!("expected InvalidConstraint, got {:?}", other),
        }

        let c = JointConstraint::new(ConeBounds::uniform(10.0), -1.0);
        assert!(c.validate().is_err());
        let c = JointConstraint::new(ConeBounds::uniform(10.0), 360.0);
        assert!(c.validate().is_err());
        let c = JointConstraint::new(ConeBounds::uniform(f32::NAN), 10.0);
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_constraint_json_defaults() {
        let c: JointConstraint =
            serde_json::from_str(r#"{ "cone": { "x_positive": 10.0 } }"#).unwrap();
        assert_eq!(c.cone.x_positive, 10.0);
        assert_eq!(c.cone.y_negative, DEFAULT_CONE_DEGREES);
        assert_eq!(c.twist_limit, DEFAULT_TWIST_DEGREES);
    }

    #[test]
    fn test_quadrant_selection() {
        let bounds = ConeBounds::new(10.0, 20.0, 30.0, 40.0);
        let t = bounds.quadrant_tangents(Vec2::new(1.0, 1.0));
        assert!((t.x - 10f32.to_radians().tan()).abs() < TOL);
        assert!((t.y - 30f32.to_radians().tan()).abs() < TOL);
        let t = bounds.quadrant_tangents(Vec2::new(-1.0, -1.0));
        assert!((t.x - 20f32.to_radians().tan()).abs() < TOL);
        assert!((t.y - 40f32.to_radians().tan()).abs() < TOL);
    }

    #[test]
    fn test_cone_limit_blends_axes() {
        let bounds = ConeBounds::new(45.0, 45.0, 0.0, 0.0);
        // Pure x offset uses only the x bound
        assert!((cone_limit(&bounds, Vec2::new(2.0, 0.0), 3.0) - 3.0).abs() < TOL);
        // Pure y offset uses only the (zero) y bound
        assert!(cone_limit(&bounds, Vec2::new(0.0, -2.0), 3.0).abs() < TOL);
        // Diagonal blends both
        let diagonal = cone_limit(&bounds, Vec2::new(1.0, 1.0), 1.0);
        assert!((diagonal - std::f32::consts::FRAC_1_SQRT_2).abs() < TOL);
        // No offset, no limit needed
        assert_eq!(cone_limit(&bounds, Vec2::ZERO, 1.0), 0.0);
        // Negative quadrants never produce a negative limit
        let bounds = ConeBounds::uniform(30.0);
        assert!(cone_limit(&bounds, Vec2::new(-1.0, -1.0), 1.0) > 0.0);
    }

    #[test]
    fn test_cone_projection_frame() {
        let cone = ConeProjection::new(
            Vec3::new(0.5, -0.25, 2.0),
            Vec3::new(0.0, 0.0, 3.0),
            Quat::IDENTITY,
        );
        assert!((cone.axis - Vec3::Z).length() < TOL);
        assert!((cone.reach - 2.0).abs() < TOL);
        assert!((cone.planar - Vec2::new(0.5, -0.25)).length() < TOL);
        assert!(cone.offset.dot(cone.axis).abs() < TOL);
    }

    fn tilted(degrees: f32) -> Vec3 {
        let angle = degrees.to_radians();
        Vec3::new(angle.sin(), 0.0, angle.cos())
    }

    #[test]
    fn test_cone_not_engaged_inside_bounds() {
        let next = Vec3::new(0.0, 0.0, 1.0);
        let joint = next - tilted(20.0);
        let outcome = constrain_cone(joint, next, 1.0, &ConeBounds::uniform(30.0), Vec3::Z, Quat::IDENTITY);
        assert!(!outcome.engaged);
        assert!((outcome.position - joint).length() < TOL);
        assert!((outcome.direction - tilted(20.0)).length() < TOL);
    }

    #[test]
    fn test_cone_clamps_to_boundary() {
        let next = Vec3::new(0.0, 0.0, 1.0);
        let joint = next - tilted(60.0) * 2.0;
        let bounds = ConeBounds::uniform(30.0);

        let outcome = constrain_cone(joint, next, 1.0, &bounds, Vec3::Z, Quat::IDENTITY);
        assert!(outcome.engaged);
        assert!((outcome.direction - tilted(30.0)).length() < TOL);
        // Segment length enforced, bound met
        assert!(((outcome.position - next).length() - 1.0).abs() < TOL);
        let after = ConeProjection::new(outcome.direction, Vec3::Z, Quat::IDENTITY);
        assert!(after.offset.length() <= after.limit(&bounds) + TOL);
    }

    #[test]
    fn test_cone_respects_asymmetric_quadrants() {
        let next = Vec3::ZERO;
        let bounds = ConeBounds::new(60.0, 10.0, 45.0, 45.0);

        let outcome = constrain_cone(next - tilted(30.0), next, 1.0, &bounds, Vec3::Z, Quat::IDENTITY);
        assert!(!outcome.engaged);

        let outcome = constrain_cone(next - tilted(-30.0), next, 1.0, &bounds, Vec3::Z, Quat::IDENTITY);
        assert!(outcome.engaged);
        assert!((outcome.direction - tilted(-10.0)).length() < TOL);
    }

    #[test]
    fn test_cone_frame_rolls_with_bone() {
        // Rolled a quarter turn about its rest axis, the bone's +X points along world +Y
        let roll = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let (x, y) = cone_frame(Vec3::Z, roll);
        assert!((x - Vec3::Y).length() < TOL);
        assert!((y - Vec3::NEG_X).length() < TOL);

        let bounds = ConeBounds::new(60.0, 10.0, 10.0, 10.0);
        let next = Vec3::ZERO;
        let toward_y = Vec3::new(0.0, 30f32.to_radians().sin(), 30f32.to_radians().cos());
        let outcome = constrain_cone(next - toward_y, next, 1.0, &bounds, Vec3::Z, roll);
        assert!(!outcome.engaged);
        // The same swing lands on the narrow side without the roll
        let outcome = constrain_cone(next - toward_y, next, 1.0, &bounds, Vec3::Z, Quat::IDENTITY);
        assert!(outcome.engaged);
    }

    #[test]
    fn test_cone_frame_for_bone_along_own_x() {
        let (x, y) = cone_frame(Vec3::X, Quat::IDENTITY);
        assert!((x - Vec3::Y).length() < TOL);
        assert!((y - Vec3::Z).length() < TOL);

        // Pointing backward along -Z keeps a proper frame with no flip
        let back = Quat::from_rotation_y(std::f32::consts::PI);
        let (x, y) = cone_frame(Vec3::NEG_Z, back);
        assert!((x - Vec3::NEG_X).length() < TOL);
        assert!((y - Vec3::Y).length() < TOL);
        assert!((x.cross(y) - Vec3::NEG_Z).length() < TOL);
    }

    #[test]
    fn test_cone_pointing_backward_is_engaged() {
        let bounds = ConeBounds::uniform(30.0);
        let next = Vec3::ZERO;
        let backward = Vec3::new(0.6, 0.0, -0.8);
        let outcome = constrain_cone(next - backward, next, 1.0, &bounds, Vec3::Z, Quat::IDENTITY);
        assert!(outcome.engaged);
        assert!((outcome.direction - tilted(30.0)).length() < TOL);

        // Straight back has no side to bend toward
        let outcome = constrain_cone(next + Vec3::Z, next, 1.0, &bounds, Vec3::Z, Quat::IDENTITY);
        assert!(outcome.engaged);
        assert!((outcome.direction - Vec3::Z).length() < TOL);
    }

    #[test]
    fn test_cone_handles_coincident_points() {
        let outcome = constrain_cone(
            Vec3::ONE,
            Vec3::ONE,
            0.5,
            &ConeBounds::uniform(20.0),
            Vec3::X,
            Quat::IDENTITY,
        );
        assert!(outcome.position.is_finite());
        assert!(!outcome.engaged);
        assert!((outcome.position - (Vec3::ONE - Vec3::X * 0.5)).length() < TOL);
    }

    #[test]
    fn test_twist_within_limit_is_untouched() {
        let result = constrain_twist(
            Vec3::ZERO,
            Vec3::new(0.0, 1.0, 0.0),
            1.0,
            Vec3::Y,
            Quat::from_rotation_y(0.2),
            30.0,
        );
        assert!(!result.engaged);
        assert_eq!(result.correction, Quat::IDENTITY);
        assert_eq!(result.previous, Vec3::ZERO);
    }

    #[test]
    fn test_twist_clamped_to_limit() {
        // A bone resting along +Z but tilted about +X has no twist about +Z.
        // Swinging its segment onto +X turns that tilt into a twist about +X
        // of the same angle.
        let rest_direction = Vec3::Z;
        for tilt in [50.0f32, -50.0] {
            let rest_orientation = Quat::from_axis_angle(Vec3::X, tilt.to_radians());
            let result = constrain_twist(
                Vec3::ZERO,
                Vec3::X,
                1.0,
                rest_direction,
                rest_orientation,
                20.0,
            );
            assert!(result.engaged);
            assert!((result.difference - 50.0).abs() < 1e-2, "difference = {}", result.difference);

            let swung = swung_orientation(rest_direction, rest_orientation, Vec3::X);
            let corrected = result.correction * swung;
            assert!((corrected.twist_degrees(Vec3::X) - tilt.signum() * 20.0).abs() < 1e-2);
            let after = twist_difference(corrected, Vec3::X, rest_orientation, rest_direction);
            assert!((after - 20.0).abs() < 1e-2);
            assert!((result.previous - Vec3::ZERO).length() < TOL);
        }
    }

    #[test]
    fn test_twist_correction_reaches_boundary() {
        // Rest bone points along +X with a compound tilt; swinging it onto +Z
        // changes its twist by some amount that a 1 degree limit catches.
        let rest_direction = Vec3::X;
        let rest_orientation =
            Quat::from_axis_angle(Vec3::Z, 0.6) * Quat::from_axis_angle(Vec3::X, 0.3);
        let previous = Vec3::ZERO;
        let joint = Vec3::new(0.0, 0.0, 2.0);
        let limit = 1.0;

        let segment = joint - previous;
        let before = twist_difference(
            swung_orientation(rest_direction, rest_orientation, segment),
            segment,
            rest_orientation,
            rest_direction,
        );
        let result = constrain_twist(previous, joint, 2.0, rest_direction, rest_orientation, limit);

        assert!((result.difference - before).abs() < 1e-3);
        if before.abs() > limit {
            assert!(result.engaged);
            let corrected = result.correction * swung_orientation(rest_direction, rest_orientation, segment);
            let after = twist_difference(corrected, segment, rest_orientation, rest_direction);
            assert!(after.abs() <= limit + 1e-2, "after = {}", after);
        } else {
            assert!(!result.engaged);
        }
        // Upstream joint keeps the segment rigid and in place
        assert!(((joint - result.previous).length() - 2.0).abs() < TOL);
        assert!((result.previous - previous).length() < 1e-3);
    }

    #[test]
    fn test_twist_correction_is_about_segment_axis() {
        let segment_axis = Vec3::new(1.0, 1.0, 0.0).normalize();
        let rest_direction = Vec3::X;
        let rest_orientation = Quat::from_axis_angle(Vec3::Y, 1.0);
        let result = constrain_twist(
            Vec3::ZERO,
            segment_axis * 1.5,
            1.5,
            rest_direction,
            rest_orientation,
            0.0,
        );
        if result.engaged {
            // Rotating the segment axis by the correction leaves it in place
            assert!((result.correction * segment_axis - segment_axis).length() < TOL);
        }
    }

    #[test]
    fn test_twist_degenerate_segment() {
        let result = constrain_twist(Vec3::ONE, Vec3::ONE, 1.0, Vec3::Y, Quat::IDENTITY, 0.0);
        assert!(!result.engaged);
        assert_eq!(result.previous, Vec3::ONE);
    }

    #[test]
    fn test_table_falls_back_to_default() {
        let (mut skeleton, ids) =
            Skeleton::from_points("line", &[Vec3::ZERO, Vec3::X, Vec3::new(2.0, 0.0, 0.0)]);
        let special = JointConstraint::new(ConeBounds::uniform(15.0), 30.0);
        skeleton.set_constraint(ids[1], Some(special)).unwrap();

        let default = JointConstraint::new(ConeBounds::uniform(60.0), 90.0);
        let table = ConstraintTable::resolve(&skeleton, &ids, default);
        assert_eq!(table.len(), 3);
        assert_eq!(*table.get(0), default);
        assert_eq!(*table.get(1), special);
        assert_eq!(*table.get(2), default);
        assert_eq!(table.fallbacks(), &[0, 2]);
        assert_eq!(*table.get(99), default);
    }

    #[test]
    fn test_uniform_table() {
        let limit = JointConstraint::new(ConeBounds::uniform(20.0), 15.0);
        let table = ConstraintTable::uniform(4, limit);
        assert_eq!(table.len(), 4);
        assert!(table.fallbacks().is_empty());
        assert_eq!(*table.get(3), limit);
        assert_eq!(*table.default_constraint(), limit);
    }
}
