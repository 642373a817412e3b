//! Vector and rotation helpers used by the solver. All functions are total: degenerate (zero-length)
//! input yields a stable result instead of `NaN`.

use nalgebra::{Unit, UnitQuaternion, Vector3};
use std::f32::consts::PI;

/// Norm below which a vector is treated as zero.
pub const DEGENERATE_EPSILON: f32 = 1e-6;

/// Normalizes `vector`, or falls back to the normalized `fallback`, or to the x axis if both are
/// degenerate.
pub fn normalize_or(vector: &Vector3<f32>, fallback: &Vector3<f32>) -> Vector3<f32> {
    vector
        .try_normalize(DEGENERATE_EPSILON)
        .or_else(|| fallback.try_normalize(DEGENERATE_EPSILON))
        .unwrap_or_else(Vector3::x)
}

/// Normalizes `vector` or returns the zero vector.
pub fn normalize_or_zero(vector: &Vector3<f32>) -> Vector3<f32> {
    vector.try_normalize(DEGENERATE_EPSILON).unwrap_or_else(Vector3::zeros)
}

/// Some unit vector perpendicular to `vector`. Only meaningful for non-zero input.
pub fn any_orthogonal(vector: &Vector3<f32>) -> Unit<Vector3<f32>> {
    // Crossing with the axis of the smallest component is never close to parallel
    let axis = if vector.x.abs() <= vector.y.abs() && vector.x.abs() <= vector.z.abs() {
        Vector3::x()
    } else if vector.y.abs() <= vector.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };
    Unit::try_new(vector.cross(&axis), DEGENERATE_EPSILON).unwrap_or_else(Vector3::y_axis)
}

/// Closest point to `point` on the plane through `origin` with unit `normal`.
pub fn project_on_plane(
    point: &Vector3<f32>,
    origin: &Vector3<f32>,
    normal: &Unit<Vector3<f32>>,
) -> Vector3<f32> {
    point - normal.into_inner() * normal.dot(&(point - origin))
}

/// Angle in radians from `from` to `to`, positive when the rotation is counter-clockwise about
/// `axis`. Zero if either vector is degenerate.
pub fn signed_angle(from: &Vector3<f32>, to: &Vector3<f32>, axis: &Vector3<f32>) -> f32 {
    let denominator = from.norm() * to.norm();
    if denominator < DEGENERATE_EPSILON * DEGENERATE_EPSILON {
        return 0.0;
    }
    let angle = (from.dot(to) / denominator).clamp(-1.0, 1.0).acos();
    if axis.dot(&from.cross(to)) < 0.0 {
        -angle
    } else {
        angle
    }
}

/// Minimal rotation carrying the direction of `from` onto the direction of `to`.
///
/// Identity if either vector is degenerate; a half turn about an arbitrary perpendicular axis if
/// they are antiparallel.
pub fn from_to_rotation(from: &Vector3<f32>, to: &Vector3<f32>) -> UnitQuaternion<f32> {
    let (Some(from), Some(to)) = (
        from.try_normalize(DEGENERATE_EPSILON),
        to.try_normalize(DEGENERATE_EPSILON),
    ) else {
        return UnitQuaternion::identity();
    };
    UnitQuaternion::rotation_between(&from, &to)
        .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&any_orthogonal(&from), PI))
}

/// Rotates `point` about the line through `pivot` along `axis`.
pub fn rotate_about(
    point: &Vector3<f32>,
    pivot: &Vector3<f32>,
    axis: &Unit<Vector3<f32>>,
    angle: f32,
) -> Vector3<f32> {
    UnitQuaternion::from_axis_angle(axis, angle) * (point - pivot) + pivot
}
