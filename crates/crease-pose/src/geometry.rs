//! Joint angle geometry

use crate::Point2;

/// Arms shorter than this are treated as degenerate
const MIN_ARM: f32 = 1e-6;

/// Included angle at `joint`, in degrees within [0, 180]
///
/// Returns 0.0 when either arm has no length (coincident points).
pub fn joint_angle(proximal: Point2, joint: Point2, distal: Point2) -> f32 {
    let a = proximal - joint;
    let b = distal - joint;
    if a.length() < MIN_ARM || b.length() < MIN_ARM {
        return 0.0;
    }
    let cross = a.x * b.y - a.y * b.x;
    cross.abs().atan2(a.dot(b)).to_degrees().clamp(0.0, 180.0)
}
