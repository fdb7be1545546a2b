//! Rigid rotations of the whole solid.

use glam::{DQuat, DVec3};

/// Shortest-arc rotation taking direction `from` onto direction `to`.
///
/// Inputs need not be normalised. Antipodal inputs rotate by 180° about an
/// arbitrary axis orthogonal to `from`.
#[must_use]
pub fn rotation_between(from: DVec3, to: DVec3) -> DQuat {
    DQuat::from_rotation_arc(from.normalize(), to.normalize())
}

/// Rotation by `angle_deg` about `axis` (right-handed).
#[must_use]
pub fn twist_about(axis: DVec3, angle_deg: f64) -> DQuat {
    DQuat::from_axis_angle(axis.normalize(), angle_deg.to_radians())
}
