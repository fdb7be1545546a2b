//! Mirror and quarter-turn normalization of a net.

use glam::DVec2;

use crate::net::Net;

/// Orientation fix-up applied to a finished net.
///
/// Mirrors come first, then the optional 90° counter-clockwise turn. Both
/// act about the centre of the net's bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlanarTransform {
    /// Negate x about the box centre.
    pub mirror_x: bool,
    /// Negate y about the box centre.
    pub mirror_y: bool,
    /// Rotate `(x, y) -> (-y, x)` about the box centre.
    pub rot90_left: bool,
}

impl PlanarTransform {
    /// No-op transform.
    pub const IDENTITY: Self = Self {
        mirror_x: false,
        mirror_y: false,
        rot90_left: false,
    };

    /// Whether applying this transform changes nothing.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Map one point given the box centre `center`.
    #[must_use]
    pub fn apply_point(&self, p: DVec2, center: DVec2) -> DVec2 {
        let mut d = p - center;
        if self.mirror_x {
            d.x = -d.x;
        }
        if self.mirror_y {
            d.y = -d.y;
        }
        if self.rot90_left {
            d = d.perp();
        }
        center + d
    }

    /// Apply the transform about the net's current bounding-box centre.
    #[must_use]
    pub fn apply(&self, net: &Net) -> Net {
        let Some(bounds) = net.bounds() else {
            return net.clone();
        };
        let center = bounds.center();
        net.map_points(|p| self.apply_point(p, center))
    }

    /// Move to the origin, transform, then move to the origin again so the
    /// result's bounding box starts at `(0, 0)`.
    #[must_use]
    pub fn normalize(&self, net: &Net) -> Net {
        self.apply(&net.at_origin()).at_origin()
    }
}
