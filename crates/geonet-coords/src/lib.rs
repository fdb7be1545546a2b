//! Geographic coordinates on the unit sphere.
//!
//! Latitude/longitude in degrees, conversion to and from unit vectors, and the
//! rigid rotations used to orient the solid before it is cut into nets.

mod latlon;
mod rotation;

pub use latlon::{LatLon, lon_distance, wrap_lon};
pub use rotation::{rotation_between, twist_about};
