//! Latitude/longitude pairs and their unit-vector form.
//!
//! Convention: `z` points at the north pole, longitude 0 lies in the `+x`
//! half of the `xz` plane and longitude increases towards `+y`.

use std::fmt;

use glam::DVec3;

/// A point on the sphere in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLon {
    /// Latitude in degrees. Range: \[-90, 90\].
    pub lat: f64,
    /// Longitude in degrees. Range: \[-180, 180\].
    pub lon: f64,
}

impl LatLon {
    /// Create a new coordinate. No normalisation is applied.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Unit vector pointing at this coordinate.
    #[must_use]
    pub fn to_unit(self) -> DVec3 {
        let lat = self.lat.to_radians();
        let lon = self.lon.to_radians();
        let cl = lat.cos();
        DVec3::new(cl * lon.cos(), cl * lon.sin(), lat.sin())
    }

    /// Coordinate of a unit vector. The input is not renormalised; `z` is
    /// clamped so that tiny drift past ±1 does not produce `NaN`.
    #[must_use]
    pub fn from_unit(p: DVec3) -> Self {
        let lat = p.z.clamp(-1.0, 1.0).asin().to_degrees();
        let lon = p.y.atan2(p.x).to_degrees();
        Self { lat, lon }
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lat_dir = if self.lat >= 0.0 { "N" } else { "S" };
        let lon_dir = if self.lon >= 0.0 { "E" } else { "W" };
        write!(
            f,
            "{:.2}\u{00B0}{}, {:.2}\u{00B0}{}",
            self.lat.abs(),
            lat_dir,
            self.lon.abs(),
            lon_dir
        )
    }
}

/// Wrap a longitude into `[-180, 180)`.
#[inline]
#[must_use]
pub fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Shortest angular distance between two longitudes, in `[0, 180]`.
#[inline]
#[must_use]
pub fn lon_distance(a: f64, b: f64) -> f64 {
    wrap_lon(a - b).abs()
}
