use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// WGS84 semi-major axis (m)
pub const WGS84_A: f64 = 6378137.0;
/// WGS84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257223563;
/// WGS84 first eccentricity squared
pub const WGS84_E2: f64 = 2.0 * WGS84_F - WGS84_F * WGS84_F;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GeodeticPosition {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

impl GeodeticPosition {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
        }
    }

    /// Earth-centered earth-fixed position in meters.
    pub fn to_ecef(&self) -> Vector3<f64> {
        let lat = self.latitude_deg.to_radians();
        let lon = self.longitude_deg.to_radians();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();

        // prime vertical radius of curvature
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

        Vector3::new(
            (n + self.altitude_m) * cos_lat * cos_lon,
            (n + self.altitude_m) * cos_lat * sin_lon,
            (n * (1.0 - WGS84_E2) + self.altitude_m) * sin_lat,
        )
    }

    /// Straight line distance in meters, through the earth if need be.
    pub fn distance_to(&self, other: &GeodeticPosition) -> f64 {
        ecef_distance(&self.to_ecef(), &other.to_ecef())
    }
}

pub fn ecef_distance(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    (a - b).norm()
}
