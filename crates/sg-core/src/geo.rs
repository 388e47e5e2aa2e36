//! Geographic coordinate type and spatial utilities.
//!
//! `GeoPoint` uses `f64` latitude/longitude.  Distances feed strict
//! comparisons (`< radius`, `< 200 m`) whose results must be reproducible,
//! so single precision is not good enough here.

use std::fmt;

use crate::{CoreError, CoreResult};

/// Earth radius used for great-circle distances, in metres.
///
/// Equatorial radius as used by Neo4j for WGS-84 points; association lengths
/// and circle queries agree with data exported from a Neo4j deployment.
pub const EARTH_RADIUS_M: f64 = 6_378_140.0;

/// Relative slack added to degree windows so that points sitting exactly on
/// the analytic boundary are never lost to floating-point rounding.  The exact
/// haversine filter runs afterwards.
const WINDOW_SLACK: f64 = 1e-9;

// ── GeoPoint ──────────────────────────────────────────────────────────────────

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Construct a point, rejecting NaN and out-of-range coordinates.
    pub fn checked(lat: f64, lon: f64) -> CoreResult<Self> {
        let p = Self { lat, lon };
        if p.is_valid() {
            Ok(p)
        } else {
            Err(CoreError::InvalidCoordinate { lat, lon })
        }
    }

    /// `true` if both coordinates are finite and within ±90 / ±180.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// `[lat, lon]` pair, the coordinate order used by the spatial index.
    #[inline]
    pub fn as_array(self) -> [f64; 2] {
        [self.lat, self.lon]
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

// ── BoundingBox ───────────────────────────────────────────────────────────────

/// Closed latitude/longitude box.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Validated constructor: all bounds finite and in range, min ≤ max.
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> CoreResult<Self> {
        GeoPoint::checked(lat_min, lon_min)?;
        GeoPoint::checked(lat_max, lon_max)?;
        if lat_min > lat_max || lon_min > lon_max {
            return Err(CoreError::InvalidParameter(format!(
                "bounding box is inverted: lat [{lat_min}, {lat_max}], lon [{lon_min}, {lon_max}]"
            )));
        }
        Ok(Self { lat_min, lat_max, lon_min, lon_max })
    }

    /// Inclusive containment test on both axes.
    #[inline]
    pub fn contains(&self, p: GeoPoint) -> bool {
        p.lat >= self.lat_min
            && p.lat <= self.lat_max
            && p.lon >= self.lon_min
            && p.lon <= self.lon_max
    }

    /// Smallest degree window that is guaranteed to contain every point whose
    /// great-circle distance from `center` is at most `radius_m`.
    ///
    /// Windows that would wrap the antimeridian or reach a pole widen to the
    /// full longitude range; callers filter by exact distance afterwards.
    pub fn around(center: GeoPoint, radius_m: f64) -> Self {
        let delta = (radius_m / EARTH_RADIUS_M) * (1.0 + WINDOW_SLACK);
        let delta_deg = delta.to_degrees();

        let lat_min = (center.lat - delta_deg).max(-90.0);
        let lat_max = (center.lat + delta_deg).min(90.0);

        let cos_lat = center.lat.to_radians().cos();
        let sin_delta = delta.sin();
        let full = Self { lat_min, lat_max, lon_min: -180.0, lon_max: 180.0 };

        if delta >= std::f64::consts::FRAC_PI_2 || sin_delta >= cos_lat {
            return full;
        }

        let lon_delta = (sin_delta / cos_lat).asin().to_degrees() * (1.0 + WINDOW_SLACK);
        let lon_min = center.lon - lon_delta;
        let lon_max = center.lon + lon_delta;
        if lon_min < -180.0 || lon_max > 180.0 {
            return full;
        }
        Self { lat_min, lat_max, lon_min, lon_max }
    }
}
