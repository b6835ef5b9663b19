//! Fixed-point coordinates and spatial utilities.
//!
//! Every coordinate the stores keep is a fixed-point degree: the floating
//! value multiplied by [`FIXED_FACTOR`] and rounded to an `i32`.  One unit is
//! 1e-7 degrees, about 1.1 cm of latitude, and ±180° fits comfortably in
//! `i32`.  Distances and projections convert back to `f64` at the point of
//! use so that stored geometry never drifts.

use crate::{CoreError, CoreResult};

/// Scale between floating degrees and fixed-point degrees.
pub const FIXED_FACTOR: f64 = 1e7;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Length of one degree of latitude on the mean sphere, in metres.
pub const METERS_PER_DEGREE_LAT: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Convert floating degrees to fixed-point degrees (round to nearest).
#[inline]
pub fn floating_to_fixed(degrees: f64) -> i32 {
    (degrees * FIXED_FACTOR).round() as i32
}

/// Convert fixed-point degrees back to floating degrees.
#[inline]
pub fn fixed_to_floating(fixed: i32) -> f64 {
    fixed as f64 / FIXED_FACTOR
}

/// Length of one degree of longitude at `lat_degrees`, in metres.
#[inline]
pub fn meters_per_degree_lon(lat_degrees: f64) -> f64 {
    METERS_PER_DEGREE_LAT * lat_degrees.to_radians().cos()
}

// ── GeoPoint ──────────────────────────────────────────────────────────────────

/// A WGS-84 coordinate in floating degrees, as it arrives from a query.
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

    /// Like [`new`](Self::new) but rejects non-finite or out-of-range degrees.
    pub fn checked(lat: f64, lon: f64) -> CoreResult<Self> {
        let valid = lat.is_finite() && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        if valid {
            Ok(Self { lat, lon })
        } else {
            Err(CoreError::CoordinateOutOfRange { lat, lon })
        }
    }

    #[inline]
    pub fn to_fixed(self) -> FixedPoint {
        FixedPoint::new(floating_to_fixed(self.lat), floating_to_fixed(self.lon))
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

    /// The point `north_m` metres north and `east_m` metres east of `self`
    /// (flat-earth offset, fine for the few hundred metres used in tests and
    /// search radii).
    pub fn offset_m(self, north_m: f64, east_m: f64) -> GeoPoint {
        GeoPoint::new(
            self.lat + north_m / METERS_PER_DEGREE_LAT,
            self.lon + east_m / meters_per_degree_lon(self.lat),
        )
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.7}, {:.7})", self.lat, self.lon)
    }
}

// ── FixedPoint ────────────────────────────────────────────────────────────────

/// A coordinate in fixed-point degrees, as the stores keep it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixedPoint {
    pub lat: i32,
    pub lon: i32,
}

impl FixedPoint {
    #[inline]
    pub fn new(lat: i32, lon: i32) -> Self {
        Self { lat, lon }
    }

    #[inline]
    pub fn to_floating(self) -> GeoPoint {
        GeoPoint::new(fixed_to_floating(self.lat), fixed_to_floating(self.lon))
    }

    #[inline]
    pub fn distance_m(self, other: FixedPoint) -> f64 {
        self.to_floating().distance_m(other.to_floating())
    }
}

// ── Envelope ──────────────────────────────────────────────────────────────────

/// Axis-aligned bounding box in fixed-point degrees.  Bounds are inclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Envelope {
    pub min_lon: i32,
    pub min_lat: i32,
    pub max_lon: i32,
    pub max_lat: i32,
}

impl Envelope {
    /// Degenerate envelope covering one point.
    pub fn of_point(p: FixedPoint) -> Self {
        Self { min_lon: p.lon, min_lat: p.lat, max_lon: p.lon, max_lat: p.lat }
    }

    /// Smallest envelope covering all `points`, or `None` if there are none.
    pub fn of_points(points: &[FixedPoint]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut env = Envelope::of_point(*first);
        for p in rest {
            env.expand_to_include(*p);
        }
        Some(env)
    }

    /// Envelope from floating north/south/east/west bounds, in any order.
    pub fn from_corners(north: f64, south: f64, east: f64, west: f64) -> Self {
        let (n, s) = (floating_to_fixed(north), floating_to_fixed(south));
        let (e, w) = (floating_to_fixed(east), floating_to_fixed(west));
        Self {
            min_lon: e.min(w),
            min_lat: n.min(s),
            max_lon: e.max(w),
            max_lat: n.max(s),
        }
    }

    /// Envelope reaching at least `radius_m` metres from `center` in every
    /// direction.  The longitude span widens with latitude.
    pub fn around(center: GeoPoint, radius_m: f64) -> Self {
        let d_lat = radius_m / METERS_PER_DEGREE_LAT;
        // Keep the longitude span finite near the poles.
        let d_lon = radius_m / meters_per_degree_lon(center.lat).max(1.0);
        let c = center.to_fixed();
        let (dy, dx) = (floating_to_fixed(d_lat), floating_to_fixed(d_lon));
        Self {
            min_lon: c.lon.saturating_sub(dx),
            min_lat: c.lat.saturating_sub(dy),
            max_lon: c.lon.saturating_add(dx),
            max_lat: c.lat.saturating_add(dy),
        }
    }

    pub fn expand_to_include(&mut self, p: FixedPoint) {
        self.min_lon = self.min_lon.min(p.lon);
        self.min_lat = self.min_lat.min(p.lat);
        self.max_lon = self.max_lon.max(p.lon);
        self.max_lat = self.max_lat.max(p.lat);
    }

    #[inline]
    pub fn contains(&self, p: FixedPoint) -> bool {
        p.lon >= self.min_lon && p.lon <= self.max_lon
            && p.lat >= self.min_lat && p.lat <= self.max_lat
    }

    #[inline]
    pub fn intersects(&self, other: &Envelope) -> bool {
        self.min_lon <= other.max_lon && other.min_lon <= self.max_lon
            && self.min_lat <= other.max_lat && other.min_lat <= self.max_lat
    }
}
