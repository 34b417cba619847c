//! Utility functions for coordinate projection, tolerances and display formatting

use crate::LatLng;
use geo::Coord;

/// Length of one degree of latitude in meters (spherical approximation)
pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Distance tolerance in meters used by every overlap comparison.
/// Shapes closer than this are considered touching, not overlapping.
pub const OVERLAP_EPSILON_M: f64 = 0.1;

/// Planar areas at or below this value (m²) are treated as degenerate
pub const DEGENERATE_AREA_M2: f64 = 1e-6;

/// Deepest coordinate nesting accepted by the normalizer
pub const MAX_NESTING_DEPTH: usize = 8;

/// Valid latitude range in degrees
pub const MAX_LATITUDE: f64 = 90.0;

/// Valid longitude range in degrees
pub const MAX_LONGITUDE: f64 = 180.0;

/// Wrap a longitude (or longitude difference) into (-180, 180]
#[inline(always)]
pub fn wrap_longitude(lng: f64) -> f64 {
    if lng > -MAX_LONGITUDE && lng <= MAX_LONGITUDE {
        return lng;
    }
    let wrapped = (lng + MAX_LONGITUDE).rem_euclid(2.0 * MAX_LONGITUDE) - MAX_LONGITUDE;
    if wrapped == -MAX_LONGITUDE {
        MAX_LONGITUDE
    } else {
        wrapped
    }
}

/// Length of one degree of longitude in meters at the given latitude
#[inline(always)]
pub fn meters_per_degree_lng(lat: f64) -> f64 {
    METERS_PER_DEGREE_LAT * lat.to_radians().cos()
}

/// Equirectangular projection around a fixed origin.
///
/// Maps (lat, lng) to planar meters (x east, y north) using the meters-per-degree
/// factors at the origin latitude. Accurate for extents of a few kilometers.
/// Longitude differences are taken the short way round, so shapes crossing the
/// antimeridian stay contiguous.
#[derive(Debug, Clone, Copy)]
pub struct LocalProjection {
    origin: LatLng,
    meters_per_degree_lng: f64,
}

impl LocalProjection {
    /// Create a projection centered at `origin`
    pub fn new(origin: LatLng) -> Self {
        Self {
            origin,
            meters_per_degree_lng: meters_per_degree_lng(origin.lat),
        }
    }

    /// Create a projection centered halfway between two points.
    ///
    /// The result does not depend on argument order.
    pub fn between(a: LatLng, b: LatLng) -> Self {
        let (a, b) = if (a.lat, a.lng) <= (b.lat, b.lng) {
            (a, b)
        } else {
            (b, a)
        };
        let lng = wrap_longitude(a.lng + wrap_longitude(b.lng - a.lng) / 2.0);
        Self::new(LatLng::new((a.lat + b.lat) / 2.0, lng))
    }

    /// Project a geographic point to planar meters
    #[inline(always)]
    pub fn project(&self, point: LatLng) -> Coord<f64> {
        Coord {
            x: wrap_longitude(point.lng - self.origin.lng) * self.meters_per_degree_lng,
            y: (point.lat - self.origin.lat) * METERS_PER_DEGREE_LAT,
        }
    }

    /// Convert planar meters back to a geographic point
    #[inline(always)]
    pub fn unproject(&self, coord: Coord<f64>) -> LatLng {
        // Near the poles the longitude factor collapses, keep the origin longitude
        let lng = if self.meters_per_degree_lng.abs() > f64::EPSILON {
            wrap_longitude(self.origin.lng + coord.x / self.meters_per_degree_lng)
        } else {
            self.origin.lng
        };
        LatLng::new(self.origin.lat + coord.y / METERS_PER_DEGREE_LAT, lng)
    }
}

/// Check if a point is a finite WGS84 coordinate
#[inline(always)]
pub fn is_valid_lat_lng(point: &LatLng) -> bool {
    point.lat.is_finite()
        && point.lng.is_finite()
        && point.lat.abs() <= MAX_LATITUDE
        && point.lng.abs() <= MAX_LONGITUDE
}

/// Format an area in square meters for display
///
/// Areas below one square kilometer are rounded to whole square meters.
pub fn format_area(area_m2: f64) -> String {
    if area_m2 >= 1_000_000.0 {
        format!("{:.2} km²", area_m2 / 1_000_000.0)
    } else {
        format!("{} m²", area_m2.round())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meters_per_degree_at_equator() {
        assert!((meters_per_degree_lng(0.0) - METERS_PER_DEGREE_LAT).abs() < 1e-9);
    }

    #[test]
    fn test_meters_per_degree_shrinks_with_latitude() {
        let at_60 = meters_per_degree_lng(60.0);
        assert!((at_60 - METERS_PER_DEGREE_LAT / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_projection_origin_is_zero() {
        let origin = LatLng::new(45.815, 15.9819);
        let projection = LocalProjection::new(origin);
        let coord = projection.project(origin);
        assert!(coord.x.abs() < 1e-9);
        assert!(coord.y.abs() < 1e-9);
    }

    #[test]
    fn test_projection_roundtrip() {
        let projection = LocalProjection::new(LatLng::new(51.5074, -0.1278));
        let point = LatLng::new(51.5090, -0.1250);

        let back = projection.unproject(projection.project(point));

        assert!((back.lat - point.lat).abs() < 1e-12);
        assert!((back.lng - point.lng).abs() < 1e-12);
    }

    #[test]
    fn test_projection_between_is_order_independent() {
        let a = LatLng::new(45.815, 15.9819);
        let b = LatLng::new(45.820, 15.990);
        let p = LatLng::new(45.817, 15.985);

        let ab = LocalProjection::between(a, b).project(p);
        let ba = LocalProjection::between(b, a).project(p);

        assert_eq!(ab, ba);
    }

    #[test]
    fn test_wrap_longitude() {
        assert_eq!(wrap_longitude(10.0), 10.0);
        assert_eq!(wrap_longitude(180.0), 180.0);
        assert_eq!(wrap_longitude(-180.0), 180.0);
        assert!((wrap_longitude(190.0) + 170.0).abs() < 1e-9);
        assert!((wrap_longitude(-359.999) - 0.001).abs() < 1e-9);
    }

    #[test]
    fn test_projection_across_antimeridian() {
        let a = LatLng::new(0.0, 179.9995);
        let b = LatLng::new(0.0, -179.9995);
        let projection = LocalProjection::between(a, b);

        let width = projection.project(b).x - projection.project(a).x;

        assert!((width - 0.001 * METERS_PER_DEGREE_LAT).abs() < 1e-6);
        let back = projection.unproject(projection.project(b));
        assert!((back.lng - b.lng).abs() < 1e-9);
    }

    #[test]
    fn test_is_valid_lat_lng() {
        assert!(is_valid_lat_lng(&LatLng::new(0.0, 0.0)));
        assert!(is_valid_lat_lng(&LatLng::new(-90.0, 180.0)));
        assert!(!is_valid_lat_lng(&LatLng::new(90.5, 0.0)));
        assert!(!is_valid_lat_lng(&LatLng::new(0.0, f64::NAN)));
    }

    #[test]
    fn test_format_area() {
        assert_eq!(format_area(7853.98), "7854 m²");
        assert_eq!(format_area(2_500_000.0), "2.50 km²");
    }
}
