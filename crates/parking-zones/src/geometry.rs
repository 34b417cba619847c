//! Geometry engine: area, centroid and overlap classification for canonical shapes
//!
//! All computations work in a local planar frame (see [`LocalProjection`]) measured
//! in meters. Pairwise tests project both shapes around the midpoint of their
//! reference points so that `shapes_overlap(a, b) == shapes_overlap(b, a)`.
//!
//! Every distance comparison uses a tolerance of [`OVERLAP_EPSILON_M`]: shapes that
//! only share a drawn boundary, or touch at a point, are not overlapping. The
//! tolerance shrinks for shapes only a few centimeters across so that they still
//! overlap their own copies.

use crate::utils::{
    DEGENERATE_AREA_M2, LocalProjection, METERS_PER_DEGREE_LAT, OVERLAP_EPSILON_M,
    meters_per_degree_lng, wrap_longitude,
};
use crate::{Circle, LatLng, Ring, Shape, Zone};
use geo::{Area, Centroid, Contains, Coord, InteriorPoint, LineString, Point, Polygon};
use std::f64::consts::PI;

/// Result of checking a candidate shape against existing zones
#[derive(Debug, Clone)]
pub struct OverlapReport<'a> {
    /// Whether any existing zone conflicts with the candidate
    pub overlaps: bool,
    /// Conflicting zones, in the order they appear in the checked collection
    pub conflicts: Vec<&'a Zone>,
}

impl OverlapReport<'_> {
    /// Names of the conflicting zones, in collection order
    pub fn conflict_names(&self) -> Vec<String> {
        self.conflicts.iter().map(|z| z.name().to_string()).collect()
    }
}

/// Geographic bounding box, used to fit the map view to a zone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

/// Area of a shape in square meters.
///
/// Rings use the shoelace formula in the planar frame of the ring's own latitude.
/// Degenerate (collinear) rings have an area of 0.
pub fn compute_area(shape: &Shape) -> f64 {
    match shape {
        Shape::Circle(circle) => PI * circle.radius() * circle.radius(),
        Shape::Polygon(ring) | Shape::Rectangle(ring) => {
            let projection = LocalProjection::new(ring.bbox_center());
            let area = planar_polygon(&project_ring(ring, &projection)).unsigned_area();
            if area <= DEGENERATE_AREA_M2 { 0.0 } else { area }
        }
    }
}

/// Centroid of a shape.
///
/// Rings use the area-weighted polygon centroid and fall back to the vertex mean
/// when the ring is degenerate.
pub fn compute_centroid(shape: &Shape) -> LatLng {
    match shape {
        Shape::Circle(circle) => circle.center(),
        Shape::Polygon(ring) | Shape::Rectangle(ring) => {
            let projection = LocalProjection::new(ring.bbox_center());
            let coords = project_ring(ring, &projection);
            let polygon = planar_polygon(&coords);
            if polygon.unsigned_area() > DEGENERATE_AREA_M2
                && let Some(centroid) = polygon.centroid()
            {
                return projection.unproject(centroid.0);
            }
            projection.unproject(vertex_mean(&coords))
        }
    }
}

/// Check a candidate against every zone and collect all conflicts.
///
/// Each zone is tested independently; the conflicts keep the order of `existing`.
pub fn detect_overlap<'a>(candidate: &Shape, existing: &'a [Zone]) -> OverlapReport<'a> {
    #[cfg(feature = "profiling")]
    profiling::scope!("geometry::detect_overlap");

    let conflicts: Vec<&Zone> = existing
        .iter()
        .filter(|zone| shapes_overlap(candidate, zone.shape()))
        .collect();

    OverlapReport {
        overlaps: !conflicts.is_empty(),
        conflicts,
    }
}

/// Pairwise overlap test between two shapes
pub fn shapes_overlap(a: &Shape, b: &Shape) -> bool {
    let projection = LocalProjection::between(a.reference_point(), b.reference_point());
    let eps = OVERLAP_EPSILON_M.min(size_scale(a).min(size_scale(b)) / 4.0);

    if extents_separated(
        planar_extent(a, &projection),
        planar_extent(b, &projection),
        eps,
    ) {
        return false;
    }

    match (a, b) {
        (Shape::Circle(a), Shape::Circle(b)) => circles_overlap(a, b, &projection, eps),
        (Shape::Circle(circle), Shape::Polygon(ring) | Shape::Rectangle(ring))
        | (Shape::Polygon(ring) | Shape::Rectangle(ring), Shape::Circle(circle)) => {
            circle_ring_overlap(circle, ring, &projection, eps)
        }
        (
            Shape::Polygon(a) | Shape::Rectangle(a),
            Shape::Polygon(b) | Shape::Rectangle(b),
        ) => rings_overlap(a, b, &projection, eps),
    }
}

/// Whether a point lies inside a shape (used for click hit-testing)
pub fn contains_point(shape: &Shape, point: LatLng) -> bool {
    match shape {
        Shape::Circle(circle) => {
            let projection = LocalProjection::new(circle.center());
            distance(projection.project(point), Coord::zero()) <= circle.radius()
        }
        Shape::Polygon(ring) | Shape::Rectangle(ring) => {
            let projection = LocalProjection::new(ring.bbox_center());
            let polygon = planar_polygon(&project_ring(ring, &projection));
            polygon.contains(&Point::from(projection.project(point)))
        }
    }
}

/// Geographic bounds of a shape; circles are expanded by their radius.
///
/// Bounds crossing the antimeridian have a west longitude greater than the east one.
pub fn bounds(shape: &Shape) -> BoundingBox {
    match shape {
        Shape::Circle(circle) => {
            let center = circle.center();
            let d_lat = circle.radius() / METERS_PER_DEGREE_LAT;
            let lng_factor = meters_per_degree_lng(center.lat);
            let d_lng = if lng_factor > f64::EPSILON {
                (circle.radius() / lng_factor).min(180.0)
            } else {
                180.0
            };
            BoundingBox {
                south_west: LatLng::new(
                    (center.lat - d_lat).max(-90.0),
                    wrap_longitude(center.lng - d_lng),
                ),
                north_east: LatLng::new(
                    (center.lat + d_lat).min(90.0),
                    wrap_longitude(center.lng + d_lng),
                ),
            }
        }
        Shape::Polygon(ring) | Shape::Rectangle(ring) => {
            let (south_west, north_east) = ring.bbox();
            BoundingBox {
                south_west,
                north_east,
            }
        }
    }
}

/// Characteristic size of a shape in meters: the radius of a circle, or twice the
/// area over the perimeter for a ring (the inradius of a regular polygon)
fn size_scale(shape: &Shape) -> f64 {
    match shape {
        Shape::Circle(circle) => circle.radius(),
        Shape::Polygon(ring) | Shape::Rectangle(ring) => {
            let projection = LocalProjection::new(ring.bbox_center());
            let coords = project_ring(ring, &projection);
            let perimeter: f64 = edges(&coords).map(|(a, b)| distance(a, b)).sum();
            if perimeter > 0.0 {
                2.0 * compute_area(shape) / perimeter
            } else {
                0.0
            }
        }
    }
}

fn circles_overlap(a: &Circle, b: &Circle, projection: &LocalProjection, eps: f64) -> bool {
    let d = distance(projection.project(a.center()), projection.project(b.center()));
    d < a.radius() + b.radius() - eps
}

fn circle_ring_overlap(
    circle: &Circle,
    ring: &Ring,
    projection: &LocalProjection,
    eps: f64,
) -> bool {
    let center = projection.project(circle.center());
    let reach = circle.radius() - eps;
    let coords = project_ring(ring, projection);

    let edge_distance = edges(&coords)
        .map(|(a, b)| segment_distance(center, a, b))
        .fold(f64::INFINITY, f64::min);

    // Center well inside the ring
    if edge_distance > eps
        && planar_polygon(&coords).contains(&Point::from(center))
    {
        return true;
    }

    // A ring vertex inside the circle
    if coords.iter().any(|&v| distance(v, center) < reach) {
        return true;
    }

    // The circle boundary crosses a ring edge
    edge_distance < reach
}

fn rings_overlap(a: &Ring, b: &Ring, projection: &LocalProjection, eps: f64) -> bool {
    let a = counter_clockwise(project_ring(a, projection));
    let b = counter_clockwise(project_ring(b, projection));
    ring_intrudes(&a, &b, eps) || ring_intrudes(&b, &a, eps)
}

/// Whether any part of ring `a` reaches into the interior of ring `b`.
///
/// Both rings must be counter-clockwise.
fn ring_intrudes(a: &[Coord<f64>], b: &[Coord<f64>], eps: f64) -> bool {
    let b_polygon = planar_polygon(b);
    let strictly_inside = |p: Coord<f64>| {
        b_polygon.contains(&Point::from(p))
            && edges(b)
                .map(|(s, e)| segment_distance(p, s, e))
                .fold(f64::INFINITY, f64::min)
                > eps
    };

    for (a_start, a_end) in edges(a) {
        for (b_start, b_end) in edges(b) {
            if segments_cross(a_start, a_end, b_start, b_end, eps)
                || collinear_same_direction(a_start, a_end, b_start, b_end, eps)
            {
                return true;
            }
        }
    }

    if a.iter().any(|&v| strictly_inside(v)) {
        return true;
    }

    // Covers containment where every vertex sits exactly on the other boundary
    if edges(a).any(|(s, e)| strictly_inside((s + e) / 2.0)) {
        return true;
    }

    planar_polygon(a)
        .interior_point()
        .is_some_and(|p| strictly_inside(p.0))
}

/// Proper crossing: each segment has its endpoints clearly on opposite sides of the other
fn segments_cross(
    p1: Coord<f64>,
    p2: Coord<f64>,
    q1: Coord<f64>,
    q2: Coord<f64>,
    eps: f64,
) -> bool {
    let opposite = |d1: f64, d2: f64| (d1 > eps && d2 < -eps) || (d1 < -eps && d2 > eps);
    opposite(line_offset(q1, p1, p2), line_offset(q2, p1, p2))
        && opposite(line_offset(p1, q1, q2), line_offset(p2, q1, q2))
}

/// Overlapping collinear edges running the same way.
///
/// With both rings counter-clockwise the interiors then lie on the same side, so the
/// rings overlap; opposite directions mean a shared boundary between neighbours.
fn collinear_same_direction(
    p1: Coord<f64>,
    p2: Coord<f64>,
    q1: Coord<f64>,
    q2: Coord<f64>,
    eps: f64,
) -> bool {
    let p_len = distance(p1, p2);
    if p_len <= eps || distance(q1, q2) <= eps {
        return false;
    }
    if line_offset(q1, p1, p2).abs() > eps || line_offset(q2, p1, p2).abs() > eps {
        return false;
    }

    let dir = (p2 - p1) / p_len;
    if dot(dir, q2 - q1) <= 0.0 {
        return false;
    }

    let t1 = dot(dir, q1 - p1);
    let t2 = dot(dir, q2 - p1);
    let shared = t2.min(p_len) - t1.max(0.0);
    shared > eps
}

/// Signed distance from `p` to the line through `a` and `b` (positive on the left)
fn line_offset(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let len = distance(a, b);
    if len == 0.0 {
        return distance(p, a);
    }
    cross(b - a, p - a) / len
}

fn segment_distance(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let ab = b - a;
    let len2 = dot(ab, ab);
    if len2 == 0.0 {
        return distance(p, a);
    }
    let t = (dot(p - a, ab) / len2).clamp(0.0, 1.0);
    distance(p, a + ab * t)
}

#[inline]
fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

#[inline]
fn dot(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.x + a.y * b.y
}

#[inline]
fn cross(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

fn edges(coords: &[Coord<f64>]) -> impl Iterator<Item = (Coord<f64>, Coord<f64>)> + '_ {
    let n = coords.len();
    (0..n).map(move |i| (coords[i], coords[(i + 1) % n]))
}

fn project_ring(ring: &Ring, projection: &LocalProjection) -> Vec<Coord<f64>> {
    ring.vertices()
        .iter()
        .map(|&p| projection.project(p))
        .collect()
}

fn counter_clockwise(mut coords: Vec<Coord<f64>>) -> Vec<Coord<f64>> {
    if planar_polygon(&coords).signed_area() < 0.0 {
        coords.reverse();
    }
    coords
}

fn planar_polygon(coords: &[Coord<f64>]) -> Polygon<f64> {
    Polygon::new(LineString::new(coords.to_vec()), vec![])
}

/// Planar (min, max) corners of a shape
fn planar_extent(shape: &Shape, projection: &LocalProjection) -> (Coord<f64>, Coord<f64>) {
    match shape {
        Shape::Circle(circle) => {
            let c = projection.project(circle.center());
            let r = circle.radius();
            (
                Coord {
                    x: c.x - r,
                    y: c.y - r,
                },
                Coord {
                    x: c.x + r,
                    y: c.y + r,
                },
            )
        }
        Shape::Polygon(ring) | Shape::Rectangle(ring) => {
            let mut min = Coord {
                x: f64::INFINITY,
                y: f64::INFINITY,
            };
            let mut max = Coord {
                x: f64::NEG_INFINITY,
                y: f64::NEG_INFINITY,
            };
            for c in project_ring(ring, projection) {
                min.x = min.x.min(c.x);
                min.y = min.y.min(c.y);
                max.x = max.x.max(c.x);
                max.y = max.y.max(c.y);
            }
            (min, max)
        }
    }
}

fn extents_separated(
    a: (Coord<f64>, Coord<f64>),
    b: (Coord<f64>, Coord<f64>),
    eps: f64,
) -> bool {
    let (a_min, a_max) = a;
    let (b_min, b_max) = b;
    a_max.x < b_min.x - eps
        || b_max.x < a_min.x - eps
        || a_max.y < b_min.y - eps
        || b_max.y < a_min.y - eps
}

fn vertex_mean(coords: &[Coord<f64>]) -> Coord<f64> {
    let sum = coords.iter().fold(Coord::zero(), |acc, &c| acc + c);
    sum / coords.len() as f64
}
