//! Canonical shape representations
//!
//! Shapes are valid by construction: a [`Ring`] always has at least three distinct
//! vertices and a [`Circle`] always has a positive radius. Deserialization goes
//! through the same validating constructors.

use crate::{Result, ZoneError, utils};
use serde::{Deserialize, Serialize};

/// A geographic point in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[inline]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// The kind of shape a zone was drawn as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Polygon,
    Rectangle,
    Circle,
}

/// An open, implicitly closed vertex ring with at least three distinct points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LatLng>", into = "Vec<LatLng>")]
pub struct Ring {
    vertices: Vec<LatLng>,
}

impl Ring {
    /// Build a ring from an ordered vertex list, preserving winding order.
    ///
    /// A trailing vertex equal to the first one is dropped since rings are closed implicitly.
    pub fn new(mut vertices: Vec<LatLng>) -> Result<Self> {
        if let Some(bad) = vertices.iter().find(|p| !utils::is_valid_lat_lng(p)) {
            return Err(ZoneError::MalformedShape(format!(
                "invalid coordinate ({}, {})",
                bad.lat, bad.lng
            )));
        }

        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }

        let mut distinct: Vec<LatLng> = Vec::with_capacity(vertices.len());
        for vertex in &vertices {
            if !distinct.contains(vertex) {
                distinct.push(*vertex);
            }
        }
        if distinct.len() < 3 {
            return Err(ZoneError::MalformedShape(format!(
                "ring needs at least 3 distinct points, got {}",
                distinct.len()
            )));
        }

        Ok(Self { vertices })
    }

    #[inline]
    pub fn vertices(&self) -> &[LatLng] {
        &self.vertices
    }

    /// Iterate over the ring edges, including the closing edge
    pub fn edges(&self) -> impl Iterator<Item = (LatLng, LatLng)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// South-west and north-east corners of the vertex bounding box.
    ///
    /// Longitudes are measured from the first vertex the short way round, so a ring
    /// crossing the antimeridian yields a west corner with a larger longitude than
    /// the east corner.
    pub fn bbox(&self) -> (LatLng, LatLng) {
        let anchor = self.vertices[0].lng;
        let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut west, mut east) = (anchor, anchor);
        let (mut west_offset, mut east_offset) = (0.0, 0.0);
        for p in &self.vertices {
            min_lat = min_lat.min(p.lat);
            max_lat = max_lat.max(p.lat);
            let offset = utils::wrap_longitude(p.lng - anchor);
            if offset < west_offset {
                west_offset = offset;
                west = p.lng;
            }
            if offset > east_offset {
                east_offset = offset;
                east = p.lng;
            }
        }
        (LatLng::new(min_lat, west), LatLng::new(max_lat, east))
    }

    /// Center of the vertex bounding box
    pub fn bbox_center(&self) -> LatLng {
        let (south_west, north_east) = self.bbox();
        let lng = utils::wrap_longitude(
            south_west.lng + utils::wrap_longitude(north_east.lng - south_west.lng) / 2.0,
        );
        LatLng::new((south_west.lat + north_east.lat) / 2.0, lng)
    }
}

impl TryFrom<Vec<LatLng>> for Ring {
    type Error = ZoneError;

    fn try_from(vertices: Vec<LatLng>) -> Result<Self> {
        Ring::new(vertices)
    }
}

impl From<Ring> for Vec<LatLng> {
    fn from(ring: Ring) -> Self {
        ring.vertices
    }
}

/// A circle given by its center and a radius in meters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CircleRecord")]
pub struct Circle {
    center: LatLng,
    radius: f64,
}

/// Unvalidated wire form of a circle
#[derive(Deserialize)]
struct CircleRecord {
    center: LatLng,
    radius: f64,
}

impl Circle {
    pub fn new(center: LatLng, radius: f64) -> Result<Self> {
        if !utils::is_valid_lat_lng(&center) {
            return Err(ZoneError::MalformedShape(format!(
                "invalid circle center ({}, {})",
                center.lat, center.lng
            )));
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ZoneError::MalformedShape(format!(
                "circle radius must be positive, got {}",
                radius
            )));
        }
        Ok(Self { center, radius })
    }

    #[inline]
    pub fn center(&self) -> LatLng {
        self.center
    }

    /// Radius in meters
    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl TryFrom<CircleRecord> for Circle {
    type Error = ZoneError;

    fn try_from(record: CircleRecord) -> Result<Self> {
        Circle::new(record.center, record.radius)
    }
}

/// Canonical zone geometry.
///
/// Serialized as `{"shapeType": ..., "geometry": ...}` so it can be flattened into a zone record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shapeType", content = "geometry", rename_all = "lowercase")]
pub enum Shape {
    Polygon(Ring),
    Rectangle(Ring),
    Circle(Circle),
}

impl Shape {
    pub fn polygon(vertices: Vec<LatLng>) -> Result<Self> {
        Ok(Shape::Polygon(Ring::new(vertices)?))
    }

    pub fn rectangle(vertices: Vec<LatLng>) -> Result<Self> {
        Ok(Shape::Rectangle(Ring::new(vertices)?))
    }

    pub fn circle(center: LatLng, radius: f64) -> Result<Self> {
        Ok(Shape::Circle(Circle::new(center, radius)?))
    }

    #[inline]
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Shape::Polygon(_) => ShapeType::Polygon,
            Shape::Rectangle(_) => ShapeType::Rectangle,
            Shape::Circle(_) => ShapeType::Circle,
        }
    }

    /// A point near the middle of the shape, used to anchor local projections
    pub fn reference_point(&self) -> LatLng {
        match self {
            Shape::Polygon(ring) | Shape::Rectangle(ring) => ring.bbox_center(),
            Shape::Circle(circle) => circle.center(),
        }
    }
}
