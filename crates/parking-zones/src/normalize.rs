//! Shape normalization
//!
//! Converts the coordinate structures produced by the drawing surface into a
//! canonical [`Shape`]. Drawn rings may arrive wrapped in any number of
//! containing groups and each point may be either a `[lat, lng]` pair or a
//! `{lat, lng}` object.

use crate::utils::MAX_NESTING_DEPTH;
use crate::{Circle, LatLng, Result, Ring, Shape, ShapeType, ZoneError};
use serde::{Deserialize, Serialize};

/// Raw coordinates as handed over by the drawing surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCoordinates {
    Pair([f64; 2]),
    Object { lat: f64, lng: f64 },
    Nested(Vec<RawCoordinates>),
}

/// A shape description from the drawing surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawShape {
    pub shape_type: ShapeType,
    pub raw_coordinates: RawCoordinates,
    /// Circle radius in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

/// Normalize a raw shape into its canonical form
pub fn normalize(raw: &RawShape) -> Result<Shape> {
    let points = flatten(&raw.raw_coordinates)?;

    match raw.shape_type {
        ShapeType::Polygon => Ok(Shape::Polygon(Ring::new(points)?)),
        ShapeType::Rectangle => Ok(Shape::Rectangle(Ring::new(points)?)),
        ShapeType::Circle => {
            let [center] = points.as_slice() else {
                return Err(ZoneError::MalformedShape(format!(
                    "circle needs exactly one center point, got {}",
                    points.len()
                )));
            };
            let radius = raw
                .radius
                .ok_or_else(|| ZoneError::MalformedShape("circle is missing a radius".into()))?;
            Ok(Shape::Circle(Circle::new(*center, radius)?))
        }
    }
}

/// Flatten arbitrarily nested coordinates into one ordered point list
fn flatten(raw: &RawCoordinates) -> Result<Vec<LatLng>> {
    let mut points = Vec::new();
    flatten_into(raw, 0, &mut points)?;
    Ok(points)
}

fn flatten_into(raw: &RawCoordinates, depth: usize, out: &mut Vec<LatLng>) -> Result<()> {
    if depth > MAX_NESTING_DEPTH {
        return Err(ZoneError::MalformedShape(format!(
            "coordinates nested deeper than {} levels",
            MAX_NESTING_DEPTH
        )));
    }

    match raw {
        RawCoordinates::Pair([lat, lng]) => out.push(LatLng::new(*lat, *lng)),
        RawCoordinates::Object { lat, lng } => out.push(LatLng::new(*lat, *lng)),
        RawCoordinates::Nested(children) => {
            for child in children {
                flatten_into(child, depth + 1, out)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> RawShape {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_unwraps_nested_polygon_ring() {
        let raw = parse(
            r#"{"shapeType":"polygon","rawCoordinates":[[[45.0,15.0],[45.0,15.01],[45.01,15.01]]]}"#,
        );

        let shape = normalize(&raw).unwrap();

        let Shape::Polygon(ring) = shape else {
            panic!("expected polygon");
        };
        assert_eq!(
            ring.vertices(),
            &[
                LatLng::new(45.0, 15.0),
                LatLng::new(45.0, 15.01),
                LatLng::new(45.01, 15.01)
            ]
        );
    }

    #[test]
    fn test_accepts_object_points() {
        let raw = parse(
            r#"{"shapeType":"rectangle","rawCoordinates":[[
                {"lat":45.0,"lng":15.0},{"lat":45.01,"lng":15.0},
                {"lat":45.01,"lng":15.01},{"lat":45.0,"lng":15.01}
            ]]}"#,
        );

        let shape = normalize(&raw).unwrap();

        assert_eq!(shape.shape_type(), ShapeType::Rectangle);
        match shape {
            Shape::Rectangle(ring) => assert_eq!(ring.vertices().len(), 4),
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_circle_passthrough() {
        let raw = parse(
            r#"{"shapeType":"circle","rawCoordinates":[[45.815,15.9819]],"radius":50.0}"#,
        );

        let shape = normalize(&raw).unwrap();

        let Shape::Circle(circle) = shape else {
            panic!("expected circle");
        };
        assert_eq!(circle.center(), LatLng::new(45.815, 15.9819));
        assert_eq!(circle.radius(), 50.0);
    }

    #[test]
    fn test_circle_center_as_object() {
        let raw = parse(
            r#"{"shapeType":"circle","rawCoordinates":{"lat":45.815,"lng":15.9819},"radius":25.0}"#,
        );

        let shape = normalize(&raw).unwrap();

        assert_eq!(
            shape,
            Shape::circle(LatLng::new(45.815, 15.9819), 25.0).unwrap()
        );
    }

    #[test]
    fn test_circle_needs_exactly_one_center() {
        for coords in ["[]", "[[]]", "[[45.0,15.0],[45.1,15.1]]"] {
            let raw = parse(&format!(
                r#"{{"shapeType":"circle","rawCoordinates":{},"radius":10.0}}"#,
                coords
            ));

            let err = normalize(&raw).unwrap_err();

            assert!(
                err.to_string().contains("exactly one center"),
                "{}: {}",
                coords,
                err
            );
        }
    }

    #[test]
    fn test_circle_rejects_non_positive_radius() {
        let raw = RawShape {
            shape_type: ShapeType::Circle,
            raw_coordinates: RawCoordinates::Pair([45.815, 15.9819]),
            radius: Some(0.0),
        };
        assert!(matches!(normalize(&raw), Err(ZoneError::MalformedShape(_))));

        let raw = RawShape { radius: None, ..raw };
        assert!(matches!(normalize(&raw), Err(ZoneError::MalformedShape(_))));
    }

    #[test]
    fn test_polygon_with_too_few_distinct_points() {
        let raw = parse(
            r#"{"shapeType":"polygon","rawCoordinates":[[45.0,15.0],[45.0,15.01],[45.0,15.0]]}"#,
        );
        assert!(matches!(normalize(&raw), Err(ZoneError::MalformedShape(_))));
    }

    #[test]
    fn test_depth_guard() {
        let mut coords = RawCoordinates::Pair([45.0, 15.0]);
        for _ in 0..(MAX_NESTING_DEPTH + 2) {
            coords = RawCoordinates::Nested(vec![coords]);
        }
        let raw = RawShape {
            shape_type: ShapeType::Polygon,
            raw_coordinates: coords,
            radius: None,
        };

        let err = normalize(&raw).unwrap_err();

        assert!(err.to_string().contains("nested deeper"));
    }
}
