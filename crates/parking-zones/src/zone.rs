//! Zone records and user metadata

use crate::geometry::{self, BoundingBox};
use crate::{LatLng, Shape, ShapeType, utils};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed color palette a zone can be tagged with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Red,
    #[default]
    Blue,
    Green,
    Yellow,
    Purple,
}

impl ColorTag {
    /// Every palette entry, in display order
    pub const ALL: [ColorTag; 5] = [
        ColorTag::Red,
        ColorTag::Blue,
        ColorTag::Green,
        ColorTag::Yellow,
        ColorTag::Purple,
    ];

    /// Display color as a CSS hex string
    pub fn hex(self) -> &'static str {
        match self {
            ColorTag::Red => "#ef4444",
            ColorTag::Blue => "#3b82f6",
            ColorTag::Green => "#22c55e",
            ColorTag::Yellow => "#eab308",
            ColorTag::Purple => "#a855f7",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ColorTag::Red => "Red",
            ColorTag::Blue => "Blue",
            ColorTag::Green => "Green",
            ColorTag::Yellow => "Yellow",
            ColorTag::Purple => "Purple",
        }
    }
}

/// User-supplied metadata for a new zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneMetadata {
    pub name: String,
    #[serde(default)]
    pub color_tag: ColorTag,
}

impl ZoneMetadata {
    pub fn new(name: impl Into<String>, color_tag: ColorTag) -> Self {
        Self {
            name: name.into(),
            color_tag,
        }
    }
}

/// Partial update of a zone's mutable fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color_tag: Option<ColorTag>,
}

impl ZoneUpdate {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn color_tag(mut self, color_tag: ColorTag) -> Self {
        self.color_tag = Some(color_tag);
        self
    }
}

/// A named, colored region of fixed shape.
///
/// Geometry, area and centroid are fixed at creation; only the name and color tag
/// can change afterwards, through the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    id: String,
    name: String,
    color_tag: ColorTag,
    #[serde(flatten)]
    shape: Shape,
    /// Square meters
    area: f64,
    centroid: LatLng,
    created_at: DateTime<Utc>,
}

impl Zone {
    /// Build a zone and derive its area and centroid from the shape
    pub(crate) fn new(id: String, shape: Shape, metadata: ZoneMetadata) -> Self {
        let area = geometry::compute_area(&shape);
        let centroid = geometry::compute_centroid(&shape);
        Self {
            id,
            name: metadata.name,
            color_tag: metadata.color_tag,
            shape,
            area,
            centroid,
            created_at: Utc::now(),
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn color_tag(&self) -> ColorTag {
        self.color_tag
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn shape_type(&self) -> ShapeType {
        self.shape.shape_type()
    }

    /// Area in square meters
    #[inline]
    pub fn area(&self) -> f64 {
        self.area
    }

    #[inline]
    pub fn centroid(&self) -> LatLng {
        self.centroid
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Area formatted for display, e.g. `"7854 m²"` or `"1.25 km²"`
    pub fn formatted_area(&self) -> String {
        utils::format_area(self.area)
    }

    /// Bounds to fit the map view to this zone
    pub fn bounds(&self) -> BoundingBox {
        geometry::bounds(&self.shape)
    }

    /// Whether a clicked point falls inside this zone
    pub fn contains(&self, point: LatLng) -> bool {
        geometry::contains_point(&self.shape, point)
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_color_tag(&mut self, color_tag: ColorTag) {
        self.color_tag = color_tag;
    }

    #[cfg(test)]
    pub(crate) fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle_zone() -> Zone {
        Zone::new(
            "zone-1".to_string(),
            Shape::circle(LatLng::new(45.815, 15.9819), 50.0).unwrap(),
            ZoneMetadata::new("A", ColorTag::Green),
        )
    }

    #[test]
    fn test_derived_fields() {
        let zone = circle_zone();

        assert_eq!(zone.shape_type(), ShapeType::Circle);
        assert_eq!(zone.centroid(), LatLng::new(45.815, 15.9819));
        assert!((zone.area() - std::f64::consts::PI * 2500.0).abs() < 1e-9);
        assert_eq!(zone.formatted_area(), "7854 m²");
    }

    #[test]
    fn test_record_layout() {
        let zone = circle_zone();

        let json = serde_json::to_value(&zone).unwrap();

        for key in [
            "id",
            "name",
            "colorTag",
            "shapeType",
            "geometry",
            "area",
            "centroid",
            "createdAt",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["colorTag"], "green");
        assert_eq!(json["shapeType"], "circle");
    }

    #[test]
    fn test_record_roundtrip() {
        let zone = Zone::new(
            "zone-2".to_string(),
            Shape::polygon(vec![
                LatLng::new(45.81, 15.97),
                LatLng::new(45.81, 15.98),
                LatLng::new(45.82, 15.975),
            ])
            .unwrap(),
            ZoneMetadata::new("Triangle", ColorTag::Purple),
        );

        let json = serde_json::to_string(&zone).unwrap();
        let back: Zone = serde_json::from_str(&json).unwrap();

        assert_eq!(back, zone);
    }

    #[test]
    fn test_palette() {
        assert_eq!(ColorTag::default(), ColorTag::Blue);
        assert_eq!(ColorTag::ALL.len(), 5);
        assert!(ColorTag::ALL.iter().all(|c| c.hex().starts_with('#')));
        assert_eq!(ColorTag::Yellow.label(), "Yellow");
    }

    #[test]
    fn test_update_builder() {
        let update = ZoneUpdate::default().name("B").color_tag(ColorTag::Red);
        assert_eq!(update.name.as_deref(), Some("B"));
        assert_eq!(update.color_tag, Some(ColorTag::Red));
    }
}
