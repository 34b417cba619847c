//! Read-only views over a zone list for display (color filter, search, sorting)

use crate::{ColorTag, Zone};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Order in which queried zones are returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    /// Collection (creation) order
    #[default]
    Insertion,
    /// Case-insensitive by name
    Name,
    /// Most recently created first
    NewestFirst,
}

/// Filter and sort settings for listing zones
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneQuery {
    /// Only zones with one of these colors; `None` keeps every color
    pub colors: Option<HashSet<ColorTag>>,
    /// Case-insensitive substring the zone name must contain
    pub search: Option<String>,
    pub sort: SortOrder,
}

impl ZoneQuery {
    pub fn with_colors(mut self, colors: impl IntoIterator<Item = ColorTag>) -> Self {
        self.colors = Some(colors.into_iter().collect());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn sorted_by(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Apply the query to a zone list
    pub fn apply<'a>(&self, zones: &'a [Zone]) -> Vec<&'a Zone> {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut result: Vec<&Zone> = zones
            .iter()
            .filter(|zone| {
                self.colors
                    .as_ref()
                    .is_none_or(|colors| colors.contains(&zone.color_tag()))
            })
            .filter(|zone| {
                needle
                    .as_deref()
                    .is_none_or(|n| zone.name().to_lowercase().contains(n))
            })
            .collect();

        match self.sort {
            SortOrder::Insertion => {}
            SortOrder::Name => {
                result.sort_by_cached_key(|zone| zone.name().to_lowercase());
            }
            SortOrder::NewestFirst => {
                result.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LatLng, Shape, ZoneMetadata};

    fn zones() -> Vec<Zone> {
        [
            ("North lot", ColorTag::Red, 0.0),
            ("airport", ColorTag::Blue, 0.01),
            ("Market", ColorTag::Red, 0.02),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, (name, color, offset))| {
            Zone::new(
                format!("id-{}", i),
                Shape::circle(LatLng::new(45.0 + offset, 15.0), 10.0).unwrap(),
                ZoneMetadata::new(name, color),
            )
        })
        .collect()
    }

    fn names(zones: Vec<&Zone>) -> Vec<&str> {
        zones.into_iter().map(Zone::name).collect()
    }

    #[test]
    fn test_default_query_keeps_insertion_order() {
        let zones = zones();
        let result = ZoneQuery::default().apply(&zones);
        assert_eq!(names(result), vec!["North lot", "airport", "Market"]);
    }

    #[test]
    fn test_color_filter() {
        let zones = zones();
        let result = ZoneQuery::default().with_colors([ColorTag::Red]).apply(&zones);
        assert_eq!(names(result), vec!["North lot", "Market"]);

        let none = ZoneQuery::default().with_colors([]).apply(&zones);
        assert!(none.is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let zones = zones();
        let result = ZoneQuery::default().with_search("  LOT ").apply(&zones);
        assert_eq!(names(result), vec!["North lot"]);
    }

    #[test]
    fn test_sort_by_name() {
        let zones = zones();
        let result = ZoneQuery::default().sorted_by(SortOrder::Name).apply(&zones);
        assert_eq!(names(result), vec!["airport", "Market", "North lot"]);
    }

    #[test]
    fn test_sort_newest_first() {
        // Creation timestamps can collide within one test run
        let zones: Vec<Zone> = zones()
            .into_iter()
            .enumerate()
            .map(|(i, zone)| {
                let created_at = zone.created_at() + chrono::Duration::seconds(i as i64);
                zone.with_created_at(created_at)
            })
            .collect();

        let result = ZoneQuery::default()
            .sorted_by(SortOrder::NewestFirst)
            .apply(&zones);

        assert_eq!(names(result), vec!["Market", "airport", "North lot"]);
    }
}
