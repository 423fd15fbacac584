//! Asset provider contract.
//!
//! The core never parses vector files. Hosts hand it a provider that lists the
//! named groups of a puppet asset along with their bounding boxes; pivots
//! default to the centre of a group's box.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Vec2};

/// Source of named group geometry for one puppet asset.
/// Adapters (SVG loaders, test stubs) implement this and pass it into `Puppet::build`.
pub trait AssetProvider {
    /// Group identifiers in document order, without duplicates.
    fn list_groups(&self) -> Vec<String>;

    fn bounding_box(&self, name: &str) -> Option<Rect>;

    /// Rotation centre of a group. Falls back to the origin when the group has no box.
    fn pivot(&self, name: &str) -> Vec2 {
        self.bounding_box(name)
            .map(|r| r.center())
            .unwrap_or(Vec2::ZERO)
    }
}

/// In-memory provider: ordered `group → bounding box`.
///
/// Deserializes from `{"groups": {"torse": [x0, y0, x1, y1], ...}}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticAssets {
    #[serde(default)]
    pub groups: IndexMap<String, Rect>,
    /// Explicit pivots overriding the box centre.
    #[serde(default)]
    pub pivots: IndexMap<String, Vec2>,
}

impl StaticAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, name: &str, bbox: Rect) -> Self {
        self.groups.insert(name.to_string(), bbox);
        self
    }

    pub fn with_pivot(mut self, name: &str, pivot: Vec2) -> Self {
        self.pivots.insert(name.to_string(), pivot);
        self
    }
}

impl AssetProvider for StaticAssets {
    fn list_groups(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    fn bounding_box(&self, name: &str) -> Option<Rect> {
        self.groups.get(name).copied()
    }

    fn pivot(&self, name: &str) -> Vec2 {
        if let Some(p) = self.pivots.get(name) {
            return *p;
        }
        self.bounding_box(name)
            .map(|r| r.center())
            .unwrap_or(Vec2::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pivot_defaults_to_box_centre() {
        let a = StaticAssets::new()
            .with_group("cou", Rect::new(0.0, 0.0, 10.0, 4.0))
            .with_pivot("tete", Vec2::new(1.0, 1.0));
        assert_eq!(a.pivot("cou"), Vec2::new(5.0, 2.0));
        assert_eq!(a.pivot("tete"), Vec2::new(1.0, 1.0));
        assert_eq!(a.pivot("missing"), Vec2::ZERO);
        assert_eq!(a.list_groups(), vec!["cou".to_string()]);
    }
}
