//! Column site locations
//!
//! A site is the point location of one stratigraphic column. Sites are read
//! once at the start of a run and treated as an immutable snapshot.

use glam::DVec2;

/// Stable identifier of a column site
///
/// Matches the integer primary key of the external site store.
pub type SiteId = i64;

/// A point location that owns exactly one region of the tessellation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Site {
    /// Unique, stable identifier
    pub id: SiteId,
    /// Coordinate as (longitude, latitude) in floating-point degrees
    pub position: DVec2,
}

impl Site {
    /// Create a site from its identifier and longitude/latitude in degrees
    pub fn new(id: SiteId, lon: f64, lat: f64) -> Self {
        Self {
            id,
            position: DVec2::new(lon, lat),
        }
    }

    /// Longitude in degrees
    #[inline]
    pub fn lon(&self) -> f64 {
        self.position.x
    }

    /// Latitude in degrees
    #[inline]
    pub fn lat(&self) -> f64 {
        self.position.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_creation() {
        let site = Site::new(462, -89.4, 43.07);
        assert_eq!(site.id, 462);
        assert_eq!(site.lon(), -89.4);
        assert_eq!(site.lat(), 43.07);
        assert_eq!(site.position, DVec2::new(-89.4, 43.07));
    }
}
