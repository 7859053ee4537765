//! Owned area output type
//!
//! An [`OwnedArea`] is the final output unit of the pipeline: one clipped
//! cell paired with exactly one site identifier. It is the only value that
//! crosses the core/persistence boundary.

use std::fmt::Write as _;

use glam::DVec2;

use crate::geometry::Ring;
use crate::site::SiteId;

/// Mean Earth radius in meters, matching the radius turf-style geodesic
/// area calculations use
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A clipped cell owned by exactly one site
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedArea {
    site: SiteId,
    polygon: Ring,
    area_sq_m: f64,
}

impl OwnedArea {
    /// Pair a clipped cell with its owning site
    ///
    /// The polygon is normalized to counter-clockwise winding and its
    /// geodesic area is computed once here.
    pub fn new(site: SiteId, polygon: Ring) -> Self {
        let polygon = polygon.into_ccw();
        let area_sq_m = geodesic_area(&polygon);
        Self {
            site,
            polygon,
            area_sq_m,
        }
    }

    /// The owning site's identifier
    #[inline]
    pub fn site(&self) -> SiteId {
        self.site
    }

    /// The area polygon, counter-clockwise
    #[inline]
    pub fn polygon(&self) -> &Ring {
        &self.polygon
    }

    /// Geodesic area in square meters
    #[inline]
    pub fn area_sq_m(&self) -> f64 {
        self.area_sq_m
    }

    /// Boundary-inclusive containment test against the area polygon
    #[inline]
    pub fn contains(&self, position: DVec2) -> bool {
        self.polygon.contains(position)
    }

    /// Serialize the polygon as well-known text
    ///
    /// The ring is explicitly closed, as every consumer of `POLYGON`
    /// literals expects.
    ///
    /// # Example
    ///
    /// ```
    /// use column_areas::area::OwnedArea;
    /// use column_areas::geometry::Ring;
    /// use glam::DVec2;
    ///
    /// let area = OwnedArea::new(
    ///     462,
    ///     Ring::new(vec![
    ///         DVec2::new(0.0, 0.0),
    ///         DVec2::new(1.0, 0.0),
    ///         DVec2::new(1.0, 1.0),
    ///         DVec2::new(0.0, 1.0),
    ///     ]),
    /// );
    /// assert_eq!(area.to_wkt(), "POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))");
    /// ```
    pub fn to_wkt(&self) -> String {
        let mut wkt = String::from("POLYGON ((");
        for (i, p) in self.polygon.points().iter().enumerate() {
            if i > 0 {
                wkt.push_str(", ");
            }
            let _ = write!(wkt, "{} {}", p.x, p.y);
        }
        if let Some(first) = self.polygon.points().first() {
            let _ = write!(wkt, ", {} {}", first.x, first.y);
        }
        wkt.push_str("))");
        wkt
    }
}

/// Geodesic polygon area in square meters
///
/// Chamberlain & Duquette's spherical excess formula over (lon, lat)
/// degree coordinates, the same computation turf's `area` performs.
pub fn geodesic_area(ring: &Ring) -> f64 {
    let pts = ring.points();
    if pts.len() < 3 {
        return 0.0;
    }
    let mut total = 0.0;
    for i in 0..pts.len() {
        let p1 = pts[i];
        let p2 = pts[(i + 1) % pts.len()];
        total += (p2.x - p1.x).to_radians()
            * (2.0 + p1.y.to_radians().sin() + p2.y.to_radians().sin());
    }
    (total * EARTH_RADIUS_M * EARTH_RADIUS_M / 2.0).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(x0: f64, y0: f64, x1: f64, y1: f64) -> Ring {
        Ring::new(vec![
            DVec2::new(x0, y0),
            DVec2::new(x1, y0),
            DVec2::new(x1, y1),
            DVec2::new(x0, y1),
        ])
    }

    #[test]
    fn test_wkt_closes_ring() {
        let area = OwnedArea::new(1, quad(0.0, 0.0, 1.0, 1.0));
        assert_eq!(area.to_wkt(), "POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))");
    }

    #[test]
    fn test_wkt_keeps_precision() {
        let area = OwnedArea::new(
            1,
            Ring::new(vec![
                DVec2::new(-89.425, 43.0725),
                DVec2::new(-89.0, 43.0725),
                DVec2::new(-89.0, 43.5),
            ]),
        );
        assert!(area.to_wkt().contains("-89.425 43.0725"));
    }

    #[test]
    fn test_polygon_normalized_ccw() {
        let cw = Ring::new(quad(0.0, 0.0, 1.0, 1.0).points().iter().rev().copied().collect());
        let area = OwnedArea::new(1, cw);
        assert!(area.polygon().is_ccw());
    }

    #[test]
    fn test_geodesic_area_equatorial_quad() {
        // 1 x 1 degree quad at the equator against the closed-form
        // spherical band area R^2 * d_lon * (sin(lat1) - sin(lat0)).
        let ring = quad(0.0, 0.0, 1.0, 1.0);
        let expected =
            EARTH_RADIUS_M * EARTH_RADIUS_M * 1f64.to_radians() * 1f64.to_radians().sin();
        let actual = geodesic_area(&ring);
        let relative = (actual - expected).abs() / expected;
        assert!(
            relative < 1e-2,
            "relative error {} (actual {}, expected {})",
            relative,
            actual,
            expected
        );
    }

    #[test]
    fn test_geodesic_area_orientation_independent() {
        let ccw = quad(10.0, 40.0, 11.0, 41.0);
        let cw = Ring::new(ccw.points().iter().rev().copied().collect());
        assert_eq!(geodesic_area(&ccw), geodesic_area(&cw));
    }

    #[test]
    fn test_geodesic_area_shrinks_with_latitude() {
        let equator = geodesic_area(&quad(0.0, 0.0, 1.0, 1.0));
        let high = geodesic_area(&quad(0.0, 60.0, 1.0, 61.0));
        assert!(high < equator * 0.6);
    }

    #[test]
    fn test_degenerate_ring_has_zero_area() {
        let ring = Ring::new(vec![DVec2::new(0.0, 0.0), DVec2::new(1.0, 0.0)]);
        assert_eq!(geodesic_area(&ring), 0.0);
    }
}
