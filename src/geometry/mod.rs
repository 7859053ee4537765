//! Planar geometry primitives for the tessellation core
//!
//! Coordinates are (longitude, latitude) degrees held in `glam::DVec2`. All
//! predicates share one epsilon policy: [`EPSILON`] for coordinate and
//! boundary comparisons, [`AREA_EPSILON`] for discarding sliver rings
//! produced by clipping.

mod clip;

pub use clip::{clip_cell_to_region, clip_ring_halfplane, clip_ring_to_convex};

use glam::DVec2;

/// Coordinate comparison tolerance in degrees (~0.1 mm on the ground)
///
/// Used for boundary-inclusive containment tests and for merging coincident
/// vertices, so floating-point boundary coincidence never produces spurious
/// empty results.
pub const EPSILON: f64 = 1e-9;

/// Minimum ring area in square degrees; anything smaller is a sliver
pub const AREA_EPSILON: f64 = 1e-12;

/// Axis-aligned bounding box
///
/// Computed once from the clip region and used only to bound the unclipped
/// Voronoi construction. Cells of hull sites are mathematically unbounded, so
/// a finite working box is required before clipping to the true boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner (west, south)
    pub min: DVec2,
    /// Maximum corner (east, north)
    pub max: DVec2,
}

impl BoundingBox {
    /// Create a box from its two corners
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point of the iterator
    ///
    /// Returns `None` for an empty iterator.
    pub fn of_points<I: IntoIterator<Item = DVec2>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::new(first, first);
        for p in iter {
            bbox.min = bbox.min.min(p);
            bbox.max = bbox.max.max(p);
        }
        Some(bbox)
    }

    /// Box width (east-west extent)
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Box height (north-south extent)
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Expand the box on every side by `fraction` of its larger extent
    ///
    /// The working box is padded so that hull sites never sit exactly on the
    /// box boundary; the pad is clipped away again with the rest of the cell.
    pub fn padded(&self, fraction: f64) -> Self {
        let pad = (self.width().max(self.height()) * fraction).max(EPSILON);
        Self {
            min: self.min - DVec2::splat(pad),
            max: self.max + DVec2::splat(pad),
        }
    }

    /// Boundary-inclusive containment test
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x - EPSILON
            && p.x <= self.max.x + EPSILON
            && p.y >= self.min.y - EPSILON
            && p.y <= self.max.y + EPSILON
    }

    /// The box as a counter-clockwise ring
    pub fn corners(&self) -> Ring {
        Ring::new(vec![
            self.min,
            DVec2::new(self.max.x, self.min.y),
            self.max,
            DVec2::new(self.min.x, self.max.y),
        ])
    }
}

/// A closed polygon ring
///
/// Stored without the repeated closing point; the edge from the last vertex
/// back to the first is implicit. Orientation is not normalized here, and the
/// containment and area predicates do not depend on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    points: Vec<DVec2>,
}

impl Ring {
    /// Create a ring, dropping a repeated closing point and coincident
    /// consecutive vertices
    pub fn new(points: Vec<DVec2>) -> Self {
        let mut cleaned: Vec<DVec2> = Vec::with_capacity(points.len());
        for p in points {
            if cleaned
                .last()
                .map_or(true, |last| last.distance(p) > EPSILON)
            {
                cleaned.push(p);
            }
        }
        while cleaned.len() > 1
            && cleaned[0].distance(*cleaned.last().unwrap()) <= EPSILON
        {
            cleaned.pop();
        }
        Self { points: cleaned }
    }

    /// Vertices of the ring, closing point implicit
    #[inline]
    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    /// Number of vertices
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the ring has no vertices
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Signed shoelace area; positive for counter-clockwise rings
    pub fn signed_area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..self.points.len() {
            let a = self.points[i];
            let b = self.points[(i + 1) % self.points.len()];
            sum += a.perp_dot(b);
        }
        sum / 2.0
    }

    /// Absolute planar area in square degrees
    #[inline]
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// True if the ring winds counter-clockwise
    #[inline]
    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Reverse the winding so the ring is counter-clockwise
    pub fn into_ccw(mut self) -> Self {
        if !self.is_ccw() && self.points.len() >= 3 {
            self.points.reverse();
        }
        self
    }

    /// Area-weighted centroid, falling back to the vertex mean for
    /// degenerate rings
    pub fn centroid(&self) -> DVec2 {
        let n = self.points.len();
        if n == 0 {
            return DVec2::ZERO;
        }
        let a = self.signed_area();
        if a.abs() < AREA_EPSILON {
            return self.points.iter().copied().sum::<DVec2>() / n as f64;
        }
        let mut c = DVec2::ZERO;
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            c += (p + q) * p.perp_dot(q);
        }
        c / (6.0 * a)
    }

    /// Largest distance from `center` to any vertex
    ///
    /// Every point of the ring's interior is within this radius of `center`,
    /// which is what the ownership resolver's candidate pruning relies on.
    pub fn max_radius_about(&self, center: DVec2) -> f64 {
        self.points
            .iter()
            .map(|p| p.distance(center))
            .fold(0.0, f64::max)
    }

    /// Boundary-inclusive point-in-ring test (even-odd rule)
    pub fn contains(&self, p: DVec2) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            if distance_to_segment(p, a, b) <= EPSILON {
                return true;
            }
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[j];
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if p.x < x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Bounding box of the ring, `None` when empty
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::of_points(self.points.iter().copied())
    }
}

/// Distance from `p` to the segment `a`-`b`
pub fn distance_to_segment(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// A clip region of one or more disjoint polygon parts
///
/// Interior rings (holes) are not representable; the region sources reject
/// them before a `MultiPolygon` is ever constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiPolygon {
    parts: Vec<Ring>,
}

impl MultiPolygon {
    /// Create a region from its parts
    pub fn new(parts: Vec<Ring>) -> Self {
        Self { parts }
    }

    /// The region's parts
    #[inline]
    pub fn parts(&self) -> &[Ring] {
        &self.parts
    }

    /// Number of parts
    #[inline]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// True when the region has no parts
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// A point inside any one part counts as inside the region
    pub fn contains(&self, p: DVec2) -> bool {
        self.parts.iter().any(|part| part.contains(p))
    }

    /// Total planar area of all parts in square degrees
    pub fn area(&self) -> f64 {
        self.parts.iter().map(Ring::area).sum()
    }

    /// Bounding box over every part, `None` for an empty region
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::of_points(
            self.parts
                .iter()
                .flat_map(|part| part.points().iter().copied()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Ring {
        Ring::new(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 1.0),
        ])
    }

    #[test]
    fn test_ring_drops_closing_point() {
        let ring = Ring::new(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 0.0),
        ]);
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn test_signed_area_and_orientation() {
        let ccw = unit_square();
        assert!((ccw.signed_area() - 1.0).abs() < 1e-12);
        assert!(ccw.is_ccw());

        let cw = Ring::new(ccw.points().iter().rev().copied().collect());
        assert!((cw.signed_area() + 1.0).abs() < 1e-12);
        assert!(!cw.is_ccw());
        assert!(cw.into_ccw().is_ccw());
    }

    #[test]
    fn test_contains_inside_outside() {
        let ring = unit_square();
        assert!(ring.contains(DVec2::new(0.5, 0.5)));
        assert!(!ring.contains(DVec2::new(1.5, 0.5)));
        assert!(!ring.contains(DVec2::new(-0.1, 0.5)));
    }

    #[test]
    fn test_contains_boundary_and_vertex() {
        let ring = unit_square();
        // On an edge
        assert!(ring.contains(DVec2::new(0.5, 0.0)));
        assert!(ring.contains(DVec2::new(1.0, 0.5)));
        // On a vertex
        assert!(ring.contains(DVec2::new(0.0, 0.0)));
        // Just outside, beyond tolerance
        assert!(!ring.contains(DVec2::new(0.5, -1e-6)));
    }

    #[test]
    fn test_contains_concave() {
        // L-shaped ring; the notch at the upper right is outside
        let ring = Ring::new(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(2.0, 1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(1.0, 2.0),
            DVec2::new(0.0, 2.0),
        ]);
        assert!(ring.contains(DVec2::new(0.5, 1.5)));
        assert!(ring.contains(DVec2::new(1.5, 0.5)));
        assert!(!ring.contains(DVec2::new(1.5, 1.5)));
    }

    #[test]
    fn test_centroid() {
        let c = unit_square().centroid();
        assert!(c.distance(DVec2::new(0.5, 0.5)) < 1e-12);
    }

    #[test]
    fn test_max_radius_covers_interior() {
        let ring = unit_square();
        let c = ring.centroid();
        let r = ring.max_radius_about(c);
        assert!((r - (0.5f64 * 2.0f64.sqrt())).abs() < 1e-12);
    }

    #[test]
    fn test_bounding_box() {
        let bbox = unit_square().bounding_box().unwrap();
        assert_eq!(bbox.min, DVec2::new(0.0, 0.0));
        assert_eq!(bbox.max, DVec2::new(1.0, 1.0));
        assert_eq!(bbox.width(), 1.0);
        assert_eq!(bbox.height(), 1.0);
    }

    #[test]
    fn test_bbox_padded() {
        let bbox = unit_square().bounding_box().unwrap().padded(0.1);
        assert!(bbox.min.x < 0.0 && bbox.max.x > 1.0);
        assert!((bbox.width() - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_bbox_corners_ccw() {
        let corners = unit_square().bounding_box().unwrap().corners();
        assert_eq!(corners.len(), 4);
        assert!(corners.is_ccw());
    }

    #[test]
    fn test_multipolygon_contains_any_part() {
        let far = Ring::new(vec![
            DVec2::new(2.0, 0.0),
            DVec2::new(3.0, 0.0),
            DVec2::new(3.0, 1.0),
            DVec2::new(2.0, 1.0),
        ]);
        let region = MultiPolygon::new(vec![unit_square(), far]);
        assert!(region.contains(DVec2::new(0.5, 0.5)));
        assert!(region.contains(DVec2::new(2.5, 0.5)));
        assert!(!region.contains(DVec2::new(1.5, 0.5)));
        assert!((region.area() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_distance_to_segment() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(2.0, 0.0);
        assert!((distance_to_segment(DVec2::new(1.0, 1.0), a, b) - 1.0).abs() < 1e-12);
        assert!((distance_to_segment(DVec2::new(-1.0, 0.0), a, b) - 1.0).abs() < 1e-12);
        assert_eq!(distance_to_segment(DVec2::new(1.0, 0.0), a, b), 0.0);
    }
}
