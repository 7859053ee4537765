//! Bounded Voronoi cell construction
//!
//! Builds one convex cell per site by intersecting half-planes: each cell
//! starts as the working bounding box and is cut by the perpendicular
//! bisector against every other site. The cells partition the box exactly;
//! clipping to the true region boundary happens downstream.

use glam::DVec2;

use crate::error::{Result, TessellationError};
use crate::geometry::{clip_ring_halfplane, BoundingBox, Ring};
use crate::site::{Site, SiteId};

/// A cell of the box-bounded Voronoi diagram, not yet clipped to the region
///
/// This is an intermediate representation; it carries its originating site
/// so the clipped pieces stay labeled through the rest of the pipeline.
#[derive(Debug, Clone)]
pub struct RawCell {
    /// Identifier of the site this cell was constructed for
    pub site: SiteId,
    /// The site's coordinate
    pub center: DVec2,
    /// Convex cell boundary, counter-clockwise
    pub vertices: Ring,
}

/// Generate one box-bounded Voronoi cell per site
///
/// Every point of a cell is at least as close to its site as to any other
/// site. A single site degenerates to the whole box. Coincident sites must
/// have been rejected by the validation gate before this runs; the half-plane
/// cut of two coincident sites would erase both cells.
///
/// The construction is O(n² · v) over n sites with v vertices per cell,
/// which is fine for batch runs over column sets.
pub fn generate_cells(bbox: &BoundingBox, sites: &[Site]) -> Result<Vec<RawCell>> {
    let box_ring = bbox.corners();

    sites
        .iter()
        .enumerate()
        .map(|(i, site)| {
            let mut ring = box_ring.clone();
            for (j, other) in sites.iter().enumerate() {
                if i == j {
                    continue;
                }
                // Points closer to `site` than to `other` satisfy
                // (other - site) . p <= (other - site) . midpoint.
                let normal = other.position - site.position;
                let midpoint = (site.position + other.position) * 0.5;
                ring = clip_ring_halfplane(&ring, normal, normal.dot(midpoint));
                if ring.len() < 3 {
                    break;
                }
            }
            if ring.len() < 3 {
                return Err(TessellationError::EmptyCell(site.id));
            }
            Ok(RawCell {
                site: site.id,
                center: site.position,
                vertices: ring,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::EPSILON;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn unit_box() -> BoundingBox {
        BoundingBox::new(DVec2::new(0.0, 0.0), DVec2::new(1.0, 1.0))
    }

    #[test]
    fn test_single_site_owns_whole_box() {
        let cells = generate_cells(&unit_box(), &[Site::new(1, 0.3, 0.7)]).unwrap();
        assert_eq!(cells.len(), 1);
        assert!((cells[0].vertices.area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_two_sites_split_at_bisector() {
        let sites = [Site::new(1, 0.25, 0.5), Site::new(2, 0.75, 0.5)];
        let cells = generate_cells(&unit_box(), &sites).unwrap();
        assert_eq!(cells.len(), 2);

        let left = &cells[0];
        let right = &cells[1];
        assert_eq!(left.site, 1);
        assert_eq!(right.site, 2);
        assert!((left.vertices.area() - 0.5).abs() < 1e-9);
        assert!((right.vertices.area() - 0.5).abs() < 1e-9);
        for p in left.vertices.points() {
            assert!(p.x <= 0.5 + EPSILON);
        }
        for p in right.vertices.points() {
            assert!(p.x >= 0.5 - EPSILON);
        }
    }

    #[test]
    fn test_cells_partition_box() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let sites: Vec<Site> = (0..40)
            .map(|i| Site::new(i, rng.gen::<f64>(), rng.gen::<f64>()))
            .collect();

        let cells = generate_cells(&unit_box(), &sites).unwrap();
        assert_eq!(cells.len(), sites.len());

        let total: f64 = cells.iter().map(|c| c.vertices.area()).sum();
        assert!(
            (total - 1.0).abs() < 1e-6,
            "cell areas should sum to the box area, got {}",
            total
        );
    }

    #[test]
    fn test_each_site_inside_own_cell() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let sites: Vec<Site> = (0..25)
            .map(|i| Site::new(i, rng.gen::<f64>(), rng.gen::<f64>()))
            .collect();

        let cells = generate_cells(&unit_box(), &sites).unwrap();
        for (site, cell) in sites.iter().zip(&cells) {
            assert_eq!(site.id, cell.site);
            assert!(
                cell.vertices.contains(site.position),
                "site {} should be inside its own cell",
                site.id
            );
        }
    }

    #[test]
    fn test_cells_are_ccw() {
        let sites = [
            Site::new(1, 0.2, 0.2),
            Site::new(2, 0.8, 0.3),
            Site::new(3, 0.5, 0.8),
        ];
        let cells = generate_cells(&unit_box(), &sites).unwrap();
        for cell in &cells {
            assert!(cell.vertices.is_ccw());
        }
    }
}
