//! Polygon clipping
//!
//! Two layers share one primitive. [`clip_ring_halfplane`] cuts a ring
//! against a single half-plane, interpolating edge crossings. The Voronoi
//! builder applies it with bisector half-planes; [`clip_ring_to_convex`]
//! applies it per edge of a convex cell (Sutherland-Hodgman with the convex
//! polygon as the clip shape), which handles arbitrary, possibly concave
//! region parts as the subject.

use glam::DVec2;

use super::{MultiPolygon, Ring, AREA_EPSILON, EPSILON};

/// Keep the part of `ring` satisfying `normal . p <= offset`
///
/// Vertices within [`EPSILON`] of the boundary line count as inside, so a
/// ring touching the boundary is not cut into a spurious sliver. The result
/// may have fewer than 3 vertices when the ring lies (almost) entirely on
/// the far side.
pub fn clip_ring_halfplane(ring: &Ring, normal: DVec2, offset: f64) -> Ring {
    let pts = ring.points();
    let n = pts.len();
    let mut out: Vec<DVec2> = Vec::with_capacity(n + 2);

    for i in 0..n {
        let a = pts[i];
        let b = pts[(i + 1) % n];
        let da = normal.dot(a) - offset;
        let db = normal.dot(b) - offset;
        let a_in = da <= EPSILON;
        let b_in = db <= EPSILON;

        if a_in {
            out.push(a);
        }
        if a_in != b_in {
            let denom = da - db;
            if denom.abs() > f64::EPSILON {
                let t = (da / denom).clamp(0.0, 1.0);
                out.push(a + (b - a) * t);
            }
        }
    }

    Ring::new(out)
}

/// Intersect an arbitrary simple ring with a convex counter-clockwise cell
///
/// Clips the subject successively against each cell edge's interior
/// half-plane. Returns `None` when the intersection is empty or degenerates
/// to a sliver below [`AREA_EPSILON`].
pub fn clip_ring_to_convex(subject: &Ring, cell: &Ring) -> Option<Ring> {
    if subject.len() < 3 || cell.len() < 3 {
        return None;
    }

    let edges = cell.points();
    let mut out = subject.clone();
    for i in 0..edges.len() {
        let a = edges[i];
        let b = edges[(i + 1) % edges.len()];
        // For a CCW cell the interior is left of a->b, i.e. n . p <= n . a
        // with n the outward edge normal.
        let e = b - a;
        let normal = DVec2::new(e.y, -e.x);
        out = clip_ring_halfplane(&out, normal, normal.dot(a));
        if out.len() < 3 {
            return None;
        }
    }

    if out.area() <= AREA_EPSILON {
        None
    } else {
        Some(out)
    }
}

/// Intersect a convex Voronoi cell with the whole clip region
///
/// Produces at most one piece per region part; parts the cell does not reach
/// contribute nothing. The caller decides what a multi-piece result means.
pub fn clip_cell_to_region(cell: &Ring, region: &MultiPolygon) -> Vec<Ring> {
    region
        .parts()
        .iter()
        .filter_map(|part| clip_ring_to_convex(part, cell))
        .collect()
}
