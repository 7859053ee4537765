//! Core tessellation pipeline
//!
//! Validates the input snapshot, builds the box-bounded Voronoi diagram,
//! clips every cell against the region boundary, and resolves cell
//! ownership. Pure computation over the in-memory snapshot; persistence
//! happens elsewhere.

mod ownership;
mod validate;
mod voronoi;

pub use ownership::{retain_piece, verify_owner};
pub use validate::validate_sites;
pub use voronoi::{generate_cells, RawCell};

use rayon::prelude::*;
use tracing::info;

use crate::area::OwnedArea;
use crate::error::Result;
use crate::geometry::{clip_cell_to_region, MultiPolygon};
use crate::site::Site;

#[cfg(feature = "spatial-index")]
use crate::geometry::{Ring, EPSILON};
#[cfg(feature = "spatial-index")]
use crate::spatial::SpatialIndex;

/// Pad fraction applied to the region bounding box before Voronoi
/// construction, so hull sites never sit exactly on the working boundary
const BBOX_PAD_FRACTION: f64 = 0.005;

/// Run the full tessellation stage: one owned area per validated site
///
/// Output order matches the input site order. Clipping and ownership
/// resolution run per cell in parallel; cells are independent given the raw
/// diagram and the region, so this changes nothing but wall-clock time.
pub fn generate_owned_areas(sites: &[Site], region: &MultiPolygon) -> Result<Vec<OwnedArea>> {
    validate::validate_sites(sites, region)?;

    // Step 1: working box from the region
    let bbox = match region.bounding_box() {
        Some(bbox) => bbox.padded(BBOX_PAD_FRACTION),
        None => return Err(crate::error::TessellationError::NoRegion),
    };

    // Step 2: box-bounded Voronoi diagram
    let cells = voronoi::generate_cells(&bbox, sites)?;

    #[cfg(feature = "spatial-index")]
    let index = SpatialIndex::new(sites);

    // Step 3: clip each cell to the region and verify its owner
    let areas: Vec<OwnedArea> = cells
        .par_iter()
        .map(|cell| {
            let pieces = clip_cell_to_region(&cell.vertices, region);
            let piece = ownership::retain_piece(cell, pieces)?;

            #[cfg(feature = "spatial-index")]
            let candidates = candidates_near(&index, sites, &piece);
            #[cfg(not(feature = "spatial-index"))]
            let candidates = sites.to_vec();

            ownership::verify_owner(cell, piece, &candidates)
        })
        .collect::<Result<_>>()?;

    info!(sites = sites.len(), areas = areas.len(), "tessellation resolved");
    Ok(areas)
}

/// Sites that could possibly lie inside `piece`
///
/// Everything inside the piece is within its max vertex radius of its
/// centroid, so the KD query can only over-select, never miss a claimant.
#[cfg(feature = "spatial-index")]
fn candidates_near(index: &SpatialIndex, sites: &[Site], piece: &Ring) -> Vec<Site> {
    let center = piece.centroid();
    let radius = piece.max_radius_about(center) + EPSILON;
    index
        .within_radius(center, radius)
        .into_iter()
        .map(|i| sites[i])
        .collect()
}
