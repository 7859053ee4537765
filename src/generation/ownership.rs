//! Ownership resolution
//!
//! After clipping, each cell must contain exactly one site, and it must be
//! the site the cell was constructed for. Anything else means the diagram is
//! wrong, and a wrong diagram must never reach the stores: silent
//! mis-assignment corrupts downstream spatial data permanently.

use tracing::warn;

use crate::area::OwnedArea;
use crate::error::{Result, TessellationError};
use crate::geometry::Ring;
use crate::site::Site;

use super::voronoi::RawCell;

/// Reduce a cell's clipped pieces to the single piece it keeps
///
/// A cell that spans more than one region part yields multiple disjoint
/// pieces. Only the piece containing the owning site's coordinate is kept;
/// the rest are discarded with a warning, which keeps the result a total
/// partition without operator intervention.
pub fn retain_piece(cell: &RawCell, mut pieces: Vec<Ring>) -> Result<Ring> {
    match pieces.len() {
        0 => Err(TessellationError::EmptyCell(cell.site)),
        1 => Ok(pieces.pop().unwrap()),
        n => {
            let own = pieces.iter().position(|piece| piece.contains(cell.center));
            match own {
                Some(index) => {
                    warn!(
                        site = cell.site,
                        discarded = n - 1,
                        "cell spans multiple region parts; keeping the piece containing the site"
                    );
                    Ok(pieces.swap_remove(index))
                }
                None => Err(TessellationError::OwnershipViolation {
                    site: cell.site,
                    claimants: vec![],
                }),
            }
        }
    }
}

/// Verify that exactly the owning site lies inside the kept piece
///
/// `candidates` must be a superset of the sites inside the piece; the caller
/// may prune it spatially but never below that guarantee. Claimants are
/// reported sorted so diagnostics are deterministic.
pub fn verify_owner(cell: &RawCell, piece: Ring, candidates: &[Site]) -> Result<OwnedArea> {
    let mut claimants: Vec<_> = candidates
        .iter()
        .filter(|site| piece.contains(site.position))
        .map(|site| site.id)
        .collect();
    claimants.sort_unstable();

    if claimants == [cell.site] {
        Ok(OwnedArea::new(cell.site, piece))
    } else {
        Err(TessellationError::OwnershipViolation {
            site: cell.site,
            claimants,
        })
    }
}
