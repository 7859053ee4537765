//! Pre-flight validation gate
//!
//! Runs before any geometry is constructed. A failure here aborts the whole
//! run: partial tessellation would silently omit sites from the final
//! coverage, which is worse than no result at all.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{Result, TessellationError};
use crate::geometry::{MultiPolygon, EPSILON};
use crate::site::{Site, SiteId};

/// Validate the input snapshot
///
/// Checks, in order: the site set is non-empty, the region is usable,
/// no two sites share a coordinate within tolerance, and every site lies
/// inside (or on the boundary of) the region. Offender lists are collected
/// in full before failing so one run reports every bad site at once.
pub fn validate_sites(sites: &[Site], region: &MultiPolygon) -> Result<()> {
    if sites.is_empty() {
        return Err(TessellationError::NoSites);
    }
    if region.is_empty() {
        return Err(TessellationError::NoRegion);
    }
    for (i, part) in region.parts().iter().enumerate() {
        if part.len() < 3 {
            return Err(TessellationError::InvalidRegion(format!(
                "region part {} has fewer than 3 points",
                i
            )));
        }
    }

    let duplicates = coincident_sites(sites);
    if !duplicates.is_empty() {
        return Err(TessellationError::DuplicateSites(duplicates));
    }

    let outside: Vec<SiteId> = sites
        .iter()
        .filter(|site| !region.contains(site.position))
        .map(|site| site.id)
        .collect();
    if !outside.is_empty() {
        return Err(TessellationError::SitesOutsideRegion(outside));
    }

    debug!(sites = sites.len(), parts = region.len(), "validation gate passed");
    Ok(())
}

/// Identifiers of all sites involved in a coincident pair
///
/// Coincident sites make cell ownership ambiguous, so both members of every
/// pair are reported rather than silently dropping one.
fn coincident_sites(sites: &[Site]) -> Vec<SiteId> {
    let mut ids = BTreeSet::new();
    for i in 0..sites.len() {
        for j in (i + 1)..sites.len() {
            if sites[i].position.distance(sites[j].position) <= EPSILON {
                ids.insert(sites[i].id);
                ids.insert(sites[j].id);
            }
        }
    }
    ids.into_iter().collect()
}
