//! Tessellation result value
//!
//! [`Tessellation`] owns the complete set of resolved areas for one run,
//! along with the input snapshot it was derived from.

use crate::area::OwnedArea;
use crate::error::Result;
use crate::generation::generate_owned_areas;
use crate::geometry::MultiPolygon;
use crate::site::{Site, SiteId};

#[cfg(feature = "spatial-index")]
use crate::spatial::SpatialIndex;
#[cfg(feature = "spatial-index")]
use glam::DVec2;

/// A complete bounded Voronoi tessellation of the clip region
///
/// Every validated site owns exactly one area; together the areas partition
/// the region with no overlapping interiors. The value is immutable once
/// generated and is what gets handed to the sync orchestrator.
///
/// # Example
///
/// ```
/// use column_areas::{Site, Tessellation};
/// use column_areas::geometry::{MultiPolygon, Ring};
/// use glam::DVec2;
///
/// let region = MultiPolygon::new(vec![Ring::new(vec![
///     DVec2::new(0.0, 0.0),
///     DVec2::new(1.0, 0.0),
///     DVec2::new(1.0, 1.0),
///     DVec2::new(0.0, 1.0),
/// ])]);
/// let sites = vec![Site::new(462, 0.25, 0.5), Site::new(463, 0.75, 0.5)];
///
/// let tessellation = Tessellation::generate(sites, region).unwrap();
/// assert_eq!(tessellation.area_count(), 2);
/// ```
#[derive(Clone)]
pub struct Tessellation {
    sites: Vec<Site>,
    region: MultiPolygon,
    areas: Vec<OwnedArea>,

    /// Site index for position lookups (requires the spatial-index feature)
    #[cfg(feature = "spatial-index")]
    index: SpatialIndex,
}

impl Tessellation {
    /// Run the tessellation pipeline over an input snapshot
    ///
    /// Validates the snapshot, builds and clips the diagram, and resolves
    /// ownership. Any failure leaves no partial result.
    pub fn generate(sites: Vec<Site>, region: MultiPolygon) -> Result<Self> {
        let areas = generate_owned_areas(&sites, &region)?;

        #[cfg(feature = "spatial-index")]
        let index = SpatialIndex::new(&sites);

        Ok(Self {
            sites,
            region,
            areas,
            #[cfg(feature = "spatial-index")]
            index,
        })
    }

    /// Number of resolved areas
    #[inline]
    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    /// All areas, in input site order
    #[inline]
    pub fn areas(&self) -> &[OwnedArea] {
        &self.areas
    }

    /// The input site snapshot
    #[inline]
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// The clip region the areas partition
    #[inline]
    pub fn region(&self) -> &MultiPolygon {
        &self.region
    }

    /// The area owned by a site, if that site is part of this run
    pub fn get_area(&self, site: SiteId) -> Option<&OwnedArea> {
        self.areas.iter().find(|area| area.site() == site)
    }

    /// The site owning the cell that contains a position
    ///
    /// By the Voronoi property this is simply the nearest site. The position
    /// is not required to lie inside the clip region; callers that care
    /// should check `region().contains(position)` themselves.
    #[cfg(feature = "spatial-index")]
    pub fn find_site_at(&self, position: DVec2) -> SiteId {
        self.sites[self.index.nearest(position)].id
    }
}
