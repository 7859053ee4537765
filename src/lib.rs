//! Bounded Voronoi tessellation of stratigraphic column areas
//!
//! Partitions a bounded geographic region into non-overlapping cells, one
//! per column site, such that each cell contains exactly the points closest
//! to its site, clipped to the region's true boundary shape. The resolved
//! areas are upserted into one or more target stores.
//!
//! # Quick Start
//!
//! ```rust
//! use column_areas::{Site, Tessellation};
//! use column_areas::geometry::{MultiPolygon, Ring};
//! use glam::DVec2;
//!
//! // Clip region: the unit square
//! let region = MultiPolygon::new(vec![Ring::new(vec![
//!     DVec2::new(0.0, 0.0),
//!     DVec2::new(1.0, 0.0),
//!     DVec2::new(1.0, 1.0),
//!     DVec2::new(0.0, 1.0),
//! ])]);
//!
//! // Two column sites split the square at x = 0.5
//! let sites = vec![Site::new(462, 0.25, 0.5), Site::new(463, 0.75, 0.5)];
//!
//! let tessellation = Tessellation::generate(sites, region).unwrap();
//! assert_eq!(tessellation.area_count(), 2);
//! println!("{}", tessellation.areas()[0].to_wkt());
//! ```
//!
//! # Pipeline
//!
//! sites + clip region → validation gate → Voronoi builder → polygon
//! clipper → ownership resolver → sync orchestrator. The tessellation stage
//! is pure computation over the in-memory snapshot; all fatal errors stop
//! the batch before any persistence occurs.
//!
//! # Features
//!
//! - `spatial-index` (default): KD-tree site lookups for ownership candidate
//!   pruning and [`Tessellation::find_site_at`]

// Modules
pub mod area;
pub mod config;
pub mod error;
pub mod generation;
pub mod geometry;
pub mod io;
pub mod site;
pub mod sync;
pub mod tessellation;

#[cfg(feature = "spatial-index")]
pub mod spatial;

// Re-export core types for convenience
pub use area::OwnedArea;
pub use config::{RegionSelector, RunConfig, RunConfigBuilder, SiteSelector, SyncOptions};
pub use error::{Result, TessellationError};
pub use generation::RawCell;
pub use io::{GeoJsonFileSource, RegionSource, SiteSource};
pub use site::{Site, SiteId};
pub use sync::{AreaStore, JsonFileStore, MemoryStore, SyncReport};
pub use tessellation::Tessellation;

#[cfg(feature = "spatial-index")]
pub use spatial::SpatialIndex;

// Re-export glam::DVec2 for convenience
pub use glam::DVec2;

use tracing::info;

/// Run a complete batch: fetch, tessellate, sync
///
/// Composes the collaborators around the core pipeline. Fatal errors at any
/// stage before persistence return `Err` and leave every store untouched;
/// per-store write failures are reported in the returned [`SyncReport`].
pub fn run(
    config: &RunConfig,
    sites: &dyn SiteSource,
    regions: &dyn RegionSource,
    stores: &[Box<dyn AreaStore>],
) -> Result<SyncReport> {
    let site_set = sites.fetch_sites(config.site_selector())?;
    let region = regions.fetch_region(config.region_selector())?;
    info!(sites = site_set.len(), parts = region.len(), "input snapshot loaded");

    let tessellation = Tessellation::generate(site_set, region)?;

    Ok(sync::sync_areas(
        tessellation.areas(),
        stores,
        config.sync_options(),
    ))
}
