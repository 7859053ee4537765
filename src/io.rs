//! Input sources for sites and clip regions
//!
//! The core never talks to a data store directly; it consumes the
//! [`SiteSource`] and [`RegionSource`] collaborator traits. The shipped
//! implementation reads GeoJSON files: a FeatureCollection of Point
//! features for sites, and a FeatureCollection (or a bare geometry) for the
//! boundary.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glam::DVec2;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::{RegionSelector, SiteSelector};
use crate::error::{Result, TessellationError};
use crate::geometry::{MultiPolygon, Ring};
use crate::site::Site;

/// Yields the site snapshot for a run
pub trait SiteSource {
    /// Fetch all sites matching the selector
    ///
    /// An empty selection is the fatal data-absence error of the run, not a
    /// valid empty result.
    fn fetch_sites(&self, selector: &SiteSelector) -> Result<Vec<Site>>;
}

/// Yields the clip region for a run
pub trait RegionSource {
    /// Fetch the region addressed by the selector
    ///
    /// Multiple matching boundary polygons concatenate into one multi-part
    /// region. Zero matches is fatal.
    fn fetch_region(&self, selector: &RegionSelector) -> Result<MultiPolygon>;
}

// GeoJSON document shapes. Unknown members (like "type": "Feature") are
// ignored by serde, which is exactly the leniency real-world files need.

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Point { coordinates: [f64; 2] },
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
}

#[derive(Debug, Clone, Deserialize)]
struct Feature {
    geometry: Geometry,
    #[serde(default)]
    properties: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

/// A region file may hold a collection, a single feature, or bare geometry
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RegionDocument {
    Collection(FeatureCollection),
    Feature(Feature),
    Geometry(Geometry),
}

/// Parse a sites FeatureCollection and apply the selector
pub fn parse_sites(text: &str, selector: &SiteSelector) -> Result<Vec<Site>> {
    let collection: FeatureCollection = serde_json::from_str(text)
        .map_err(|error| TessellationError::SourceFailed(format!("sites document: {}", error)))?;

    let mut sites = Vec::new();
    for feature in &collection.features {
        let Geometry::Point { coordinates } = &feature.geometry else {
            return Err(TessellationError::SourceFailed(
                "site feature geometry is not a Point".to_string(),
            ));
        };
        let id = feature
            .properties
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                TessellationError::SourceFailed(
                    "site feature has no integer 'id' property".to_string(),
                )
            })?;
        let group = feature.properties.get("group").and_then(Value::as_i64);

        let selected = match selector {
            SiteSelector::ByIds(ids) => ids.contains(&id),
            SiteSelector::ByGroups(groups) => {
                group.map_or(false, |value| groups.contains(&value))
            }
        };
        if selected {
            sites.push(Site::new(id, coordinates[0], coordinates[1]));
        }
    }

    if let SiteSelector::ByIds(ids) = selector {
        let found: HashSet<_> = sites.iter().map(|site| site.id).collect();
        let missing: Vec<_> = ids.iter().filter(|id| !found.contains(id)).collect();
        if !missing.is_empty() {
            warn!(?missing, "selected site ids not present in the source");
        }
    }

    if sites.is_empty() {
        return Err(TessellationError::NoSites);
    }
    debug!(sites = sites.len(), "sites loaded");
    Ok(sites)
}

/// Parse a region document and apply the selector
///
/// A bare geometry document *is* the region; addressing modes only apply to
/// feature collections, whose features are matched on their `id`, `name`,
/// or `group` properties. The `Query` mode needs a query-capable source and
/// is rejected here.
pub fn parse_region(text: &str, selector: &RegionSelector) -> Result<MultiPolygon> {
    let document: RegionDocument = serde_json::from_str(text)
        .map_err(|error| TessellationError::SourceFailed(format!("region document: {}", error)))?;

    let geometries: Vec<Geometry> = match document {
        RegionDocument::Geometry(geometry) => vec![geometry],
        RegionDocument::Feature(feature) => vec![feature.geometry],
        RegionDocument::Collection(collection) => {
            let matched: Vec<Geometry> = collection
                .features
                .into_iter()
                .filter(|feature| region_selected(&feature.properties, selector))
                .map(|feature| feature.geometry)
                .collect();
            if let RegionSelector::Query(_) = selector {
                return Err(TessellationError::InvalidConfig(
                    "query region selection is not supported by the GeoJSON file source"
                        .to_string(),
                ));
            }
            matched
        }
    };

    let mut parts = Vec::new();
    for geometry in geometries {
        collect_parts(geometry, &mut parts)?;
    }
    if parts.is_empty() {
        return Err(TessellationError::NoRegion);
    }
    debug!(parts = parts.len(), "clip region loaded");
    Ok(MultiPolygon::new(parts))
}

fn region_selected(properties: &Map<String, Value>, selector: &RegionSelector) -> bool {
    match selector {
        RegionSelector::ById(id) => properties.get("id").and_then(Value::as_i64) == Some(*id),
        RegionSelector::ByName(name) => {
            properties.get("name").and_then(Value::as_str) == Some(name.as_str())
        }
        RegionSelector::ByGroup(group) => {
            properties.get("group").and_then(Value::as_str) == Some(group.as_str())
        }
        RegionSelector::Query(_) => false,
    }
}

fn collect_parts(geometry: Geometry, parts: &mut Vec<Ring>) -> Result<()> {
    match geometry {
        Geometry::Point { .. } => Err(TessellationError::InvalidRegion(
            "region geometry is a Point".to_string(),
        )),
        Geometry::Polygon { coordinates } => push_polygon(&coordinates, parts),
        Geometry::MultiPolygon { coordinates } => {
            for polygon in &coordinates {
                push_polygon(polygon, parts)?;
            }
            Ok(())
        }
    }
}

fn push_polygon(rings: &[Vec<[f64; 2]>], parts: &mut Vec<Ring>) -> Result<()> {
    if rings.len() > 1 {
        return Err(TessellationError::InvalidRegion(
            "interior rings (holes) are not supported".to_string(),
        ));
    }
    let Some(exterior) = rings.first() else {
        return Err(TessellationError::InvalidRegion(
            "polygon has no rings".to_string(),
        ));
    };
    let ring = Ring::new(
        exterior
            .iter()
            .map(|&[lon, lat]| DVec2::new(lon, lat))
            .collect(),
    )
    .into_ccw();
    if ring.len() < 3 {
        return Err(TessellationError::InvalidRegion(
            "region ring has fewer than 3 distinct points".to_string(),
        ));
    }
    parts.push(ring);
    Ok(())
}

/// GeoJSON-file-backed site and region source
pub struct GeoJsonFileSource {
    sites_path: PathBuf,
    region_path: PathBuf,
}

impl GeoJsonFileSource {
    /// Create a source reading sites and region from the given files
    pub fn new(sites_path: impl AsRef<Path>, region_path: impl AsRef<Path>) -> Self {
        Self {
            sites_path: sites_path.as_ref().to_path_buf(),
            region_path: region_path.as_ref().to_path_buf(),
        }
    }

    fn read(path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|error| {
            TessellationError::SourceFailed(format!("reading {}: {}", path.display(), error))
        })
    }
}

impl SiteSource for GeoJsonFileSource {
    fn fetch_sites(&self, selector: &SiteSelector) -> Result<Vec<Site>> {
        parse_sites(&Self::read(&self.sites_path)?, selector)
    }
}

impl RegionSource for GeoJsonFileSource {
    fn fetch_region(&self, selector: &RegionSelector) -> Result<MultiPolygon> {
        parse_region(&Self::read(&self.region_path)?, selector)
    }
}
