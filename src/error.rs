//! Error types for column area tessellation

use std::fmt;

use crate::site::SiteId;

/// Errors that can occur while configuring, generating, or resolving a
/// tessellation run
///
/// Every variant is fatal to the run. Failures at the persistence stage are
/// deliberately not errors; they are reported per (site, store) pair through
/// [`crate::sync::SyncReport`] so one bad write never stops the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum TessellationError {
    /// Configuration validation failed
    InvalidConfig(String),
    /// The site source returned no sites for the configured selector
    NoSites,
    /// The region source returned no clip region
    NoRegion,
    /// The clip region geometry is unusable (too few points, interior rings)
    InvalidRegion(String),
    /// Sites whose coordinates fall outside the clip region
    SitesOutsideRegion(Vec<SiteId>),
    /// Sites that share a coordinate within tolerance
    DuplicateSites(Vec<SiteId>),
    /// A site's cell vanished entirely during construction or clipping
    EmptyCell(SiteId),
    /// A clipped cell resolved to zero or multiple owning sites
    OwnershipViolation {
        /// The site the cell was constructed for
        site: SiteId,
        /// The sites actually found inside the clipped cell
        claimants: Vec<SiteId>,
    },
    /// Reading from a site or region source failed
    SourceFailed(String),
}

fn join_ids(ids: &[SiteId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for TessellationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TessellationError::InvalidConfig(msg) => {
                write!(f, "invalid configuration: {}", msg)
            }
            TessellationError::NoSites => {
                write!(f, "no sites matched the configured selector")
            }
            TessellationError::NoRegion => {
                write!(f, "no clip region matched the configured selector")
            }
            TessellationError::InvalidRegion(msg) => write!(f, "invalid clip region: {}", msg),
            TessellationError::SitesOutsideRegion(ids) => {
                write!(f, "sites outside the clip region: {}", join_ids(ids))
            }
            TessellationError::DuplicateSites(ids) => {
                write!(f, "sites with coincident coordinates: {}", join_ids(ids))
            }
            TessellationError::EmptyCell(id) => {
                write!(f, "cell for site {} was clipped away entirely", id)
            }
            TessellationError::OwnershipViolation { site, claimants } => write!(
                f,
                "cell for site {} resolved to {} owner(s): [{}]",
                site,
                claimants.len(),
                join_ids(claimants)
            ),
            TessellationError::SourceFailed(msg) => write!(f, "source failed: {}", msg),
        }
    }
}

impl std::error::Error for TessellationError {}

/// Result type alias for tessellation operations
pub type Result<T> = std::result::Result<T, TessellationError>;
