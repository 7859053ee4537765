//! Run configuration and builder
//!
//! A run is driven by one immutable [`RunConfig`] value: how sites are
//! selected, how the clip region is addressed, and how writes are bounded.
//! Mutual exclusivity of the selector modes is enforced when the value is
//! built, not scattered through the pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TessellationError};
use crate::site::SiteId;

/// How the site set is selected from the site source
///
/// Exactly one mode must be configured per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteSelector {
    /// Select sites by an explicit list of identifiers
    ByIds(Vec<SiteId>),
    /// Select every site belonging to one of the given groups
    ByGroups(Vec<i64>),
}

/// How the clip region is addressed at the region source
///
/// Exactly one mode must be configured per run. `Query` carries an arbitrary
/// selection string interpreted by the source; sources that cannot honor a
/// mode report an error instead of guessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionSelector {
    /// Address the boundary by identifier
    ById(i64),
    /// Address the boundary by name
    ByName(String),
    /// Address every boundary in a named group
    ByGroup(String),
    /// Arbitrary source-interpreted selection returning the geometry
    Query(String),
}

/// Bounds on the persistence stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Number of areas in flight at once during the write loop
    ///
    /// 1 (the default) is a strict sequential loop, matching the batch-job
    /// backpressure the target stores expect. Raising it processes areas in
    /// batches of this size; it is always bounded, never unbounded.
    #[serde(default = "default_write_concurrency")]
    pub write_concurrency: usize,
}

fn default_write_concurrency() -> usize {
    1
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            write_concurrency: 1,
        }
    }
}

/// Immutable configuration for one tessellation run
///
/// # Example
///
/// ```
/// use column_areas::config::RunConfigBuilder;
///
/// let config = RunConfigBuilder::new()
///     .site_ids(vec![462, 463, 456])
///     .unwrap()
///     .region_id(875)
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(config.sync_options().write_concurrency, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    site_selector: SiteSelector,
    region_selector: RegionSelector,
    sync: SyncOptions,
}

impl RunConfig {
    /// Validate pre-assembled parts into a config
    ///
    /// This is the single place the selector invariants are checked; the
    /// builder and any deserialized form both funnel through it.
    pub fn from_parts(
        site_selector: SiteSelector,
        region_selector: RegionSelector,
        sync: SyncOptions,
    ) -> Result<Self> {
        match &site_selector {
            SiteSelector::ByIds(ids) if ids.is_empty() => {
                return Err(TessellationError::InvalidConfig(
                    "site id selection must not be empty".to_string(),
                ));
            }
            SiteSelector::ByGroups(groups) if groups.is_empty() => {
                return Err(TessellationError::InvalidConfig(
                    "site group selection must not be empty".to_string(),
                ));
            }
            _ => {}
        }
        validate_write_concurrency(sync.write_concurrency)?;
        Ok(Self {
            site_selector,
            region_selector,
            sync,
        })
    }

    /// The configured site selection mode
    #[inline]
    pub fn site_selector(&self) -> &SiteSelector {
        &self.site_selector
    }

    /// The configured region addressing mode
    #[inline]
    pub fn region_selector(&self) -> &RegionSelector {
        &self.region_selector
    }

    /// Bounds on the persistence stage
    #[inline]
    pub fn sync_options(&self) -> &SyncOptions {
        &self.sync
    }
}

fn validate_write_concurrency(value: usize) -> Result<()> {
    if value == 0 || value > 16 {
        return Err(TessellationError::InvalidConfig(format!(
            "write concurrency must be in 1..=16 (got {})",
            value
        )));
    }
    Ok(())
}

/// Builder for [`RunConfig`] with validation at every step
///
/// Selector setters reject a second selection mode of the same kind, so an
/// ambiguous configuration fails where it is written, not deep in the run.
///
/// # Example
///
/// ```
/// use column_areas::config::RunConfigBuilder;
///
/// let result = RunConfigBuilder::new()
///     .site_ids(vec![462])
///     .unwrap()
///     .site_groups(vec![7]);
///
/// assert!(result.is_err()); // two site selection modes
/// ```
#[derive(Debug, Clone, Default)]
pub struct RunConfigBuilder {
    site_selector: Option<SiteSelector>,
    region_selector: Option<RegionSelector>,
    sync: SyncOptions,
}

impl RunConfigBuilder {
    /// Create a builder with no selection modes and default sync bounds
    pub fn new() -> Self {
        Self {
            site_selector: None,
            region_selector: None,
            sync: SyncOptions::default(),
        }
    }

    fn set_site_selector(mut self, selector: SiteSelector) -> Result<Self> {
        if self.site_selector.is_some() {
            return Err(TessellationError::InvalidConfig(
                "site selection mode already configured".to_string(),
            ));
        }
        self.site_selector = Some(selector);
        Ok(self)
    }

    fn set_region_selector(mut self, selector: RegionSelector) -> Result<Self> {
        if self.region_selector.is_some() {
            return Err(TessellationError::InvalidConfig(
                "region selection mode already configured".to_string(),
            ));
        }
        self.region_selector = Some(selector);
        Ok(self)
    }

    /// Select sites by explicit identifiers
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the list is empty or another site
    /// selection mode was already set.
    pub fn site_ids(self, ids: Vec<SiteId>) -> Result<Self> {
        if ids.is_empty() {
            return Err(TessellationError::InvalidConfig(
                "site id selection must not be empty".to_string(),
            ));
        }
        self.set_site_selector(SiteSelector::ByIds(ids))
    }

    /// Select sites by group identifiers
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the list is empty or another site
    /// selection mode was already set.
    pub fn site_groups(self, groups: Vec<i64>) -> Result<Self> {
        if groups.is_empty() {
            return Err(TessellationError::InvalidConfig(
                "site group selection must not be empty".to_string(),
            ));
        }
        self.set_site_selector(SiteSelector::ByGroups(groups))
    }

    /// Address the clip region by boundary identifier
    pub fn region_id(self, id: i64) -> Result<Self> {
        self.set_region_selector(RegionSelector::ById(id))
    }

    /// Address the clip region by boundary name
    pub fn region_name(self, name: impl Into<String>) -> Result<Self> {
        self.set_region_selector(RegionSelector::ByName(name.into()))
    }

    /// Address the clip region by boundary group
    pub fn region_group(self, group: impl Into<String>) -> Result<Self> {
        self.set_region_selector(RegionSelector::ByGroup(group.into()))
    }

    /// Address the clip region with an arbitrary source-interpreted query
    pub fn region_query(self, query: impl Into<String>) -> Result<Self> {
        self.set_region_selector(RegionSelector::Query(query.into()))
    }

    /// Bound the number of areas in flight during the write loop
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` outside 1..=16.
    pub fn write_concurrency(mut self, value: usize) -> Result<Self> {
        validate_write_concurrency(value)?;
        self.sync.write_concurrency = value;
        Ok(self)
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when either selection mode is missing.
    pub fn build(self) -> Result<RunConfig> {
        let site_selector = self.site_selector.ok_or_else(|| {
            TessellationError::InvalidConfig("no site selection mode configured".to_string())
        })?;
        let region_selector = self.region_selector.ok_or_else(|| {
            TessellationError::InvalidConfig("no region selection mode configured".to_string())
        })?;
        RunConfig::from_parts(site_selector, region_selector, self.sync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_minimal() {
        let config = RunConfigBuilder::new()
            .site_ids(vec![462, 463])
            .unwrap()
            .region_id(875)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            config.site_selector(),
            &SiteSelector::ByIds(vec![462, 463])
        );
        assert_eq!(config.region_selector(), &RegionSelector::ById(875));
        assert_eq!(config.sync_options().write_concurrency, 1);
    }

    #[test]
    fn test_builder_missing_selectors() {
        assert!(RunConfigBuilder::new().build().is_err());
        assert!(RunConfigBuilder::new()
            .site_ids(vec![462])
            .unwrap()
            .build()
            .is_err());
        assert!(RunConfigBuilder::new()
            .region_id(875)
            .unwrap()
            .build()
            .is_err());
    }

    #[test]
    fn test_builder_rejects_two_site_modes() {
        let result = RunConfigBuilder::new()
            .site_ids(vec![462])
            .unwrap()
            .site_groups(vec![7]);
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_two_region_modes() {
        let result = RunConfigBuilder::new()
            .region_name("New Zealand")
            .unwrap()
            .region_group("basins");
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_empty_selections() {
        assert!(RunConfigBuilder::new().site_ids(vec![]).is_err());
        assert!(RunConfigBuilder::new().site_groups(vec![]).is_err());
    }

    #[test]
    fn test_write_concurrency_bounds() {
        assert!(RunConfigBuilder::new().write_concurrency(0).is_err());
        assert!(RunConfigBuilder::new().write_concurrency(17).is_err());
        let config = RunConfigBuilder::new()
            .site_ids(vec![1])
            .unwrap()
            .region_id(1)
            .unwrap()
            .write_concurrency(4)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.sync_options().write_concurrency, 4);
    }

    #[test]
    fn test_from_parts_rejects_empty_ids() {
        let result = RunConfig::from_parts(
            SiteSelector::ByIds(vec![]),
            RegionSelector::ById(1),
            SyncOptions::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_selector_serde_round_trip() {
        let selector = SiteSelector::ByIds(vec![462, 463, 456]);
        let json = serde_json::to_string(&selector).unwrap();
        assert_eq!(json, r#"{"by_ids":[462,463,456]}"#);
        let restored: SiteSelector = serde_json::from_str(&json).unwrap();
        assert_eq!(selector, restored);

        let selector = RegionSelector::ByName("Parana Basin".to_string());
        let json = serde_json::to_string(&selector).unwrap();
        let restored: RegionSelector = serde_json::from_str(&json).unwrap();
        assert_eq!(selector, restored);
    }

    #[test]
    fn test_sync_options_default_from_empty_json() {
        let options: SyncOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.write_concurrency, 1);
    }
}
