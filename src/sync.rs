//! Persistence of owned areas into target stores
//!
//! The orchestrator walks the resolved areas in order and upserts each one
//! into every configured store: check by site identifier, then insert or
//! update. Stores are independent; a failed write is recorded and surfaced
//! in the final report but never stops the remaining writes. There is no
//! cross-store transaction, so two stores may disagree transiently for the
//! site currently being written; each converges before the next site starts.

use std::collections::{BTreeMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::area::OwnedArea;
use crate::config::SyncOptions;
use crate::site::SiteId;

/// Error type for store operations
///
/// Stores are external collaborators with their own failure modes, so they
/// report boxed errors rather than the core's error enum.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// An upsert-style target store keyed by site identifier
///
/// Implementations must be safe to share across the bounded write batches,
/// hence `&self` methods and `Send + Sync`.
pub trait AreaStore: Send + Sync {
    /// Short name used in reports and logs
    fn name(&self) -> &str;

    /// Whether a row for this site already exists
    fn contains(&self, site: SiteId) -> Result<bool, StoreError>;

    /// Insert a new row for a site that has none
    fn insert(&self, site: SiteId, area: &OwnedArea) -> Result<(), StoreError>;

    /// Replace the polygon (and derived scalar) of an existing row
    fn update(&self, site: SiteId, area: &OwnedArea) -> Result<(), StoreError>;
}

/// The row shape stores persist for each site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredArea {
    /// Area polygon as well-known text
    pub wkt: String,
    /// Geodesic area in square meters
    pub area_sq_m: f64,
}

impl StoredArea {
    fn from_area(area: &OwnedArea) -> Self {
        Self {
            wkt: area.to_wkt(),
            area_sq_m: area.area_sq_m(),
        }
    }
}

/// One failed (site, store) write
#[derive(Debug, Clone, PartialEq)]
pub struct SyncFailure {
    /// Site whose write failed
    pub site: SiteId,
    /// Name of the store that rejected the write
    pub store: String,
    /// Error description from the store
    pub message: String,
}

/// Outcome of a sync run
///
/// A non-empty failure list means partial success: the run completed, but
/// callers must treat the batch as not fully applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// Rows created
    pub inserted: usize,
    /// Rows replaced in place
    pub updated: usize,
    /// Writes that failed, in processing order
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    /// True when every write landed
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn merge(&mut self, other: SyncReport) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.failures.extend(other.failures);
    }
}

/// Upsert every area into every store
///
/// Areas are processed in input order. `write_concurrency` of 1 (the
/// default) is a strict sequential loop; larger values process areas in
/// batches of that size while keeping the report deterministic.
pub fn sync_areas(
    areas: &[OwnedArea],
    stores: &[Box<dyn AreaStore>],
    options: &SyncOptions,
) -> SyncReport {
    let batch = options.write_concurrency.max(1);
    let mut report = SyncReport::default();

    if batch == 1 {
        for area in areas {
            report.merge(sync_one(area, stores));
        }
    } else {
        for chunk in areas.chunks(batch) {
            let partials: Vec<SyncReport> =
                chunk.par_iter().map(|area| sync_one(area, stores)).collect();
            for partial in partials {
                report.merge(partial);
            }
        }
    }

    info!(
        inserted = report.inserted,
        updated = report.updated,
        failed = report.failures.len(),
        "sync complete"
    );
    report
}

/// Check-then-act for one area against every store
fn sync_one(area: &OwnedArea, stores: &[Box<dyn AreaStore>]) -> SyncReport {
    let site = area.site();
    let mut report = SyncReport::default();

    for store in stores {
        let result = store.contains(site).and_then(|exists| {
            if exists {
                store.update(site, area).map(|_| false)
            } else {
                store.insert(site, area).map(|_| true)
            }
        });
        match result {
            Ok(true) => {
                debug!(site, store = store.name(), "inserted");
                report.inserted += 1;
            }
            Ok(false) => {
                debug!(site, store = store.name(), "updated");
                report.updated += 1;
            }
            Err(error) => {
                warn!(site, store = store.name(), %error, "write failed");
                report.failures.push(SyncFailure {
                    site,
                    store: store.name().to_string(),
                    message: error.to_string(),
                });
            }
        }
    }

    report
}

/// In-memory store, the reference implementation and the test double
///
/// Writes for specific sites can be made to fail, simulating a store-side
/// fault without touching the orchestrator.
pub struct MemoryStore {
    name: String,
    rows: Mutex<BTreeMap<SiteId, StoredArea>>,
    write_faults: HashSet<SiteId>,
}

impl MemoryStore {
    /// Create an empty named store
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Mutex::new(BTreeMap::new()),
            write_faults: HashSet::new(),
        }
    }

    /// Make every write for `site` fail
    pub fn with_write_fault(mut self, site: SiteId) -> Self {
        self.write_faults.insert(site);
        self
    }

    /// The stored row for a site, if any
    pub fn get(&self, site: SiteId) -> Option<StoredArea> {
        self.rows.lock().unwrap().get(&site).cloned()
    }

    /// Number of stored rows
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// True when no rows are stored
    pub fn is_empty(&self) -> bool {
        self.rows.lock().unwrap().is_empty()
    }

    fn check_fault(&self, site: SiteId) -> Result<(), StoreError> {
        if self.write_faults.contains(&site) {
            return Err(format!("injected write fault for site {}", site).into());
        }
        Ok(())
    }

    fn rows(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<SiteId, StoredArea>>, StoreError> {
        self.rows.lock().map_err(|_| "store mutex poisoned".into())
    }
}

impl AreaStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn contains(&self, site: SiteId) -> Result<bool, StoreError> {
        Ok(self.rows()?.contains_key(&site))
    }

    fn insert(&self, site: SiteId, area: &OwnedArea) -> Result<(), StoreError> {
        self.check_fault(site)?;
        let mut rows = self.rows()?;
        if rows.contains_key(&site) {
            return Err(format!("row for site {} already exists", site).into());
        }
        rows.insert(site, StoredArea::from_area(area));
        Ok(())
    }

    fn update(&self, site: SiteId, area: &OwnedArea) -> Result<(), StoreError> {
        self.check_fault(site)?;
        let mut rows = self.rows()?;
        match rows.get_mut(&site) {
            Some(row) => {
                *row = StoredArea::from_area(area);
                Ok(())
            }
            None => Err(format!("no row for site {}", site).into()),
        }
    }
}

/// File-backed store: one JSON object mapping site id to [`StoredArea`]
///
/// Rows are loaded on open and the whole object is rewritten after every
/// mutation, so a run's writes survive a crash up to the last completed
/// site.
pub struct JsonFileStore {
    name: String,
    path: PathBuf,
    rows: Mutex<BTreeMap<SiteId, StoredArea>>,
}

impl JsonFileStore {
    /// Open a store file, creating an empty store if the file is missing
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let rows = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(error) if error.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => return Err(error.into()),
        };
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store".to_string());
        Ok(Self {
            name,
            path,
            rows: Mutex::new(rows),
        })
    }

    fn flush(&self, rows: &BTreeMap<SiteId, StoredArea>) -> Result<(), StoreError> {
        std::fs::write(&self.path, serde_json::to_string_pretty(rows)?)?;
        Ok(())
    }

    fn rows(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<SiteId, StoredArea>>, StoreError> {
        self.rows.lock().map_err(|_| "store mutex poisoned".into())
    }
}

impl AreaStore for JsonFileStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn contains(&self, site: SiteId) -> Result<bool, StoreError> {
        Ok(self.rows()?.contains_key(&site))
    }

    fn insert(&self, site: SiteId, area: &OwnedArea) -> Result<(), StoreError> {
        let mut rows = self.rows()?;
        if rows.contains_key(&site) {
            return Err(format!("row for site {} already exists", site).into());
        }
        rows.insert(site, StoredArea::from_area(area));
        self.flush(&rows)
    }

    fn update(&self, site: SiteId, area: &OwnedArea) -> Result<(), StoreError> {
        let mut rows = self.rows()?;
        if !rows.contains_key(&site) {
            return Err(format!("no row for site {}", site).into());
        }
        rows.insert(site, StoredArea::from_area(area));
        self.flush(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    use crate::geometry::Ring;

    fn area(site: SiteId, offset: f64) -> OwnedArea {
        OwnedArea::new(
            site,
            Ring::new(vec![
                DVec2::new(offset, 0.0),
                DVec2::new(offset + 1.0, 0.0),
                DVec2::new(offset + 1.0, 1.0),
                DVec2::new(offset, 1.0),
            ]),
        )
    }

    fn sequential() -> SyncOptions {
        SyncOptions {
            write_concurrency: 1,
        }
    }

    #[test]
    fn test_insert_then_update_is_idempotent() {
        let areas = vec![area(1, 0.0), area(2, 1.0)];
        let stores: Vec<Box<dyn AreaStore>> = vec![Box::new(MemoryStore::new("maria"))];

        let first = sync_areas(&areas, &stores, &sequential());
        assert_eq!(first.inserted, 2);
        assert_eq!(first.updated, 0);
        assert!(first.is_clean());

        let second = sync_areas(&areas, &stores, &sequential());
        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 2);
        assert!(second.is_clean());
    }

    #[test]
    fn test_update_replaces_geometry() {
        let store = MemoryStore::new("maria");
        store.insert(1, &area(1, 0.0)).unwrap();
        let before = store.get(1).unwrap();

        store.update(1, &area(1, 5.0)).unwrap();
        let after = store.get(1).unwrap();

        assert_ne!(before, after);
        assert_eq!(after, StoredArea::from_area(&area(1, 5.0)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_partial_failure_is_isolated() {
        let areas = vec![area(1, 0.0), area(2, 1.0)];
        let maria = MemoryStore::new("maria").with_write_fault(1);
        let pg = MemoryStore::new("pg");
        let stores: Vec<Box<dyn AreaStore>> = vec![Box::new(maria), Box::new(pg)];

        let report = sync_areas(&areas, &stores, &sequential());

        // Exactly one (site, store) pair failed
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].site, 1);
        assert_eq!(report.failures[0].store, "maria");
        // Three of four writes landed
        assert_eq!(report.inserted, 3);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_failure_does_not_stop_later_sites() {
        let areas = vec![area(1, 0.0), area(2, 1.0), area(3, 2.0)];
        let store = MemoryStore::new("maria").with_write_fault(1);
        let stores: Vec<Box<dyn AreaStore>> = vec![Box::new(store)];

        let report = sync_areas(&areas, &stores, &sequential());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.inserted, 2);
    }

    #[test]
    fn test_bounded_concurrency_matches_sequential() {
        let areas: Vec<OwnedArea> = (0..10).map(|i| area(i, i as f64)).collect();

        let seq_store = MemoryStore::new("store");
        let seq_report = sync_areas(
            &areas,
            &[Box::new(seq_store) as Box<dyn AreaStore>],
            &sequential(),
        );

        let par_store = MemoryStore::new("store");
        let par_report = sync_areas(
            &areas,
            &[Box::new(par_store) as Box<dyn AreaStore>],
            &SyncOptions {
                write_concurrency: 4,
            },
        );

        assert_eq!(seq_report, par_report);
        assert_eq!(par_report.inserted, 10);
    }

    #[test]
    fn test_memory_store_strict_insert_update() {
        let store = MemoryStore::new("maria");
        assert!(store.update(1, &area(1, 0.0)).is_err());
        store.insert(1, &area(1, 0.0)).unwrap();
        assert!(store.insert(1, &area(1, 0.0)).is_err());
        assert!(store.contains(1).unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("col_areas.json");
        let areas = vec![area(1, 0.0), area(2, 1.0)];

        {
            let store = JsonFileStore::open(&path).unwrap();
            let report = sync_areas(
                &areas,
                &[Box::new(store) as Box<dyn AreaStore>],
                &sequential(),
            );
            assert_eq!(report.inserted, 2);
        }

        // Reopening sees the persisted rows, so a second run only updates
        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.contains(1).unwrap());
        assert_eq!(store.name(), "col_areas");
        let report = sync_areas(
            &areas,
            &[Box::new(store) as Box<dyn AreaStore>],
            &sequential(),
        );
        assert_eq!(report.updated, 2);
        assert_eq!(report.inserted, 0);
    }
}
