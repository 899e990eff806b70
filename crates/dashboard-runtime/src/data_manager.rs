//! Load-once dataset cache for the dashboard runtime.
//!
//! [`DatasetManager`] owns the joined company table and the historical table
//! for one session. Tables are loaded on first use and reused until one of the
//! input files changes on disk (modification time or length) or the caller
//! asks for an explicit [`DatasetManager::reload`]. A missing or unreadable
//! required file never escapes as an error: the manager substitutes an empty
//! dataset and records a warning for the renderer to show.

use std::path::Path;
use std::time::{Instant, SystemTime};

use dashboard_core::models::CompanyRecord;
use dashboard_core::settings::DataPaths;
use dashboard_data::history::HistoricalTable;
use dashboard_data::reader::{load_company_dataset, load_historical_dataset};

// ── Dataset ───────────────────────────────────────────────────────────────────

/// Immutable snapshot of every table a page can read.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub companies: Vec<CompanyRecord>,
    pub history: HistoricalTable,
}

impl Dataset {
    /// `true` when there is nothing to render.
    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }
}

// ── Fingerprints ──────────────────────────────────────────────────────────────

/// Identity of an input file as seen on disk; `None` when it does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileFingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileFingerprint {
    fn of(path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(path).ok()?;
        Some(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

type Fingerprints = [Option<FileFingerprint>; 3];

// ── DatasetManager ────────────────────────────────────────────────────────────

/// Explicit cache around the CSV loaders.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use dashboard_core::settings::DataPaths;
/// use dashboard_runtime::data_manager::DatasetManager;
///
/// let paths = DataPaths::resolve(
///     Path::new("."),
///     Path::new("ind_nifty500list.csv"),
///     Path::new("final_project_watchlist_complete.csv"),
///     Path::new("historical_financials.csv"),
/// );
/// let mut mgr = DatasetManager::new(paths);
/// println!("companies: {}", mgr.get_data().companies.len());
/// ```
pub struct DatasetManager {
    /// Resolved input files.
    paths: DataPaths,
    /// Most recently loaded snapshot.
    cache: Option<Dataset>,
    /// On-disk identity of the input files when `cache` was filled.
    fingerprints: Option<Fingerprints>,
    /// When the cache was last populated.
    loaded_at: Option<Instant>,
    /// Recoverable problems from the last load, for display.
    warnings: Vec<String>,
}

impl DatasetManager {
    pub fn new(paths: DataPaths) -> Self {
        Self {
            paths,
            cache: None,
            fingerprints: None,
            loaded_at: None,
            warnings: Vec::new(),
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the dataset, loading it only when the cache is empty or an
    /// input file changed since the last load.
    pub fn get_data(&mut self) -> &Dataset {
        self.ensure_loaded();
        self.cache.get_or_insert_with(Dataset::default)
    }

    /// Like [`Self::get_data`], also returning the warnings of the load that
    /// produced the dataset. Checks the input files once.
    pub fn snapshot(&mut self) -> (&Dataset, &[String]) {
        self.ensure_loaded();
        let data = self.cache.get_or_insert_with(Dataset::default);
        (data, &self.warnings)
    }

    /// Discard the cache and load again from disk.
    pub fn reload(&mut self) -> &Dataset {
        self.invalidate_cache();
        self.get_data()
    }

    /// Discard the current cache, forcing the next [`Self::get_data`] to load.
    pub fn invalidate_cache(&mut self) {
        self.cache = None;
        self.fingerprints = None;
        self.loaded_at = None;
        tracing::debug!("dataset cache invalidated");
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn current_fingerprints(&self) -> Fingerprints {
        [
            FileFingerprint::of(&self.paths.universe),
            FileFingerprint::of(&self.paths.watchlist),
            FileFingerprint::of(&self.paths.history),
        ]
    }

    fn ensure_loaded(&mut self) {
        if self.is_cache_valid() {
            tracing::debug!("returning cached dataset");
        } else {
            self.load();
        }
    }

    fn is_cache_valid(&self) -> bool {
        match (&self.cache, &self.fingerprints) {
            (Some(_), Some(fp)) => *fp == self.current_fingerprints(),
            _ => false,
        }
    }

    /// Load every table, recovering failures into empty tables plus warnings.
    fn load(&mut self) {
        let fingerprints = self.current_fingerprints();
        let mut warnings = Vec::new();

        let companies = match load_company_dataset(&self.paths.universe, &self.paths.watchlist) {
            Ok(records) => records,
            Err(e) if e.is_data_unavailable() => {
                tracing::warn!(error = %e, "company dataset unavailable; rendering empty state");
                warnings.push(format!("Data files missing or unreadable: {e}"));
                Vec::new()
            }
            Err(e) => {
                tracing::error!(error = %e, "company dataset failed to load; rendering empty state");
                warnings.push(format!("Failed to load company data: {e}"));
                Vec::new()
            }
        };

        let history = match load_historical_dataset(&self.paths.history) {
            Ok(records) => HistoricalTable::new(records),
            Err(e) => {
                tracing::warn!(error = %e, "historical dataset unavailable; trends disabled");
                warnings.push(format!("Historical data unreadable: {e}"));
                HistoricalTable::default()
            }
        };

        tracing::debug!(
            companies = companies.len(),
            history_rows = history.len(),
            "dataset loaded"
        );

        self.cache = Some(Dataset { companies, history });
        self.fingerprints = Some(fingerprints);
        self.loaded_at = Some(Instant::now());
        self.warnings = warnings;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    const WATCHLIST_HEADER: &str = "Symbol,Sector,Anomaly_Score,Anomaly_Label,TATA_Z,DSRI_Z,AQI_Z,P_OCF_Z,PEG_Z,DuPont_Discrepancy_Z,PCA_1,PCA_2";

    fn write(path: &Path, content: &str) {
        std::fs::write(path, content).expect("write fixture");
    }

    /// Returns a manager over a populated temp dir. The TempDir must be kept
    /// alive for the duration of the test.
    fn make_manager_with_dir() -> (DatasetManager, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        write(
            &dir.path().join("universe.csv"),
            "Symbol,Company Name\nTCS,Tata Consultancy Services\n",
        );
        write(
            &dir.path().join("watchlist.csv"),
            &format!("{WATCHLIST_HEADER}\nTCS,IT,-0.41,-1,2.5,0,0,0,0,0,1,2\nXYZCO,Textiles,0.1,1,0,0,0,0,0,0,0,0\n"),
        );
        let paths = DataPaths::resolve(
            dir.path(),
            Path::new("universe.csv"),
            Path::new("watchlist.csv"),
            Path::new("history.csv"),
        );
        (DatasetManager::new(paths), dir)
    }

    #[test]
    fn test_cache_miss_on_first_call() {
        let (mgr, _dir) = make_manager_with_dir();
        assert!(!mgr.is_cache_valid());
        assert!(mgr.loaded_at.is_none());
        assert!(mgr.warnings.is_empty());
    }

    #[test]
    fn test_loads_and_joins() {
        let (mut mgr, _dir) = make_manager_with_dir();
        let data = mgr.get_data();

        assert_eq!(data.companies.len(), 2);
        assert_eq!(data.companies[0].company_name, "Tata Consultancy Services");
        assert_eq!(data.companies[1].company_name, "XYZCO");
        assert!(data.history.is_empty());
        assert!(mgr.warnings.is_empty());
    }

    #[test]
    fn test_cache_reused_when_files_unchanged() {
        let (mut mgr, _dir) = make_manager_with_dir();
        mgr.get_data();
        let first = mgr.loaded_at.unwrap();

        std::thread::sleep(Duration::from_millis(10));
        mgr.get_data();

        assert_eq!(mgr.loaded_at.unwrap(), first);
        assert!(mgr.is_cache_valid());
    }

    #[test]
    fn test_file_change_invalidates_cache() {
        let (mut mgr, dir) = make_manager_with_dir();
        assert_eq!(mgr.get_data().companies.len(), 2);

        write(
            &dir.path().join("watchlist.csv"),
            &format!("{WATCHLIST_HEADER}\nTCS,IT,-0.41,-1,2.5,0,0,0,0,0,1,2\n"),
        );

        assert!(!mgr.is_cache_valid());
        assert_eq!(mgr.get_data().companies.len(), 1);
    }

    #[test]
    fn test_history_appearing_invalidates_cache() {
        let (mut mgr, dir) = make_manager_with_dir();
        assert!(mgr.get_data().history.is_empty());

        write(
            &dir.path().join("history.csv"),
            "Ticker,Financial Year End,Total Revenue\nTCS,2024-03-31,100\n",
        );

        let data = mgr.get_data();
        assert_eq!(data.history.len(), 1);
        assert!(data.history.company_trend("TCS").is_some());
    }

    #[test]
    fn test_reload_forces_fresh_load() {
        let (mut mgr, _dir) = make_manager_with_dir();
        mgr.get_data();
        let ts1 = mgr.loaded_at.unwrap();

        std::thread::sleep(Duration::from_millis(10));
        mgr.reload();

        assert!(mgr.loaded_at.unwrap() > ts1);
    }

    #[test]
    fn test_invalidate_cache() {
        let (mut mgr, _dir) = make_manager_with_dir();
        mgr.get_data();
        assert!(mgr.cache.is_some());

        mgr.invalidate_cache();
        assert!(mgr.cache.is_none());
        assert!(mgr.fingerprints.is_none());
        assert!(mgr.loaded_at.is_none());
    }

    #[test]
    fn test_missing_files_render_empty_with_warning() {
        let dir = TempDir::new().expect("temp dir");
        let paths = DataPaths {
            universe: dir.path().join("nope-universe.csv"),
            watchlist: dir.path().join("nope-watchlist.csv"),
            history: dir.path().join("nope-history.csv"),
        };
        let mut mgr = DatasetManager::new(paths);

        assert!(mgr.get_data().is_empty());
        assert_eq!(mgr.warnings.len(), 1);
        assert!(mgr.warnings[0].contains("missing or unreadable"));
    }

    #[test]
    fn test_snapshot_returns_data_and_warnings_from_one_load() {
        let (mut mgr, dir) = make_manager_with_dir();
        write(&dir.path().join("history.csv"), "Symbol,Total Revenue\nTCS,1\n");

        let (data, warnings) = mgr.snapshot();
        assert_eq!(data.companies.len(), 2);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Historical data unreadable"));

        let first = mgr.loaded_at.unwrap();
        let (data, _) = mgr.snapshot();
        assert_eq!(data.companies.len(), 2);
        assert_eq!(mgr.loaded_at.unwrap(), first);
    }

    #[test]
    fn test_unreadable_history_is_a_warning_not_a_failure() {
        let (mut mgr, dir) = make_manager_with_dir();
        write(&dir.path().join("history.csv"), "Symbol,Total Revenue\nTCS,1\n");

        let data = mgr.get_data();
        assert_eq!(data.companies.len(), 2);
        assert!(data.history.is_empty());
        assert_eq!(mgr.warnings.len(), 1);
    }
}
