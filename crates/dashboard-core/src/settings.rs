use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory under `$HOME` holding persisted params, logs and default data.
pub const APP_DIR: &str = ".anomaly-dashboard";

/// Default universe file name (symbol to company name lookup).
pub const DEFAULT_UNIVERSE_FILE: &str = "ind_nifty500list.csv";

/// Default watchlist file name (pre-computed anomaly table).
pub const DEFAULT_WATCHLIST_FILE: &str = "final_project_watchlist_complete.csv";

/// Default historical statements file name.
pub const DEFAULT_HISTORY_FILE: &str = "historical_financials.csv";

/// Sector filter value meaning "no filter".
pub const ALL_SECTORS: &str = "All";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Peer-group anomaly dashboard over pre-computed forensic accounting scores
#[derive(Parser, Debug, Clone)]
#[command(
    name = "anomaly-dashboard",
    about = "Peer-group anomaly dashboard over pre-computed forensic accounting scores",
    version
)]
pub struct Settings {
    /// Page to render
    #[arg(long, default_value = "summary", value_parser = ["summary", "watchlist", "sectors", "company", "explorer"])]
    pub page: String,

    /// Restrict the summary, explorer and export to one sector
    #[arg(long, default_value = ALL_SECTORS)]
    pub sector: String,

    /// Company name or symbol for the deep-dive page
    #[arg(long)]
    pub company: Option<String>,

    /// Directory holding the input CSV files (discovered if not specified)
    #[arg(long, env = "ANOMALY_DASHBOARD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Universe file, relative to the data directory unless absolute
    #[arg(long, default_value = DEFAULT_UNIVERSE_FILE)]
    pub universe: PathBuf,

    /// Watchlist file, relative to the data directory unless absolute
    #[arg(long, default_value = DEFAULT_WATCHLIST_FILE)]
    pub watchlist: PathBuf,

    /// Optional historical statements file
    #[arg(long, default_value = DEFAULT_HISTORY_FILE)]
    pub history: PathBuf,

    /// Output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Write the (sector-filtered) joined table to this CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── DataPaths ──────────────────────────────────────────────────────────────────

/// Fully resolved locations of the three input tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub universe: PathBuf,
    pub watchlist: PathBuf,
    pub history: PathBuf,
}

impl DataPaths {
    /// Resolve each file against `data_dir`; absolute paths are kept as-is.
    pub fn resolve(data_dir: &Path, universe: &Path, watchlist: &Path, history: &Path) -> Self {
        let join = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                data_dir.join(p)
            }
        };
        Self {
            universe: join(universe),
            watchlist: join(watchlist),
            history: join(history),
        }
    }
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.anomaly-dashboard/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(APP_DIR).join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::debug!("Ignoring unreadable last-used params {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation; accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!("Failed to clear {}: {}", config_path.display(), e);
            }
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins; only fill what was left at its default.
        if !is_arg_explicitly_set(&matches, "page") {
            if let Some(v) = last.page {
                settings.page = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "sector") {
            if let Some(v) = last.sector {
                settings.sector = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }
        if settings.data_dir.is_none() {
            settings.data_dir = last.data_dir;
        }

        settings = Self::apply_debug(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!("Could not persist last-used params: {}", e);
        }

        settings
    }

    /// Resolve the three input files against `data_dir`.
    pub fn data_paths(&self, data_dir: &Path) -> DataPaths {
        DataPaths::resolve(data_dir, &self.universe, &self.watchlist, &self.history)
    }

    /// `None` when the sector filter is [`ALL_SECTORS`] (or blank).
    pub fn sector_filter(&self) -> Option<&str> {
        let s = self.sector.trim();
        if s.is_empty() || s.eq_ignore_ascii_case(ALL_SECTORS) {
            None
        } else {
            Some(s)
        }
    }

    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            page: Some(s.page.clone()),
            sector: Some(s.sector.clone()),
            format: Some(s.format.clone()),
            data_dir: s.data_dir.clone(),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            page: Some("sectors".to_string()),
            sector: Some("IT".to_string()),
            format: Some("json".to_string()),
            data_dir: Some(PathBuf::from("/srv/data")),
        };

        params.save_to(&path).expect("save");
        let loaded = LastUsedParams::load_from(&path);

        assert_eq!(loaded, params);
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);

        LastUsedParams {
            page: Some("watchlist".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");
        assert!(path.exists());

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists());
    }

    #[test]
    fn test_last_used_params_default_when_missing_or_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        assert_eq!(LastUsedParams::load_from(&path), LastUsedParams::default());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(LastUsedParams::load_from(&path), LastUsedParams::default());
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["anomaly-dashboard"]);

        assert_eq!(settings.page, "summary");
        assert_eq!(settings.sector, ALL_SECTORS);
        assert!(settings.company.is_none());
        assert_eq!(settings.universe, PathBuf::from(DEFAULT_UNIVERSE_FILE));
        assert_eq!(settings.watchlist, PathBuf::from(DEFAULT_WATCHLIST_FILE));
        assert_eq!(settings.history, PathBuf::from(DEFAULT_HISTORY_FILE));
        assert_eq!(settings.format, "text");
        assert!(settings.export.is_none());
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_rejects_unknown_page() {
        let result = Settings::try_parse_from(["anomaly-dashboard", "--page", "charts"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_sector_filter() {
        let all = Settings::parse_from(["anomaly-dashboard"]);
        assert_eq!(all.sector_filter(), None);

        let lower = Settings::parse_from(["anomaly-dashboard", "--sector", "all"]);
        assert_eq!(lower.sector_filter(), None);

        let it = Settings::parse_from(["anomaly-dashboard", "--sector", "IT"]);
        assert_eq!(it.sector_filter(), Some("IT"));
    }

    #[test]
    fn test_data_paths_relative_and_absolute() {
        let settings = Settings::parse_from([
            "anomaly-dashboard",
            "--history",
            "/abs/history.csv",
        ]);
        let paths = settings.data_paths(Path::new("/data"));
        assert_eq!(paths.universe, PathBuf::from("/data").join(DEFAULT_UNIVERSE_FILE));
        assert_eq!(paths.watchlist, PathBuf::from("/data").join(DEFAULT_WATCHLIST_FILE));
        assert_eq!(paths.history, PathBuf::from("/abs/history.csv"));
    }

    #[test]
    fn test_load_with_last_used_merges_persisted_page() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            page: Some("sectors".to_string()),
            sector: Some("Banking".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings =
            Settings::load_with_last_used_impl(vec!["anomaly-dashboard".into()], &config_path);
        assert_eq!(settings.page, "sectors");
        assert_eq!(settings.sector, "Banking");
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            page: Some("sectors".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec!["anomaly-dashboard".into(), "--page".into(), "watchlist".into()],
            &config_path,
        );
        assert_eq!(settings.page, "watchlist");
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            format: Some("json".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec!["anomaly-dashboard".into(), "--clear".into()],
            &config_path,
        );

        assert!(!config_path.exists());
        assert_eq!(settings.format, "text");
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        let settings = Settings::load_with_last_used_impl(
            vec!["anomaly-dashboard".into(), "--debug".into()],
            &config_path,
        );
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_with_last_used_persists_after_run() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(
            vec![
                "anomaly-dashboard".into(),
                "--data-dir".into(),
                "/srv/forensics".into(),
                "--format".into(),
                "json".into(),
            ],
            &config_path,
        );

        let loaded = LastUsedParams::load_from(&config_path);
        assert_eq!(loaded.format, Some("json".to_string()));
        assert_eq!(loaded.data_dir, Some(PathBuf::from("/srv/forensics")));
    }
}
