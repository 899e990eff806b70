use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashboard_core::settings::APP_DIR;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

fn app_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR)
}

/// Ensure the `~/.anomaly-dashboard/` directory hierarchy exists.
///
/// Creates `~/.anomaly-dashboard/` and `~/.anomaly-dashboard/logs/` if absent.
pub fn ensure_directories() -> anyhow::Result<()> {
    let app_dir = app_dir();
    std::fs::create_dir_all(&app_dir)?;
    std::fs::create_dir_all(app_dir.join("logs"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI level name onto a tracing filter directive.
fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_lowercase(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Output goes to stderr so page text on stdout stays pipeable. When
/// `log_file` is set, the same events are also appended there without ANSI
/// colour codes. Unknown level strings fall back to `"info"`.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}

// ── Data-directory discovery ───────────────────────────────────────────────────

/// Locate the directory holding the input CSV files.
///
/// Checks in order and returns the first match:
/// 1. `explicit` (from `--data-dir`, the environment or last-used params)
/// 2. the current directory, if it contains `watchlist`
/// 3. `~/.anomaly-dashboard/data/`, if it exists
///
/// Falls back to the current directory, where the load will then report the
/// files as missing.
pub fn discover_data_dir(explicit: Option<&Path>, watchlist: &Path) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    discover_data_dir_in(explicit, watchlist, &cwd, &app_dir())
}

fn discover_data_dir_in(explicit: Option<&Path>, watchlist: &Path, cwd: &Path, app_dir: &Path) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    if watchlist.is_absolute() || cwd.join(watchlist).is_file() {
        return cwd.to_path_buf();
    }
    let bundled = app_dir.join("data");
    if bundled.is_dir() {
        return bundled;
    }
    cwd.to_path_buf()
}

// ── Tests ──────────────────────────────────────────────────────────────────────
