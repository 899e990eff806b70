//! CSV export of the joined table.

use std::io::Write;
use std::path::Path;

use dashboard_core::{DashboardError, Result};
use tracing::info;

use crate::analysis::CompanyRow;

/// Header row of every export, matching the [`CompanyRow`] field names.
pub const EXPORT_HEADERS: [&str; 14] = [
    "Symbol",
    "Company Name",
    "Sector",
    "Anomaly_Score",
    "Anomaly_Label",
    "Status",
    "TATA_Z",
    "DSRI_Z",
    "AQI_Z",
    "P_OCF_Z",
    "PEG_Z",
    "DuPont_Discrepancy_Z",
    "PCA_1",
    "PCA_2",
];

/// Serialize `rows` as UTF-8 CSV with a header row into `writer`.
///
/// The header is written even when `rows` is empty.
pub fn write_csv<W: Write>(rows: &[CompanyRow], writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);

    csv_writer.write_record(EXPORT_HEADERS)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write `rows` to the file at `path`, returning the number of data rows.
pub fn export_csv(rows: &[CompanyRow], path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path).map_err(|source| DashboardError::Export {
        path: path.to_path_buf(),
        source,
    })?;
    write_csv(rows, std::io::BufWriter::new(file))?;

    info!("Exported {} rows to {}", rows.len(), path.display());
    Ok(rows.len())
}
