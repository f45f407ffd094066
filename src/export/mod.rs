//! CSV and document reports over a full result map
//!
//! Both formats share one row model and one ordering, independent of how the
//! records are currently sorted or filtered on screen:
//! listed before unlisted, then supported, unsupported, untested, and within
//! supported the maintained packages first.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::config::ExportConfig;
use crate::error::Result;
use crate::types::{ArchitectureStatus, PackageRecord};
use crate::view::{Summary, summarize};

mod csv;
mod document;

pub use csv::render_csv;
pub use document::render_document;

/// Placeholder for an absent value
pub const NOT_AVAILABLE: &str = "N/A";

/// A rendered report, ready to download or save
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportFile {
    /// `<prefix>-<timestamp>.<ext>`
    pub file_name: String,
    /// MIME type of `bytes`
    pub content_type: &'static str,
    /// Report body
    pub bytes: Vec<u8>,
}

impl ExportFile {
    /// Write the report into `dir` under its file name
    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.file_name);
        tokio::fs::write(&path, &self.bytes).await?;
        tracing::debug!(path = %path.display(), bytes = self.bytes.len(), "report written");
        Ok(path)
    }
}

/// Links shown for one row
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowLinks {
    /// Source repository
    pub repository: Option<String>,
    /// Registry page
    pub package: Option<String>,
}

/// One report row, every cell already formatted
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportRow {
    /// 1-based position in report order
    pub index: usize,
    /// Package name
    pub name: String,
    /// Status label, `N/A` for unlisted packages
    pub architecture: String,
    /// `Maintained`, `Unmaintained`, or `N/A` for unlisted packages
    pub maintenance: String,
    /// Directory score
    pub score: String,
    /// Star count with thousands separators
    pub stars: String,
    /// `YYYY-MM-DD`
    pub last_updated: String,
    /// Comma-joined platform labels
    pub platforms: String,
    /// Repository and registry links
    pub links: RowLinks,
    /// Comma-joined replacement suggestions
    pub alternatives: String,
}

/// Rank used for report order; lower sorts first
fn report_rank(record: &PackageRecord) -> (bool, u8, bool) {
    if record.not_in_directory {
        return (true, 0, false);
    }
    let status = match record.architecture {
        ArchitectureStatus::Supported => 0,
        ArchitectureStatus::Unsupported => 1,
        ArchitectureStatus::Untested => 2,
    };
    let unmaintained_supported =
        record.architecture == ArchitectureStatus::Supported && record.unmaintained;
    (false, status, unmaintained_supported)
}

fn or_na(value: String) -> String {
    if value.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        value
    }
}

/// `1234567` -> `1,234,567`
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn build_row(index: usize, record: &PackageRecord) -> ExportRow {
    let (architecture, maintenance) = if record.not_in_directory {
        (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string())
    } else {
        let maintenance = if record.unmaintained {
            "Unmaintained"
        } else {
            "Maintained"
        };
        (
            record.architecture.label().to_string(),
            maintenance.to_string(),
        )
    };

    ExportRow {
        index,
        name: record.name.clone(),
        architecture,
        maintenance,
        score: record
            .score
            .map_or_else(|| NOT_AVAILABLE.to_string(), |s| s.to_string()),
        stars: record
            .repository
            .as_ref()
            .map_or_else(|| NOT_AVAILABLE.to_string(), |r| format_thousands(r.stars)),
        last_updated: record.updated_at().map_or_else(
            || NOT_AVAILABLE.to_string(),
            |t| t.format("%Y-%m-%d").to_string(),
        ),
        platforms: or_na(
            record
                .platforms
                .map(|p| p.labels().join(", "))
                .unwrap_or_default(),
        ),
        links: RowLinks {
            repository: record.repository_url.clone(),
            package: record.directory_url.clone(),
        },
        alternatives: or_na(record.alternatives.join(", ")),
    }
}

/// Rows in report order, numbered from 1
pub fn export_rows<'a, I>(records: I) -> Vec<ExportRow>
where
    I: IntoIterator<Item = &'a PackageRecord>,
{
    let mut ordered: Vec<&PackageRecord> = records.into_iter().collect();
    ordered.sort_by_key(|r| report_rank(r));
    ordered
        .into_iter()
        .enumerate()
        .map(|(i, record)| build_row(i + 1, record))
        .collect()
}

/// `<prefix>-<timestamp>.<ext>` with an ISO-8601 timestamp without colons,
/// periods or sub-second digits (e.g. `2024-03-15T083000`)
pub fn export_file_name(prefix: &str, at: DateTime<Utc>, extension: &str) -> String {
    format!("{prefix}-{}.{extension}", at.format("%Y-%m-%dT%H%M%S"))
}

/// Render the CSV report of every record
pub fn export_as_csv<'a, I>(records: I, config: &ExportConfig) -> ExportFile
where
    I: IntoIterator<Item = &'a PackageRecord>,
{
    export_as_csv_at(records, config, Utc::now())
}

/// [`export_as_csv`] with an explicit generation time
pub fn export_as_csv_at<'a, I>(records: I, config: &ExportConfig, at: DateTime<Utc>) -> ExportFile
where
    I: IntoIterator<Item = &'a PackageRecord>,
{
    let rows = export_rows(records);
    let body = render_csv(&rows);
    tracing::debug!(rows = rows.len(), "csv report rendered");

    ExportFile {
        file_name: export_file_name(&config.file_prefix, at, "csv"),
        content_type: "text/csv; charset=utf-8",
        bytes: body.into_bytes(),
    }
}

/// Render the formatted (Markdown) report of every record
pub fn export_as_document<'a, I>(records: I, config: &ExportConfig) -> ExportFile
where
    I: IntoIterator<Item = &'a PackageRecord>,
{
    export_as_document_at(records, config, Utc::now())
}

/// [`export_as_document`] with an explicit generation time
pub fn export_as_document_at<'a, I>(
    records: I,
    config: &ExportConfig,
    at: DateTime<Utc>,
) -> ExportFile
where
    I: IntoIterator<Item = &'a PackageRecord>,
{
    let records: Vec<&PackageRecord> = records.into_iter().collect();
    let summary: Summary = summarize(records.iter().copied());
    let rows = export_rows(records);
    let body = render_document(&config.document_title, at, &summary, &rows);
    tracing::debug!(rows = rows.len(), "document report rendered");

    ExportFile {
        file_name: export_file_name(&config.file_prefix, at, "md"),
        content_type: "text/markdown; charset=utf-8",
        bytes: body.into_bytes(),
    }
}
