//! # pkgcheck
//!
//! Checks a project's third-party packages against several community data
//! sources and merges what they say into one record per package.
//!
//! For every requested package the checker combines:
//! - the **directory snapshot**, a bulk catalog of curated packages
//! - the **release list** of the target runtime
//! - the **architecture check**, per-package compatibility verdicts
//! - a **directory search**, for packages too new for the snapshot
//!
//! The resulting map can then be filtered, sorted and paged with [`view`],
//! or rendered as a CSV or formatted report with [`export`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use pkgcheck::{Config, PackageChecker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let checker = PackageChecker::new(Config::default())?;
//!
//!     let report = checker
//!         .check_packages(&["react-native-svg@15.2.0", "lottie-react-native"])
//!         .await?;
//!
//!     for record in &report.results {
//!         println!("{}: {}", record.name, record.architecture.label());
//!     }
//!
//!     let csv = pkgcheck::export::export_as_csv(&report.results, &Config::default().export);
//!     println!("{}", csv.file_name);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Batch entry point
pub mod checker;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// CSV and document reports
pub mod export;
/// Repository link validation and activity links
pub mod links;
/// Identifier normalization and manifest parsing
pub mod normalize;
/// Request pacing for directory searches
pub mod pacer;
/// Merging source data into package records
pub mod reconcile;
/// Retry logic with exponential backoff
pub mod retry;
/// Remote data sources
pub mod sources;
/// Core record types
pub mod types;
/// Runtime version helpers
pub mod version;
/// Filtering, sorting and pagination
pub mod view;


// Re-export commonly used types
pub use checker::PackageChecker;
pub use config::Config;
pub use error::{ApiError, Error, Result, SourceError, ToHttpStatus};
pub use export::{ExportFile, export_as_csv, export_as_document};
pub use normalize::{ManifestPackages, NormalizedIdentifiers, normalize_identifiers};
pub use sources::{HttpPackageSource, PackageSource};
pub use types::{
    ArchitectureStatus, ArchitectureVerdict, BatchId, CheckReport, PackageRecord, PackageResults,
    Platforms, RepositoryStats, SupportFlags,
};
pub use view::{PageSize, SortKey, SortOrder, ViewQuery, apply_filters, sort_and_paginate};
