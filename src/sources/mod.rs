//! Remote data sources consulted for every batch
//!
//! Four independent accessors sit behind [`PackageSource`]:
//! - directory snapshot: bulk list of known packages, fetched once per batch
//! - release list: newline-delimited release tags
//! - architecture check: one batched compatibility lookup for every name
//! - directory search: per-package lookup for packages missing from the snapshot
//!
//! Implementations only fetch and validate shape. Precedence and per-package
//! failure isolation live in [`crate::reconcile`].

use async_trait::async_trait;

use crate::error::Result;

mod http;
mod payload;

pub use http::HttpPackageSource;
pub use payload::{
    ArchitectureReport, DirectoryEntry, DirectoryGithub, DirectorySnapshot, GithubLicense,
    GithubStats, GithubUrls, RELEASE_CANDIDATE_MARKER, ReleaseList, parse_library_list,
};

/// Source name used in errors and logs for the bulk directory download
pub const DIRECTORY_SNAPSHOT: &str = "directory snapshot";
/// Source name for the release tag list
pub const RELEASE_LIST: &str = "release list";
/// Source name for the batched architecture check
pub const ARCHITECTURE_CHECK: &str = "architecture check";
/// Source name for the per-package directory search
pub const DIRECTORY_SEARCH: &str = "directory search";

/// Access to the remote package data
///
/// Every method performs at most one request and is bounded by the configured
/// timeout. Retry, pacing and cancellation are applied by the caller.
#[async_trait]
pub trait PackageSource: Send + Sync {
    /// Download the full directory and index it by package name
    async fn directory_snapshot(&self) -> Result<DirectorySnapshot>;

    /// Download the release tag list, newest first, candidates removed
    async fn release_versions(&self) -> Result<ReleaseList>;

    /// Look up compatibility verdicts for every name in one call
    ///
    /// An empty `names` slice yields an empty report without a request.
    async fn architecture_check(&self, names: &[String]) -> Result<ArchitectureReport>;

    /// Search the directory for one package
    ///
    /// Returns every entry the search produced; the caller picks the exact
    /// match.
    async fn search_directory(&self, name: &str) -> Result<Vec<DirectoryEntry>>;
}

/// Pick the entry whose registry name equals `name` exactly
pub fn find_exact(entries: Vec<DirectoryEntry>, name: &str) -> Option<DirectoryEntry> {
    entries.into_iter().find(|entry| entry.npm_pkg == name)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
