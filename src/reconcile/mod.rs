//! Merging of source data into one record per requested package
//!
//! Each name resolves through the first branch that matches:
//! 1. snapshot hit: full record from the directory snapshot
//! 2. search hit: exact match from the per-package search (`is_recent`)
//! 3. architecture only: checked but unlisted, minimal record
//! 4. unresolved: absent everywhere
//!
//! Whatever the branch, a verdict from the architecture check overwrites the
//! status, maintenance flag and (when present) the note. A failed search or
//! an unusable repository link becomes that package's note and never reaches
//! the other records.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::SourceConfig;
use crate::error::Result;
use crate::links::{stats_links, validate_repository_url};
use crate::normalize::NormalizedIdentifiers;
use crate::pacer::RequestPacer;
use crate::sources::{
    ArchitectureReport, DirectoryEntry, DirectorySnapshot, PackageSource, find_exact,
};
use crate::types::{PackageRecord, PackageResults, Platforms, RepositoryStats, SupportFlags};

/// Note for a package the architecture check knows but the directory does not
pub const UNLISTED_NOTE: &str = "Package is not listed in the directory";
/// Note for a package no source knows
pub const NOT_FOUND_NOTE: &str = "Package not found in the directory";

/// Outcome of the per-package search for names missing from the snapshot
type SearchOutcomes = HashMap<String, Result<Option<DirectoryEntry>>>;

/// Builds the result map for one batch
#[derive(Clone)]
pub struct Reconciler {
    source: Arc<dyn PackageSource>,
    endpoints: SourceConfig,
    pacer: RequestPacer,
}

impl Reconciler {
    /// Create a reconciler that searches through `source`, spaced by `pacer`
    pub fn new(source: Arc<dyn PackageSource>, endpoints: SourceConfig, pacer: RequestPacer) -> Self {
        Self {
            source,
            endpoints,
            pacer,
        }
    }

    /// Produce one record per normalized name, in input order
    ///
    /// Searches run only for names missing from the snapshot that the
    /// architecture check reported on.
    pub async fn reconcile(
        &self,
        identifiers: &NormalizedIdentifiers,
        snapshot: &DirectorySnapshot,
        architecture: &ArchitectureReport,
    ) -> PackageResults {
        let to_search: Vec<String> = identifiers
            .names
            .iter()
            .filter(|name| !snapshot.contains(name) && architecture.contains(name))
            .cloned()
            .collect();

        let searched = self.search_all(to_search).await;

        identifiers
            .names
            .iter()
            .map(|name| {
                let mut record = self.resolve(name, snapshot, architecture, &searched);

                record.version = identifiers.version_of(name).map(str::to_string);
                if let Some(verdict) = architecture.get(name) {
                    record.apply_architecture(verdict);
                }
                record
            })
            .collect()
    }

    /// Run the searches through the pacer, at most `max_concurrent` at once
    async fn search_all(&self, names: Vec<String>) -> SearchOutcomes {
        if names.is_empty() {
            return HashMap::new();
        }

        tracing::debug!(count = names.len(), "searching directory for unlisted packages");

        stream::iter(names.into_iter().map(|name| async move {
            let outcome = self.search_one(&name).await;
            (name, outcome)
        }))
        .buffer_unordered(self.pacer.max_concurrent())
        .collect()
        .await
    }

    async fn search_one(&self, name: &str) -> Result<Option<DirectoryEntry>> {
        let _permit = self.pacer.acquire().await?;
        let entries = self.source.search_directory(name).await?;
        Ok(find_exact(entries, name))
    }

    fn resolve(
        &self,
        name: &str,
        snapshot: &DirectorySnapshot,
        architecture: &ArchitectureReport,
        searched: &SearchOutcomes,
    ) -> PackageRecord {
        if let Some(entry) = snapshot.get(name) {
            tracing::debug!(package = %name, branch = "snapshot", "resolved");
            return self.record_from_entry(name, entry);
        }

        match searched.get(name) {
            Some(Ok(Some(entry))) => {
                tracing::debug!(package = %name, branch = "search", "resolved");
                let mut record = self.record_from_entry(name, entry);
                record.is_recent = true;
                record
            }
            Some(Err(e)) => {
                tracing::warn!(package = %name, error = %e, "directory search failed");
                PackageRecord::unresolved(name, format!("Directory search failed: {e}"))
            }
            _ if architecture.contains(name) => {
                tracing::debug!(package = %name, branch = "architecture-only", "resolved");
                PackageRecord::unresolved(name, UNLISTED_NOTE)
            }
            _ => {
                tracing::debug!(package = %name, branch = "unresolved", "resolved");
                PackageRecord::unresolved(name, NOT_FOUND_NOTE)
            }
        }
    }

    /// Full record from a directory entry (snapshot or search)
    ///
    /// A repository link that does not parse drops the repository data and
    /// leaves a note; the rest of the entry is kept.
    fn record_from_entry(&self, name: &str, entry: &DirectoryEntry) -> PackageRecord {
        let (repository_url, note) = match entry.repository_url().map(validate_repository_url) {
            Some(Ok(url)) => (Some(url), None),
            Some(Err(e)) => {
                tracing::warn!(package = %name, error = %e, "ignoring repository link");
                (None, Some(format!("Repository link ignored: {e}")))
            }
            None => (None, None),
        };

        let github = entry.github.clone().unwrap_or_default();
        let repository = match (&repository_url, &github.stats) {
            (Some(repo), Some(stats)) => {
                let links = stats_links(repo);
                Some(RepositoryStats {
                    description: github.description.clone().filter(|d| !d.is_empty()),
                    stars: stats.stars.unwrap_or(0),
                    forks: stats.forks.unwrap_or(0),
                    watchers: stats.subscribers.unwrap_or(0),
                    open_issues: stats.issues.unwrap_or(0),
                    updated_at: stats.updated_at.as_deref().and_then(parse_timestamp),
                    stargazers_url: links.stargazers,
                    forks_url: links.forks,
                    watchers_url: links.watchers,
                    issues_url: links.issues,
                    commits_url: links.commits,
                })
            }
            _ => None,
        };

        let license = github.license.unwrap_or_default();

        PackageRecord {
            name: name.to_string(),
            directory_url: Some(self.endpoints.package_page(name)),
            repository_url,
            platforms: Some(Platforms {
                ios: entry.ios.unwrap_or(false),
                android: entry.android.unwrap_or(false),
                web: entry.web.unwrap_or(false),
                windows: entry.windows.unwrap_or(false),
                macos: entry.macos.unwrap_or(false),
                fireos: entry.fireos.unwrap_or(false),
                horizon: entry.horizon.unwrap_or(false),
                vegaos: entry.vegaos.unwrap_or(false),
            }),
            support: Some(SupportFlags {
                has_types: github.has_types.unwrap_or(false),
                license: license.name.filter(|n| !n.is_empty()),
                license_url: license.url.filter(|u| !u.is_empty()),
                expo_go: entry.expo_go,
                dev: entry.dev,
                has_native_code: github.has_native_code.unwrap_or(false),
                config_plugin: github.config_plugin.unwrap_or(false),
            }),
            repository,
            architecture_note: entry.new_architecture_note.clone(),
            alternatives: entry.alternatives.clone().unwrap_or_default(),
            score: entry.score,
            note,
            ..PackageRecord::default()
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            tracing::debug!(value = raw, error = %e, "ignoring unparseable update time");
            None
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
