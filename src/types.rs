//! Core types for pkgcheck

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use utoipa::ToSchema;

/// Identifier of one `check_packages` call
///
/// Ids increase monotonically per [`PackageChecker`](crate::PackageChecker);
/// a batch whose id is no longer the latest is stale.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct BatchId(pub u64);

impl BatchId {
    /// Get the inner value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compatibility of a package with the target runtime architecture
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ArchitectureStatus {
    /// Known to work
    Supported,
    /// Known not to work
    Unsupported,
    /// No verdict available (default)
    #[default]
    Untested,
}

impl ArchitectureStatus {
    /// All statuses in report order
    pub const ALL: [ArchitectureStatus; 3] = [
        ArchitectureStatus::Supported,
        ArchitectureStatus::Unsupported,
        ArchitectureStatus::Untested,
    ];

    /// Display label ("Supported", ...)
    pub fn label(&self) -> &'static str {
        match self {
            ArchitectureStatus::Supported => "Supported",
            ArchitectureStatus::Unsupported => "Unsupported",
            ArchitectureStatus::Untested => "Untested",
        }
    }

    /// Wire name ("supported", ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchitectureStatus::Supported => "supported",
            ArchitectureStatus::Unsupported => "unsupported",
            ArchitectureStatus::Untested => "untested",
        }
    }

    /// Interpret the status string reported by the architecture check
    ///
    /// `new-arch-only` counts as supported. Anything unrecognised is untested.
    pub fn from_reported(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "supported" | "new-arch-only" => ArchitectureStatus::Supported,
            "unsupported" => ArchitectureStatus::Unsupported,
            _ => ArchitectureStatus::Untested,
        }
    }
}

impl fmt::Display for ArchitectureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ArchitectureStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supported" => Ok(ArchitectureStatus::Supported),
            "unsupported" => Ok(ArchitectureStatus::Unsupported),
            "untested" => Ok(ArchitectureStatus::Untested),
            other => Err(crate::error::Error::InvalidInput(format!(
                "unknown architecture status: {other}"
            ))),
        }
    }
}

/// Compatibility verdict from the architecture-check source, already defaulted
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArchitectureVerdict {
    /// Reported status
    pub status: ArchitectureStatus,
    /// Flagged as unmaintained
    pub unmaintained: bool,
    /// Error or explanation text from the source
    pub note: Option<String>,
}

/// Platforms a directory package declares support for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Platforms {
    /// iOS
    pub ios: bool,
    /// Android
    pub android: bool,
    /// Web
    pub web: bool,
    /// Windows
    pub windows: bool,
    /// macOS
    pub macos: bool,
    /// Fire OS
    pub fireos: bool,
    /// Horizon OS
    pub horizon: bool,
    /// Vega OS
    pub vegaos: bool,
}

impl Platforms {
    /// Labels of the supported platforms, in fixed order
    pub fn labels(&self) -> Vec<&'static str> {
        [
            (self.ios, "iOS"),
            (self.android, "Android"),
            (self.web, "Web"),
            (self.windows, "Windows"),
            (self.macos, "macOS"),
            (self.fireos, "Fire OS"),
            (self.horizon, "Horizon"),
            (self.vegaos, "Vega OS"),
        ]
        .into_iter()
        .filter_map(|(on, label)| on.then_some(label))
        .collect()
    }
}

/// Language, license and tooling metadata
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SupportFlags {
    /// Ships type definitions
    pub has_types: bool,
    /// License name
    pub license: Option<String>,
    /// License text URL
    pub license_url: Option<String>,
    /// Works in the sandboxed development client
    pub expo_go: Option<bool>,
    /// Development-time tool only
    pub dev: Option<bool>,
    /// Contains native code
    pub has_native_code: bool,
    /// Provides a config plugin
    pub config_plugin: bool,
}

/// Repository statistics and derived activity links
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RepositoryStats {
    /// Repository description
    pub description: Option<String>,
    /// Star count
    pub stars: u64,
    /// Fork count
    pub forks: u64,
    /// Watcher (subscriber) count
    pub watchers: u64,
    /// Open issue count
    pub open_issues: u64,
    /// Last push/update time
    #[schema(value_type = Option<String>)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Stargazers page
    pub stargazers_url: String,
    /// Forks page
    pub forks_url: String,
    /// Watchers page
    pub watchers_url: String,
    /// Issues page
    pub issues_url: String,
    /// Commit history page
    pub commits_url: String,
}

/// Reconciled view of one requested package
///
/// Built once per batch by the reconciler and never mutated afterwards.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PackageRecord {
    /// Bare package name (the result map key)
    pub name: String,
    /// Requested version, for display only
    pub version: Option<String>,
    /// Registry page, when resolved through the directory
    pub directory_url: Option<String>,
    /// Source repository, when resolved through the directory
    pub repository_url: Option<String>,
    /// Declared platforms (directory packages only)
    pub platforms: Option<Platforms>,
    /// Support metadata (directory packages only)
    pub support: Option<SupportFlags>,
    /// Repository statistics (never present for unlisted packages)
    pub repository: Option<RepositoryStats>,
    /// Architecture compatibility
    pub architecture: ArchitectureStatus,
    /// Free-text architecture note from the directory
    pub architecture_note: Option<String>,
    /// Flagged as unmaintained
    pub unmaintained: bool,
    /// Could not be resolved against the directory snapshot or search
    pub not_in_directory: bool,
    /// Explanation when resolution was partial or failed
    pub note: Option<String>,
    /// Suggested replacement packages
    pub alternatives: Vec<String>,
    /// Resolved through the per-package search rather than the snapshot
    pub is_recent: bool,
    /// Optional quality score (only some directory variants provide it)
    pub score: Option<u32>,
}

impl PackageRecord {
    /// A record for a package no source could resolve
    pub fn unresolved(name: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            not_in_directory: true,
            note: Some(note.into()),
            ..Self::default()
        }
    }

    /// Overlay the architecture-check verdict
    ///
    /// Status and maintenance flag always come from the verdict. The note is
    /// replaced only when the verdict carries one.
    pub fn apply_architecture(&mut self, verdict: &ArchitectureVerdict) {
        self.architecture = verdict.status;
        self.unmaintained = verdict.unmaintained;
        if let Some(note) = &verdict.note {
            self.note = Some(note.clone());
        }
    }

    /// Star count, 0 when unknown
    pub fn stars(&self) -> u64 {
        self.repository.as_ref().map_or(0, |r| r.stars)
    }

    /// Last update time, if known
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.repository.as_ref().and_then(|r| r.updated_at)
    }

    /// Issue, pull request and contributor search pages for the repository
    pub fn activity_links(&self) -> Option<crate::links::ActivityLinks> {
        self.repository_url
            .as_deref()
            .map(crate::links::activity_links)
    }
}

/// Reconciled records keyed by bare name, in normalized input order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PackageResults {
    records: Vec<PackageRecord>,
    index: HashMap<String, usize>,
}

impl PackageResults {
    /// Create an empty result map
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty result map with room for `capacity` records
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a record under its name, replacing (in place) any existing one
    pub fn insert(&mut self, record: PackageRecord) -> Option<PackageRecord> {
        match self.index.get(&record.name) {
            Some(&pos) => Some(std::mem::replace(&mut self.records[pos], record)),
            None => {
                self.index.insert(record.name.clone(), self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    /// Look up a record by bare name
    pub fn get(&self, name: &str) -> Option<&PackageRecord> {
        self.index.get(name).map(|&pos| &self.records[pos])
    }

    /// Whether a record exists for `name`
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order
    pub fn records(&self) -> &[PackageRecord] {
        &self.records
    }

    /// Iterate over records in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, PackageRecord> {
        self.records.iter()
    }

    /// Names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.name.as_str())
    }
}

impl FromIterator<PackageRecord> for PackageResults {
    fn from_iter<I: IntoIterator<Item = PackageRecord>>(iter: I) -> Self {
        let mut results = PackageResults::new();
        for record in iter {
            results.insert(record);
        }
        results
    }
}

impl IntoIterator for PackageResults {
    type Item = PackageRecord;
    type IntoIter = std::vec::IntoIter<PackageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a PackageResults {
    type Item = &'a PackageRecord;
    type IntoIter = std::slice::Iter<'a, PackageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl Serialize for PackageResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(&record.name, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PackageResults {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ResultsVisitor;

        impl<'de> Visitor<'de> for ResultsVisitor {
            type Value = PackageResults;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of package name to package record")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut results = PackageResults::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, mut record)) =
                    access.next_entry::<String, PackageRecord>()?
                {
                    record.name = name;
                    results.insert(record);
                }
                Ok(results)
            }
        }

        deserializer.deserialize_map(ResultsVisitor)
    }
}

/// Outcome of one successful `check_packages` call
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckReport {
    /// Batch that produced this report
    pub batch_id: BatchId,
    /// One record per normalized identifier, in input order
    #[schema(value_type = Object)]
    pub results: PackageResults,
    /// Release tags, newest first, release candidates removed
    pub release_versions: Vec<String>,
}

impl CheckReport {
    /// Newest non-candidate release, if the list was not empty
    pub fn latest_release(&self) -> Option<&str> {
        self.release_versions.first().map(String::as_str)
    }

    /// Upgrade suggestion for a project on `runtime_version`
    pub fn upgrade_advice(&self, runtime_version: &str) -> Option<crate::version::UpgradeAdvice> {
        crate::version::upgrade_advice(runtime_version, &self.release_versions)
    }
}
