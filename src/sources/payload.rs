//! Wire shapes of the upstream payloads and their validation
//!
//! Upstream JSON is loosely typed. Everything is deserialized into `Option`
//! fields first and defaulted explicitly when records are built, so a missing
//! field never silently turns into a wrong value.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Result, SourceError};
use crate::types::{ArchitectureStatus, ArchitectureVerdict};

/// Release-candidate marker in a release tag
pub const RELEASE_CANDIDATE_MARKER: &str = "-rc";

/// One library as listed by the community directory
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    /// Registry package name
    pub npm_pkg: String,
    /// Repository URL (search payloads put it here)
    #[serde(default)]
    pub github_url: Option<String>,
    /// iOS
    #[serde(default)]
    pub ios: Option<bool>,
    /// Android
    #[serde(default)]
    pub android: Option<bool>,
    /// Web
    #[serde(default)]
    pub web: Option<bool>,
    /// Windows
    #[serde(default)]
    pub windows: Option<bool>,
    /// macOS
    #[serde(default)]
    pub macos: Option<bool>,
    /// Fire OS
    #[serde(default)]
    pub fireos: Option<bool>,
    /// Horizon OS
    #[serde(default)]
    pub horizon: Option<bool>,
    /// Vega OS
    #[serde(default)]
    pub vegaos: Option<bool>,
    /// Works in the sandboxed development client
    #[serde(default)]
    pub expo_go: Option<bool>,
    /// Development-time tool only
    #[serde(default)]
    pub dev: Option<bool>,
    /// Free-text architecture note
    #[serde(default)]
    pub new_architecture_note: Option<String>,
    /// Suggested replacements
    #[serde(default)]
    pub alternatives: Option<Vec<String>>,
    /// Directory quality score
    #[serde(default)]
    pub score: Option<u32>,
    /// Repository metadata
    #[serde(default)]
    pub github: Option<DirectoryGithub>,
}

impl DirectoryEntry {
    /// Repository URL, preferring the snapshot's nested `github.urls.repo`
    pub fn repository_url(&self) -> Option<&str> {
        self.github
            .as_ref()
            .and_then(|g| g.urls.as_ref())
            .and_then(|u| u.repo.as_deref())
            .or(self.github_url.as_deref())
            .filter(|u| !u.trim().is_empty())
    }
}

/// Repository metadata attached to a directory entry
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryGithub {
    /// Repository links
    #[serde(default)]
    pub urls: Option<GithubUrls>,
    /// Repository description
    #[serde(default)]
    pub description: Option<String>,
    /// Ships type definitions
    #[serde(default)]
    pub has_types: Option<bool>,
    /// Contains native code
    #[serde(default)]
    pub has_native_code: Option<bool>,
    /// Provides a config plugin
    #[serde(default)]
    pub config_plugin: Option<bool>,
    /// License
    #[serde(default)]
    pub license: Option<GithubLicense>,
    /// Repository counters
    #[serde(default)]
    pub stats: Option<GithubStats>,
}

/// Links published for a repository
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GithubUrls {
    /// Repository page
    #[serde(default)]
    pub repo: Option<String>,
    /// Clone URL
    #[serde(default)]
    pub clone: Option<String>,
    /// Project homepage
    #[serde(default)]
    pub homepage: Option<String>,
}

/// License of a repository
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GithubLicense {
    /// License name
    #[serde(default)]
    pub name: Option<String>,
    /// License text URL
    #[serde(default)]
    pub url: Option<String>,
}

/// Repository counters
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubStats {
    /// Stars
    #[serde(default)]
    pub stars: Option<u64>,
    /// Forks
    #[serde(default)]
    pub forks: Option<u64>,
    /// Watchers
    #[serde(default)]
    pub subscribers: Option<u64>,
    /// Open issues
    #[serde(default)]
    pub issues: Option<u64>,
    /// Last update, RFC 3339
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Validate a `{ "libraries": [...] }` payload and decode its entries
///
/// A payload without a `libraries` array is malformed. Individual entries
/// that cannot be decoded (e.g. missing `npmPkg`) are skipped.
pub fn parse_library_list(
    payload: &serde_json::Value,
    source_name: &'static str,
) -> Result<Vec<DirectoryEntry>> {
    let libraries = payload
        .get("libraries")
        .and_then(|l| l.as_array())
        .ok_or_else(|| SourceError::malformed(source_name, "expected a `libraries` array"))?;

    let mut entries = Vec::with_capacity(libraries.len());
    for raw in libraries {
        match serde_json::from_value::<DirectoryEntry>(raw.clone()) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::debug!(source = source_name, error = %e, "skipping undecodable library entry");
            }
        }
    }
    Ok(entries)
}

/// Bulk directory lookup table keyed by bare package name
#[derive(Clone, Debug, Default)]
pub struct DirectorySnapshot {
    entries: HashMap<String, DirectoryEntry>,
}

impl DirectorySnapshot {
    /// Index entries by name; the first entry for a name wins
    pub fn from_entries(entries: impl IntoIterator<Item = DirectoryEntry>) -> Self {
        let mut map = HashMap::new();
        for entry in entries {
            map.entry(entry.npm_pkg.clone()).or_insert(entry);
        }
        Self { entries: map }
    }

    /// Look up a bare name
    pub fn get(&self, name: &str) -> Option<&DirectoryEntry> {
        self.entries.get(name)
    }

    /// Whether `name` is listed
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of listed packages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot lists nothing
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Release tags, newest first, release candidates removed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReleaseList {
    versions: Vec<String>,
}

impl ReleaseList {
    /// Parse a newline-delimited tag list
    ///
    /// Lines are trimmed, blanks dropped, and every entry containing the
    /// release-candidate marker removed. Relative order is preserved.
    pub fn parse(text: &str) -> Self {
        let versions = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.contains(RELEASE_CANDIDATE_MARKER))
            .map(str::to_string)
            .collect();
        Self { versions }
    }

    /// Newest release
    pub fn latest(&self) -> Option<&str> {
        self.versions.first().map(String::as_str)
    }

    /// All releases, newest first
    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    /// Take ownership of the tag list
    pub fn into_versions(self) -> Vec<String> {
        self.versions
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArchitectureEntry {
    #[serde(default)]
    new_architecture: Option<String>,
    #[serde(default)]
    unmaintained: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

impl RawArchitectureEntry {
    fn into_verdict(self) -> ArchitectureVerdict {
        ArchitectureVerdict {
            status: self
                .new_architecture
                .as_deref()
                .map(ArchitectureStatus::from_reported)
                .unwrap_or_default(),
            unmaintained: self.unmaintained.unwrap_or(false),
            note: self.error.filter(|e| !e.trim().is_empty()),
        }
    }
}

/// Architecture-check verdicts keyed by bare name
#[derive(Clone, Debug, Default)]
pub struct ArchitectureReport {
    verdicts: HashMap<String, ArchitectureVerdict>,
}

impl ArchitectureReport {
    /// Validate and default a check response (`{ "<name>": { ... }, ... }`)
    pub fn parse(payload: &serde_json::Value, source_name: &'static str) -> Result<Self> {
        let object = payload
            .as_object()
            .ok_or_else(|| SourceError::malformed(source_name, "expected an object keyed by name"))?;

        let mut verdicts = HashMap::with_capacity(object.len());
        for (name, raw) in object {
            match serde_json::from_value::<RawArchitectureEntry>(raw.clone()) {
                Ok(entry) => {
                    verdicts.insert(name.clone(), entry.into_verdict());
                }
                Err(e) => {
                    tracing::debug!(package = %name, error = %e, "skipping undecodable architecture entry");
                }
            }
        }
        Ok(Self { verdicts })
    }

    /// Build from already-typed verdicts
    pub fn from_verdicts(verdicts: impl IntoIterator<Item = (String, ArchitectureVerdict)>) -> Self {
        Self {
            verdicts: verdicts.into_iter().collect(),
        }
    }

    /// Verdict for `name`, if the source reported one
    pub fn get(&self, name: &str) -> Option<&ArchitectureVerdict> {
        self.verdicts.get(name)
    }

    /// Whether the source reported on `name`
    pub fn contains(&self, name: &str) -> bool {
        self.verdicts.contains_key(name)
    }

    /// Number of reported packages
    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    /// Whether nothing was reported
    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }
}
