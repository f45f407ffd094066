//! Identifier normalization and manifest extraction
//!
//! Raw specifiers (`name`, `name@version`, `@scope/name@version`) are reduced
//! to bare names. Versions are kept on the side for display and are never used
//! to query a data source.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;

use crate::error::{Error, Result};

/// The runtime package whose own version is reported separately
pub const RUNTIME_PACKAGE: &str = "react-native";

/// Normalized, deduplicated request
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedIdentifiers {
    /// Bare names in first-seen order
    pub names: Vec<String>,
    /// Display version per bare name
    pub versions: HashMap<String, String>,
}

impl NormalizedIdentifiers {
    /// Display version for `name`, if one was given
    pub fn version_of(&self, name: &str) -> Option<&str> {
        self.versions.get(name).map(String::as_str)
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no names survived normalization
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Split one specifier into bare name and optional version
///
/// The split happens on the last `@` that is not the leading scope marker.
/// Returns `None` for blank input, including a name made only of `@`.
pub fn split_specifier(raw: &str) -> Option<(&str, Option<&str>)> {
    let spec = raw.trim();
    let (name, version) = match spec.rfind('@') {
        Some(pos) if pos > 0 => {
            let version = spec[pos + 1..].trim();
            (spec[..pos].trim(), (!version.is_empty()).then_some(version))
        }
        _ => (spec, None),
    };

    if name.trim_matches('@').is_empty() {
        return None;
    }
    Some((name, version))
}

/// Normalize a raw identifier list
///
/// Drops blank entries and duplicates (first occurrence wins for ordering).
/// The first occurrence that carries a version supplies the display version.
pub fn normalize_identifiers<S: AsRef<str>>(raw: &[S]) -> NormalizedIdentifiers {
    let mut seen = HashSet::new();
    let mut normalized = NormalizedIdentifiers::default();

    for entry in raw {
        let Some((name, version)) = split_specifier(entry.as_ref()) else {
            continue;
        };

        if seen.insert(name.to_string()) {
            normalized.names.push(name.to_string());
        }
        if let Some(version) = version {
            normalized
                .versions
                .entry(name.to_string())
                .or_insert_with(|| version.to_string());
        }
    }

    normalized
}

/// Split free text such as `"a, b@1.0 ,c"` into raw specifiers
pub fn split_identifier_list(text: &str) -> Vec<String> {
    text.split([',', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether `name` is one of the ignored runtime packages or scoped under one
pub fn is_ignored(name: &str, ignored: &[String]) -> bool {
    ignored.iter().any(|entry| {
        name == entry
            || name
                .strip_prefix(entry.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Strip range operators from a manifest version (`^1.2.0` -> `1.2.0`)
pub fn clean_version(raw: &str) -> Option<String> {
    let cleaned = raw
        .trim()
        .trim_start_matches(['^', '~', '>', '<', '='])
        .trim();
    match cleaned {
        "" | "*" | "latest" => None,
        v => Some(v.to_string()),
    }
}

/// Identifiers extracted from a package manifest
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ManifestPackages {
    /// `name@version` specifiers, ignored packages removed
    pub identifiers: Vec<String>,
    /// Version of the runtime package itself, if declared
    pub runtime_version: Option<String>,
}

/// Extract dependency specifiers from manifest JSON
///
/// Only the `dependencies` object is read. The content is parsed in place and
/// nothing from it is kept beyond the returned identifiers.
pub fn parse_manifest(content: &str, ignored: &[String]) -> Result<ManifestPackages> {
    let json: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| Error::Manifest(format!("not valid JSON: {e}")))?;

    let dependencies = json
        .get("dependencies")
        .and_then(|d| d.as_object())
        .filter(|d| !d.is_empty())
        .ok_or_else(|| Error::Manifest("no dependencies found".to_string()))?;

    let runtime_version = dependencies
        .get(RUNTIME_PACKAGE)
        .and_then(|v| v.as_str())
        .and_then(clean_version);

    let identifiers: Vec<String> = dependencies
        .iter()
        .filter(|(name, _)| !is_ignored(name, ignored))
        .map(
            |(name, version)| match version.as_str().and_then(clean_version) {
                Some(version) => format!("{name}@{version}"),
                None => name.clone(),
            },
        )
        .collect();

    if identifiers.is_empty() {
        return Err(Error::Manifest(
            "no checkable dependencies found".to_string(),
        ));
    }

    tracing::debug!(count = identifiers.len(), "extracted manifest dependencies");

    Ok(ManifestPackages {
        identifiers,
        runtime_version,
    })
}
