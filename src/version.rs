//! Runtime version helpers
//!
//! Compares a project's runtime version against the release list and builds
//! the link to the upgrade diff tool.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Upgrade diff tool, `?from=<current>&to=<latest>` is appended
pub const UPGRADE_HELPER_URL: &str = "https://react-native-community.github.io/upgrade-helper";

/// Pad a two-part version to three parts (`0.72` -> `0.72.0`)
pub fn normalize_version(version: &str) -> String {
    let version = version.trim();
    if version.split('.').count() == 2 {
        format!("{version}.0")
    } else {
        version.to_string()
    }
}

/// Suggested upgrade from the project's runtime version to the newest release
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpgradeAdvice {
    /// Normalized current version
    pub current: String,
    /// Newest non-candidate release
    pub latest: String,
    /// Diff between the two versions
    pub upgrade_helper_url: String,
}

/// Advice for moving from `current` to the newest release
///
/// Returns `None` when the normalized version is not a known release, when
/// the release list is empty, or when the project is already on the latest.
pub fn upgrade_advice(current: &str, releases: &[String]) -> Option<UpgradeAdvice> {
    let current = normalize_version(current);
    let latest = releases.first()?;

    if !releases.iter().any(|r| *r == current) || current == *latest {
        return None;
    }

    let upgrade_helper_url = format!(
        "{UPGRADE_HELPER_URL}?from={}&to={}",
        urlencoding::encode(&current),
        urlencoding::encode(latest)
    );

    Some(UpgradeAdvice {
        current,
        latest: latest.clone(),
        upgrade_helper_url,
    })
}
