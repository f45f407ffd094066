//! Repository link validation and derived activity links

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::SourceError;

const NEW_ARCH_TERMS: &str = r#""new architecture" OR "fabric" OR "turbomodule""#;

/// Check that a source-supplied repository link is an absolute http(s) URL
///
/// Returns the link without trailing slashes or `.git` suffix so derived
/// paths can be appended directly.
pub fn validate_repository_url(raw: &str) -> Result<String, SourceError> {
    let trimmed = raw.trim();
    let parsed = url::Url::parse(trimmed).map_err(|e| SourceError::InvalidLink {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(SourceError::InvalidLink {
            url: trimmed.to_string(),
            reason: "expected an http(s) repository link".to_string(),
        });
    }

    let cleaned = trimmed.trim_end_matches('/');
    Ok(cleaned.strip_suffix(".git").unwrap_or(cleaned).to_string())
}

/// Repository counter pages
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatsLinks {
    /// Stargazers page
    pub stargazers: String,
    /// Fork network page
    pub forks: String,
    /// Watchers page
    pub watchers: String,
    /// Issues page
    pub issues: String,
    /// Commit history page
    pub commits: String,
}

/// Counter pages under a validated repository link
pub fn stats_links(repo_url: &str) -> StatsLinks {
    StatsLinks {
        stargazers: format!("{repo_url}/stargazers"),
        forks: format!("{repo_url}/network/members"),
        watchers: format!("{repo_url}/watchers"),
        issues: format!("{repo_url}/issues"),
        commits: format!("{repo_url}/commits"),
    }
}

/// Search pages for judging a package's architecture and maintenance state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ActivityLinks {
    /// Project readme
    pub readme: String,
    /// Open issues mentioning the new architecture
    pub architecture_issues: String,
    /// Pull requests mentioning the new architecture
    pub architecture_prs: String,
    /// Merged pull requests mentioning the new architecture
    pub architecture_merged_prs: String,
    /// Release notes mentioning the new architecture
    pub architecture_release_notes: String,
    /// Open issues asking whether the project is maintained
    pub maintenance_issues: String,
    /// Most recently updated open pull requests
    pub maintenance_prs: String,
    /// Contributor activity graph
    pub contributors: String,
    /// Recently updated forks
    pub active_forks: String,
}

fn search_page(repo_url: &str, path: &str, query: &str) -> String {
    format!("{repo_url}/{path}?q={}", urlencoding::encode(query))
}

/// Activity links under a validated repository link
pub fn activity_links(repo_url: &str) -> ActivityLinks {
    ActivityLinks {
        readme: format!("{repo_url}#readme"),
        architecture_issues: search_page(
            repo_url,
            "issues",
            &format!("is:issue is:open {NEW_ARCH_TERMS}"),
        ),
        architecture_prs: search_page(repo_url, "pulls", &format!("is:pr {NEW_ARCH_TERMS}")),
        architecture_merged_prs: search_page(
            repo_url,
            "pulls",
            &format!("is:pr is:merged {NEW_ARCH_TERMS}"),
        ),
        architecture_release_notes: search_page(repo_url, "releases", NEW_ARCH_TERMS),
        maintenance_issues: search_page(
            repo_url,
            "issues",
            r#"is:issue is:open "maintained" OR "abandoned" OR "deprecated""#,
        ),
        maintenance_prs: search_page(repo_url, "pulls", "is:pr is:open sort:updated-desc"),
        contributors: format!("{repo_url}/graphs/contributors"),
        active_forks: format!("{repo_url}/forks?include=active&sort_by=last_updated"),
    }
}

/// Shorten a link for display (`https://www.github.com/a/b` -> `github.com/a/b`)
pub fn display_link(url: &str) -> &str {
    let url = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    url.strip_prefix("www.").unwrap_or(url)
}
