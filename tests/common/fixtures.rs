//! Upstream payload fixtures

use serde_json::{Value, json};

/// Release list as served upstream: newest first, with a candidate tag
pub const RELEASES: &str = "0.76.0-rc.2\n0.75.4\n0.75.3\n0.74.5\n\n";

/// Snapshot entry with repository metadata
pub fn library(name: &str, stars: u64, updated_at: &str) -> Value {
    json!({
        "npmPkg": name,
        "ios": true,
        "android": true,
        "web": false,
        "expoGo": true,
        "score": 72,
        "alternatives": [],
        "github": {
            "urls": { "repo": format!("https://github.com/acme/{name}.git") },
            "description": format!("{name} for mobile apps"),
            "hasTypes": true,
            "license": { "name": "MIT License", "url": "https://spdx.org/licenses/MIT" },
            "stats": {
                "stars": stars,
                "forks": stars / 20,
                "subscribers": 9,
                "issues": 31,
                "updatedAt": updated_at
            }
        }
    })
}

/// `{ "libraries": [...] }` wrapper used by the snapshot and the search
pub fn library_list(entries: Vec<Value>) -> Value {
    json!({ "libraries": entries })
}

/// One architecture-check verdict
pub fn verdict(status: &str, unmaintained: bool) -> Value {
    json!({ "newArchitecture": status, "unmaintained": unmaintained })
}
