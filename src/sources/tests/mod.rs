use super::*;
use crate::config::{Config, HttpConfig, SourceConfig};
use crate::error::{Error, SourceError};
use crate::types::ArchitectureStatus;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source_for(server: &MockServer) -> HttpPackageSource {
    let config = Config {
        sources: SourceConfig::with_base_url(&server.uri()),
        http: HttpConfig {
            request_timeout: Duration::from_millis(500),
            connect_timeout: Duration::from_millis(500),
        },
        ..Default::default()
    };
    HttpPackageSource::new(&config).unwrap()
}

#[tokio::test]
async fn test_snapshot_builds_lookup_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "libraries": [
                {
                    "npmPkg": "react-native-svg",
                    "ios": true,
                    "android": true,
                    "github": {
                        "urls": { "repo": "https://github.com/software-mansion/react-native-svg" },
                        "stats": { "stars": 7400, "updatedAt": "2024-05-01T10:00:00Z" }
                    }
                },
                { "npmPkg": "react-native-mmkv", "web": false }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = source_for(&server).directory_snapshot().await.unwrap();

    assert_eq!(snapshot.len(), 2);
    let svg = snapshot.get("react-native-svg").unwrap();
    assert_eq!(svg.ios, Some(true));
    assert_eq!(
        svg.repository_url(),
        Some("https://github.com/software-mansion/react-native-svg")
    );
    assert!(snapshot.get("not-there").is_none());
}

#[tokio::test]
async fn test_snapshot_without_libraries_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "packages": [] })))
        .mount(&server)
        .await;

    let err = source_for(&server).directory_snapshot().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Source(SourceError::MalformedPayload {
            source_name: DIRECTORY_SNAPSHOT,
            ..
        })
    ));
}

#[tokio::test]
async fn test_snapshot_invalid_json_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = source_for(&server).directory_snapshot().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Source(SourceError::MalformedPayload { .. })
    ));
}

#[tokio::test]
async fn test_http_status_is_reported_with_source_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/releases"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = source_for(&server).release_versions().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Source(SourceError::HttpStatus {
            source_name: RELEASE_LIST,
            status: 503
        })
    ));
}

#[tokio::test]
async fn test_release_list_filters_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/releases"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("0.76.0-rc.2\n0.75.4\n0.75.3\n0.75.0-rc.7\n0.74.5\n"),
        )
        .mount(&server)
        .await;

    let releases = source_for(&server).release_versions().await.unwrap();
    assert_eq!(releases.versions(), ["0.75.4", "0.75.3", "0.74.5"]);
    assert_eq!(releases.latest(), Some("0.75.4"));
}

#[tokio::test]
async fn test_slow_source_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/releases"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_string("0.75.4"),
        )
        .mount(&server)
        .await;

    let err = source_for(&server).release_versions().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Source(SourceError::Timeout {
            source_name: RELEASE_LIST
        })
    ));
}

#[tokio::test]
async fn test_architecture_check_posts_names() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/check"))
        .and(body_json(json!({ "packages": ["a", "b"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "a": { "newArchitecture": "supported", "unmaintained": false },
            "b": { "newArchitecture": "new-arch-only", "unmaintained": true }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let names = vec!["a".to_string(), "b".to_string()];
    let report = source_for(&server).architecture_check(&names).await.unwrap();

    assert_eq!(report.len(), 2);
    assert_eq!(report.get("a").unwrap().status, ArchitectureStatus::Supported);
    assert_eq!(report.get("b").unwrap().status, ArchitectureStatus::Supported);
    assert!(report.get("b").unwrap().unmaintained);
}

#[tokio::test]
async fn test_architecture_check_empty_list_skips_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let report = source_for(&server).architecture_check(&[]).await.unwrap();
    assert!(report.is_empty());
}

#[tokio::test]
async fn test_search_sends_query_and_returns_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/libraries"))
        .and(query_param("search", "@scope/fresh-lib"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "libraries": [
                { "npmPkg": "@scope/fresh-lib-extras" },
                { "npmPkg": "@scope/fresh-lib", "githubUrl": "https://github.com/scope/fresh-lib" }
            ]
        })))
        .mount(&server)
        .await;

    let entries = source_for(&server)
        .search_directory("@scope/fresh-lib")
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);

    let exact = find_exact(entries, "@scope/fresh-lib").unwrap();
    assert_eq!(
        exact.repository_url(),
        Some("https://github.com/scope/fresh-lib")
    );
}

#[tokio::test]
async fn test_search_wrong_shape_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/libraries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "libraries": null })))
        .mount(&server)
        .await;

    let err = source_for(&server).search_directory("x").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Source(SourceError::MalformedPayload {
            source_name: DIRECTORY_SEARCH,
            ..
        })
    ));
}

#[test]
fn test_find_exact_ignores_partial_matches() {
    let entries = vec![DirectoryEntry {
        npm_pkg: "lib-extras".to_string(),
        ..Default::default()
    }];
    assert!(find_exact(entries, "lib").is_none());
}
