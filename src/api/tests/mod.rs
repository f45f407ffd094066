use super::*;
use crate::config::RetryConfig;
use crate::test_helpers::{Failure, StaticSource, entry};
use crate::types::{ArchitectureStatus, PackageRecord};
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;

fn test_config() -> Config {
    let mut config = Config::default();
    config.retry = RetryConfig::disabled();
    config.search.min_interval = Duration::from_millis(1);
    config
}

fn test_app(source: StaticSource, config: Config) -> Router {
    let checker = PackageChecker::with_source(config.clone(), Arc::new(source)).unwrap();
    create_router(checker, Arc::new(config))
}

fn default_app() -> Router {
    test_app(
        StaticSource::new()
            .listed(entry("react-native-svg", 7_412))
            .listed(entry("lottie-react-native", 50))
            .verdict("react-native-svg", ArchitectureStatus::Supported, false)
            .verdict("lottie-react-native", ArchitectureStatus::Unsupported, true),
        test_config(),
    )
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn record(name: &str, status: ArchitectureStatus, stars: u64) -> PackageRecord {
    PackageRecord {
        name: name.to_string(),
        architecture: status,
        repository: Some(crate::types::RepositoryStats {
            stars,
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = default_app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_openapi_endpoint() {
    let response = default_app()
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["info"]["title"], "pkgcheck REST API");
}

#[tokio::test]
async fn test_cors_enabled() {
    let response = default_app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let mut config = test_config();
    config.api.cors_enabled = false;
    let response = test_app(StaticSource::new(), config)
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_check_returns_keyed_results() {
    let response = default_app()
        .oneshot(post_json(
            "/check",
            json!({ "packages": ["react-native-svg@15.2.0, lottie-react-native", "ghost"] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["batch_id"], 1);
    assert_eq!(json["release_versions"], json!(["0.75.4", "0.75.3"]));
    assert!(json.get("upgrade").is_none());

    let results = json["results"].as_object().unwrap();
    assert_eq!(
        results.keys().collect::<Vec<_>>(),
        vec!["react-native-svg", "lottie-react-native", "ghost"]
    );
    assert_eq!(results["react-native-svg"]["version"], "15.2.0");
    assert_eq!(results["react-native-svg"]["architecture"], "supported");
    assert_eq!(results["lottie-react-native"]["unmaintained"], true);
    assert_eq!(results["ghost"]["not_in_directory"], true);
}

#[tokio::test]
async fn test_check_includes_upgrade_advice() {
    let response = default_app()
        .oneshot(post_json(
            "/check",
            json!({ "packages": ["react-native-svg"], "runtime_version": "0.75.3" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["upgrade"]["current"], "0.75.3");
    assert_eq!(json["upgrade"]["latest"], "0.75.4");
}

#[tokio::test]
async fn test_check_rejects_empty_list() {
    let response = default_app()
        .oneshot(post_json("/check", json!({ "packages": [" , ", ""] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "invalid_input");
}

#[tokio::test]
async fn test_check_rejects_oversized_list() {
    let mut config = test_config();
    config.api.max_packages_per_request = 2;
    let response = test_app(StaticSource::new(), config)
        .oneshot(post_json("/check", json!({ "packages": ["a", "b", "c"] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_check_source_failure_is_bad_gateway() {
    let mut source = StaticSource::new();
    source.snapshot_failure = Some(Failure::Status(503));
    let response = test_app(source, test_config())
        .oneshot(post_json("/check", json!({ "packages": ["a"] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "upstream_unavailable");
    assert_eq!(json["error"]["details"]["source"], "directory snapshot");
}

#[tokio::test]
async fn test_cancel_check_endpoint() {
    for body in [json!({ "session": "tab-1" }), json!({ "batch_id": 4 })] {
        let response = default_app()
            .oneshot(post_json("/check/cancel", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let response = default_app()
        .oneshot(post_json("/check/cancel", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

fn slow_app() -> Router {
    let mut source = StaticSource::new().listed(entry("react-native-svg", 1));
    source.snapshot_delay = Some(Duration::from_millis(200));
    test_app(source, test_config())
}

#[tokio::test]
async fn test_concurrent_clients_do_not_cancel_each_other() {
    let app = slow_app();
    let first = app
        .clone()
        .oneshot(post_json("/check", json!({ "packages": ["react-native-svg"] })));
    let second = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        app.clone()
            .oneshot(post_json("/check", json!({ "packages": ["ghost"] })))
            .await
    };

    let (first, second) = tokio::join!(first, second);
    assert_eq!(first.unwrap().status(), StatusCode::OK);
    assert_eq!(second.unwrap().status(), StatusCode::OK);
}

#[tokio::test]
async fn test_same_session_check_supersedes_previous() {
    let app = slow_app();
    let first = app.clone().oneshot(post_json(
        "/check",
        json!({ "packages": ["react-native-svg"], "session": "tab-1" }),
    ));
    let second = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        app.clone()
            .oneshot(post_json(
                "/check",
                json!({ "packages": ["ghost"], "session": "tab-1" }),
            ))
            .await
    };

    let (first, second) = tokio::join!(first, second);
    let first = first.unwrap();
    assert_eq!(first.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(first).await["error"]["code"], "superseded");
    assert_eq!(second.unwrap().status(), StatusCode::OK);
}

#[tokio::test]
async fn test_manifest_endpoint() {
    let manifest = json!({
        "dependencies": {
            "react": "18.2.0",
            "react-native": "0.72.4",
            "react-native-svg": "^15.2.0"
        }
    });
    let response = default_app()
        .oneshot(post_json("/manifest", manifest))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["identifiers"], json!(["react-native-svg@15.2.0"]));
    assert_eq!(json["runtime_version"], "0.72.4");
}

#[tokio::test]
async fn test_manifest_without_dependencies_is_unprocessable() {
    let response = default_app()
        .oneshot(post_json("/manifest", json!({ "name": "app" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"]["code"], "invalid_manifest");
}

#[tokio::test]
async fn test_view_endpoint_pages_and_summarizes() {
    let packages = vec![
        record("c", ArchitectureStatus::Supported, 5),
        record("a", ArchitectureStatus::Supported, 50),
        record("b", ArchitectureStatus::Unsupported, 500),
        PackageRecord::unresolved("ghost", "not found"),
    ];
    let body = json!({
        "packages": packages,
        "query": { "sort_key": "stars", "sort_order": "desc", "page_size": 1, "page": 2 },
        "quick_filter": "supported"
    });

    let response = default_app()
        .oneshot(post_json("/view", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["page"], 2);
    assert_eq!(json["total_pages"], 2);
    assert_eq!(json["total_count"], 2);
    assert_eq!(json["items"].as_array().unwrap().len(), 1);
    assert_eq!(json["items"][0]["name"], "c");
    assert_eq!(json["summary"]["total"], 4);
    assert_eq!(json["summary"]["unlisted"], 1);
}

#[tokio::test]
async fn test_view_endpoint_defaults_query() {
    let body = json!({ "packages": [record("a", ArchitectureStatus::Untested, 1)] });
    let response = default_app()
        .oneshot(post_json("/view", body))
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["page"], 1);
    assert_eq!(json["total_pages"], 1);
    assert_eq!(json["items"][0]["name"], "a");
}

#[tokio::test]
async fn test_export_csv_attachment() {
    let body = json!({ "packages": [record("a", ArchitectureStatus::Supported, 1_500)] });
    let response = default_app()
        .oneshot(post_json("/export/csv", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert!(
        headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"package-report-"));
    assert!(disposition.ends_with(".csv\""));

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with(r#""1","a","Supported","Maintained""#));
    assert!(lines[1].contains(r#""1,500""#));
}

#[tokio::test]
async fn test_export_document_attachment() {
    let body = json!({ "packages": [record("a", ArchitectureStatus::Supported, 1)] });
    let response = default_app()
        .oneshot(post_json("/export/document", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.ends_with(".md\""));

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.starts_with("# Package Compatibility Report"));
}

#[tokio::test]
async fn test_api_server_spawns() {
    let mut config = test_config();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);
    let checker =
        PackageChecker::with_source((*config).clone(), Arc::new(StaticSource::new())).unwrap();

    let handle = tokio::spawn(start_api_server(checker, config));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(!handle.is_finished(), "server should still be serving");
    handle.abort();
}
