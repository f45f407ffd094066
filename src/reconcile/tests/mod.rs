use super::*;
use crate::normalize::normalize_identifiers;
use crate::test_helpers::{Failure, StaticSource, entry, search_entry};
use crate::types::{ArchitectureStatus, ArchitectureVerdict};
use std::time::Duration;

async fn run(source: StaticSource, raw: &[&str]) -> (PackageResults, Arc<StaticSource>) {
    let source = Arc::new(source);
    let identifiers = normalize_identifiers(raw);
    let snapshot = source.directory_snapshot().await.unwrap();
    let architecture = source.architecture_check(&identifiers.names).await.unwrap();

    let reconciler = Reconciler::new(
        source.clone(),
        SourceConfig::default(),
        RequestPacer::new(Duration::from_millis(1), 2),
    );
    let results = reconciler
        .reconcile(&identifiers, &snapshot, &architecture)
        .await;
    (results, source)
}

#[tokio::test]
async fn test_snapshot_hit_builds_full_record() {
    let source = StaticSource::new()
        .listed(entry("react-native-svg", 7400))
        .verdict("react-native-svg", ArchitectureStatus::Supported, false);

    let (results, _) = run(source, &["react-native-svg@15.2.0"]).await;
    let record = results.get("react-native-svg").unwrap();

    assert!(!record.not_in_directory);
    assert!(!record.is_recent);
    assert_eq!(record.version.as_deref(), Some("15.2.0"));
    assert_eq!(record.architecture, ArchitectureStatus::Supported);
    assert_eq!(
        record.directory_url.as_deref(),
        Some("https://www.npmjs.com/package/react-native-svg")
    );
    assert_eq!(
        record.repository_url.as_deref(),
        Some("https://github.com/example/react-native-svg")
    );
    assert!(record.platforms.unwrap().ios);
    assert!(record.support.as_ref().unwrap().has_types);

    let repo = record.repository.as_ref().unwrap();
    assert_eq!(repo.stars, 7400);
    assert_eq!(repo.forks, 740);
    assert_eq!(
        repo.forks_url,
        "https://github.com/example/react-native-svg/network/members"
    );
    assert_eq!(
        repo.updated_at.unwrap().to_rfc3339(),
        "2024-03-15T08:30:00+00:00"
    );
    assert!(record.note.is_none());
}

#[tokio::test]
async fn test_snapshot_hit_never_searches() {
    // listed and checked: both branches could apply, the snapshot wins
    let source = StaticSource::new()
        .listed(entry("dual", 10))
        .verdict("dual", ArchitectureStatus::Unsupported, false)
        .searchable("dual", vec![search_entry("dual")]);

    let (results, source) = run(source, &["dual"]).await;

    assert!(source.searched().is_empty());
    let record = results.get("dual").unwrap();
    assert!(!record.is_recent);
    assert_eq!(record.architecture, ArchitectureStatus::Unsupported);
}

#[tokio::test]
async fn test_search_exact_match_marks_recent() {
    let source = StaticSource::new()
        .verdict("fresh-lib", ArchitectureStatus::Supported, false)
        .searchable(
            "fresh-lib",
            vec![search_entry("fresh-lib-plugin"), search_entry("fresh-lib")],
        );

    let (results, source) = run(source, &["fresh-lib"]).await;
    let record = results.get("fresh-lib").unwrap();

    assert_eq!(source.searched(), vec!["fresh-lib"]);
    assert!(record.is_recent);
    assert!(!record.not_in_directory);
    assert_eq!(
        record.repository_url.as_deref(),
        Some("https://github.com/fresh/fresh-lib")
    );
    // search entries without counters carry no repository stats
    assert!(record.repository.is_none());
    assert!(record.platforms.unwrap().web);
}

#[tokio::test]
async fn test_search_without_exact_match_is_architecture_only() {
    let source = StaticSource::new()
        .verdict("lonely", ArchitectureStatus::Untested, true)
        .searchable("lonely", vec![search_entry("lonely-fork")]);

    let (results, _) = run(source, &["lonely"]).await;
    let record = results.get("lonely").unwrap();

    assert!(record.not_in_directory);
    assert!(record.repository.is_none());
    assert!(record.unmaintained);
    assert_eq!(record.note.as_deref(), Some(UNLISTED_NOTE));
}

#[tokio::test]
async fn test_unknown_everywhere_is_unresolved_without_search() {
    let (results, source) = run(StaticSource::new(), &["ghost"]).await;
    let record = results.get("ghost").unwrap();

    assert!(source.searched().is_empty());
    assert!(record.not_in_directory);
    assert_eq!(record.architecture, ArchitectureStatus::Untested);
    assert_eq!(record.note.as_deref(), Some(NOT_FOUND_NOTE));
}

#[tokio::test]
async fn test_search_failure_degrades_one_package() {
    let source = StaticSource::new()
        .listed(entry("listed", 5))
        .verdict("broken", ArchitectureStatus::Supported, false)
        .search_fails("broken", Failure::Malformed)
        .verdict("flaky", ArchitectureStatus::Unsupported, false)
        .search_fails("flaky", Failure::Status(503))
        .verdict("fine", ArchitectureStatus::Supported, false)
        .searchable("fine", vec![search_entry("fine")]);

    let (results, _) = run(source, &["listed", "broken", "flaky", "fine"]).await;

    assert_eq!(
        results.names().collect::<Vec<_>>(),
        vec!["listed", "broken", "flaky", "fine"]
    );

    let broken = results.get("broken").unwrap();
    assert!(broken.not_in_directory);
    assert_eq!(broken.architecture, ArchitectureStatus::Supported);
    assert!(broken.note.as_deref().unwrap().contains("malformed"));

    let flaky = results.get("flaky").unwrap();
    assert!(flaky.note.as_deref().unwrap().contains("503"));

    assert!(results.get("fine").unwrap().is_recent);
    assert!(!results.get("listed").unwrap().not_in_directory);
}

#[tokio::test]
async fn test_invalid_repository_link_keeps_directory_record() {
    let mut bad = entry("bad-link", 1);
    bad.github.as_mut().unwrap().urls.as_mut().unwrap().repo =
        Some("github.com/example/bad-link".to_string());

    let source = StaticSource::new()
        .listed(entry("a", 1))
        .listed(bad)
        .listed(entry("c", 1))
        .verdict("bad-link", ArchitectureStatus::Unsupported, true);

    let (results, _) = run(source, &["a", "bad-link", "c"]).await;

    assert_eq!(results.names().collect::<Vec<_>>(), vec!["a", "bad-link", "c"]);
    for name in ["a", "c"] {
        let record = results.get(name).unwrap();
        assert!(!record.not_in_directory);
        assert!(record.repository.is_some());
        assert!(record.note.is_none());
    }

    let degraded = results.get("bad-link").unwrap();
    assert!(!degraded.not_in_directory);
    assert!(degraded.repository_url.is_none());
    assert!(degraded.repository.is_none());
    assert!(degraded.platforms.unwrap().ios);
    assert!(degraded.support.is_some());
    assert!(degraded.directory_url.is_some());
    assert!(degraded.note.as_deref().unwrap().contains("invalid link"));
    assert_eq!(degraded.architecture, ArchitectureStatus::Unsupported);
    assert!(degraded.unmaintained);
}

#[tokio::test]
async fn test_verdict_overrides_directory_and_keeps_note_precedence() {
    let mut source = StaticSource::new().listed(entry("pkg", 1));
    source.architecture.insert(
        "pkg".to_string(),
        ArchitectureVerdict {
            status: ArchitectureStatus::Unsupported,
            unmaintained: true,
            note: Some("Check failed upstream".to_string()),
        },
    );

    let (results, _) = run(source, &["pkg"]).await;
    let record = results.get("pkg").unwrap();

    assert_eq!(record.architecture, ArchitectureStatus::Unsupported);
    assert!(record.unmaintained);
    assert_eq!(record.note.as_deref(), Some("Check failed upstream"));
}

#[tokio::test]
async fn test_key_set_equals_normalized_input() {
    let source = StaticSource::new()
        .listed(entry("a", 1))
        .verdict("b", ArchitectureStatus::Supported, false)
        .searchable("b", vec![search_entry("b")]);

    let raw = ["a@1", "b", "", "a@2", "  c ", "@s/d@0.1.0", "b"];
    let (results, _) = run(source, &raw).await;

    assert_eq!(
        results.names().collect::<Vec<_>>(),
        vec!["a", "b", "c", "@s/d"]
    );
    assert_eq!(results.get("a").unwrap().version.as_deref(), Some("1"));
    assert_eq!(results.get("@s/d").unwrap().version.as_deref(), Some("0.1.0"));
}

#[tokio::test]
async fn test_unparseable_update_time_is_dropped() {
    let mut odd = entry("odd", 1);
    odd.github
        .as_mut()
        .unwrap()
        .stats
        .as_mut()
        .unwrap()
        .updated_at = Some("yesterday".to_string());

    let (results, _) = run(StaticSource::new().listed(odd), &["odd"]).await;
    let record = results.get("odd").unwrap();

    assert!(record.repository.is_some());
    assert!(record.updated_at().is_none());
}
