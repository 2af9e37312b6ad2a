//! End-to-end reconciliation flows against the in-memory store and a
//! mock report server.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pipecov_core::{Activity, Attachment, COVERAGE_ATTACHMENT};
use pipecov_db_memory::InMemoryActivityStore;
use pipecov_reconciler::{BackoffPolicy, DispatchConfig, Reconciler};
use pipecov_report::ReportFetcher;
use pipecov_storage::{ActivityEvents, ActivityStore};

const SINGLE_COUNTER_REPORT: &str =
    r#"<report name="app"><counter type="INSTRUCTION" missed="10" covered="90"/></report>"#;

async fn mock_report_server(body: &str, expected_hits: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jacoco.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected_hits)
        .mount(&server)
        .await;
    server
}

fn reconciler(store: Arc<InMemoryActivityStore>) -> Reconciler {
    Reconciler::new(store, ReportFetcher::new().unwrap()).with_policy(BackoffPolicy::fast())
}

fn activity_with_report(name: &str, report_url: String) -> Activity {
    Activity::new(name, "jx").with_attachment(Attachment::new(COVERAGE_ATTACHMENT, vec![report_url]))
}

#[tokio::test]
async fn records_one_fact_with_projected_measurements() {
    let server = mock_report_server(SINGLE_COUNTER_REPORT, 1).await;
    let report_url = format!("{}/jacoco.xml", server.uri());

    let store = Arc::new(InMemoryActivityStore::new());
    let snapshot = store
        .insert(activity_with_report("a", report_url.clone()))
        .await
        .unwrap();

    reconciler(store.clone()).reconcile(&snapshot).await;

    let updated = store.get("jx", "a").await.unwrap().unwrap();
    assert_eq!(updated.facts.len(), 1);

    let fact = &updated.facts[0];
    assert!(fact.original.url.starts_with(&format!("{report_url}?version=")));

    let value = |name: &str| {
        fact.measurements
            .iter()
            .find(|m| m.name == name)
            .unwrap_or_else(|| panic!("missing measurement {name}"))
            .value
    };
    assert_eq!(fact.measurements.len(), 3);
    assert_eq!(value("Instructions-Coverage"), 90);
    assert_eq!(value("Instructions-Missed"), 10);
    assert_eq!(value("Instructions-Total"), 100);
}

#[tokio::test]
async fn report_without_counters_still_creates_a_fact() {
    let server = mock_report_server(r#"<report name="empty"></report>"#, 1).await;

    let store = Arc::new(InMemoryActivityStore::new());
    let snapshot = store
        .insert(activity_with_report("a", format!("{}/jacoco.xml", server.uri())))
        .await
        .unwrap();

    reconciler(store.clone()).reconcile(&snapshot).await;

    let updated = store.get("jx", "a").await.unwrap().unwrap();
    assert_eq!(updated.facts.len(), 1);
    assert!(updated.facts[0].measurements.is_empty());
}

#[tokio::test]
async fn redelivered_snapshot_is_not_reprocessed() {
    // expect(1): the second delivery must not fetch again.
    let server = mock_report_server(SINGLE_COUNTER_REPORT, 1).await;

    let store = Arc::new(InMemoryActivityStore::new());
    let snapshot = store
        .insert(activity_with_report("a", format!("{}/jacoco.xml", server.uri())))
        .await
        .unwrap();

    let reconciler = reconciler(store.clone());
    reconciler.reconcile(&snapshot).await;

    let after_first = store.get("jx", "a").await.unwrap().unwrap();
    reconciler.reconcile(&after_first).await;

    let after_second = store.get("jx", "a").await.unwrap().unwrap();
    assert_eq!(after_second.facts.len(), 1);
    // No second write happened: the version token is unchanged.
    assert_eq!(after_second.resource_version, after_first.resource_version);
}

#[tokio::test]
async fn fetch_failure_skips_the_url_without_touching_the_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jacoco.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryActivityStore::new());
    let snapshot = store
        .insert(activity_with_report("a", format!("{}/jacoco.xml", server.uri())))
        .await
        .unwrap();

    reconciler(store.clone()).reconcile(&snapshot).await;

    let unchanged = store.get("jx", "a").await.unwrap().unwrap();
    assert!(unchanged.facts.is_empty());
    assert_eq!(unchanged.resource_version, snapshot.resource_version);
}

#[tokio::test]
async fn one_bad_url_does_not_block_the_next() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jacoco.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SINGLE_COUNTER_REPORT))
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryActivityStore::new());
    let snapshot = store
        .insert(
            Activity::new("a", "jx").with_attachment(Attachment::new(
                COVERAGE_ATTACHMENT,
                vec![
                    format!("{}/broken.xml", server.uri()),
                    format!("{}/jacoco.xml", server.uri()),
                ],
            )),
        )
        .await
        .unwrap();

    reconciler(store.clone()).reconcile(&snapshot).await;

    let updated = store.get("jx", "a").await.unwrap().unwrap();
    assert_eq!(updated.facts.len(), 1);
    assert!(updated.facts[0].original.url.contains("/jacoco.xml"));
}

#[tokio::test]
async fn attachments_of_other_kinds_are_ignored() {
    let store = Arc::new(InMemoryActivityStore::new());
    let snapshot = store
        .insert(Activity::new("a", "jx").with_attachment(Attachment::new(
            "sonarqube",
            vec!["http://store/sonar.xml".to_string()],
        )))
        .await
        .unwrap();

    reconciler(store.clone()).reconcile(&snapshot).await;

    let unchanged = store.get("jx", "a").await.unwrap().unwrap();
    assert!(unchanged.facts.is_empty());
}

#[tokio::test]
async fn dispatcher_runs_with_zero_configured_workers() {
    let server = mock_report_server(SINGLE_COUNTER_REPORT, 1).await;

    let store = Arc::new(InMemoryActivityStore::new());
    let reconciler = Arc::new(reconciler(store.clone()));

    // The field is public, so the with_workers clamp can be bypassed.
    let mut config = DispatchConfig::new("jx").with_resync_interval(Duration::from_secs(600));
    config.workers = 0;

    let events = store.subscribe();
    let handle = pipecov_reconciler::spawn(reconciler, store.clone(), events, config);

    store
        .insert(activity_with_report("a", format!("{}/jacoco.xml", server.uri())))
        .await
        .unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let current = store.get("jx", "a").await.unwrap().unwrap();
        if !current.facts.is_empty() {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "fact never recorded");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    handle.shutdown().await;
}

#[tokio::test]
async fn dispatcher_ignores_activities_outside_its_namespace() {
    // expect(0): an event from another namespace must never reach a worker.
    let server = mock_report_server(SINGLE_COUNTER_REPORT, 0).await;

    let store = Arc::new(InMemoryActivityStore::new());
    let reconciler = Arc::new(reconciler(store.clone()));

    let events = store.subscribe();
    let handle = pipecov_reconciler::spawn(
        reconciler,
        store.clone(),
        events,
        DispatchConfig::new("jx").with_resync_interval(Duration::from_secs(600)),
    );

    store
        .insert(
            Activity::new("a", "staging").with_attachment(Attachment::new(
                COVERAGE_ATTACHMENT,
                vec![format!("{}/jacoco.xml", server.uri())],
            )),
        )
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;

    let untouched = store.get("staging", "a").await.unwrap().unwrap();
    assert!(untouched.facts.is_empty());

    handle.shutdown().await;
}

#[tokio::test]
async fn dispatcher_picks_up_inserted_activities() {
    let server = mock_report_server(SINGLE_COUNTER_REPORT, 1).await;

    let store = Arc::new(InMemoryActivityStore::new());
    let reconciler = Arc::new(reconciler(store.clone()));

    let events = store.subscribe();
    let handle = pipecov_reconciler::spawn(
        reconciler,
        store.clone(),
        events,
        DispatchConfig::new("jx")
            .with_workers(2)
            .with_resync_interval(Duration::from_secs(600)),
    );

    store
        .insert(activity_with_report("a", format!("{}/jacoco.xml", server.uri())))
        .await
        .unwrap();

    // The insert event flows through the dispatcher to a worker.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let current = store.get("jx", "a").await.unwrap().unwrap();
        if !current.facts.is_empty() {
            assert_eq!(current.facts[0].measurements.len(), 3);
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "fact never recorded");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    handle.shutdown().await;
}
