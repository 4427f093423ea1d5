//! End-to-end behaviour of the sync controller and mutation gateway against
//! a mock tournament server.

use std::sync::Arc;
use std::time::Duration;

use futsal_core::cache::{CacheManager, ManualClock};
use futsal_core::config::RetryPolicy;
use futsal_core::models::{Collection, Group, Team};
use futsal_core::sync::{DataSyncController, LoadStatus, MutationError, MutationGateway, Refresh};
use futsal_core::ApiClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Respond, ResponseTemplate};

const TTL: Duration = Duration::from_secs(300);

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        initial_backoff_ms: 5,
    }
}

fn api_for(server: &MockServer, timeout: Duration) -> ApiClient {
    ApiClient::new(&format!("{}/api", server.uri()), timeout).unwrap()
}

fn controller(server: &MockServer) -> (Arc<DataSyncController>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let cache = CacheManager::in_memory(TTL).with_clock(clock.clone());
    let sync = DataSyncController::new(api_for(server, Duration::from_secs(2)), cache, fast_retry());
    (Arc::new(sync), clock)
}

fn sharks() -> serde_json::Value {
    serde_json::json!([{"name": "Sharks", "group": "A"}])
}

async fn mount_empty_collections(server: &MockServer, except: &[Collection]) {
    for collection in Collection::ALL {
        if except.contains(&collection) {
            continue;
        }
        Mock::given(method("GET"))
            .and(path(format!("/api/{}", collection.path())))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(server)
            .await;
    }
}

/// Fails the first `failures` requests, then serves `body`.
struct FlakyResponder {
    failures: usize,
    calls: std::sync::atomic::AtomicUsize,
    body: serde_json::Value,
}

impl Respond for FlakyResponder {
    fn respond(&self, _request: &wiremock::Request) -> ResponseTemplate {
        let n = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if n < self.failures {
            ResponseTemplate::new(503)
        } else {
            ResponseTemplate::new(200).set_body_json(self.body.clone())
        }
    }
}

#[tokio::test]
async fn teams_are_cached_and_served_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/teams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sharks()))
        .expect(1)
        .mount(&server)
        .await;

    let (sync, clock) = controller(&server);
    let first = sync
        .fetch_collection(Collection::Teams, Refresh::IfStale)
        .await
        .unwrap();
    assert_eq!(first.as_teams(), &[Team::new("Sharks", Group::A)]);
    assert!(matches!(sync.status(Collection::Teams), LoadStatus::Ready(_)));

    clock.advance(chrono::Duration::minutes(4));
    let second = sync
        .fetch_collection(Collection::Teams, Refresh::IfStale)
        .await
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn stale_entry_is_refetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/teams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sharks()))
        .expect(2)
        .mount(&server)
        .await;

    let (sync, clock) = controller(&server);
    let first = sync.load(Collection::Teams, Refresh::IfStale).await;
    clock.advance(chrono::Duration::minutes(5));
    let second = sync.load(Collection::Teams, Refresh::IfStale).await;
    assert!(!Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn forced_refresh_always_hits_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/upcoming"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(3)
        .mount(&server)
        .await;

    let (sync, _clock) = controller(&server);
    for _ in 0..3 {
        sync.fetch_collection(Collection::Upcoming, Refresh::Force)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn succeeds_on_last_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/points"))
        .respond_with(FlakyResponder {
            failures: 3,
            calls: Default::default(),
            body: serde_json::json!([{"team": "Sharks", "points": 6, "gd": 4, "group": "A"}]),
        })
        .expect(4)
        .mount(&server)
        .await;

    let (sync, _clock) = controller(&server);
    let records = sync
        .fetch_collection(Collection::Points, Refresh::IfStale)
        .await
        .unwrap();
    assert_eq!(records.as_points()[0].points, 6);
    assert!(sync.errors().is_empty());
}

#[tokio::test]
async fn matches_timing_out_four_times_becomes_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/matches"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([]))
                .set_delay(Duration::from_millis(500)),
        )
        .expect(4)
        .mount(&server)
        .await;

    let cache = CacheManager::in_memory(TTL);
    let sync = DataSyncController::new(api_for(&server, Duration::from_millis(50)), cache, fast_retry());

    let err = sync
        .fetch_collection(Collection::Matches, Refresh::IfStale)
        .await
        .unwrap_err();
    assert_eq!(err.attempts, 4);
    assert!(err.source.is_timeout());
    assert!(sync.status(Collection::Matches).is_error());
    assert!(sync.cache().get(Collection::Matches).is_none());
}

#[tokio::test]
async fn load_substitutes_empty_sequence_on_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/matches"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&server)
        .await;

    let (sync, _clock) = controller(&server);
    let records = sync.load(Collection::Matches, Refresh::IfStale).await;
    assert!(records.is_empty());
    assert_eq!(records.collection(), Collection::Matches);
    assert_eq!(sync.errors().len(), 1);
}

#[tokio::test]
async fn load_all_settles_with_partial_failure() {
    let server = MockServer::start().await;
    mount_empty_collections(&server, &[Collection::Teams, Collection::Finals]).await;
    Mock::given(method("GET"))
        .and(path("/api/teams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sharks()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/finals"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (sync, _clock) = controller(&server);
    let snapshot = sync.load_all(Refresh::IfStale).await;

    assert_eq!(snapshot.teams().len(), 1);
    assert!(snapshot.finals().is_empty());
    assert!(sync.all_settled());
    assert!(!sync.all_ready());
    assert_eq!(sync.progress(), (6, 6));
    let errors = sync.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, Collection::Finals);
}

#[tokio::test]
async fn retry_failed_reloads_only_errored_collections() {
    let server = MockServer::start().await;
    mount_empty_collections(&server, &[Collection::Semifinals]).await;
    Mock::given(method("GET"))
        .and(path("/api/semifinals"))
        .respond_with(FlakyResponder {
            failures: 4,
            calls: Default::default(),
            body: serde_json::json!([{"team1": "Sharks", "team2": "Owls", "score": "3-2"}]),
        })
        .expect(5)
        .mount(&server)
        .await;

    let (sync, _clock) = controller(&server);
    sync.load_all(Refresh::IfStale).await;
    assert!(sync.status(Collection::Semifinals).is_error());

    let retried = sync.retry_failed().await;
    assert_eq!(retried, vec![Collection::Semifinals]);
    assert!(sync.all_ready());
    assert!(sync.retry_failed().await.is_empty());
}

#[tokio::test]
async fn invalidating_one_collection_keeps_other_ages() {
    let server = MockServer::start().await;
    mount_empty_collections(&server, &[]).await;

    let (sync, clock) = controller(&server);
    sync.load(Collection::Teams, Refresh::IfStale).await;
    let teams_at = sync.cache().get(Collection::Teams).unwrap().cached_at;

    clock.advance(chrono::Duration::minutes(2));
    sync.refresh(Collection::Points).await;

    assert_eq!(sync.cache().get(Collection::Teams).unwrap().cached_at, teams_at);
    assert_eq!(
        sync.cache().get(Collection::Points).unwrap().cached_at,
        teams_at + chrono::Duration::minutes(2)
    );
    assert_eq!(sync.cache().last_updated(), Some(teams_at + chrono::Duration::minutes(2)));
}

#[tokio::test]
async fn create_invalidates_and_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/teams"))
        .respond_with(FlakyResponder {
            failures: 0,
            calls: Default::default(),
            body: sharks(),
        })
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/teams"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let (sync, _clock) = controller(&server);
    let before = sync.load(Collection::Teams, Refresh::IfStale).await;

    let gateway = MutationGateway::new(Arc::clone(&sync));
    let after = gateway
        .create_record(&Team::new("Owls", Group::B))
        .await
        .unwrap();

    assert!(!Arc::ptr_eq(&before, &after));
    let cached = sync.cache().get_fresh(Collection::Teams).unwrap();
    assert!(Arc::ptr_eq(&after, &cached));
}

#[tokio::test]
async fn update_invalidates_and_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/points"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"_id": "p1", "team": "Sharks", "points": 3, "group": "A"}
        ])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/points/p1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (sync, _clock) = controller(&server);
    let before = sync.load(Collection::Points, Refresh::IfStale).await;
    assert!(sync.cache().get_fresh(Collection::Points).is_some());

    let gateway = MutationGateway::new(Arc::clone(&sync));
    let after = gateway
        .update(Collection::Points, "p1", &serde_json::json!({"points": 6}))
        .await
        .unwrap();

    assert!(!Arc::ptr_eq(&before, &after));
    let cached = sync.cache().get_fresh(Collection::Points).unwrap();
    assert!(Arc::ptr_eq(&after, &cached));
}

#[tokio::test]
async fn delete_invalidates_and_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/matches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/matches/m1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (sync, _clock) = controller(&server);
    let before = sync.load(Collection::Matches, Refresh::IfStale).await;

    let gateway = MutationGateway::new(Arc::clone(&sync));
    let after = gateway.delete(Collection::Matches, "m1").await.unwrap();

    assert!(!Arc::ptr_eq(&before, &after));
    assert!(sync.status(Collection::Matches).is_ready());
}

#[tokio::test]
async fn backoff_only_delays_its_own_collection() {
    let server = MockServer::start().await;
    mount_empty_collections(&server, &[Collection::Matches]).await;
    Mock::given(method("GET"))
        .and(path("/api/matches"))
        .respond_with(FlakyResponder {
            failures: 1,
            calls: Default::default(),
            body: serde_json::json!([]),
        })
        .expect(2)
        .mount(&server)
        .await;

    let cache = CacheManager::in_memory(TTL);
    let slow_retry = RetryPolicy {
        max_retries: 3,
        initial_backoff_ms: 1500,
    };
    let sync = Arc::new(DataSyncController::new(
        api_for(&server, Duration::from_secs(2)),
        cache,
        slow_retry,
    ));

    let loading = tokio::spawn({
        let sync = Arc::clone(&sync);
        async move { sync.load_all(Refresh::IfStale).await }
    });

    let others: Vec<Collection> = Collection::ALL
        .into_iter()
        .filter(|c| *c != Collection::Matches)
        .collect();
    for _ in 0..100 {
        if others.iter().all(|c| sync.status(*c).is_ready()) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert!(others.iter().all(|c| sync.status(*c).is_ready()));
    assert!(sync.status(Collection::Matches).is_loading());
    assert!(!sync.all_settled());

    loading.await.unwrap();
    assert!(sync.all_ready());
}

#[tokio::test]
async fn failed_mutation_leaves_cache_intact() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/teams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sharks()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/teams/t1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let (sync, _clock) = controller(&server);
    let before = sync.load(Collection::Teams, Refresh::IfStale).await;

    let gateway = MutationGateway::new(Arc::clone(&sync));
    let err = gateway.delete(Collection::Teams, "t1").await.unwrap_err();
    match err {
        MutationError::Api(e) => assert_eq!(e.status(), Some(500)),
        other => panic!("unexpected error: {:?}", other),
    }

    let cached = sync.cache().get_fresh(Collection::Teams).unwrap();
    assert!(Arc::ptr_eq(&before, &cached));
}

#[tokio::test]
async fn persistent_cache_survives_restart() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/teams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sharks()))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let first = DataSyncController::new(
        api_for(&server, Duration::from_secs(2)),
        CacheManager::persistent(dir.path().to_path_buf(), TTL).unwrap(),
        fast_retry(),
    );
    first.load(Collection::Teams, Refresh::IfStale).await;

    let second = DataSyncController::new(
        api_for(&server, Duration::from_secs(2)),
        CacheManager::persistent(dir.path().to_path_buf(), TTL).unwrap(),
        fast_retry(),
    );
    let records = second.load(Collection::Teams, Refresh::IfStale).await;
    assert_eq!(records.as_teams()[0].name, "Sharks");
}
