use std::sync::Arc;
use std::time::Duration;

use fight_sync::config::FeedConfig;
use fight_sync::db::{MemoryStore, Store};
use fight_sync::feed::OddsApiClient;
use fight_sync::sync::{RetryPolicy, SkipKind, SyncOrchestrator};
use fight_sync::Error;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ODDS_PATH: &str = "/v4/sports/mma_mixed_martial_arts/odds/";

fn feed_config(server: &MockServer) -> FeedConfig {
    FeedConfig {
        base_url: server.uri(),
        api_key: "test-key".to_string(),
        timeout: Duration::from_secs(5),
        ..FeedConfig::default()
    }
}

fn orchestrator(server: &MockServer, store: Arc<MemoryStore>, attempts: u32) -> SyncOrchestrator {
    let feed = OddsApiClient::new(feed_config(server)).unwrap();
    let retry = RetryPolicy {
        max_attempts: attempts,
        backoff: Duration::from_millis(5),
    };
    SyncOrchestrator::new(Arc::new(feed), store, retry)
}

fn event(id: &str, title: &str, fights: &[(&str, i64, &str, i64)]) -> Value {
    let markets: Vec<Value> = fights
        .iter()
        .map(|(a, pa, b, pb)| {
            json!({
                "key": "h2h",
                "outcomes": [{"name": a, "price": pa}, {"name": b, "price": pb}]
            })
        })
        .collect();

    json!({
        "id": id,
        "sport_key": "mma_mixed_martial_arts",
        "sport_title": "MMA",
        "title": title,
        "commence_time": "2025-02-08T22:00:00Z",
        "bookmakers": [{"key": "draftkings", "title": "DraftKings", "markets": markets}]
    })
}

async fn mount_payload(server: &MockServer, payload: Value) {
    Mock::given(method("GET"))
        .and(path(ODDS_PATH))
        .and(query_param("apiKey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_empty_feed() {
    let server = MockServer::start().await;
    mount_payload(&server, json!([])).await;
    let store = Arc::new(MemoryStore::new());

    let report = orchestrator(&server, store.clone(), 1).run_pass().await.unwrap();

    assert_eq!(report.events_created, 0);
    assert_eq!(report.events_matched, 0);
    assert_eq!(report.fights_upserted, 0);
    assert!(report.skipped.is_empty());
    assert_eq!(store.event_count(), 0);
}

#[tokio::test]
async fn test_server_error_is_retried_then_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ODDS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .expect(3)
        .mount(&server)
        .await;
    let store = Arc::new(MemoryStore::new());

    let err = orchestrator(&server, store.clone(), 3).run_pass().await.unwrap_err();

    match err {
        Error::FeedUnavailable(msg) => assert!(msg.contains("500"), "unexpected message: {}", msg),
        other => panic!("expected FeedUnavailable, got {:?}", other),
    }
    assert_eq!(store.event_count(), 0);
    assert_eq!(store.fight_count(), 0);
}

#[tokio::test]
async fn test_malformed_payload_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ODDS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "quota exceeded"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = orchestrator(&server, Arc::new(MemoryStore::new()), 3)
        .run_pass()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::FeedMalformed(_)));
}

#[tokio::test]
async fn test_unparseable_event_is_skipped() {
    let server = MockServer::start().await;
    let broken = json!({
        "id": "e2",
        "sport_key": "mma_mixed_martial_arts",
        "title": "UFC Fight Night: Adesanya vs Imavov",
        "commence_time": "2025-02-01T20:00:00Z",
        "bookmakers": [{"key": "fanduel", "markets": [
            {"key": "h2h", "outcomes": [{"price": -110}, {"name": "Nassourdine Imavov", "price": -110}]}
        ]}]
    });
    mount_payload(
        &server,
        json!([
            event("e1", "UFC 312: Du Plessis vs Strickland", &[("Dricus Du Plessis", -180, "Sean Strickland", 155)]),
            broken,
            event("e3", "PFL 1: 2025 Regular Season", &[("Sergio Pettis", 120, "Raufeon Stots", -140)]),
        ]),
    )
    .await;
    let store = Arc::new(MemoryStore::new());

    let report = orchestrator(&server, store.clone(), 1).run_pass().await.unwrap();

    assert_eq!(report.events_created, 2);
    assert_eq!(report.fights_upserted, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].kind, SkipKind::ExtractionFailed);
    assert!(report.skipped[0].raw_identifier.starts_with("e2"));
    assert_eq!(store.fight_count(), 2);
}

#[tokio::test]
async fn test_repeat_pass_is_idempotent() {
    let server = MockServer::start().await;
    mount_payload(
        &server,
        json!([
            event(
                "e1",
                "UFC 312: Du Plessis vs Strickland",
                &[("Dricus Du Plessis", -180, "Sean Strickland", 155), ("Zhang Weili", -250, "Tatiana Suarez", 200)]
            ),
            event("e3", "PFL 1: 2025 Regular Season", &[("Sergio Pettis", 120, "Raufeon Stots", -140)]),
        ]),
    )
    .await;
    let store = Arc::new(MemoryStore::new());
    let sync = orchestrator(&server, store.clone(), 1);

    let first = sync.run_pass().await.unwrap();
    assert_eq!(first.events_created, 2);
    assert_eq!(first.fights_upserted, 3);

    let events_before = store.list_events().await.unwrap();

    let second = sync.run_pass().await.unwrap();
    assert_eq!(second.events_created, 0);
    assert_eq!(second.events_matched, 2);
    assert_eq!(second.fights_upserted, 3);
    assert_eq!(store.list_events().await.unwrap(), events_before);
    assert_eq!(store.fight_count(), 3);
}

#[tokio::test]
async fn test_changed_odds_update_existing_fight() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());

    mount_payload(
        &server,
        json!([event("e1", "UFC 312", &[("Dricus Du Plessis", -180, "Sean Strickland", 155)])]),
    )
    .await;
    orchestrator(&server, store.clone(), 1).run_pass().await.unwrap();

    server.reset().await;
    mount_payload(
        &server,
        json!([event("e1", "UFC 312", &[("Dricus Du Plessis", -200, "Sean Strickland", 170)])]),
    )
    .await;
    orchestrator(&server, store.clone(), 1).run_pass().await.unwrap();

    let event = &store.list_events().await.unwrap()[0];
    let fights = store.fights_for_event(event.id).await.unwrap();
    assert_eq!(fights.len(), 1);
    assert_eq!(fights[0].odds_a, Some(-200.0));
    assert_eq!(fights[0].odds_b, Some(170.0));
    assert_eq!(fights[0].winner, None);
}

#[tokio::test]
async fn test_other_sports_are_filtered_out() {
    let server = MockServer::start().await;
    let mut boxing = event("b1", "Fury vs Usyk", &[("Tyson Fury", 150, "Oleksandr Usyk", -170)]);
    boxing["sport_key"] = json!("boxing_boxing");
    mount_payload(&server, json!([boxing, event("e1", "UFC 312", &[])])).await;
    let store = Arc::new(MemoryStore::new());

    let report = orchestrator(&server, store.clone(), 1).run_pass().await.unwrap();

    assert_eq!(report.events_created, 1);
    assert_eq!(report.fights_upserted, 0);
    assert_eq!(store.list_events().await.unwrap()[0].name, "UFC 312");
}
