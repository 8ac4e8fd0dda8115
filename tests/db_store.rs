use chrono::{TimeZone, Utc};
use fight_sync::config::DatabaseConfig;
use fight_sync::db::{Db, EventDraft, FightUpsert, Store};
use fight_sync::Error;
use tokio_test::assert_ok;

async fn sqlite() -> Db {
    let db = Db::new(&DatabaseConfig {
        url: Some("sqlite::memory:".to_string()),
        max_connections: 5,
    })
    .await
    .unwrap();
    db.create_tables().await.unwrap();
    db
}

fn fight(event_id: i64, a: &str, b: &str, odds: (f64, f64)) -> FightUpsert {
    FightUpsert {
        event_id,
        fighter_a_name: a.to_string(),
        fighter_b_name: b.to_string(),
        odds_a: Some(odds.0),
        odds_b: Some(odds.1),
    }
}

#[tokio::test]
async fn test_create_tables_is_repeatable() {
    let db = sqlite().await;
    assert_ok!(db.create_tables().await);
    assert!(db.list_events().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_event_upsert_is_keyed_by_name_and_day() {
    let db = sqlite().await;
    let evening = Utc.with_ymd_and_hms(2025, 2, 8, 22, 0, 0).unwrap();

    let first = db.upsert_event(&EventDraft::new("UFC 312", evening)).await.unwrap();
    let again = db
        .upsert_event(&EventDraft::new("ufc 312!", evening + chrono::Duration::hours(1)))
        .await
        .unwrap();
    let next_day = db
        .upsert_event(&EventDraft::new("UFC 312", evening + chrono::Duration::days(1)))
        .await
        .unwrap();

    assert_eq!(first.id, again.id);
    assert_eq!(again.name, "UFC 312");
    assert_eq!(again.event_date, evening + chrono::Duration::hours(1));
    assert_ne!(first.id, next_day.id);
    assert_eq!(db.list_events().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_events_are_ordered_by_date() {
    let db = sqlite().await;
    db.upsert_event(&EventDraft::new("UFC 313", Utc.with_ymd_and_hms(2025, 3, 8, 22, 0, 0).unwrap()))
        .await
        .unwrap();
    db.upsert_event(&EventDraft::new("UFC 312", Utc.with_ymd_and_hms(2025, 2, 8, 22, 0, 0).unwrap()))
        .await
        .unwrap();

    let names: Vec<String> = db.list_events().await.unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["UFC 312", "UFC 313"]);
}

#[tokio::test]
async fn test_refresh_reactivates_event() {
    let db = sqlite().await;
    let evening = Utc.with_ymd_and_hms(2025, 2, 8, 22, 0, 0).unwrap();
    let mut draft = EventDraft::new("UFC 312", evening);
    draft.is_active = false;
    let event = db.upsert_event(&draft).await.unwrap();

    let later = evening + chrono::Duration::minutes(30);
    db.refresh_event(event.id, Some(later)).await.unwrap();

    let stored = &db.list_events().await.unwrap()[0];
    assert!(stored.is_active);
    assert_eq!(stored.event_date, later);

    assert!(matches!(db.refresh_event(999, None).await, Err(Error::EventNotFound(999))));
}

#[tokio::test]
async fn test_fight_upsert_updates_odds_only() {
    let db = sqlite().await;
    let event = db
        .upsert_event(&EventDraft::new("UFC 312", Utc.with_ymd_and_hms(2025, 2, 8, 22, 0, 0).unwrap()))
        .await
        .unwrap();

    db.upsert_fight(&fight(event.id, "Dricus Du Plessis", "Sean Strickland", (-180.0, 155.0)))
        .await
        .unwrap();
    db.upsert_fight(&fight(event.id, "Dricus Du Plessis", "Sean Strickland", (-200.0, 170.0)))
        .await
        .unwrap();
    db.upsert_fight(&fight(event.id, "Sean Strickland", "Dricus Du Plessis", (170.0, -200.0)))
        .await
        .unwrap();

    let fights = db.fights_for_event(event.id).await.unwrap();
    assert_eq!(fights.len(), 2);
    assert_eq!(fights[0].fighter_a_name, "Dricus Du Plessis");
    assert_eq!(fights[0].odds_a, Some(-200.0));
    assert_eq!(fights[0].odds_b, Some(170.0));
    assert_eq!(fights[0].winner, None);
}

#[tokio::test]
async fn test_missing_odds_are_stored_as_null() {
    let db = sqlite().await;
    let event = db
        .upsert_event(&EventDraft::new("PFL 1", Utc.with_ymd_and_hms(2025, 4, 3, 23, 0, 0).unwrap()))
        .await
        .unwrap();

    let mut upsert = fight(event.id, "Sergio Pettis", "Raufeon Stots", (120.0, -140.0));
    upsert.odds_b = None;
    db.upsert_fight(&upsert).await.unwrap();

    let fights = db.fights_for_event(event.id).await.unwrap();
    assert_eq!(fights[0].odds_a, Some(120.0));
    assert_eq!(fights[0].odds_b, None);
}

#[tokio::test]
async fn test_in_memory_database_is_shared_across_queries() {
    let db = sqlite().await;
    db.upsert_event(&EventDraft::new("UFC 312", Utc.with_ymd_and_hms(2025, 2, 8, 22, 0, 0).unwrap()))
        .await
        .unwrap();

    let (a, b, c) = tokio::join!(db.list_events(), db.list_events(), db.list_events());
    assert_eq!(a.unwrap().len(), 1);
    assert_eq!(b.unwrap().len(), 1);
    assert_eq!(c.unwrap().len(), 1);
}

#[tokio::test]
async fn test_find_event() {
    let db = sqlite().await;
    let event = db
        .upsert_event(&EventDraft::new("UFC 312", Utc.with_ymd_and_hms(2025, 2, 8, 22, 0, 0).unwrap()))
        .await
        .unwrap();

    assert_eq!(db.find_event(event.id).await.unwrap(), Some(event.clone()));
    assert_eq!(db.find_event(event.id + 100).await.unwrap(), None);
}

#[tokio::test]
async fn test_decimal_odds_are_not_rounded() {
    let db = sqlite().await;
    let event = db
        .upsert_event(&EventDraft::new("UFC 312", Utc.with_ymd_and_hms(2025, 2, 8, 22, 0, 0).unwrap()))
        .await
        .unwrap();

    db.upsert_fight(&fight(event.id, "Dricus Du Plessis", "Sean Strickland", (1.83333, 2.05125)))
        .await
        .unwrap();

    let fights = db.fights_for_event(event.id).await.unwrap();
    assert_eq!(fights[0].odds_a, Some(1.83333));
    assert_eq!(fights[0].odds_b, Some(2.05125));
}
