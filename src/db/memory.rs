use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;

use super::store::{Event, EventDraft, Fight, FightUpsert, Store};
use crate::error::{Error, Result};
use crate::sync::normalize::normalize;

type FightKey = (i64, String, String);

/// Process-local store used when no `DATABASE_URL` is configured.
pub struct MemoryStore {
    events: DashMap<i64, Event>,
    event_keys: DashMap<(String, NaiveDate), i64>,
    fights: DashMap<FightKey, Fight>,
    next_event_id: AtomicI64,
    next_fight_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            events: DashMap::new(),
            event_keys: DashMap::new(),
            fights: DashMap::new(),
            next_event_id: AtomicI64::new(1),
            next_fight_id: AtomicI64::new(1),
        }
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn fight_count(&self) -> usize {
        self.fights.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_events(&self) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self.events.iter().map(|e| e.value().clone()).collect();
        events.sort_by(|a, b| a.event_date.cmp(&b.event_date).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn upsert_event(&self, draft: &EventDraft) -> Result<Event> {
        let id = *self
            .event_keys
            .entry(draft.natural_key())
            .or_insert_with(|| self.next_event_id.fetch_add(1, Ordering::SeqCst));

        let mut event = self.events.entry(id).or_insert_with(|| Event {
            id,
            name: draft.name.clone(),
            event_date: draft.event_date,
            is_active: draft.is_active,
        });
        event.event_date = draft.event_date;
        event.is_active = draft.is_active;

        Ok(event.clone())
    }

    async fn refresh_event(&self, id: i64, event_date: Option<DateTime<Utc>>) -> Result<()> {
        let mut event = self.events.get_mut(&id).ok_or(Error::EventNotFound(id))?;
        event.is_active = true;

        if let Some(date) = event_date {
            let old_key = (normalize(&event.name), event.event_day());
            event.event_date = date;
            let new_key = (normalize(&event.name), event.event_day());

            if old_key != new_key {
                self.event_keys.remove(&old_key);
                self.event_keys.insert(new_key, id);
            }
        }

        Ok(())
    }

    async fn upsert_fight(&self, fight: &FightUpsert) -> Result<()> {
        if !self.events.contains_key(&fight.event_id) {
            return Err(Error::EventNotFound(fight.event_id));
        }

        let key = (
            fight.event_id,
            fight.fighter_a_name.clone(),
            fight.fighter_b_name.clone(),
        );

        self.fights
            .entry(key)
            .and_modify(|existing| {
                existing.odds_a = fight.odds_a;
                existing.odds_b = fight.odds_b;
            })
            .or_insert_with(|| Fight {
                id: self.next_fight_id.fetch_add(1, Ordering::SeqCst),
                event_id: fight.event_id,
                fighter_a_name: fight.fighter_a_name.clone(),
                fighter_b_name: fight.fighter_b_name.clone(),
                odds_a: fight.odds_a,
                odds_b: fight.odds_b,
                winner: None,
            });

        Ok(())
    }

    async fn find_event(&self, id: i64) -> Result<Option<Event>> {
        Ok(self.events.get(&id).map(|e| e.value().clone()))
    }

    async fn fights_for_event(&self, event_id: i64) -> Result<Vec<Fight>> {
        let mut fights: Vec<Fight> = self
            .fights
            .iter()
            .filter(|f| f.event_id == event_id)
            .map(|f| f.value().clone())
            .collect();
        fights.sort_by_key(|f| f.id);
        Ok(fights)
    }
}
