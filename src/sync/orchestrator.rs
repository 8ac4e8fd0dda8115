//! One sync pass: fetch, resolve, extract, dedupe, persist.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::dedup::{dedupe_by_key, dedupe_drafts, dedupe_fights};
use super::extractor::{extract, FightCandidate};
use super::report::{SkipKind, SyncReport};
use super::resolver::{EventRef, EventResolver, Resolution};
use crate::config::SyncConfig;
use crate::db::store::{Event, EventDraft, FightUpsert, Store};
use crate::error::Result;
use crate::feed::{FeedRecord, FeedSource, RawEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Fetching,
    Resolving,
    Extracting,
    Deduplicating,
    Persisting,
    Done,
    Failed(String),
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPhase::Failed(reason) => write!(f, "Failed({})", reason),
            other => write!(f, "{:?}", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

impl From<&SyncConfig> for RetryPolicy {
    fn from(config: &SyncConfig) -> Self {
        Self {
            max_attempts: config.max_fetch_attempts.max(1),
            backoff: config.retry_backoff,
        }
    }
}

struct PhaseTracker {
    phase: SyncPhase,
}

impl PhaseTracker {
    fn new() -> Self {
        Self { phase: SyncPhase::Idle }
    }

    fn enter(&mut self, next: SyncPhase) {
        debug!("sync phase {} -> {}", self.phase, next);
        self.phase = next;
    }
}

/// A raw event that made it through extraction.
struct Resolved {
    identifier: String,
    target: EventRef,
    commence_time: Option<DateTime<Utc>>,
}

pub struct SyncOrchestrator {
    feed: Arc<dyn FeedSource>,
    store: Arc<dyn Store>,
    retry: RetryPolicy,
}

impl SyncOrchestrator {
    pub fn new(feed: Arc<dyn FeedSource>, store: Arc<dyn Store>, retry: RetryPolicy) -> Self {
        Self { feed, store, retry }
    }

    /// Run one pass.
    ///
    /// Only feed failures (and failing to load the stored events, which also
    /// happens before any write) return `Err`. Everything else is recorded in
    /// the report's `skipped` list.
    pub async fn run_pass(&self) -> Result<SyncReport> {
        let mut tracker = PhaseTracker::new();
        info!("🔄 Starting sync pass from {}", self.feed.name());

        tracker.enter(SyncPhase::Fetching);
        let loaded = match self.fetch_with_retry().await {
            Ok(records) => self.store.list_events().await.map(|existing| (records, existing)),
            Err(e) => Err(e),
        };
        let (records, existing) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                tracker.enter(SyncPhase::Failed(e.to_string()));
                warn!("❌ Sync pass aborted: {}", e);
                return Err(e);
            }
        };

        let mut report = SyncReport::default();

        tracker.enter(SyncPhase::Resolving);
        let (resolver, raws) = self.resolve_all(records, &existing, &mut report);

        tracker.enter(SyncPhase::Extracting);
        let mut candidates = Vec::new();
        let mut resolved = Vec::new();
        for (raw, target) in raws {
            match extract(&raw, target) {
                Ok(fights) => {
                    candidates.extend(fights);
                    resolved.push(Resolved {
                        identifier: raw.identifier(),
                        target,
                        commence_time: raw.commence_time,
                    });
                }
                Err(e) => {
                    warn!("⚠️ Skipping {}: {}", raw.identifier(), e);
                    report.skip(raw.identifier(), SkipKind::ExtractionFailed, e.to_string());
                }
            }
        }

        tracker.enter(SyncPhase::Deduplicating);
        let plan = plan_writes(resolver.into_staged(), &resolved, candidates, &existing);

        tracker.enter(SyncPhase::Persisting);
        self.persist(plan, &mut report).await;

        tracker.enter(SyncPhase::Done);
        info!(
            "✅ Sync pass done: {} events created, {} matched, {} fights upserted, {} skipped",
            report.events_created,
            report.events_matched,
            report.fights_upserted,
            report.skipped.len()
        );

        Ok(report)
    }

    async fn fetch_with_retry(&self) -> Result<Vec<FeedRecord>> {
        let mut attempt = 1;
        let mut backoff = self.retry.backoff;

        loop {
            match self.feed.fetch_raw_events().await {
                Ok(records) => return Ok(records),
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    warn!(
                        "Feed fetch attempt {}/{} failed: {}; retrying in {:?}",
                        attempt, self.retry.max_attempts, e, backoff
                    );
                    sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn resolve_all(
        &self,
        records: Vec<FeedRecord>,
        existing: &[Event],
        report: &mut SyncReport,
    ) -> (EventResolver, Vec<(RawEvent, EventRef)>) {
        let now = Utc::now();
        let mut resolver = EventResolver::new(existing);
        let mut raws = Vec::with_capacity(records.len());

        for record in records {
            let raw = match record {
                FeedRecord::Event(raw) => raw,
                FeedRecord::Rejected { raw_identifier, reason } => {
                    warn!("⚠️ Skipping {}: {}", raw_identifier, reason);
                    report.skip(raw_identifier, SkipKind::FeedRecordRejected, reason);
                    continue;
                }
            };

            let target = match resolver.resolve(&raw, now) {
                Resolution::Matched { target, tier } => {
                    debug!("{} matched {:?} via {:?}", raw.identifier(), target, tier);
                    target
                }
                Resolution::Create(draft) => {
                    debug!("{} staged as new event {}", raw.identifier(), draft.name);
                    resolver.stage(draft)
                }
            };

            raws.push((raw, target));
        }

        (resolver, raws)
    }

    async fn persist(&self, plan: WritePlan, report: &mut SyncReport) {
        let mut created: Vec<Option<i64>> = vec![None; plan.drafts.len()];

        for (slot, (draft, sources)) in plan.drafts.iter().enumerate() {
            match self.store.upsert_event(draft).await {
                Ok(event) => {
                    info!("🆕 Created event {} ({})", event.name, event.id);
                    created[slot] = Some(event.id);
                    report.events_created += 1;
                }
                Err(e) => {
                    warn!("❌ Could not create event {}: {}", draft.name, e);
                    for source in sources {
                        report.skip(
                            source.clone(),
                            SkipKind::EventResolutionSkipped,
                            format!("could not create event {}: {}", draft.name, e),
                        );
                    }
                }
            }
        }

        for refresh in &plan.refreshes {
            match self.store.refresh_event(refresh.event_id, refresh.event_date).await {
                Ok(()) => report.events_matched += 1,
                Err(e) => {
                    warn!("❌ Could not refresh event {}: {}", refresh.event_id, e);
                    report.skip(refresh.source.clone(), SkipKind::PersistenceWriteFailed, e.to_string());
                }
            }
        }

        for fight in &plan.fights {
            let event_id = match fight.target {
                EventRef::Existing(id) => id,
                EventRef::Pending(slot) => match created.get(slot).copied().flatten() {
                    Some(id) => id,
                    // already reported against the raw event
                    None => continue,
                },
            };

            let upsert = FightUpsert {
                event_id,
                fighter_a_name: fight.fighter_a_name.clone(),
                fighter_b_name: fight.fighter_b_name.clone(),
                odds_a: fight.odds_a,
                odds_b: fight.odds_b,
            };

            match self.store.upsert_fight(&upsert).await {
                Ok(()) => report.fights_upserted += 1,
                Err(e) => {
                    warn!("❌ Could not upsert {}: {}", fight.label(), e);
                    report.skip(fight.label(), SkipKind::PersistenceWriteFailed, e.to_string());
                }
            }
        }
    }
}

struct EventRefresh {
    event_id: i64,
    event_date: Option<DateTime<Utc>>,
    source: String,
}

/// Everything the Persisting phase writes, already deduplicated.
struct WritePlan {
    /// Drafts to create with the raw events that depend on each.
    drafts: Vec<(EventDraft, Vec<String>)>,
    refreshes: Vec<EventRefresh>,
    /// Pending references point into `drafts`.
    fights: Vec<FightCandidate>,
}

fn plan_writes(
    staged: Vec<EventDraft>,
    resolved: &[Resolved],
    candidates: Vec<FightCandidate>,
    existing: &[Event],
) -> WritePlan {
    // Drafts only staged by raw events that later failed are not created.
    let used: HashSet<usize> = resolved
        .iter()
        .filter_map(|r| match r.target {
            EventRef::Pending(i) => Some(i),
            EventRef::Existing(_) => None,
        })
        .collect();
    let kept: Vec<usize> = (0..staged.len()).filter(|i| used.contains(i)).collect();

    let (drafts, remap) = dedupe_drafts(kept.iter().map(|&i| staged[i].clone()));
    let slot_of: HashMap<usize, usize> = kept.iter().copied().zip(remap).collect();

    let mut sources = vec![Vec::new(); drafts.len()];
    for r in resolved {
        if let EventRef::Pending(i) = r.target {
            if let Some(&slot) = slot_of.get(&i) {
                sources[slot].push(r.identifier.clone());
            }
        }
    }

    let days: HashMap<i64, chrono::NaiveDate> = existing.iter().map(|e| (e.id, e.event_day())).collect();
    let refreshes = dedupe_by_key(
        resolved.iter().filter_map(|r| match r.target {
            EventRef::Existing(id) => Some(EventRefresh {
                event_id: id,
                // keep the stored day so the natural key does not move
                event_date: r
                    .commence_time
                    .filter(|t| days.get(&id) == Some(&t.date_naive())),
                source: r.identifier.clone(),
            }),
            EventRef::Pending(_) => None,
        }),
        |r| r.event_id,
    );

    let fights = dedupe_fights(candidates.into_iter().filter_map(|mut f| {
        if let EventRef::Pending(i) = f.target {
            f.target = EventRef::Pending(*slot_of.get(&i)?);
        }
        Some(f)
    }));

    WritePlan {
        drafts: drafts.into_iter().zip(sources).collect(),
        refreshes,
        fights,
    }
}
