use chrono::{DateTime, Utc};
use serde::Serialize;

use super::normalize::{normalize, parse_sequence_tag, related, sequence_tags, SequenceTag};
use crate::constants::FALLBACK_EVENT_NAME;
use crate::db::store::{Event, EventDraft};
use crate::feed::RawEvent;

/// Where a raw event's fights will attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventRef {
    /// An event already in the store.
    Existing(i64),
    /// A draft staged earlier in this pass, by staging index.
    Pending(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchTier {
    Exact,
    Containment,
    SequenceNumber,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Matched { target: EventRef, tier: MatchTier },
    Create(EventDraft),
}

struct Candidate {
    target: EventRef,
    name_key: String,
    tags: Vec<SequenceTag>,
}

impl Candidate {
    fn new(target: EventRef, name: &str) -> Self {
        let name_key = normalize(name);
        let tags = sequence_tags(&name_key).collect();
        Self { target, name_key, tags }
    }
}

/// Pass-local matcher over the stored events plus every draft staged so far.
pub struct EventResolver {
    candidates: Vec<Candidate>,
    staged: Vec<EventDraft>,
}

impl EventResolver {
    pub fn new(existing: &[Event]) -> Self {
        let candidates = existing
            .iter()
            .map(|e| Candidate::new(EventRef::Existing(e.id), &e.name))
            .collect();

        Self {
            candidates,
            staged: Vec::new(),
        }
    }

    /// Match `raw` against the pool, or describe the event to create.
    pub fn resolve(&self, raw: &RawEvent, now: DateTime<Utc>) -> Resolution {
        let title = raw.title.as_deref().unwrap_or("");
        let key = normalize(title);

        let found = if key.is_empty() {
            self.find_fallback()
        } else {
            self.find_match(&key)
        };
        if let Some((target, tier)) = found {
            return Resolution::Matched { target, tier };
        }

        let name = if key.is_empty() {
            FALLBACK_EVENT_NAME.to_string()
        } else {
            title.trim().to_string()
        };

        Resolution::Create(EventDraft::new(name, raw.commence_time.unwrap_or(now)))
    }

    /// Add a draft to the pool so later raw events of the pass can match it.
    pub fn stage(&mut self, draft: EventDraft) -> EventRef {
        let target = EventRef::Pending(self.staged.len());
        self.candidates.push(Candidate::new(target, &draft.name));
        self.staged.push(draft);
        target
    }

    pub fn into_staged(self) -> Vec<EventDraft> {
        self.staged
    }

    /// Untitled raw events only match an event already carrying the fallback name.
    fn find_fallback(&self) -> Option<(EventRef, MatchTier)> {
        let key = normalize(FALLBACK_EVENT_NAME);
        self.candidates
            .iter()
            .find(|c| c.name_key == key)
            .map(|c| (c.target, MatchTier::Exact))
    }

    /// Exact, then containment, then sequence number.
    ///
    /// The sequence tier compares parsed `(promotion, number)` tags rather than
    /// substrings, so "ufc312" matches a stored "ufc 312 ..." and a "ufc 31" tag
    /// never equals "ufc 312".
    fn find_match(&self, key: &str) -> Option<(EventRef, MatchTier)> {
        if key.is_empty() {
            return None;
        }

        if let Some(c) = self.candidates.iter().find(|c| c.name_key == key) {
            return Some((c.target, MatchTier::Exact));
        }

        if let Some(c) = self.candidates.iter().find(|c| related(&c.name_key, key)) {
            return Some((c.target, MatchTier::Containment));
        }

        let tag = parse_sequence_tag(key)?;
        self.candidates
            .iter()
            .find(|c| c.tags.contains(&tag))
            .map(|c| (c.target, MatchTier::SequenceNumber))
    }
}
