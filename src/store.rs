//! Record store collaborators and snapshot provisioning
//!
//! The engine never talks to storage directly. A [`RecordStore`] supplies a
//! user's records, an optional [`WellnessFeed`] supplies secondary daily
//! scores, and a [`SnapshotProvider`] turns those into the immutable
//! [`Snapshot`] the derivations run on. Mutations announce themselves on an
//! invalidation channel; the provider refetches on its next read.

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::pipeline::Snapshot;
use crate::types::{DailyScore, EntryDetails, EntryId, Mood, MoodEntry, UserId};

/// Persistence collaborator for mood records
pub trait RecordStore {
    /// All of a user's entries, newest first
    fn fetch_entries(&self, user_id: UserId) -> Result<Vec<MoodEntry>, StoreError>;

    /// Persist a new entry and return its identifier
    fn create_entry(
        &mut self,
        user_id: UserId,
        timestamp: NaiveDateTime,
        date: NaiveDate,
        mood: Mood,
    ) -> Result<EntryId, StoreError>;

    /// Attach follow-up details to an existing entry owned by `user_id`
    fn update_entry_details(
        &mut self,
        id: EntryId,
        user_id: UserId,
        details: EntryDetails,
    ) -> Result<(), StoreError>;
}

/// Secondary daily wellness score source
pub trait WellnessFeed {
    /// Scores at or above `threshold` for the user
    fn fetch_daily_scores(
        &self,
        user_id: UserId,
        threshold: u32,
    ) -> Result<Vec<DailyScore>, StoreError>;
}

/// Fetch wellness scores, degrading to `None` when the feed is absent or fails
pub fn load_wellness(
    feed: Option<&dyn WellnessFeed>,
    user_id: UserId,
    threshold: u32,
) -> Option<Vec<DailyScore>> {
    let Some(feed) = feed else {
        debug!(user_id, "no wellness feed configured");
        return None;
    };
    match feed.fetch_daily_scores(user_id, threshold) {
        Ok(scores) => Some(scores),
        Err(StoreError::NotConfigured) => {
            debug!(user_id, "wellness feed not configured");
            None
        }
        Err(e) => {
            warn!(user_id, error = %e, "wellness feed unavailable, skipping cross-metric insight");
            None
        }
    }
}

/// Why a snapshot went stale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    EntryCreated { user_id: UserId, id: EntryId },
    DetailsSaved { user_id: UserId, id: EntryId },
}

impl Invalidation {
    pub fn user_id(&self) -> UserId {
        match self {
            Invalidation::EntryCreated { user_id, .. } | Invalidation::DetailsSaved { user_id, .. } => {
                *user_id
            }
        }
    }
}

/// Sending half of the invalidation channel, held by mutation collaborators
pub type InvalidationSender = Sender<Invalidation>;

/// Caches one user's snapshot and refetches it after invalidation.
///
/// A failed fetch yields an empty snapshot ("no data this cycle") rather than
/// an error; the next invalidation or [`SnapshotProvider::refresh`] retries.
pub struct SnapshotProvider {
    user_id: UserId,
    snapshot: Option<Snapshot>,
    invalidations: Receiver<Invalidation>,
}

impl SnapshotProvider {
    /// Create a provider and the sender mutations should signal on
    pub fn new(user_id: UserId) -> (Self, InvalidationSender) {
        let (tx, rx) = mpsc::channel();
        let provider = Self {
            user_id,
            snapshot: None,
            invalidations: rx,
        };
        (provider, tx)
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Current snapshot, refetched when missing or invalidated
    pub fn current<S: RecordStore + ?Sized>(&mut self, store: &S) -> &Snapshot {
        if self.drain_invalidations() {
            self.snapshot = None;
        }
        let user_id = self.user_id;
        self.snapshot
            .get_or_insert_with(|| fetch_snapshot(store, user_id))
    }

    /// Drop the cached snapshot so the next read refetches
    pub fn refresh(&mut self) {
        self.snapshot = None;
    }

    /// Whether a snapshot is cached and no invalidation is pending
    pub fn is_fresh(&mut self) -> bool {
        if self.drain_invalidations() {
            self.snapshot = None;
        }
        self.snapshot.is_some()
    }

    fn drain_invalidations(&self) -> bool {
        let mut stale = false;
        for signal in self.invalidations.try_iter() {
            if signal.user_id() == self.user_id {
                debug!(user_id = self.user_id, ?signal, "snapshot invalidated");
                stale = true;
            }
        }
        stale
    }
}

fn fetch_snapshot<S: RecordStore + ?Sized>(store: &S, user_id: UserId) -> Snapshot {
    match store.fetch_entries(user_id) {
        Ok(entries) => {
            debug!(user_id, count = entries.len(), "snapshot fetched");
            Snapshot::new(user_id, entries)
        }
        Err(e) => {
            warn!(user_id, error = %e, "record fetch failed, using empty snapshot");
            Snapshot::empty(user_id)
        }
    }
}

/// Record store held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: Vec<MoodEntry>,
    next_id: EntryId,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, assigning identifiers to entries that lack one
    pub fn with_entries(entries: Vec<MoodEntry>) -> Self {
        let mut store = Self::new();
        store.next_id = entries.iter().filter_map(|e| e.id).max().unwrap_or(0);
        for mut entry in entries {
            if entry.id.is_none() {
                store.next_id += 1;
                entry.id = Some(store.next_id);
            }
            store.records.push(entry);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for InMemoryStore {
    fn fetch_entries(&self, user_id: UserId) -> Result<Vec<MoodEntry>, StoreError> {
        let mut entries: Vec<MoodEntry> = self
            .records
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    fn create_entry(
        &mut self,
        user_id: UserId,
        timestamp: NaiveDateTime,
        date: NaiveDate,
        mood: Mood,
    ) -> Result<EntryId, StoreError> {
        self.next_id += 1;
        let id = self.next_id;
        self.records.push(MoodEntry {
            id: Some(id),
            date,
            ..MoodEntry::new(user_id, timestamp, mood)
        });
        Ok(id)
    }

    fn update_entry_details(
        &mut self,
        id: EntryId,
        user_id: UserId,
        details: EntryDetails,
    ) -> Result<(), StoreError> {
        let record = self
            .records
            .iter_mut()
            .find(|e| e.id == Some(id) && e.user_id == user_id)
            .ok_or(StoreError::NotFound { id, user_id })?;
        record.factors = details.factors;
        record.tobacco_urge = details.tobacco_urge;
        record.notes = details.notes;
        Ok(())
    }
}

/// Wellness feed backed by a fixed list of scores
#[derive(Debug, Clone, Default)]
pub struct InMemoryWellnessFeed {
    scores: Vec<(UserId, DailyScore)>,
}

impl InMemoryWellnessFeed {
    pub fn new(user_id: UserId, scores: Vec<DailyScore>) -> Self {
        Self {
            scores: scores.into_iter().map(|s| (user_id, s)).collect(),
        }
    }
}

impl WellnessFeed for InMemoryWellnessFeed {
    fn fetch_daily_scores(
        &self,
        user_id: UserId,
        threshold: u32,
    ) -> Result<Vec<DailyScore>, StoreError> {
        Ok(self
            .scores
            .iter()
            .filter(|(owner, s)| *owner == user_id && s.score >= threshold as f64)
            .map(|(_, s)| s.clone())
            .collect())
    }
}
