//! Two-step mood logging flow
//!
//! Tapping a mood creates the record immediately; factors, tobacco urge and
//! notes are collected in a [`DetailDraft`] and attached with a single
//! follow-up update. Every successful mutation is announced on the snapshot
//! invalidation channel.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::StoreError;
use crate::store::{Invalidation, InvalidationSender, RecordStore};
use crate::types::{EntryDetails, EntryId, Factor, Mood, TobaccoUrge, UserId};

/// Most factors a user may attach to one entry
pub const MAX_FACTORS: usize = 2;

/// Details being collected for the pending entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailDraft {
    factors: Vec<Factor>,
    tobacco_urge: TobaccoUrge,
    notes: String,
}

impl DetailDraft {
    /// Select or deselect a factor; a third selection is ignored
    pub fn toggle_factor(&mut self, factor: Factor) {
        if let Some(pos) = self.factors.iter().position(|f| *f == factor) {
            self.factors.remove(pos);
        } else if self.factors.len() < MAX_FACTORS {
            self.factors.push(factor);
        }
    }

    pub fn set_tobacco_urge(&mut self, urge: TobaccoUrge) {
        self.tobacco_urge = urge;
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// Finalize into stored details; blank notes become absent
    pub fn into_details(self) -> EntryDetails {
        let notes = if self.notes.trim().is_empty() {
            None
        } else {
            Some(self.notes)
        };
        EntryDetails {
            factors: self.factors,
            tobacco_urge: self.tobacco_urge,
            notes,
        }
    }
}

/// Drives the create-then-annotate flow for one user
pub struct MoodLogger {
    user_id: UserId,
    invalidations: InvalidationSender,
    pending: Option<PendingEntry>,
}

#[derive(Debug, Clone)]
struct PendingEntry {
    id: EntryId,
    mood: Mood,
    draft: DetailDraft,
}

impl MoodLogger {
    pub fn new(user_id: UserId, invalidations: InvalidationSender) -> Self {
        Self {
            user_id,
            invalidations,
            pending: None,
        }
    }

    /// Record a mood at local time `now`, dated from `now`
    pub fn log_mood<S: RecordStore + ?Sized>(
        &mut self,
        store: &mut S,
        mood: Mood,
        now: NaiveDateTime,
    ) -> Result<EntryId, StoreError> {
        let id = store.create_entry(self.user_id, now, now.date(), mood)?;
        self.pending = Some(PendingEntry {
            id,
            mood,
            draft: DetailDraft::default(),
        });
        self.signal(Invalidation::EntryCreated {
            user_id: self.user_id,
            id,
        });
        Ok(id)
    }

    /// Mood of the entry awaiting details
    pub fn pending_mood(&self) -> Option<Mood> {
        self.pending.as_ref().map(|p| p.mood)
    }

    /// Draft for the pending entry, if any
    pub fn draft_mut(&mut self) -> Option<&mut DetailDraft> {
        self.pending.as_mut().map(|p| &mut p.draft)
    }

    /// Attach the drafted details and reset the flow.
    ///
    /// Returns `Ok(None)` when there is no pending entry. On store failure the
    /// draft is kept so the caller may retry.
    pub fn save_details<S: RecordStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> Result<Option<EntryId>, StoreError> {
        let Some(pending) = self.pending.as_ref() else {
            return Ok(None);
        };
        let id = pending.id;
        store.update_entry_details(id, self.user_id, pending.draft.clone().into_details())?;

        self.pending = None;
        self.signal(Invalidation::DetailsSaved {
            user_id: self.user_id,
            id,
        });
        Ok(Some(id))
    }

    /// Abandon the pending details; the mood entry itself stays
    pub fn skip(&mut self) {
        self.pending = None;
    }

    fn signal(&self, invalidation: Invalidation) {
        if self.invalidations.send(invalidation).is_err() {
            debug!(user_id = self.user_id, "no snapshot provider listening");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, SnapshotProvider};

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-03-01T21:10", "%Y-%m-%dT%H:%M").unwrap()
    }

    #[test]
    fn test_toggle_factor_caps_at_two() {
        let mut draft = DetailDraft::default();
        draft.toggle_factor(Factor::Work);
        draft.toggle_factor(Factor::Sleep);
        draft.toggle_factor(Factor::Health);
        assert_eq!(draft.factors(), &[Factor::Work, Factor::Sleep]);

        draft.toggle_factor(Factor::Work);
        draft.toggle_factor(Factor::Health);
        assert_eq!(draft.factors(), &[Factor::Sleep, Factor::Health]);
    }

    #[test]
    fn test_blank_notes_are_absent() {
        let mut draft = DetailDraft::default();
        draft.set_notes("   ");
        assert_eq!(draft.into_details().notes, None);
    }

    #[test]
    fn test_log_then_save_details() {
        let mut store = InMemoryStore::new();
        let (mut provider, tx) = SnapshotProvider::new(4);
        let mut logger = MoodLogger::new(4, tx);

        let id = logger.log_mood(&mut store, Mood::Low, now()).unwrap();
        assert_eq!(logger.pending_mood(), Some(Mood::Low));
        assert_eq!(provider.current(&store).entries().len(), 1);

        let draft = logger.draft_mut().unwrap();
        draft.toggle_factor(Factor::Recovery);
        draft.set_tobacco_urge(TobaccoUrge::Strong);
        draft.set_notes("craving after dinner");

        assert_eq!(logger.save_details(&mut store).unwrap(), Some(id));
        assert_eq!(logger.pending_mood(), None);

        let snapshot = provider.current(&store);
        let entry = &snapshot.entries()[0];
        assert_eq!(entry.factors, vec![Factor::Recovery]);
        assert_eq!(entry.tobacco_urge, TobaccoUrge::Strong);
        assert_eq!(entry.notes.as_deref(), Some("craving after dinner"));
        assert_eq!(entry.date, now().date());
    }

    #[test]
    fn test_save_without_pending_entry_is_noop() {
        let mut store = InMemoryStore::new();
        let (_provider, tx) = SnapshotProvider::new(4);
        let mut logger = MoodLogger::new(4, tx);
        assert_eq!(logger.save_details(&mut store).unwrap(), None);

        logger.log_mood(&mut store, Mood::Good, now()).unwrap();
        logger.skip();
        assert_eq!(logger.save_details(&mut store).unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_logging_without_listener_still_succeeds() {
        let mut store = InMemoryStore::new();
        let (provider, tx) = SnapshotProvider::new(4);
        drop(provider);
        let mut logger = MoodLogger::new(4, tx);
        assert!(logger.log_mood(&mut store, Mood::Okay, now()).is_ok());
    }
}
