//! In-memory, display-ordered collection of listings.
//!
//! The store is owned by the UI thread and only mutated while draining the
//! message channel, so it needs no locking.  What it does need is protection
//! against responses that arrive late: every [`ListingStore::replace_all`]
//! bumps a generation counter, placeholders remember the generation they were
//! created in, and task reports tagged with an older generation are dropped.
//!
//! A refresh removes placeholders outright, so with today's callers a late
//! report normally comes back [`MergeOutcome::Missing`].  `Stale` only fires
//! when a placeholder under the same id was prepended again after the
//! refresh; the generation check keeps such a report from landing on the
//! newer record.

use super::{Listing, TaskReport};

/// Result of [`ListingStore::merge_by_id`], mostly useful for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Applied,
    /// No record with that id (a refresh already superseded it).
    Missing,
    /// A record with that id exists but was created after the report's
    /// generation ended.
    Stale,
}

#[derive(Debug, Default)]
pub struct ListingStore {
    items: Vec<Listing>,
    generation: u64,
}

impl ListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Listing] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, id: &str) -> Option<&Listing> {
        self.items.iter().find(|l| l.id == id)
    }

    /// Swap in the authoritative set from the backend.
    ///
    /// Every placeholder is discarded, reconciled or not.
    pub fn replace_all(&mut self, listings: Vec<Listing>) {
        let dropped = self.items.iter().filter(|l| l.is_pending()).count();
        if dropped > 0 {
            log::debug!("refresh discarded {dropped} pending placeholder(s)");
        }
        self.items = listings;
        self.generation += 1;
    }

    /// Insert a pending record at the front and return its generation.
    pub fn prepend_placeholder(&mut self, id: &str, url: &str, message: &str) -> u64 {
        self.items
            .insert(0, Listing::placeholder(id, url, message, self.generation));
        self.generation
    }

    /// Rename a placeholder once the backend has assigned its task id.
    ///
    /// Returns `false` if the placeholder is gone.
    pub fn rekey(&mut self, old_id: &str, new_id: &str) -> bool {
        match self
            .items
            .iter_mut()
            .find(|l| l.id == old_id && l.is_pending())
        {
            Some(listing) => {
                listing.id = new_id.to_string();
                true
            }
            None => false,
        }
    }

    /// Fold a task report into the placeholder with the given id.
    ///
    /// Persisted records are never touched, even if their id happens to equal
    /// the task id.
    pub fn merge_by_id(&mut self, id: &str, generation: u64, report: &TaskReport) -> MergeOutcome {
        let Some(listing) = self
            .items
            .iter_mut()
            .find(|l| l.id == id && l.is_pending())
        else {
            return MergeOutcome::Missing;
        };
        if listing.pending.as_ref().map(|p| p.generation) != Some(generation) {
            return MergeOutcome::Stale;
        }
        listing.apply_report(report);
        MergeOutcome::Applied
    }

    /// Remove exactly the record with `id`.  Returns the removed record.
    pub fn remove_by_id(&mut self, id: &str) -> Option<Listing> {
        let idx = self.items.iter().position(|l| l.id == id)?;
        Some(self.items.remove(idx))
    }
}
