//! # Staging area with identifier uniqueness.
//!
//! [`Staging`] owns both halves of the admission state, the FIFO of pending entries
//! and the set of identifiers that are pending, and only mutates them together.
//!
//! ```text
//!            offer(id, work)                       pop_front()          release(id)
//!   ──► [contains id?] ─yes─► Collapsed      queue ─► (id, work) ──► executor ──► set.remove(id)
//!             │ no
//!             ▼
//!       [queue full?] ─yes─► Err((id, work))
//!             │ no
//!             ▼
//!   queue.push_back, set.insert ─► Staged
//! ```
//!
//! ## Rules
//! - An identifier is in the set iff its entry is queued, or has just been popped
//!   and is being handed to the executor (until [`Staging::release`]).
//! - Capacity only counts queued entries; a popped entry frees its slot immediately.
//! - After [`Staging::seal`] every offer panics: the final drain already ran.
//!
//! The structure is not synchronised; the pool keeps it behind one mutex shared by
//! submitters and the drain loop.

use std::collections::{HashSet, VecDeque};

use crate::core::admission::Admission;
use crate::tasks::{Identifier, Work};

pub(crate) struct Staging<K> {
    queue: VecDeque<(K, Work)>,
    pending: HashSet<K>,
    capacity: usize,
    sealed: bool,
}

impl<K: Identifier> Staging<K> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
            pending: HashSet::with_capacity(capacity),
            capacity,
            sealed: false,
        }
    }

    /// Stages `work` unless `id` is pending. Hands `(id, work)` back when full.
    ///
    /// Unlabelled work is labelled with the identifier's `Debug` form once it is staged.
    ///
    /// # Panics
    /// If the area is sealed. Nothing is mutated in that case.
    pub(crate) fn offer(&mut self, id: K, work: Work) -> Result<Admission, (K, Work)> {
        assert!(!self.sealed, "pool is stopped");

        if self.pending.contains(&id) {
            return Ok(Admission::Collapsed);
        }
        if self.queue.len() >= self.capacity {
            return Err((id, work));
        }
        let work = match work.label() {
            Some(_) => work,
            None => work.with_label(format!("{id:?}")),
        };
        self.pending.insert(id.clone());
        self.queue.push_back((id, work));
        Ok(Admission::Staged)
    }

    /// Removes the oldest entry. Its identifier stays pending until [`Staging::release`].
    pub(crate) fn pop_front(&mut self) -> Option<(K, Work)> {
        self.queue.pop_front()
    }

    /// Makes `id` available for new submissions.
    pub(crate) fn release(&mut self, id: &K) {
        self.pending.remove(id);
    }

    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }

    pub(crate) fn contains(&self, id: &K) -> bool {
        self.pending.contains(id)
    }

    /// Queued entries.
    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    /// Identifiers currently marked pending.
    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
