//! State shared by the pool handle and the drain loop.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::core::{admission::Admission, staging::Staging};
use crate::events::{Bus, Event, EventKind};
use crate::tasks::{Identifier, Work};

pub(crate) struct Shared<K> {
    pub(crate) staging: Mutex<Staging<K>>,
    /// Woken whenever a queued entry leaves the staging area, and once after sealing.
    pub(crate) space: Notify,
    pub(crate) bus: Bus,
    stopped: AtomicBool,
}

impl<K> Shared<K> {
    #[inline]
    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Flips the lifecycle flag; returns `true` for the caller that performed the transition.
    pub(crate) fn mark_stopped(&self) -> bool {
        !self.stopped.swap(true, Ordering::AcqRel)
    }
}

impl<K: Identifier> Shared<K> {
    pub(crate) fn new(capacity: usize, bus: Bus) -> Self {
        Self {
            staging: Mutex::new(Staging::with_capacity(capacity)),
            space: Notify::new(),
            bus,
            stopped: AtomicBool::new(false),
        }
    }

    /// Offers `work` under the staging lock and publishes the outcome.
    ///
    /// A full area is reported as `Err` without an event; the caller decides whether
    /// that is a rejection or a reason to wait. The identifier is only formatted for
    /// events when the bus has receivers.
    pub(crate) fn offer(&self, id: K, work: Work) -> Result<Admission, (K, Work)> {
        let task = self.bus.has_receivers().then(|| format!("{id:?}"));
        let (res, pending) = {
            let mut staging = self.staging.lock();
            let res = staging.offer(id, work);
            (res, staging.len())
        };

        let Some(task) = task else { return res };
        match &res {
            Ok(Admission::Staged) => self.bus.publish(
                Event::new(EventKind::TaskStaged)
                    .with_task(task)
                    .with_pending(pending),
            ),
            Ok(Admission::Collapsed) => {
                self.bus
                    .publish(Event::new(EventKind::TaskCollapsed).with_task(task));
            }
            Ok(Admission::Rejected) | Err(_) => {}
        }
        res
    }

    /// Publishes a rejection for an offer that found the area full.
    pub(crate) fn reject(&self, id: &K) {
        if !self.bus.has_receivers() {
            return;
        }
        let pending = self.staging.lock().len();
        self.bus.publish(
            Event::new(EventKind::TaskRejected)
                .with_task(format!("{id:?}"))
                .with_reason("staging full")
                .with_pending(pending),
        );
    }
}
