//! # Drain loop: periodic hand-off from the staging area to the executor.
//!
//! One background task per pool. It sleeps until the next tick or until shutdown,
//! then empties the staging area in FIFO order.
//!
//! ## State machine
//! ```text
//!   AwaitingTick ──tick──► Draining ──empty──► AwaitingTick
//!        │
//!        └──cancelled──► mark stopped ──► DrainingFinal ──empty + seal──► Terminated
//! ```
//!
//! ## Per entry
//! ```text
//! lock { pop_front }  ──► notify waiting submitters
//!                     ──► executor.submit(work).await
//!                     ──► lock { release(id) }
//! ```
//!
//! ## Rules
//! - The first tick fires one full interval after the pool is built.
//! - The stopped flag is set **before** the final drain starts.
//! - On the final drain, "area is empty" and "area is sealed" are decided in the
//!   same critical section, so nothing can be staged after the last pop.
//! - The loop never fails; forwarding is fire-and-forget. A panic raised by the
//!   executor's `submit` is caught, reported as `WorkPanicked`, and the identifier
//!   is still released.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::core::shared::Shared;
use crate::events::{Event, EventKind};
use crate::executor::Execute;
use crate::subscribers::panic_message;
use crate::tasks::{Identifier, Work};

/// What woke the loop up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Trigger {
    Tick,
    Shutdown,
}

impl Trigger {
    fn as_str(self) -> &'static str {
        match self {
            Trigger::Tick => "tick",
            Trigger::Shutdown => "shutdown",
        }
    }
}

pub(crate) struct DrainLoop<K> {
    pub(crate) shared: Arc<Shared<K>>,
    pub(crate) executor: Arc<dyn Execute>,
    pub(crate) interval: Duration,
    pub(crate) token: CancellationToken,
}

impl<K: Identifier> DrainLoop<K> {
    /// Runs until cancelled, then performs the final drain and returns.
    pub(crate) async fn run(self) {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let trigger = tokio::select! {
                biased;
                _ = self.token.cancelled() => {
                    self.shared.mark_stopped();
                    Trigger::Shutdown
                }
                _ = ticker.tick() => Trigger::Tick,
            };

            let final_pass = trigger == Trigger::Shutdown;
            self.drain(trigger, final_pass).await;
            if final_pass {
                break;
            }
        }

        self.shared.bus.publish(Event::new(EventKind::PoolStopped));
    }

    /// Forwards every staged entry.
    async fn drain(&self, trigger: Trigger, final_pass: bool) {
        let started = Instant::now();
        let mut drained = 0usize;

        loop {
            let next = {
                let mut staging = self.shared.staging.lock();
                let next = staging.pop_front();
                if next.is_none() && final_pass {
                    staging.seal();
                }
                next
            };
            let Some((id, work)) = next else { break };

            self.shared.space.notify_waiters();
            self.forward(work).await;
            self.shared.staging.lock().release(&id);
            drained += 1;
        }

        if final_pass {
            // Submitters still waiting for space must observe the seal.
            self.shared.space.notify_waiters();
        }

        if drained > 0 || final_pass {
            self.shared.bus.publish(
                Event::new(EventKind::DrainCompleted)
                    .with_drained(drained)
                    .with_reason(trigger.as_str())
                    .with_elapsed(started.elapsed()),
            );
        }
    }

    /// Hands one unit to the executor. A panicking executor is reported and the
    /// loop carries on.
    async fn forward(&self, work: Work) {
        let label = work.label_arc();
        let res = AssertUnwindSafe(self.executor.submit(work))
            .catch_unwind()
            .await;

        if let Err(panic_err) = res {
            let info = panic_message(&*panic_err);
            tracing::warn!(
                executor = self.executor.name(),
                work = ?label,
                %info,
                "executor panicked on submit"
            );
            let mut ev = Event::new(EventKind::WorkPanicked).with_reason(info);
            if let Some(label) = label {
                ev = ev.with_task(label);
            }
            self.shared.bus.publish(ev);
        }
    }
}
