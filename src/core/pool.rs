//! # UniqPool: deduplicating admission in front of an executor.
//!
//! The [`UniqPool`] stages work keyed by an identifier, keeps at most one pending
//! entry per identifier and hands staged work to an [`Execute`] backend on a fixed
//! cadence, so bursts of duplicate submissions collapse into one execution.
//!
//! ## High-level architecture
//! ```text
//! try_submit(id, f) ──┐
//! submit(id, f)     ──┼─► [stopped?] panic
//!                     ▼
//! ┌──────────────── Staging (one mutex) ────────────────┐
//! │ pending: HashSet<K>    queue: VecDeque<(K, Work)>    │
//! └──────────────────────────┬──────────────────────────┘
//!        ▲                   │ pop (tick | shutdown)
//!        │ Notify            ▼
//!   full + submit ◄──── DrainLoop ──► executor.submit(work), release(id)
//!                                              │
//!                                              ▼
//!                               Execute (WorkerPool by default)
//! ```
//!
//! ## Shutdown path
//! ```text
//! stop_and_wait()
//!   ├─► stopped = true, publish ShutdownRequested   (new submissions panic from here on)
//!   ├─► cancel drain token ─► final drain ─► seal ─► PoolStopped
//!   ├─► await drain task
//!   ├─► executor.stop_and_wait()                     (all forwarded work finished)
//!   ├─► publish ExecutorStopped
//!   └─► stop event listener, flush subscribers
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//! use uniqpool::{PoolConfig, UniqPool};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = UniqPool::new(PoolConfig::new(10, 2, 10, Duration::from_millis(50)))?;
//!     let runs = Arc::new(AtomicUsize::new(0));
//!
//!     for _ in 0..5 {
//!         let runs = runs.clone();
//!         pool.try_submit("refresh", move || async move {
//!             runs.fetch_add(1, Ordering::SeqCst);
//!         });
//!     }
//!
//!     pool.stop_and_wait().await;
//!     assert_eq!(runs.load(Ordering::SeqCst), 1);
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{PoolConfig, admission::Admission, builder::PoolBuilder, shared::Shared},
    error::ConfigError,
    events::{Event, EventKind},
    executor::Execute,
    tasks::{Identifier, Work},
};

/// Deduplicating, periodically drained admission queue.
///
/// Construct with [`UniqPool::new`] or [`UniqPool::builder`]; both must run inside a
/// tokio runtime. Share it across tasks behind an `Arc`.
///
/// Dropping the pool without calling [`UniqPool::stop_and_wait`] (or after such a call
/// was cancelled) still runs the final drain and stops the event listener in the
/// background, but nothing waits for the forwarded work.
pub struct UniqPool<K> {
    cfg: PoolConfig,
    shared: Arc<Shared<K>>,
    executor: Arc<dyn Execute>,
    token: CancellationToken,
    drain: Mutex<Option<JoinHandle<()>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    listener_token: CancellationToken,
}

impl<K: Identifier> UniqPool<K> {
    /// Creates a pool with the default [`WorkerPool`](crate::WorkerPool) executor.
    pub fn new(cfg: PoolConfig) -> Result<Self, ConfigError> {
        PoolBuilder::new(cfg).build()
    }

    /// Returns a builder for subscribers and custom executors.
    pub fn builder(cfg: PoolConfig) -> PoolBuilder<K> {
        PoolBuilder::new(cfg)
    }

    pub(crate) fn from_parts(
        cfg: PoolConfig,
        shared: Arc<Shared<K>>,
        executor: Arc<dyn Execute>,
        token: CancellationToken,
        drain: JoinHandle<()>,
        listener: Option<JoinHandle<()>>,
        listener_token: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            shared,
            executor,
            token,
            drain: Mutex::new(Some(drain)),
            listener: Mutex::new(listener),
            listener_token,
        }
    }

    /// Stages work without waiting.
    ///
    /// Returns `true` if the work was staged **or** the identifier is already pending
    /// (the new work is discarded). Returns `false` only when the staging area is full
    /// and the identifier is not pending.
    ///
    /// # Panics
    /// If the pool is stopped.
    pub fn try_submit<F, Fut>(&self, id: K, f: F) -> bool
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.try_admit(id, f).is_accepted()
    }

    /// Same as [`UniqPool::try_submit`], reporting the detailed [`Admission`].
    ///
    /// # Panics
    /// If the pool is stopped.
    pub fn try_admit<F, Fut>(&self, id: K, f: F) -> Admission
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.try_admit_work(id, Work::new(f))
    }

    /// Non-blocking admission of a prebuilt [`Work`].
    ///
    /// # Panics
    /// If the pool is stopped.
    pub fn try_admit_work(&self, id: K, work: Work) -> Admission {
        self.ensure_running();
        match self.shared.offer(id, work) {
            Ok(admission) => admission,
            Err((id, _work)) => {
                self.shared.reject(&id);
                Admission::Rejected
            }
        }
    }

    /// Stages work, waiting for space when the staging area is full.
    ///
    /// Returns immediately with [`Admission::Collapsed`] when the identifier is already
    /// pending. Otherwise waits until a drain frees space and returns
    /// [`Admission::Staged`]; if another submitter stages the same identifier while this
    /// one waits, the call collapses into it instead.
    ///
    /// # Panics
    /// If the pool is stopped when called, or if the final drain completes while waiting.
    pub async fn submit<F, Fut>(&self, id: K, f: F) -> Admission
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.submit_work(id, Work::new(f)).await
    }

    /// Blocking-variant admission of a prebuilt [`Work`].
    ///
    /// # Panics
    /// Same as [`UniqPool::submit`].
    pub async fn submit_work(&self, id: K, work: Work) -> Admission {
        self.ensure_running();

        let mut pending = (id, work);
        loop {
            let notified = self.shared.space.notified();
            tokio::pin!(notified);
            // Register before checking so a pop between the check and the await is not missed.
            notified.as_mut().enable();

            let (id, work) = pending;
            match self.shared.offer(id, work) {
                Ok(admission) => return admission,
                Err(back) => pending = back,
            }
            notified.await;
        }
    }

    /// Lock-free read of the lifecycle flag.
    #[inline]
    pub fn stopped(&self) -> bool {
        self.shared.is_stopped()
    }

    /// Number of identifiers currently marked pending.
    pub fn pending_len(&self) -> usize {
        self.shared.staging.lock().pending_len()
    }

    /// Whether an entry for `id` is pending.
    pub fn is_pending(&self, id: &K) -> bool {
        self.shared.staging.lock().contains(id)
    }

    /// Capacity of the staging area.
    pub fn capacity(&self) -> usize {
        self.cfg.queue_capacity
    }

    /// Configuration the pool was built with.
    pub fn config(&self) -> &PoolConfig {
        &self.cfg
    }

    /// Stops accepting work, drains everything staged, then waits for the executor to
    /// finish all forwarded work.
    ///
    /// Must be called at most once; later calls return immediately.
    pub async fn stop_and_wait(&self) {
        let drain = self.drain.lock().take();
        let Some(drain) = drain else {
            return;
        };

        if self.shared.mark_stopped() {
            self.shared
                .bus
                .publish(Event::new(EventKind::ShutdownRequested));
        }
        self.token.cancel();
        if let Err(err) = drain.await {
            tracing::error!(error = %err, "drain loop failed");
        }

        self.executor.stop_and_wait().await;
        self.shared
            .bus
            .publish(Event::new(EventKind::ExecutorStopped).with_task(self.executor.name()));

        self.listener_token.cancel();
        let listener = self.listener.lock().take();
        if let Some(listener) = listener {
            let _ = listener.await;
        }
    }

    fn ensure_running(&self) {
        if self.stopped() {
            panic!("pool is stopped");
        }
    }
}

impl<K> Drop for UniqPool<K> {
    fn drop(&mut self) {
        if self.shared.mark_stopped() {
            self.shared
                .bus
                .publish(Event::new(EventKind::ShutdownRequested));
        }
        // Also reached when a `stop_and_wait` future was dropped mid-way.
        self.token.cancel();
        self.listener_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Subscribe;
    use async_trait::async_trait;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    fn cfg(capacity: usize, interval_ms: u64) -> PoolConfig {
        PoolConfig::new(capacity, 2, 10, Duration::from_millis(interval_ms))
    }

    fn counter(n: &Arc<AtomicUsize>) -> impl FnOnce() -> futures::future::Ready<()> + Send + 'static {
        let n = Arc::clone(n);
        move || {
            n.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(())
        }
    }

    #[tokio::test]
    async fn test_duplicates_run_once() {
        let pool = UniqPool::new(cfg(10, 100)).expect("pool");
        let processed = Arc::new(AtomicUsize::new(0));

        assert_eq!(pool.submit("task1", counter(&processed)).await, Admission::Staged);
        assert!(pool.try_submit("task2", counter(&processed)));
        assert!(
            pool.try_submit("task2", counter(&processed)),
            "duplicate must be reported as accepted"
        );
        assert_eq!(
            pool.submit("task1", counter(&processed)).await,
            Admission::Collapsed
        );
        assert_eq!(pool.pending_len(), 2);

        pool.stop_and_wait().await;

        assert_eq!(processed.load(Ordering::SeqCst), 2);
        assert_eq!(pool.pending_len(), 0);
        assert!(pool.stopped());
    }

    #[tokio::test]
    async fn test_submit_after_stop_panics() {
        let pool: UniqPool<&str> = UniqPool::new(cfg(10, 100)).expect("pool");
        pool.stop_and_wait().await;

        let res = std::panic::AssertUnwindSafe(pool.submit("task1", || async {}))
            .catch_unwind()
            .await;
        assert!(res.is_err(), "submit after stop must panic");

        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pool.try_submit("task1", || async {})
        }));
        assert!(res.is_err(), "try_submit after stop must panic");
        assert_eq!(pool.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_full_staging_rejects_then_submit_waits_for_tick() {
        let interval = Duration::from_millis(100);
        let started = Instant::now();
        let pool = UniqPool::new(PoolConfig::new(2, 2, 10, interval)).expect("pool");
        let processed = Arc::new(AtomicUsize::new(0));
        assert_eq!(pool.capacity(), 2);

        pool.submit("task1", counter(&processed)).await;
        pool.submit("task2", counter(&processed)).await;
        assert!(
            started.elapsed() < Duration::from_millis(50),
            "staging with free space must not wait"
        );

        assert_eq!(
            pool.try_admit("task3", counter(&processed)),
            Admission::Rejected
        );
        assert!(!pool.is_pending(&"task3"), "rejected id must not be marked");

        pool.submit("task4", counter(&processed)).await;
        assert!(
            started.elapsed() >= interval,
            "blocking submit returned after {:?}, before the first drain",
            started.elapsed()
        );

        pool.stop_and_wait().await;
        assert_eq!(processed.load(Ordering::SeqCst), 3);
        assert_eq!(pool.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_pending_duplicate_does_not_wait_when_full() {
        let pool = UniqPool::new(cfg(1, 10_000)).expect("pool");
        let processed = Arc::new(AtomicUsize::new(0));

        assert!(pool.try_submit("a", counter(&processed)));
        assert!(!pool.try_submit("b", counter(&processed)));

        let res = tokio::time::timeout(
            Duration::from_millis(50),
            pool.submit("a", counter(&processed)),
        )
        .await;
        assert_eq!(res.ok(), Some(Admission::Collapsed));

        pool.stop_and_wait().await;
        assert_eq!(processed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resubmission_after_drain_is_new_entry() {
        let pool = UniqPool::new(cfg(10, 20)).expect("pool");
        let processed = Arc::new(AtomicUsize::new(0));

        assert_eq!(pool.try_admit("a", counter(&processed)), Admission::Staged);

        let deadline = Instant::now() + Duration::from_secs(2);
        while pool.is_pending(&"a") {
            assert!(Instant::now() < deadline, "entry was never drained");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(pool.try_admit("a", counter(&processed)), Admission::Staged);
        pool.stop_and_wait().await;
        assert_eq!(processed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_drain_preserves_fifo_order() {
        let pool = UniqPool::new(PoolConfig::new(10, 1, 10, Duration::from_secs(10)))
            .expect("pool");
        let order = Arc::new(Mutex::new(Vec::new()));

        for id in ["c", "a", "e", "b", "d"] {
            let order = order.clone();
            pool.try_submit(id, move || async move {
                order.lock().push(id);
            });
        }

        pool.stop_and_wait().await;
        assert_eq!(*order.lock(), vec!["c", "a", "e", "b", "d"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submitters_keep_one_entry_per_id() {
        let pool = Arc::new(UniqPool::new(cfg(64, 10_000)).expect("pool"));
        let processed = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            let processed = processed.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..100u32 {
                    assert!(pool.try_submit(i % 5, counter(&processed)));
                }
            }));
        }
        for h in handles {
            h.await.expect("submitter");
        }

        assert_eq!(pool.pending_len(), 5);
        pool.stop_and_wait().await;
        assert_eq!(processed.load(Ordering::SeqCst), 5);
        assert_eq!(pool.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_stop_waits_for_forwarded_work() {
        let pool = UniqPool::new(cfg(4, 10_000)).expect("pool");
        let finished = Arc::new(AtomicUsize::new(0));

        let f = finished.clone();
        pool.try_submit("slow", move || async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            f.fetch_add(1, Ordering::SeqCst);
        });

        pool.stop_and_wait().await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);

        // Second call is a no-op.
        pool.stop_and_wait().await;
    }

    #[tokio::test]
    async fn test_waiting_submitter_panics_after_final_drain() {
        let pool = Arc::new(UniqPool::new(cfg(1, 10_000)).expect("pool"));
        let processed = Arc::new(AtomicUsize::new(0));
        assert!(pool.try_submit("a", counter(&processed)));

        let waiter = {
            let pool = pool.clone();
            let processed = processed.clone();
            tokio::spawn(async move { pool.submit("b", counter(&processed)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        pool.stop_and_wait().await;
        let res = waiter.await;

        // The waiter either got in before the seal (and ran) or observed the seal.
        match res {
            Ok(admission) => {
                assert_eq!(admission, Admission::Staged);
                assert_eq!(processed.load(Ordering::SeqCst), 2);
            }
            Err(err) => {
                assert!(err.is_panic());
                assert_eq!(processed.load(Ordering::SeqCst), 1);
            }
        }
        assert_eq!(pool.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_drop_runs_final_drain() {
        let processed = Arc::new(AtomicUsize::new(0));
        {
            let pool = UniqPool::new(cfg(4, 10_000)).expect("pool");
            assert!(pool.try_submit("a", counter(&processed)));
        }

        let deadline = Instant::now() + Duration::from_secs(2);
        while processed.load(Ordering::SeqCst) == 0 {
            assert!(Instant::now() < deadline, "dropped pool lost staged work");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let res = UniqPool::<u64>::new(PoolConfig::new(10, 2, 10, Duration::ZERO));
        assert_eq!(res.err(), Some(ConfigError::ZeroInterval));
    }

    struct Recorder {
        kinds: Arc<Mutex<Vec<EventKind>>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.kinds.lock().push(ev.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    #[tokio::test]
    async fn test_lifecycle_events_reach_subscribers() {
        let kinds = Arc::new(Mutex::new(Vec::new()));
        let pool = UniqPool::builder(cfg(1, 10_000))
            .with_subscribers(vec![Arc::new(Recorder {
                kinds: kinds.clone(),
            })])
            .build()
            .expect("pool");

        pool.try_submit("a", || async {});
        pool.try_submit("a", || async {});
        pool.try_submit("b", || async {});
        pool.stop_and_wait().await;

        let kinds = kinds.lock().clone();
        for expected in [
            EventKind::TaskStaged,
            EventKind::TaskCollapsed,
            EventKind::TaskRejected,
            EventKind::ShutdownRequested,
            EventKind::DrainCompleted,
            EventKind::PoolStopped,
            EventKind::ExecutorStopped,
        ] {
            assert!(kinds.contains(&expected), "missing {expected:?} in {kinds:?}");
        }
    }

    struct Recording {
        forwarded: Mutex<Vec<Option<String>>>,
        stopped: AtomicUsize,
    }

    #[async_trait]
    impl Execute for Recording {
        async fn submit(&self, work: Work) {
            self.forwarded.lock().push(work.label().map(str::to_owned));
            work.start().await;
        }

        async fn stop_and_wait(&self) {
            self.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_custom_executor_receives_labelled_work() {
        let exec = Arc::new(Recording {
            forwarded: Mutex::new(Vec::new()),
            stopped: AtomicUsize::new(0),
        });
        let pool = UniqPool::builder(cfg(4, 10_000))
            .with_executor(exec.clone())
            .build()
            .expect("pool");

        pool.try_submit(7u32, || async {});
        pool.try_submit(7u32, || async {});
        pool.try_submit(9u32, || async {});
        pool.try_admit_work(11u32, Work::new(|| async {}).with_label("refresh:11"));
        pool.stop_and_wait().await;

        assert_eq!(
            *exec.forwarded.lock(),
            vec![
                Some("7".to_owned()),
                Some("9".to_owned()),
                Some("refresh:11".to_owned())
            ]
        );
        assert_eq!(exec.stopped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_stop_still_releases_subscribers() {
        let sub = Arc::new(Recorder {
            kinds: Arc::new(Mutex::new(Vec::new())),
        });
        let subs: Vec<Arc<dyn Subscribe>> = vec![sub.clone()];
        let pool = UniqPool::builder(cfg(4, 10))
            .with_subscribers(subs)
            .build()
            .expect("pool");

        pool.try_submit("slow", || async {
            tokio::time::sleep(Duration::from_millis(300)).await;
        });
        let timed_out = tokio::time::timeout(Duration::from_millis(50), pool.stop_and_wait())
            .await
            .is_err();
        assert!(timed_out, "stop must still be waiting for the slow unit");

        drop(pool);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(
            Arc::strong_count(&sub),
            1,
            "listener and subscriber worker must exit after drop"
        );
    }

    struct Exploding;

    #[async_trait]
    impl Execute for Exploding {
        async fn submit(&self, work: Work) {
            panic!("executor refused {:?}", work.label());
        }

        async fn stop_and_wait(&self) {}
    }

    #[tokio::test]
    async fn test_panicking_executor_does_not_wedge_the_pool() {
        let kinds = Arc::new(Mutex::new(Vec::new()));
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Recorder {
            kinds: kinds.clone(),
        })];
        let pool = Arc::new(
            UniqPool::builder(cfg(1, 20))
                .with_executor(Arc::new(Exploding))
                .with_subscribers(subs)
                .build()
                .expect("pool"),
        );

        assert!(pool.try_submit("a", || async {}));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(pool.pending_len(), 0, "failed hand-off must release the id");
        assert!(!pool.stopped());

        assert!(pool.try_submit("b", || async {}));
        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.submit("c", || async {}).await })
        };
        tokio::task::yield_now().await;

        pool.stop_and_wait().await;
        assert_eq!(pool.pending_len(), 0);

        let finished = tokio::time::timeout(Duration::from_secs(1), waiter).await;
        assert!(finished.is_ok(), "blocked submitter must not hang");
        assert!(kinds.lock().contains(&EventKind::WorkPanicked));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submitters_race_the_drain_loop() {
        let pool = Arc::new(
            UniqPool::new(PoolConfig::new(64, 4, 64, Duration::from_millis(1))).expect("pool"),
        );
        let processed = Arc::new(AtomicUsize::new(0));
        let staged = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            let processed = processed.clone();
            let staged = staged.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..200u32 {
                    match pool.try_admit(i % 4, counter(&processed)) {
                        Admission::Staged => {
                            staged.fetch_add(1, Ordering::SeqCst);
                        }
                        Admission::Collapsed => {}
                        Admission::Rejected => panic!("capacity exceeds the id count"),
                    }
                    if i % 10 == 0 {
                        tokio::time::sleep(Duration::from_millis(1)).await;
                    } else {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }
        for h in handles {
            h.await.expect("submitter");
        }

        pool.stop_and_wait().await;
        let staged = staged.load(Ordering::SeqCst);
        assert!(staged > 4, "drains must interleave with submissions, staged {staged}");
        assert_eq!(processed.load(Ordering::SeqCst), staged);
        assert_eq!(pool.pending_len(), 0);
    }
}
