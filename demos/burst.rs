//! # Burst Example
//!
//! Shows how a burst of duplicate submissions collapses into one execution per id,
//! and how the blocking `submit` applies backpressure when the staging area is full.
//!
//! ## Run
//! ```bash
//! RUST_LOG=uniqpool=debug cargo run --example burst --features "logging"
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tracing_subscriber::EnvFilter;
use uniqpool::{Admission, LogWriter, PoolConfig, Subscribe, UniqPool};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("uniqpool=info")),
        )
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let pool = UniqPool::builder(PoolConfig::new(4, 2, 16, Duration::from_millis(200)))
        .with_subscribers(subs)
        .build()?;

    let runs = Arc::new(AtomicUsize::new(0));

    // ============================================================
    // Demo -> Collapse: 30 submissions, 3 distinct ids
    // ============================================================
    println!("Demo 1: Collapse");
    println!(" └► Submit 30 refreshes for 3 users: 3 executions");

    let mut collapsed = 0;
    for i in 0..30 {
        let user = format!("user:{}", i % 3);
        let runs = runs.clone();
        let name = user.clone();
        let outcome = pool.try_admit(user, move || async move {
            println!("{:>6}[{name}] refreshed", "");
            runs.fetch_add(1, Ordering::SeqCst);
        });
        if outcome == Admission::Collapsed {
            collapsed += 1;
        }
    }
    println!(" └► collapsed={collapsed} pending={}", pool.pending_len());

    tokio::time::sleep(Duration::from_millis(300)).await;
    println!();

    // ============================================================
    // Demo -> Backpressure: 6 distinct ids into a staging area of 4
    // ============================================================
    println!("Demo 2: Backpressure");
    println!(" └► Fill the staging area; the 5th submit waits for the next drain");

    let started = Instant::now();
    for i in 0..6 {
        let runs = runs.clone();
        pool.submit(format!("report:{i}"), move || async move {
            runs.fetch_add(1, Ordering::SeqCst);
        })
        .await;
        println!("{:>6}report:{i} staged after {:?}", "", started.elapsed());
    }

    pool.stop_and_wait().await;
    println!();
    println!("Total executions: {}", runs.load(Ordering::SeqCst));
    Ok(())
}
