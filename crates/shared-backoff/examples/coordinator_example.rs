//! Example: many workers sharing one backoff coordinator
//!
//! This example demonstrates:
//! 1. A burst of concurrent failures opening a single backoff window
//! 2. Exactly one worker growing the window once it elapses
//! 3. Ignoring errors that say nothing about the resource's health
//!
//! Run with:
//! ```bash
//! RUST_LOG=shared_backoff=debug cargo run -p shared-backoff --example coordinator_example
//! ```

use shared_backoff::prelude::*;
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// A simulated upstream that fails its first few calls
struct FlakyUpstream {
    calls: AtomicU32,
    fail_count: u32,
}

impl FlakyUpstream {
    fn new(fail_count: u32) -> Self {
        Self {
            calls: AtomicU32::new(0),
            fail_count,
        }
    }

    async fn fetch(&self, worker: usize) -> Result<String, std::io::Error> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;

        if call < self.fail_count {
            println!("  worker {worker:>2}: call {} FAILED", call + 1);
            Err(std::io::Error::other("upstream unavailable"))
        } else {
            println!("  worker {worker:>2}: call {} ok", call + 1);
            Ok(format!("payload for worker {worker}"))
        }
    }

    fn total_calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Example 1: concurrent workers against a failing upstream
async fn example_shared_window() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 1: Concurrent Failures, One Window ===\n");

    let coordinator = Arc::new(BackoffCoordinator::new(
        BackoffIntervals::builder()
            .start_interval(Duration::from_millis(50))
            .multiplier(2.0)
            .max_interval(Duration::from_millis(400))
            .build()?,
    ));
    let upstream = Arc::new(FlakyUpstream::new(12));
    println!("Intervals: {:?}\n", coordinator.intervals());
    let start = Instant::now();

    for round in 1..=6 {
        let mut workers = Vec::new();
        for worker in 0..8 {
            let coordinator = Arc::clone(&coordinator);
            let upstream = Arc::clone(&upstream);
            workers.push(tokio::spawn(async move {
                coordinator
                    .execute(|| upstream.fetch(worker))
                    .await
                    .is_ok()
            }));
        }

        let mut succeeded = 0;
        for worker in workers {
            if worker.await? {
                succeeded += 1;
            }
        }

        let snapshot = coordinator.snapshot();
        println!(
            "round {round}: {succeeded} succeeded, increments={}, remaining={:?}",
            snapshot.increments, snapshot.remaining
        );

        tokio::time::sleep(Duration::from_millis(120)).await;
    }

    println!("\nTotal upstream calls: {}", upstream.total_calls());
    println!("Total time: {:?}", start.elapsed());
    println!("Without coordination every worker would call every round (48 calls).");

    Ok(())
}

/// Example 2: only some errors count as failures
fn example_failure_filter() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 2: Filtering Failures ===\n");

    let coordinator = BackoffCoordinator::new(BackoffIntervals::default());

    let result = coordinator.call_if(
        || {
            Err::<(), _>(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "malformed request",
            ))
        },
        |err: &std::io::Error| err.kind() != std::io::ErrorKind::InvalidInput,
    );
    println!("Invalid input: {result:?}");
    println!("  backing off: {}", coordinator.is_backing_off());

    let result = coordinator.call_if(
        || Err::<(), _>(std::io::Error::other("connection reset")),
        |err: &std::io::Error| err.kind() != std::io::ErrorKind::InvalidInput,
    );
    println!("Connection reset: {result:?}");
    println!("  backing off: {}", coordinator.is_backing_off());

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("==============================================");
    println!("   shared-backoff: Coordinator Examples");
    println!("==============================================");

    example_shared_window().await?;
    example_failure_filter()?;

    println!("\n==============================================");
    println!("   All examples completed successfully!");
    println!("==============================================\n");

    Ok(())
}
