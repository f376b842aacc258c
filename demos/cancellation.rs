//! Cancellation and deadlines: how a `Context` reaches every derived child.
//!
//! Run with: cargo run --example cancellation

use std::time::Duration;

use flow_rail::connectors::{Scaffold, Timeout};
use flow_rail::processor::Apply;
use flow_rail::{Chainable, Context};

#[derive(Debug, thiserror::Error)]
#[error("slow")]
struct Slow;

// =============================================================================
// Step 1: Timeout bounds a slow child and cancels its derived context
// =============================================================================

async fn step1_timeout() {
    println!("=== Step 1: Timeout ===\n");

    let bounded = Timeout::new(
        "bounded-fetch",
        Duration::from_millis(50),
        Apply::new("slow-backend", |ctx: &Context, n: i32| async move {
            tokio::select! {
                () = ctx.token().cancelled() => {}
                () = tokio::time::sleep(Duration::from_secs(5)) => {}
            }
            Ok::<_, Slow>(n)
        }),
    );

    match bounded.process(&Context::background(), 1).await {
        Ok(value) => println!("unexpectedly completed: {value}"),
        Err(err) => println!("timed out as expected: is_timeout={}, is_canceled={}\n", err.is_timeout(), err.is_canceled()),
    }
}

// =============================================================================
// Step 2: Canceling a parent reaches every child context, but not the reverse
// =============================================================================

async fn step2_parent_child_propagation() {
    println!("=== Step 2: Parent/child propagation ===\n");

    let parent = Context::background();
    let child = parent.child();
    let grandchild = child.child();

    parent.cancel();
    println!("parent canceled -> child canceled: {}", child.is_canceled());
    println!("parent canceled -> grandchild canceled: {}\n", grandchild.is_canceled());

    let parent2 = Context::background();
    let child2 = parent2.child();
    child2.cancel();
    println!("child canceled -> parent canceled: {}\n", parent2.is_canceled());
}

// =============================================================================
// Step 3: Scaffold detaches from the caller's deadline but not its cancellation lineage
// =============================================================================

async fn step3_scaffold_detached_deadline() {
    println!("=== Step 3: Scaffold detaches the deadline ===\n");

    let root = Context::background();
    let scaffold = Scaffold::new("background-audit").with(Apply::new("write-log", |_: &Context, n: i32| async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok::<_, Slow>(n)
    }));

    let start = std::time::Instant::now();
    scaffold.process(&root, 1).await.unwrap();
    println!("scaffold returned immediately after {:?} (child keeps running in the background)\n", start.elapsed());

    // Give the detached child a moment to finish before the process exits.
    tokio::time::sleep(Duration::from_millis(250)).await;
}

#[tokio::main]
async fn main() {
    step1_timeout().await;
    step2_parent_child_propagation().await;
    step3_scaffold_detached_deadline().await;

    println!("All steps completed.");
}
