//! Quick Start: the core connectors in one runnable walkthrough.
//!
//! Run with: cargo run --example quick_start

use std::sync::Arc;

use flow_rail::connectors::{Concurrent, Fallback, Retry, Sequence, Switch};
use flow_rail::processor::{Apply, Transform};
use flow_rail::{Chainable, Context, Name};

#[derive(Debug, thiserror::Error)]
#[error("upstream unavailable")]
struct UpstreamDown;

// =============================================================================
// Step 1: A Sequence of pure transforms
// =============================================================================

async fn step1_sequence() {
    println!("=== Step 1: Sequence ===\n");

    let pipeline = Sequence::new("normalize")
        .then(Transform::new("trim", |_: &Context, s: String| async move { s.trim().to_string() }))
        .then(Transform::new("lowercase", |_: &Context, s: String| async move { s.to_lowercase() }));

    let out = pipeline.process(&Context::background(), "  Hello World  ".to_string()).await.unwrap();
    println!("normalized: {out:?}\n");
}

// =============================================================================
// Step 2: Fallback to a backup on failure
// =============================================================================

async fn step2_fallback() {
    println!("=== Step 2: Fallback ===\n");

    let fetch = Fallback::new("fetch-price")
        .or_else(Apply::new("primary", |_: &Context, _: i32| async move { Err::<i32, _>(UpstreamDown) }))
        .or_else(Transform::new("cache", |_: &Context, n: i32| async move { n }));

    let price = fetch.process(&Context::background(), 42).await.unwrap();
    println!("price (from cache after primary failed): {price}\n");
}

// =============================================================================
// Step 3: Retry a flaky step
// =============================================================================

async fn step3_retry() {
    println!("=== Step 3: Retry ===\n");

    let calls = Arc::new(std::sync::atomic::AtomicU32::new(0));
    let calls2 = Arc::clone(&calls);
    let retry = Retry::new(
        "retry-flaky",
        Apply::new("flaky", move |_: &Context, n: i32| {
            let calls2 = Arc::clone(&calls2);
            async move {
                let attempt = calls2.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
                if attempt < 3 { Err(UpstreamDown) } else { Ok(n) }
            }
        }),
        5,
    );

    let result = retry.process(&Context::background(), 7).await.unwrap();
    println!("retry succeeded on attempt {}: {result}\n", calls.load(std::sync::atomic::Ordering::SeqCst));
}

// =============================================================================
// Step 4: Concurrent fan-out with a reducer
// =============================================================================

async fn step4_concurrent() {
    println!("=== Step 4: Concurrent ===\n");

    let sum = Concurrent::new("fan-out-sum")
        .with(Transform::new("a", |_: &Context, n: i32| async move { n }))
        .with(Transform::new("b", |_: &Context, n: i32| async move { n * 2 }))
        .with(Transform::new("c", |_: &Context, n: i32| async move { n * 3 }))
        .reduce(Arc::new(|outputs: Vec<i32>| outputs.into_iter().sum()));

    let total = sum.process(&Context::background(), 10).await.unwrap();
    println!("fan-out sum: {total}\n");
}

// =============================================================================
// Step 5: Switch routes by a derived key
// =============================================================================

async fn step5_switch() {
    println!("=== Step 5: Switch ===\n");

    let switch = Switch::new("parity", Arc::new(|_: &Context, n: &i32| {
        Name::new(if n % 2 == 0 { "even" } else { "odd" })
    }))
    .with_route("even", Transform::new("double", |_: &Context, n: i32| async move { n * 2 }))
    .with_route("odd", Transform::new("negate", |_: &Context, n: i32| async move { -n }));

    let even = switch.process(&Context::background(), 10).await.unwrap();
    let odd = switch.process(&Context::background(), 7).await.unwrap();
    println!("switch(10) = {even}, switch(7) = {odd}\n");
}

#[tokio::main]
async fn main() {
    step1_sequence().await;
    step2_fallback().await;
    step3_retry().await;
    step4_concurrent().await;
    step5_switch().await;

    println!("All steps completed.");
}
