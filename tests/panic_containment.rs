//! A panicking child never crashes the process, whether trapped at a leaf adapter's boundary
//! or at a composite connector's spawned-task boundary.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use flow_rail::connectors::{Concurrent, Race, Retry, Sequence};
use flow_rail::processor::{Apply, Transform};
use flow_rail::{Cause, Chainable, Context};

#[derive(Debug, thiserror::Error)]
#[error("fail")]
struct Fail;

#[tokio::test]
async fn panic_inside_race_child_task_is_reported_not_propagated() {
    let race = Race::new("race")
        .or(Apply::new("panics", |_: &Context, _: i32| async move { panic!("race child exploded") }))
        .or(Apply::new("fails", |_: &Context, _: i32| async move { Err::<i32, _>(Fail) }));

    let err = race.process(&Context::background(), 1).await.unwrap_err();
    assert!(matches!(err.cause(), Cause::Aggregate(members) if members.len() == 2));
}

#[tokio::test]
async fn panic_inside_concurrent_child_task_aggregates_alongside_normal_failures() {
    let count = Arc::new(AtomicU32::new(0));
    let count2 = Arc::clone(&count);

    let gather = Concurrent::new("fan-out")
        .with(Apply::new("ok", move |_: &Context, n: i32| {
            let count2 = Arc::clone(&count2);
            async move {
                count2.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Fail>(n)
            }
        }))
        .with(Apply::new("panics", |_: &Context, _: i32| async move { panic!("concurrent child exploded") }));

    let err = gather.process(&Context::background(), 1).await.unwrap_err();
    assert_eq!(count.load(Ordering::SeqCst), 1, "sibling still ran to completion");
    assert!(matches!(err.cause(), Cause::Aggregate(members) if members.len() == 1));
}

#[tokio::test]
async fn panicking_leaf_nested_inside_sequence_and_retry_is_trapped() {
    let retry_calls = Arc::new(AtomicU32::new(0));
    let retry_calls2 = Arc::clone(&retry_calls);

    let seq = Sequence::new("seq").then(Retry::new(
        "retry",
        Apply::new("flaky-panic", move |_: &Context, _: i32| {
            let retry_calls2 = Arc::clone(&retry_calls2);
            async move {
                retry_calls2.fetch_add(1, Ordering::SeqCst);
                panic!("leaf panicked mid-retry")
            }
        }),
        3,
    ));

    let err = seq.process(&Context::background(), 1).await.unwrap_err();
    assert_eq!(retry_calls.load(Ordering::SeqCst), 3, "retry exhausts all attempts even though each one panics");
    assert!(matches!(err.cause(), Cause::Panic(msg) if msg.contains("leaf panicked mid-retry")));
}

#[tokio::test]
async fn transform_panic_does_not_abort_the_runtime_and_process_keeps_responding() {
    let boom = Transform::new("boom", |_: &Context, _: i32| async move { panic!("transform boom") });
    for _ in 0..5 {
        let err = boom.process(&Context::background(), 1).await.unwrap_err();
        assert!(matches!(err.cause(), Cause::Panic(_)));
    }
}
