//! Contract Test: One-Shot Mode
//!
//! This test verifies how methods behave when decorated by a one-shot API.
//!
//! Constraints verified:
//! - A plain call resolves exactly one value through `fetch`
//! - A trailing callback is never invoked
//! - The handle returned for a callback call is already closed
//! - Operations without a change feed work without any override
//!
//! If this test fails, someone has made one-shot calls:
//! - Open watch streams
//! - Deliver values to callbacks
//! - Depend on subscription-only configuration

mod common;

use common::*;
use dualcall_core::{
    Api, ApiConfig, ApiMode, DecorateOptions, Error, MethodResult, Termination, from_future_fn,
};
use futures::FutureExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[tokio::test]
async fn call_resolves_single_value() {
    let operation = ControlledOperation::new(7);
    let api = Api::one_shot();
    let method = api.decorate(operation.clone(), DecorateOptions::new());

    let result = method.call(("balance:alice".to_string(),));
    assert!(matches!(result, MethodResult::Value(_)));
    assert_eq!(result.mode(), ApiMode::OneShot);

    assert_eq!(result.value().await.unwrap(), 7);
    assert_eq!(operation.fetch_call_count(), 1);
    assert_eq!(
        operation.watch_call_count(),
        0,
        "one-shot calls must never open a watch"
    );
}

#[tokio::test]
async fn call_is_lazy_until_awaited() {
    let operation = ControlledOperation::new(1);
    let method = Api::one_shot().decorate(operation.clone(), DecorateOptions::new());

    let pending = method.call(("k".to_string(),));
    assert_eq!(operation.fetch_call_count(), 0);

    drop(pending);
    assert_eq!(operation.fetch_call_count(), 0);
}

#[tokio::test]
async fn callback_is_never_invoked() {
    let operation = ControlledOperation::new(42);
    let method = Api::one_shot().decorate(operation.clone(), DecorateOptions::new());
    let received = Received::new();

    let handle = method
        .subscribe(("balance:alice".to_string(), received.callback()))
        .await
        .expect("one-shot callback call succeeds");

    operation.emit(43);
    settle().await;

    assert!(
        received.values().is_empty(),
        "callback must not run in one-shot mode, got {:?}",
        received.values()
    );
    assert_eq!(operation.fetch_call_count(), 1);
    assert_eq!(operation.watch_call_count(), 0);

    assert!(handle.is_closed());
    assert!(matches!(handle.closed().await, Termination::Completed));

    // Cancelling a finished call is harmless
    handle.unsubscribe();
    handle.unsubscribe();
    assert!(handle.is_unsubscribed());
}

#[tokio::test]
async fn fetch_only_operation_needs_no_override() {
    let operation = FetchOnlyOperation::new(5);
    let method = Api::one_shot().decorate(operation.clone(), DecorateOptions::new());

    assert_eq!(method.call(("k".to_string(),)).value().await.unwrap(), 5);

    let received = Received::new();
    method
        .subscribe(("k".to_string(), received.callback()))
        .await
        .expect("fetch-only operation is fine in one-shot mode");

    assert_eq!(operation.fetch_call_count(), 2);
    assert!(received.values().is_empty());
}

#[tokio::test]
async fn producer_failure_fails_the_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let operation = from_future_fn("rpc.failing", move |(): ()| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Err::<u64, _>(Error::producer(anyhow::anyhow!("node unreachable"))) }.boxed()
    });
    let method = Api::one_shot().decorate(operation, DecorateOptions::new());

    let err = method.call(()).value().await.unwrap_err();
    assert!(err.is_producer());
    assert_eq!(err.to_string(), "node unreachable");

    let err = method
        .subscribe((never_called(),))
        .await
        .unwrap_err();
    assert!(err.is_producer());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn mode_is_fixed_per_instance() {
    let api = Api::new(ApiConfig::new(ApiMode::OneShot).with_default_page_size(25))
        .expect("valid config");
    let live = api.with_mode(ApiMode::Subscription);

    let operation = ControlledOperation::new(3);
    let once = api.decorate(operation.clone(), DecorateOptions::new());
    let stream = live.decorate(operation.clone(), DecorateOptions::new());

    assert_eq!(once.mode(), ApiMode::OneShot);
    assert_eq!(stream.mode(), ApiMode::Subscription);
    assert_eq!(live.config().default_page_size, 25);
    assert_eq!(api.mode(), ApiMode::OneShot, "deriving must not change the source");
}
