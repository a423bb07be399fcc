//! Test doubles and common utilities for contract tests
//!
//! This module provides small producers whose emissions are driven by the
//! test, plus counters for verifying how the decoration layer uses them.

#![allow(dead_code)]

use dualcall_core::error::{Error, Result};
use dualcall_core::pagination::{Page, PaginationOptions};
use dualcall_core::traits::{Operation, UpdateStream};
use futures::StreamExt;
use futures::stream;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// A watchable operation whose updates are pushed by the test
///
/// `fetch` returns the current value. Every `watch` starts with the current
/// value and then forwards whatever the test emits.
#[derive(Clone)]
pub struct ControlledOperation {
    current: Arc<AtomicU64>,
    watchers: Arc<Mutex<Vec<mpsc::UnboundedSender<Result<u64>>>>>,
    fetch_call_count: Arc<AtomicUsize>,
    watch_call_count: Arc<AtomicUsize>,
    live_watches: Arc<AtomicUsize>,
}

impl ControlledOperation {
    pub fn new(current: u64) -> Self {
        Self {
            current: Arc::new(AtomicU64::new(current)),
            watchers: Arc::new(Mutex::new(Vec::new())),
            fetch_call_count: Arc::new(AtomicUsize::new(0)),
            watch_call_count: Arc::new(AtomicUsize::new(0)),
            live_watches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Publish a new value to every open watch
    pub fn emit(&self, value: u64) {
        self.current.store(value, Ordering::SeqCst);
        self.send(Ok(value));
    }

    /// Fail every open watch
    pub fn fail(&self, msg: &str) {
        self.send(Err(Error::producer(anyhow::anyhow!(msg.to_string()))));
    }

    /// End every open watch
    pub fn end(&self) {
        self.watchers.lock().unwrap().clear();
    }

    /// Get the number of times fetch() was called
    pub fn fetch_call_count(&self) -> usize {
        self.fetch_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times watch() was called
    pub fn watch_call_count(&self) -> usize {
        self.watch_call_count.load(Ordering::SeqCst)
    }

    /// Number of watch streams that have not been dropped yet
    pub fn live_watches(&self) -> usize {
        self.live_watches.load(Ordering::SeqCst)
    }

    fn send(&self, item: Result<u64>) {
        let mut watchers = self.watchers.lock().unwrap();
        watchers.retain(|tx| tx.send(clone_result(&item)).is_ok());
    }
}

fn clone_result(item: &Result<u64>) -> Result<u64> {
    match item {
        Ok(value) => Ok(*value),
        Err(err) => Err(Error::producer(anyhow::anyhow!(err.to_string()))),
    }
}

/// Decrements the live watch counter when the watch stream is dropped
struct WatchGuard(Arc<AtomicUsize>);

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Operation for ControlledOperation {
    type Args = (String,);
    type Output = u64;

    async fn fetch(&self, _args: (String,)) -> Result<u64> {
        self.fetch_call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.current.load(Ordering::SeqCst))
    }

    fn supports_watch(&self) -> bool {
        true
    }

    fn watch(&self, _args: (String,)) -> UpdateStream<u64> {
        self.watch_call_count.fetch_add(1, Ordering::SeqCst);
        self.live_watches.fetch_add(1, Ordering::SeqCst);
        let guard = WatchGuard(Arc::clone(&self.live_watches));

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(Ok(self.current.load(Ordering::SeqCst)));
        self.watchers.lock().unwrap().push(tx);

        UnboundedReceiverStream::new(rx)
            .map(move |item| {
                let _keep = &guard;
                item
            })
            .boxed()
    }

    fn name(&self) -> &str {
        "test.controlled"
    }
}

/// An operation with no change feed
#[derive(Clone)]
pub struct FetchOnlyOperation {
    value: u64,
    fetch_call_count: Arc<AtomicUsize>,
}

impl FetchOnlyOperation {
    pub fn new(value: u64) -> Self {
        Self {
            value,
            fetch_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times fetch() was called
    pub fn fetch_call_count(&self) -> usize {
        self.fetch_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Operation for FetchOnlyOperation {
    type Args = (String,);
    type Output = u64;

    async fn fetch(&self, _args: (String,)) -> Result<u64> {
        self.fetch_call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.value)
    }

    fn name(&self) -> &str {
        "test.fetchOnly"
    }
}

/// A paged operation that records the options it was called with
#[derive(Clone, Default)]
pub struct RecordingPagedOperation {
    seen: Arc<Mutex<Vec<PaginationOptions<String>>>>,
}

impl RecordingPagedOperation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options received so far, in call order
    pub fn seen(&self) -> Vec<PaginationOptions<String>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Operation for RecordingPagedOperation {
    type Args = (PaginationOptions<String>,);
    type Output = Page<u64>;

    async fn fetch(&self, (options,): (PaginationOptions<String>,)) -> Result<Page<u64>> {
        options.validate()?;
        self.seen.lock().unwrap().push(options);
        Ok(Page::empty())
    }

    fn name(&self) -> &str {
        "test.paged"
    }
}

/// An update source that emits the given values and then ends
pub fn finite_updates(values: Vec<u64>) -> UpdateStream<u64> {
    stream::iter(values.into_iter().map(Ok)).boxed()
}

/// Callback sink recording every delivered value
#[derive(Clone, Default)]
pub struct Received(Arc<Mutex<Vec<u64>>>);

impl Received {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that pushes into this sink
    pub fn callback(&self) -> impl FnMut(u64) + Send + 'static {
        let sink = Arc::clone(&self.0);
        move |value: u64| sink.lock().unwrap().push(value)
    }

    pub fn values(&self) -> Vec<u64> {
        self.0.lock().unwrap().clone()
    }

    /// Wait until at least `count` values have been delivered
    pub async fn wait_for(&self, count: usize) {
        let waiting = async {
            while self.0.lock().unwrap().len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), waiting)
            .await
            .expect("callback deliveries within 5 seconds");
    }
}

/// Let spawned delivery tasks run
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

/// A callback that fails the test if it is ever invoked
pub fn never_called() -> impl FnMut(u64) + Send + 'static {
    |value: u64| panic!("callback must not run, got {}", value)
}
