// # Memory Store
//
// In-memory, reactive key/value store.
//
// ## Purpose
//
// Provides a complete producer for the decoration layer without a remote
// node: current values, a change feed per key, historic reads by revision
// and paged range scans.
//
// ## Revisions
//
// - Every write (set or remove) bumps a store-wide revision counter
// - Each key keeps its last `history_limit` writes for historic reads
// - A removal is recorded as a write of "no value"
//
// ## Change Feed
//
// All watchers share one bounded broadcast channel. A watcher that lags
// behind by more than `change_channel_capacity` writes skips the missed
// changes and receives the key's latest value instead.

use std::collections::{BTreeMap, VecDeque};
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::pagination::{Page, PaginationOptions};
use crate::traits::{Operation, RangeScan, UpdateStream};
use crate::tuple::Prepended;

/// One recorded write of a key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredValue<V> {
    /// Value after the write, `None` for a removal
    pub value: Option<V>,
    /// Store revision of the write
    pub revision: u64,
    /// Wall-clock time of the write
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Change<V> {
    key: String,
    value: Option<V>,
    revision: u64,
}

#[derive(Debug)]
struct History<V> {
    writes: VecDeque<StoredValue<V>>,
    pruned: bool,
}

impl<V> History<V> {
    fn latest(&self) -> Option<&V> {
        self.writes.back().and_then(|write| write.value.as_ref())
    }

    fn latest_revision(&self) -> u64 {
        self.writes.back().map_or(0, |write| write.revision)
    }
}

#[derive(Debug)]
struct State<V> {
    revision: u64,
    entries: BTreeMap<String, History<V>>,
}

#[derive(Debug)]
struct Inner<V> {
    config: StoreConfig,
    state: RwLock<State<V>>,
    changes: broadcast::Sender<Change<V>>,
}

/// In-memory reactive key/value store
///
/// Cloning is cheap and every clone shares the same data.
///
/// # Example
///
/// ```rust,no_run
/// use dualcall_core::store::MemoryStore;
///
/// #[tokio::main]
/// async fn main() {
///     let store: MemoryStore<u64> = MemoryStore::new();
///
///     store.set("balance:alice", 100).await;
///     assert_eq!(store.get("balance:alice").await, Some(100));
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStore<V> {
    inner: Arc<Inner<V>>,
}

impl<V> MemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create an empty store with default settings
    pub fn new() -> Self {
        Self::build(StoreConfig::default())
    }

    /// Create an empty store with the given settings
    pub fn with_config(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: StoreConfig) -> Self {
        let (changes, _) = broadcast::channel(config.change_channel_capacity);
        Self {
            inner: Arc::new(Inner {
                config,
                state: RwLock::new(State {
                    revision: 0,
                    entries: BTreeMap::new(),
                }),
                changes,
            }),
        }
    }

    /// Write a value, returning the new store revision
    pub async fn set(&self, key: impl Into<String>, value: V) -> u64 {
        self.record(key.into(), Some(value)).await
    }

    /// Remove a key, returning the new store revision if the key held a value
    pub async fn remove(&self, key: &str) -> Option<u64> {
        if self.get(key).await.is_none() {
            return None;
        }
        Some(self.record(key.to_string(), None).await)
    }

    /// Current value of a key
    pub async fn get(&self, key: &str) -> Option<V> {
        let state = self.inner.state.read().await;
        state.entries.get(key).and_then(History::latest).cloned()
    }

    /// Value of a key as of a store revision
    ///
    /// # Returns
    ///
    /// - `Ok(Some(V))` / `Ok(None)`: the key's value at that revision
    /// - `Err(Error::InvalidArgument)`: the revision is in the future, or the
    ///   key's history no longer reaches back that far
    pub async fn get_at(&self, key: &str, revision: u64) -> Result<Option<V>> {
        let state = self.inner.state.read().await;

        if revision > state.revision {
            return Err(Error::invalid_argument(format!(
                "revision {} is ahead of the store (at {})",
                revision, state.revision
            )));
        }

        let Some(history) = state.entries.get(key) else {
            return Ok(None);
        };

        match history.writes.iter().rev().find(|write| write.revision <= revision) {
            Some(write) => Ok(write.value.clone()),
            None if history.pruned => Err(Error::invalid_argument(format!(
                "history of {} no longer reaches revision {}",
                key, revision
            ))),
            None => Ok(None),
        }
    }

    /// Full write history kept for a key, oldest first
    pub async fn history(&self, key: &str) -> Vec<StoredValue<V>> {
        let state = self.inner.state.read().await;
        state
            .entries
            .get(key)
            .map(|history| history.writes.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Current store revision
    pub async fn revision(&self) -> u64 {
        self.inner.state.read().await.revision
    }

    /// Number of keys currently holding a value
    pub async fn len(&self) -> usize {
        let state = self.inner.state.read().await;
        state
            .entries
            .values()
            .filter(|history| history.latest().is_some())
            .count()
    }

    /// Whether no key currently holds a value
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Stream the key's current value followed by every later write to it
    pub fn watch_key(&self, key: impl Into<String>) -> UpdateStream<Option<V>> {
        let key = key.into();
        let inner = Arc::clone(&self.inner);

        stream::once(async move {
            // Subscribing under the read lock means no write can land between
            // the snapshot and the first item of the feed.
            let state = inner.state.read().await;
            let changes = BroadcastStream::new(inner.changes.subscribe());
            let history = state.entries.get(&key);
            let current = history.and_then(History::latest).cloned();
            let delivered = history.map(History::latest_revision).unwrap_or(0);
            let watermark = state.revision;
            drop(state);

            debug!(key = %key, revision = watermark, "Watching key");
            let feed = KeyFeed {
                inner,
                key,
                changes,
                watermark,
                delivered,
            };
            stream::once(async move { Ok::<_, Error>(current) }).chain(feed.into_stream())
        })
        .flatten()
        .boxed()
    }

    /// Operation reading (and watching) one key
    pub fn value_of(&self) -> ValueOf<V> {
        ValueOf {
            store: self.clone(),
        }
    }

    /// Operation reading one key at a past revision
    pub fn value_at(&self) -> ValueAt<V> {
        ValueAt {
            store: self.clone(),
        }
    }

    /// Operation serving one page of a prefix scan
    pub fn entries_paged(&self) -> EntriesPaged<V> {
        EntriesPaged {
            store: self.clone(),
        }
    }

    async fn record(&self, key: String, value: Option<V>) -> u64 {
        let mut state = self.inner.state.write().await;
        state.revision += 1;
        let revision = state.revision;
        let limit = self.inner.config.history_limit;

        let history = state.entries.entry(key.clone()).or_insert_with(|| History {
            writes: VecDeque::new(),
            pruned: false,
        });
        history.writes.push_back(StoredValue {
            value: value.clone(),
            revision,
            updated_at: Utc::now(),
        });
        while history.writes.len() > limit {
            history.writes.pop_front();
            history.pruned = true;
        }

        // Sent while still holding the write lock so watchers observe
        // changes in revision order. An error only means nobody is watching.
        let _ = self.inner.changes.send(Change {
            key,
            value,
            revision,
        });
        revision
    }
}

/// Change feed of one watched key
///
/// `watermark` is the newest store revision already accounted for; buffered
/// changes at or below it are stale and dropped. `delivered` is the revision
/// of the key's last write handed to the watcher.
struct KeyFeed<V> {
    inner: Arc<Inner<V>>,
    key: String,
    changes: BroadcastStream<Change<V>>,
    watermark: u64,
    delivered: u64,
}

impl<V> KeyFeed<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn into_stream(self) -> impl Stream<Item = Result<Option<V>>> + Send + 'static {
        stream::unfold(self, |mut feed| async move {
            let value = feed.next_value().await?;
            Some((Ok(value), feed))
        })
    }

    async fn next_value(&mut self) -> Option<Option<V>> {
        while let Some(change) = self.changes.next().await {
            match change {
                Ok(change) if change.revision <= self.watermark => {}
                Ok(change) => {
                    self.watermark = change.revision;
                    if change.key == self.key {
                        self.delivered = change.revision;
                        return Some(change.value);
                    }
                }
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(key = %self.key, skipped, "Watcher lagged, resuming from latest value");
                    let state = self.inner.state.read().await;
                    self.watermark = state.revision;

                    let Some(history) = state.entries.get(&self.key) else {
                        continue;
                    };
                    if history.latest_revision() > self.delivered {
                        self.delivered = history.latest_revision();
                        return Some(history.latest().cloned());
                    }
                }
            }
        }
        None
    }
}

impl<V> Default for MemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<V> RangeScan for MemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Key prefix
    type Arg = String;
    type Value = V;

    async fn scan_page(&self, options: &PaginationOptions<String>) -> Result<Page<V>> {
        options.validate()?;

        let prefix = options.arg.as_deref().unwrap_or("");
        let lower = match options.start_key.as_deref() {
            Some(cursor) if cursor >= prefix => Bound::Excluded(cursor.to_string()),
            _ => Bound::Included(prefix.to_string()),
        };

        let state = self.inner.state.read().await;
        let mut live = state
            .entries
            .range::<String, _>((lower, Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .filter_map(|(key, history)| {
                history.latest().map(|value| (key.clone(), value.clone()))
            });

        let entries: Vec<(String, V)> = live.by_ref().take(options.limit()).collect();
        let next_start_key = match live.next() {
            Some(_) => entries.last().map(|(key, _)| key.clone()),
            None => None,
        };

        Ok(Page {
            entries,
            next_start_key,
        })
    }
}

/// Current value of a key; watchable
pub struct ValueOf<V> {
    store: MemoryStore<V>,
}

#[async_trait]
impl<V> Operation for ValueOf<V>
where
    V: Clone + Send + Sync + 'static,
{
    type Args = (String,);
    type Output = Option<V>;

    async fn fetch(&self, (key,): (String,)) -> Result<Option<V>> {
        Ok(self.store.get(&key).await)
    }

    fn supports_watch(&self) -> bool {
        true
    }

    fn watch(&self, (key,): (String,)) -> UpdateStream<Option<V>> {
        self.store.watch_key(key)
    }

    fn name(&self) -> &str {
        "memory.valueOf"
    }
}

/// Value of a key at a revision; the revision leads the key's own arguments
pub struct ValueAt<V> {
    store: MemoryStore<V>,
}

#[async_trait]
impl<V> Operation for ValueAt<V>
where
    V: Clone + Send + Sync + 'static,
{
    type Args = Prepended<u64, (String,)>;
    type Output = Option<V>;

    async fn fetch(&self, (revision, key): (u64, String)) -> Result<Option<V>> {
        self.store.get_at(&key, revision).await
    }

    fn name(&self) -> &str {
        "memory.valueAt"
    }
}

/// One page of a prefix scan
pub struct EntriesPaged<V> {
    store: MemoryStore<V>,
}

#[async_trait]
impl<V> Operation for EntriesPaged<V>
where
    V: Clone + Send + Sync + 'static,
{
    type Args = (PaginationOptions<String>,);
    type Output = Page<V>;

    async fn fetch(&self, (options,): (PaginationOptions<String>,)) -> Result<Page<V>> {
        self.store.scan_page(&options).await
    }

    fn name(&self) -> &str {
        "memory.entriesPaged"
    }
}
