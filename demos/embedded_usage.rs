//! Minimal embedding example for dualcall-core
//!
//! Decorates the same producers with a one-shot API and a subscription API
//! and calls them both ways.
//!
//! ```bash
//! DUALCALL_MODE=subscription DUALCALL_LOG_LEVEL=debug cargo run --bin embedded_usage
//! ```

use dualcall_core::store::MemoryStore;
use dualcall_core::{Api, ApiConfig, ApiMode, DecorateOptions, Operation, Result, UpdateStream};
use futures::StreamExt;
use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

/// Block height that advances on a timer
struct BlockTicker {
    height: Arc<AtomicU64>,
    period: Duration,
}

impl BlockTicker {
    fn new(period: Duration) -> Self {
        Self {
            height: Arc::new(AtomicU64::new(1)),
            period,
        }
    }
}

#[async_trait::async_trait]
impl Operation for BlockTicker {
    type Args = ();
    type Output = u64;

    async fn fetch(&self, _args: ()) -> Result<u64> {
        Ok(self.height.load(Ordering::SeqCst))
    }

    fn supports_watch(&self) -> bool {
        true
    }

    fn watch(&self, _args: ()) -> UpdateStream<u64> {
        let height = Arc::clone(&self.height);
        IntervalStream::new(tokio::time::interval(self.period))
            .map(move |_| Ok(height.fetch_add(1, Ordering::SeqCst)))
            .boxed()
    }

    fn name(&self) -> &str {
        "chain.newHead"
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let log_level = match env::var("DUALCALL_LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let config = ApiConfig::from_env()?;
    let api = Api::new(config)?;
    let one_shot = api.with_mode(ApiMode::OneShot);
    let live = api.with_mode(ApiMode::Subscription);

    let store: MemoryStore<u64> = MemoryStore::new();
    store.set("balance:alice", 100).await;
    store.set("balance:bob", 42).await;

    // One-shot reads
    let balance = one_shot.decorate(
        store.value_of(),
        DecorateOptions::new().with_method_name("query.balance"),
    );
    let alice = balance.call(("balance:alice".to_string(),)).value().await?;
    info!(?alice, "One-shot balance");

    let entries = one_shot.decorate(store.entries_paged(), DecorateOptions::new());
    let page = entries
        .call((one_shot.page().with_arg("balance:".to_string()),))
        .value()
        .await?;
    info!(entries = page.entries.len(), last = page.is_last(), "One-shot page");

    // Subscriptions
    let balance = live.decorate(
        store.value_of(),
        DecorateOptions::new().with_method_name("query.balance"),
    );
    let handle = balance
        .subscribe((
            "balance:alice".to_string(),
            |value: Option<u64>| info!(?value, "Balance update"),
        ))
        .await?;

    store.set("balance:alice", 90).await;
    store.set("balance:alice", 75).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.unsubscribe();
    let termination = handle.closed().await;
    info!(?termination, "Balance subscription closed");

    let heads = live.decorate(BlockTicker::new(Duration::from_millis(100)), DecorateOptions::new());
    let mut updates = heads.call(()).into_stream().take(3);
    while let Some(height) = updates.next().await {
        let height = height?;
        info!(height, "New head");
    }

    // The mode from the environment decides how the same call behaves
    let heads = api.decorate(BlockTicker::new(Duration::from_millis(100)), DecorateOptions::new());
    let handle = heads
        .subscribe((|height: u64| info!(height, "Head via callback"),))
        .await?;
    tokio::time::sleep(Duration::from_millis(250)).await;
    handle.unsubscribe();

    let termination = handle.closed().await;
    if termination.is_failure() {
        anyhow::bail!("head subscription ended with {:?}", termination);
    }
    info!(mode = %api.mode(), ?termination, "Done");

    Ok(())
}
