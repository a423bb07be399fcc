// # Operation Trait
//
// Defines the interface of an underlying data-producing operation: something
// that can report the current value for a set of arguments and, optionally,
// keep reporting every later change.
//
// ## Usage
//
// ```rust,ignore
// use dualcall_core::Operation;
// use futures::StreamExt;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let op = /* Operation implementation */;
//
//     // Get the current value
//     let value = op.fetch(("balance:alice".to_string(),)).await?;
//
//     // Watch for changes
//     if op.supports_watch() {
//         let mut updates = op.watch(("balance:alice".to_string(),));
//         while let Some(update) = updates.next().await {
//             println!("changed: {:?}", update?);
//         }
//     }
//
//     Ok(())
// }
// ```

use crate::error::{Error, Result};
use crate::mode::ApiMode;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream, StreamExt};
use std::marker::PhantomData;

/// A continuous-update source: every item is one emission of the producer
pub type UpdateStream<T> = BoxStream<'static, Result<T>>;

/// Trait for underlying producer implementations
///
/// `Args` is the ordered parameter list as a tuple and `Output` is the inner
/// value type produced on every emission.
///
/// # Behavior
///
/// - `fetch` resolves exactly once
/// - `watch` yields updates in the order the producer observed them
/// - Dropping the stream returned by `watch` must release the producer's
///   resources for that watch
///
/// Operations that have no native change feed keep the default
/// `supports_watch() == false`; the decoration layer then refuses
/// subscription calls unless an override producer is configured.
#[async_trait]
pub trait Operation: Send + Sync + 'static {
    /// Ordered parameter list
    type Args: Send + 'static;

    /// Inner value type
    type Output: Send + 'static;

    /// Resolve the current value for `args`
    async fn fetch(&self, args: Self::Args) -> Result<Self::Output>;

    /// Whether [`Operation::watch`] is backed by a real change feed
    fn supports_watch(&self) -> bool {
        false
    }

    /// Stream the current value followed by every change
    ///
    /// Only called when [`Operation::supports_watch`] returns `true`. The
    /// default yields a single failure so a misconfigured caller still gets
    /// an explicit error instead of silence.
    fn watch(&self, _args: Self::Args) -> UpdateStream<Self::Output> {
        let name = self.name().to_string();
        stream::once(async move { Err(Error::unsupported(name, ApiMode::Subscription)) }).boxed()
    }

    /// Name used in diagnostics when no method name is configured
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Operation backed by a function returning an update stream
///
/// The stream's first item is the one-shot value; the whole stream is the
/// subscription.
pub struct StreamFn<F, A, T> {
    name: String,
    f: F,
    _marker: PhantomData<fn(A) -> T>,
}

/// Operation backed by a function returning a single deferred value
///
/// Cannot be watched.
pub struct FutureFn<F, A, T> {
    name: String,
    f: F,
    _marker: PhantomData<fn(A) -> T>,
}

/// Wrap a stream-returning function as a watchable operation
pub fn from_stream_fn<F, A, T>(name: impl Into<String>, f: F) -> StreamFn<F, A, T>
where
    F: Fn(A) -> UpdateStream<T> + Send + Sync + 'static,
    A: Send + 'static,
    T: Send + 'static,
{
    StreamFn {
        name: name.into(),
        f,
        _marker: PhantomData,
    }
}

/// Wrap a future-returning function as a fetch-only operation
pub fn from_future_fn<F, A, T>(name: impl Into<String>, f: F) -> FutureFn<F, A, T>
where
    F: Fn(A) -> BoxFuture<'static, Result<T>> + Send + Sync + 'static,
    A: Send + 'static,
    T: Send + 'static,
{
    FutureFn {
        name: name.into(),
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, A, T> Operation for StreamFn<F, A, T>
where
    F: Fn(A) -> UpdateStream<T> + Send + Sync + 'static,
    A: Send + 'static,
    T: Send + 'static,
{
    type Args = A;
    type Output = T;

    async fn fetch(&self, args: A) -> Result<T> {
        let mut updates = (self.f)(args);
        match updates.next().await {
            Some(result) => result,
            None => Err(Error::closed(self.name.clone())),
        }
    }

    fn supports_watch(&self) -> bool {
        true
    }

    fn watch(&self, args: A) -> UpdateStream<T> {
        (self.f)(args)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl<F, A, T> Operation for FutureFn<F, A, T>
where
    F: Fn(A) -> BoxFuture<'static, Result<T>> + Send + Sync + 'static,
    A: Send + 'static,
    T: Send + 'static,
{
    type Args = A;
    type Output = T;

    async fn fetch(&self, args: A) -> Result<T> {
        (self.f)(args).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
