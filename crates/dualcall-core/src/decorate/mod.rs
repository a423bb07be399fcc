//! Dual-mode method decoration
//!
//! An [`Api`] is bound to one [`ApiMode`] for its lifetime. Decorating an
//! [`Operation`] through it yields a [`DecoratedMethod`] whose call shapes
//! follow that mode:
//!
//! | call                      | one-shot                    | subscription                  |
//! |---------------------------|-----------------------------|-------------------------------|
//! | `call(args)`              | `MethodResult::Value`       | `MethodResult::Updates`       |
//! | `subscribe((args.., cb))` | closed handle, `cb` unused  | `Unsubscribe`, `cb` per value |
//! | `call_as::<U>(args)`      | as `call`, payload as `U`   | as `call`, payload as `U`     |
//! | `subscribe_as::<U>(..)`   | as `subscribe`              | as `subscribe`, `cb` gets `U` |
//!
//! ## Subscription flow
//!
//! ```text
//! subscribe((args.., cb))
//!        │
//!        ▼
//! ┌─────────────────┐ supports_watch? ┌──────────────────┐
//! │ DecoratedMethod │────── yes ─────▶│ Operation::watch │
//! └─────────────────┘                 └──────────────────┘
//!        │ no                                   │
//!        ▼                                      ▼
//! override_no_sub? ── yes ──▶ override stream ──┤
//!        │ no                                   ▼
//!        ▼                              first emission ──▶ cb, resolve Unsubscribe
//!  Error::Unsupported                           │
//!                                               ▼
//!                                     delivery task: cb per update
//!                                     until unsubscribe / end / failure
//! ```

pub mod options;
pub mod result;
pub mod unsubscribe;

pub use options::{DecorateOptions, OverrideNoSub};
pub use result::MethodResult;
pub use unsubscribe::{Termination, Unsubscribe, VoidFn};

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::mode::ApiMode;
use crate::pagination::PaginationOptions;
use crate::traits::{Operation, UpdateStream};
use crate::tuple::Pop;
use futures::future::FutureExt;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// An API surface bound to one interaction mode
///
/// The mode cannot change after construction; [`Api::with_mode`] builds a
/// separate instance instead. Methods already decorated keep the mode of the
/// instance that decorated them.
#[derive(Debug, Clone)]
pub struct Api {
    config: ApiConfig,
}

impl Api {
    /// Create a new API instance
    ///
    /// # Returns
    ///
    /// - `Ok(Api)`: configuration is valid
    /// - `Err(Error::Config)`: configuration failed validation
    pub fn new(config: ApiConfig) -> Result<Self> {
        config.validate()?;
        info!(mode = %config.mode, "API instance created");
        Ok(Self { config })
    }

    /// One-shot instance with default settings
    pub fn one_shot() -> Self {
        Self {
            config: ApiConfig::new(ApiMode::OneShot),
        }
    }

    /// Subscription instance with default settings
    pub fn subscription() -> Self {
        Self {
            config: ApiConfig::new(ApiMode::Subscription),
        }
    }

    /// Interaction mode of this instance
    pub fn mode(&self) -> ApiMode {
        self.config.mode
    }

    /// Configuration of this instance
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// A new instance with the same settings in another mode
    pub fn with_mode(&self, mode: ApiMode) -> Self {
        debug!(from = %self.config.mode, to = %mode, "Deriving API instance");
        Self {
            config: ApiConfig {
                mode,
                ..self.config.clone()
            },
        }
    }

    /// First-page pagination options using the configured default page size
    pub fn page<A>(&self) -> PaginationOptions<A> {
        PaginationOptions {
            arg: None,
            page_size: self.config.default_page_size,
            start_key: None,
        }
    }

    /// Decorate an operation with this instance's mode
    pub fn decorate<O: Operation>(
        &self,
        operation: O,
        options: DecorateOptions<O::Args, O::Output>,
    ) -> DecoratedMethod<O> {
        self.decorate_shared(Arc::new(operation), options)
    }

    /// Decorate an operation that is shared with other owners
    pub fn decorate_shared<O: Operation>(
        &self,
        operation: Arc<O>,
        options: DecorateOptions<O::Args, O::Output>,
    ) -> DecoratedMethod<O> {
        let method = options
            .method_name
            .unwrap_or_else(|| operation.name().to_string());

        debug!(
            method = %method,
            mode = %self.config.mode,
            watchable = operation.supports_watch(),
            has_override = options.override_no_sub.is_some(),
            "Decorating method"
        );

        DecoratedMethod {
            operation,
            mode: self.config.mode,
            method,
            override_no_sub: options.override_no_sub,
        }
    }
}

impl Default for Api {
    fn default() -> Self {
        Self::one_shot()
    }
}

/// An operation exposed through one interaction mode
pub struct DecoratedMethod<O: Operation> {
    operation: Arc<O>,
    mode: ApiMode,
    method: String,
    override_no_sub: Option<OverrideNoSub<O::Args, O::Output>>,
}

impl<O: Operation> DecoratedMethod<O> {
    /// Interaction mode of this method
    pub fn mode(&self) -> ApiMode {
        self.mode
    }

    /// Diagnostic label of this method
    pub fn method_name(&self) -> &str {
        &self.method
    }

    /// The underlying operation
    pub fn operation(&self) -> &Arc<O> {
        &self.operation
    }

    /// Call with arguments only
    ///
    /// One-shot mode returns [`MethodResult::Value`]; subscription mode
    /// returns [`MethodResult::Updates`]. Failures, including
    /// [`Error::Unsupported`], arrive through the returned value.
    pub fn call(&self, args: O::Args) -> MethodResult<O::Output> {
        match self.mode {
            ApiMode::OneShot => {
                debug!(method = %self.method, "One-shot call");
                let operation = Arc::clone(&self.operation);
                MethodResult::Value(async move { operation.fetch(args).await }.boxed())
            }
            ApiMode::Subscription => {
                debug!(method = %self.method, "Subscription call");
                MethodResult::Updates(self.updates(args))
            }
        }
    }

    /// [`DecoratedMethod::call`] with a caller-asserted payload type
    pub fn call_as<U>(&self, args: O::Args) -> MethodResult<U>
    where
        O::Output: Into<U>,
        U: Send + 'static,
    {
        self.call(args).cast()
    }

    /// Call with arguments followed by a trailing callback
    ///
    /// `params` is the argument tuple with the callback appended, e.g.
    /// `("alice".to_string(), |balance: u64| ..)` for `Args = (String,)`.
    ///
    /// - Subscription mode: waits for the first emission, hands it to the
    ///   callback, then keeps delivering on a background task until the
    ///   returned [`Unsubscribe`] is used or the producer stops. If the first
    ///   emission is a failure, this call fails with it.
    /// - One-shot mode: resolves the value once and never invokes the
    ///   callback. The returned handle is already closed.
    pub async fn subscribe<P, C>(&self, params: P) -> Result<Unsubscribe>
    where
        P: Pop<Init = O::Args, Last = C>,
        C: FnMut(O::Output) + Send + 'static,
    {
        let (args, callback) = params.pop();
        self.subscribe_with(args, callback).await
    }

    /// [`DecoratedMethod::subscribe`] with a callback typed by the caller
    pub async fn subscribe_as<U, P, C>(&self, params: P) -> Result<Unsubscribe>
    where
        P: Pop<Init = O::Args, Last = C>,
        C: FnMut(U) + Send + 'static,
        O::Output: Into<U>,
    {
        let (args, mut callback) = params.pop();
        self.subscribe_with(args, move |value: O::Output| callback(value.into()))
            .await
    }

    async fn subscribe_with<C>(&self, args: O::Args, mut callback: C) -> Result<Unsubscribe>
    where
        C: FnMut(O::Output) + Send + 'static,
    {
        if !self.mode.is_subscription() {
            self.operation.fetch(args).await?;
            debug!(method = %self.method, "One-shot call resolved, callback not invoked");
            return Ok(Unsubscribe::finished(&self.method, Termination::Completed));
        }

        let mut updates = self.updates(args);

        let first = match updates.next().await {
            Some(Ok(value)) => value,
            Some(Err(err)) => {
                error!(
                    method = %self.method,
                    error = %err,
                    "Subscription failed before first update"
                );
                return Err(err);
            }
            None => {
                debug!(method = %self.method, "Update stream ended before first update");
                return Ok(Unsubscribe::finished(&self.method, Termination::Completed));
            }
        };

        callback(first);

        let handle = Unsubscribe::active(&self.method);
        tokio::spawn(deliver(
            self.method.clone(),
            updates,
            callback,
            handle.clone(),
        ));

        Ok(handle)
    }

    /// Select the update source for subscription mode
    fn updates(&self, args: O::Args) -> UpdateStream<O::Output> {
        if self.operation.supports_watch() {
            return self.operation.watch(args);
        }

        if let Some(producer) = &self.override_no_sub {
            debug!(method = %self.method, "Operation cannot watch, using override producer");
            return producer(args);
        }

        warn!(method = %self.method, "Subscription requested on a method without a change feed");
        let err = Error::unsupported(self.method.clone(), self.mode);
        stream::once(async move { Err(err) }).boxed()
    }
}

impl<O: Operation> Clone for DecoratedMethod<O> {
    fn clone(&self) -> Self {
        Self {
            operation: Arc::clone(&self.operation),
            mode: self.mode,
            method: self.method.clone(),
            override_no_sub: self.override_no_sub.clone(),
        }
    }
}

/// Deliver updates to `callback` until cancelled, completed or failed
async fn deliver<T, C>(
    method: String,
    mut updates: UpdateStream<T>,
    mut callback: C,
    handle: Unsubscribe,
) where
    T: Send + 'static,
    C: FnMut(T) + Send + 'static,
{
    let termination = loop {
        tokio::select! {
            biased;

            _ = handle.cancelled() => break Termination::Cancelled,

            next = updates.next() => match next {
                Some(Ok(value)) => {
                    if handle.is_unsubscribed() {
                        break Termination::Cancelled;
                    }
                    callback(value);
                }
                Some(Err(err)) => {
                    error!(method = %method, error = %err, "Update stream failed");
                    break Termination::Failed(Arc::new(err));
                }
                None => break Termination::Completed,
            },
        }
    };

    // Release the producer before reporting, so watchers of `closed()` see a
    // fully torn down subscription.
    drop(updates);
    debug!(method = %method, termination = ?termination, "Subscription ended");
    handle.finish(termination);
}
