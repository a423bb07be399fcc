//! Result of a plain (callback-less) call on a decorated method

use crate::error::{Error, Result};
use crate::mode::ApiMode;
use crate::traits::UpdateStream;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use std::fmt;

/// What a decorated method hands back when called with its arguments only
///
/// The variant always matches the mode of the [`Api`](crate::Api) the
/// method was decorated by.
pub enum MethodResult<T> {
    /// One-shot mode: a deferred single value
    Value(BoxFuture<'static, Result<T>>),

    /// Subscription mode: the current value followed by every update
    Updates(UpdateStream<T>),
}

impl<T: Send + 'static> MethodResult<T> {
    /// Mode this result was produced in
    pub fn mode(&self) -> ApiMode {
        match self {
            MethodResult::Value(_) => ApiMode::OneShot,
            MethodResult::Updates(_) => ApiMode::Subscription,
        }
    }

    /// Resolve a single value
    ///
    /// For an update stream this is its first emission; a stream that ends
    /// without emitting fails with [`Error::Closed`].
    pub async fn value(self) -> Result<T> {
        match self {
            MethodResult::Value(pending) => pending.await,
            MethodResult::Updates(mut updates) => match updates.next().await {
                Some(result) => result,
                None => Err(Error::closed("update stream ended without a value")),
            },
        }
    }

    /// View either shape as a stream; a deferred value becomes a stream of one
    pub fn into_stream(self) -> UpdateStream<T> {
        match self {
            MethodResult::Value(pending) => stream::once(pending).boxed(),
            MethodResult::Updates(updates) => updates,
        }
    }

    /// Treat the payload as `U`
    ///
    /// The caller asserts the payload type; every emission is converted with
    /// `Into` and no other check is made.
    pub fn cast<U>(self) -> MethodResult<U>
    where
        T: Into<U>,
        U: Send + 'static,
    {
        match self {
            MethodResult::Value(pending) => {
                MethodResult::Value(pending.map(|result| result.map(Into::into)).boxed())
            }
            MethodResult::Updates(updates) => {
                MethodResult::Updates(updates.map(|result| result.map(Into::into)).boxed())
            }
        }
    }
}

impl<T> fmt::Debug for MethodResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodResult::Value(_) => f.write_str("MethodResult::Value(..)"),
            MethodResult::Updates(_) => f.write_str("MethodResult::Updates(..)"),
        }
    }
}
