//! Cancel handle for subscriptions

use crate::error::Error;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Notify, watch};
use tracing::debug;

/// A zero-argument cancel action
pub type VoidFn = Box<dyn Fn() + Send + Sync + 'static>;

/// Why a subscription stopped delivering
#[derive(Debug, Clone)]
pub enum Termination {
    /// [`Unsubscribe::unsubscribe`] was called
    Cancelled,
    /// The producer ended its update stream, or the call was one-shot
    Completed,
    /// The producer failed after the first delivery
    Failed(Arc<Error>),
}

impl Termination {
    /// Whether the subscription ended because of a producer failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Termination::Failed(_))
    }
}

/// Handle returned by a callback-style call
///
/// Cloning shares the same subscription. Calling [`Unsubscribe::unsubscribe`]
/// any number of times, from any clone, has the effect of calling it once.
#[derive(Clone)]
pub struct Unsubscribe {
    shared: Arc<Shared>,
}

struct Shared {
    method: String,
    cancelled: AtomicBool,
    cancel_signal: Notify,
    termination: watch::Sender<Option<Termination>>,
}

impl Unsubscribe {
    /// Handle for a subscription that is still delivering
    pub(crate) fn active(method: &str) -> Self {
        let (termination, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                method: method.to_string(),
                cancelled: AtomicBool::new(false),
                cancel_signal: Notify::new(),
                termination,
            }),
        }
    }

    /// Handle for a call that will never deliver anything
    pub(crate) fn finished(method: &str, termination: Termination) -> Self {
        let handle = Self::active(method);
        handle.finish(termination);
        handle
    }

    /// Stop further deliveries
    ///
    /// A delivery already in progress may still complete; no delivery starts
    /// after this returns.
    pub fn unsubscribe(&self) {
        if self.shared.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(method = %self.shared.method, "Unsubscribe requested");
        self.shared.cancel_signal.notify_one();
    }

    /// Whether [`Unsubscribe::unsubscribe`] has been called
    pub fn is_unsubscribed(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    /// Whether delivery has stopped for any reason
    pub fn is_closed(&self) -> bool {
        self.shared.termination.borrow().is_some()
    }

    /// Label of the method this subscription belongs to
    pub fn method(&self) -> &str {
        &self.shared.method
    }

    /// Wait until delivery has stopped and report why
    pub async fn closed(&self) -> Termination {
        let mut rx = self.shared.termination.subscribe();
        match rx.wait_for(Option::is_some).await {
            Ok(state) => (*state).clone().unwrap_or(Termination::Completed),
            Err(_) => Termination::Completed,
        }
    }

    /// Convert into a plain cancel closure
    pub fn into_void_fn(self) -> VoidFn {
        Box::new(move || self.unsubscribe())
    }

    /// Resolves once [`Unsubscribe::unsubscribe`] has been called
    pub(crate) async fn cancelled(&self) {
        if self.is_unsubscribed() {
            return;
        }
        // notify_one stores a permit, so a cancel between the check and the
        // await is not lost.
        self.shared.cancel_signal.notified().await;
    }

    /// Record the termination reason; only the first one sticks
    pub(crate) fn finish(&self, termination: Termination) {
        self.shared.termination.send_if_modified(|state| {
            if state.is_some() {
                return false;
            }
            *state = Some(termination);
            true
        });
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("method", &self.shared.method)
            .field("unsubscribed", &self.is_unsubscribed())
            .field("closed", &self.is_closed())
            .finish()
    }
}
