//! Per-method decoration options

use crate::traits::UpdateStream;
use std::fmt;
use std::sync::Arc;

/// Replacement update source for methods that cannot watch
pub type OverrideNoSub<A, T> = Arc<dyn Fn(A) -> UpdateStream<T> + Send + Sync + 'static>;

/// Options attached to one decorated method
///
/// Read once when the method is decorated, never per call.
pub struct DecorateOptions<A, T> {
    /// Label used in logs and errors; falls back to the operation's name
    pub method_name: Option<String>,

    /// Update source used in subscription mode when the operation has no
    /// change feed of its own
    pub override_no_sub: Option<OverrideNoSub<A, T>>,
}

impl<A, T> DecorateOptions<A, T> {
    /// Options with no label and no override
    pub fn new() -> Self {
        Self {
            method_name: None,
            override_no_sub: None,
        }
    }

    /// Set the diagnostic label
    pub fn with_method_name(mut self, name: impl Into<String>) -> Self {
        self.method_name = Some(name.into());
        self
    }

    /// Set the replacement update source
    pub fn with_override_no_sub<F>(mut self, producer: F) -> Self
    where
        F: Fn(A) -> UpdateStream<T> + Send + Sync + 'static,
    {
        self.override_no_sub = Some(Arc::new(producer));
        self
    }
}

impl<A, T> Default for DecorateOptions<A, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, T> Clone for DecorateOptions<A, T> {
    fn clone(&self) -> Self {
        Self {
            method_name: self.method_name.clone(),
            override_no_sub: self.override_no_sub.clone(),
        }
    }
}

impl<A, T> fmt::Debug for DecorateOptions<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecorateOptions")
            .field("method_name", &self.method_name)
            .field("override_no_sub", &self.override_no_sub.is_some())
            .finish()
    }
}
