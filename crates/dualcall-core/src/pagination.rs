//! Range-scan pagination
//!
//! [`PaginationOptions`] describes one bounded page of a key/value range scan
//! and [`Page`] is what a [`RangeScan`](crate::traits::RangeScan) executor
//! returns for it.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Options for one page of a range scan
///
/// `A` is the type of the optional filter argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationOptions<A = String> {
    /// Narrows the scan to entries associated with this value; the exact
    /// matching rule belongs to the scan executor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg: Option<A>,

    /// Maximum number of entries in the page (must be > 0)
    pub page_size: u32,

    /// Opaque continuation cursor returned by a previous page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_key: Option<String>,
}

impl<A> PaginationOptions<A> {
    /// Create options for a first page
    ///
    /// # Returns
    ///
    /// - `Ok(PaginationOptions)`: `page_size` is positive
    /// - `Err(Error::InvalidArgument)`: `page_size` is zero
    pub fn new(page_size: u32) -> Result<Self> {
        let options = Self {
            arg: None,
            page_size,
            start_key: None,
        };
        options.validate()?;
        Ok(options)
    }

    /// Set the filter argument
    pub fn with_arg(mut self, arg: A) -> Self {
        self.arg = Some(arg);
        self
    }

    /// Continue from a cursor returned by a previous page
    pub fn with_start_key(mut self, start_key: impl Into<String>) -> Self {
        self.start_key = Some(start_key.into());
        self
    }

    /// Validate the options
    ///
    /// Scan executors call this before touching their data, since options
    /// built by hand or deserialized skip the check in [`PaginationOptions::new`].
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::invalid_argument("pageSize must be a positive integer"));
        }
        Ok(())
    }

    /// Page size as a collection length
    pub fn limit(&self) -> usize {
        self.page_size as usize
    }
}

/// One page of scan results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<V> {
    /// Entries in executor order
    pub entries: Vec<(String, V)>,

    /// Cursor for the following page, `None` when the scan is exhausted
    pub next_start_key: Option<String>,
}

impl<V> Page<V> {
    /// An empty, final page
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            next_start_key: None,
        }
    }

    /// Whether no further page exists
    pub fn is_last(&self) -> bool {
        self.next_start_key.is_none()
    }

    /// Options for the page after this one, reusing `previous`'s filter and size
    pub fn next_options<A: Clone>(
        &self,
        previous: &PaginationOptions<A>,
    ) -> Option<PaginationOptions<A>> {
        self.next_start_key.as_ref().map(|cursor| PaginationOptions {
            arg: previous.arg.clone(),
            page_size: previous.page_size,
            start_key: Some(cursor.clone()),
        })
    }
}
