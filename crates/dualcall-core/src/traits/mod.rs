//! Core traits for dualcall
//!
//! This module defines the abstract interfaces external producers implement.
//!
//! - [`Operation`]: An underlying data-producing operation (fetch + optional watch)
//! - [`RangeScan`]: A paged key/value range-scan executor

pub mod operation;
pub mod range_scan;

pub use operation::{FutureFn, Operation, StreamFn, UpdateStream, from_future_fn, from_stream_fn};
pub use range_scan::RangeScan;
