// # dualcall-core
//
// Dual-mode method decoration for async producers.
//
// ## Architecture Overview
//
// One producer implementation serves two calling conventions, chosen once
// per [`Api`] instance:
// - **One-shot**: a call resolves a single value
// - **Subscription**: a call yields the current value and every update, or
//   delivers them to a trailing callback and returns an [`Unsubscribe`]
//
// The pieces:
// - **Operation**: trait for the underlying producer (`fetch` + `watch`)
// - **Api / DecoratedMethod**: the decoration layer that picks the shape
// - **tuple**: type-level parameter-list manipulation (prepend, append, pop)
// - **pagination**: options and pages for range-scan producers
// - **store**: an in-memory reactive producer for embedding and tests
//
// ## Design Principles
//
// 1. **Mode is fixed per API**: every method decorated by one `Api` shares
//    its mode
// 2. **Producers stay mode-agnostic**: operations never see which shape the
//    caller asked for
// 3. **Explicit failures**: a subscription against a producer without a
//    change feed fails loudly unless an override is configured

pub mod config;
pub mod decorate;
pub mod error;
pub mod mode;
pub mod pagination;
pub mod store;
pub mod traits;
pub mod tuple;

// Re-export core types for convenience
pub use config::{ApiConfig, StoreConfig};
pub use decorate::{
    Api, DecorateOptions, DecoratedMethod, MethodResult, Termination, Unsubscribe, VoidFn,
};
pub use error::{Error, Result};
pub use mode::ApiMode;
pub use pagination::{Page, PaginationOptions};
pub use store::MemoryStore;
pub use traits::{
    FutureFn, Operation, RangeScan, StreamFn, UpdateStream, from_future_fn, from_stream_fn,
};
pub use tuple::{Append, Appended, Pop, Prepend, Prepended, Tuple};
