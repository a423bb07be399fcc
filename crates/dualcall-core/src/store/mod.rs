// # Reference Producers
//
// This module provides producers that implement the crate's traits without
// any external service, for embedding, demos and tests.

pub mod memory;

pub use memory::{EntriesPaged, MemoryStore, StoredValue, ValueAt, ValueOf};
