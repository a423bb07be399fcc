// # Range Scan Trait
//
// Defines the interface of a key/value range-scan executor that serves one
// bounded page per call.
//
// ## Usage
//
// ```rust,ignore
// use dualcall_core::{PaginationOptions, RangeScan};
//
// let scanner = /* RangeScan implementation */;
//
// let mut options = PaginationOptions::new(100)?.with_arg("balance:".to_string());
// loop {
//     let page = scanner.scan_page(&options).await?;
//     for (key, value) in &page.entries {
//         println!("{key} = {value:?}");
//     }
//     match page.next_options(&options) {
//         Some(next) => options = next,
//         None => break,
//     }
// }
// ```

use crate::error::Result;
use crate::pagination::{Page, PaginationOptions};
use async_trait::async_trait;

/// Trait for range-scan executors
///
/// # Contract
///
/// - `options` must be validated before any data is read; a zero page size is
///   an invalid-argument failure
/// - `start_key` is the executor's own cursor format; callers pass it back
///   unmodified
/// - A page never holds more than `page_size` entries
#[async_trait]
pub trait RangeScan: Send + Sync {
    /// Filter argument type
    type Arg: Clone + Send + Sync;

    /// Value type of scanned entries
    type Value: Send;

    /// Fetch a single page
    async fn scan_page(&self, options: &PaginationOptions<Self::Arg>) -> Result<Page<Self::Value>>;

    /// Follow cursors from `options` until the scan is exhausted
    async fn scan_all(
        &self,
        options: &PaginationOptions<Self::Arg>,
    ) -> Result<Vec<(String, Self::Value)>> {
        let mut entries = Vec::new();
        let mut current = options.clone();

        loop {
            let page = self.scan_page(&current).await?;
            let next = page.next_options(&current);
            entries.extend(page.entries);

            match next {
                Some(next) => current = next,
                None => return Ok(entries),
            }
        }
    }
}
