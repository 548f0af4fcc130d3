//! Pipeline entry points.
//!
//! - `filter_and_transform`: pure outage filtering and enrichment
//! - `run_sync`: fetch, transform and post for one site

pub mod sync;
pub mod transform;

pub use sync::{SyncOptions, SyncOutcome, run_sync};
pub use transform::{CUTOFF_UNIX_SECS, cutoff, filter_and_transform};
