//! Retry and batching primitives shared by the bucket tools.
//!
//! - `retry`: bounded retry of a single fallible async call with exponential backoff.
//! - `batch`: runs a per-item operation over a list in fixed-width concurrent slices.
//! - `outcome`: per-item results and the summary derived from them.
//! - `progress`: the sink informed once per settled item.

pub mod batch;
pub mod outcome;
pub mod progress;
pub mod retry;

pub use batch::{BatchRunner, batch_process};
pub use outcome::{BatchSummary, Outcome};
pub use progress::{CountingProgress, NoProgress, Progress, progress_bar};
pub use retry::{RetryPolicy, with_retry};
