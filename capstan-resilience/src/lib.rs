//! Bounded retry with backoff
//!
//! Upstream calls made on behalf of tool invocations retry a fixed number
//! of times with increasing delay; only errors flagged as retryable are
//! retried and the last error is surfaced verbatim once attempts run out.

pub mod backoff;
pub mod retry;

pub use backoff::{BackoffCalculator, BackoffStrategy};
pub use retry::{RetryError, RetryExecutor, RetryPolicy, Retryable};
