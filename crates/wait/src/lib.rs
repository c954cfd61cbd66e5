//! Retry primitives for calls against an eventually-consistent provider API.
//!
//! [`Backoff`] describes an exponential schedule with jitter, and
//! [`wait_for_with_retryable`] polls a condition on that schedule, retrying only
//! errors whose provider code is listed as retryable.

mod backoff;
mod waiter;

pub use backoff::{Backoff, Delays};
pub use waiter::{ErrorCode, WaitError, is_retryable, wait_for_with_retryable};
