//! Condition polling with code-based retry classification.

use std::future::Future;

use thiserror::Error;
use tracing::{debug, trace};

use crate::backoff::Backoff;

/// Errors that may carry a provider error code.
pub trait ErrorCode {
    /// Provider classification of the error, `None` for errors outside the provider's taxonomy.
    fn code(&self) -> Option<&str>;
}

/// Failure of [`wait_for_with_retryable`].
#[derive(Debug, Error)]
pub enum WaitError<E> {
    /// Non-retryable error, returned as soon as it was seen.
    #[error(transparent)]
    Terminal(E),
    /// The schedule ran out while the condition kept failing with a retryable error.
    #[error("gave up after {attempts} attempts")]
    Exhausted {
        attempts: u32,
        #[source]
        last: E,
    },
    /// The schedule ran out while the condition kept reporting "not yet".
    #[error("condition not met after {attempts} attempts")]
    Timeout { attempts: u32 },
}

impl<E> WaitError<E> {
    /// The error that ended the wait, if any.
    pub fn last_error(&self) -> Option<&E> {
        match self {
            Self::Terminal(err) | Self::Exhausted { last: err, .. } => Some(err),
            Self::Timeout { .. } => None,
        }
    }
}

/// Returns true if `err` carries one of the `retryable` codes.
pub fn is_retryable<E: ErrorCode>(err: &E, retryable: &[&str]) -> bool {
    err.code().is_some_and(|code| retryable.contains(&code))
}

/// Polls `condition` on the `backoff` schedule until it reports `Ok(true)`.
///
/// `Ok(false)` and errors with a code in `retryable` are retried; any other
/// error, including one without a code, ends the wait immediately. Once the
/// schedule is exhausted the last retryable error is returned, or
/// [`WaitError::Timeout`] if the last attempt did not fail.
pub async fn wait_for_with_retryable<F, Fut, E>(
    backoff: &Backoff,
    retryable: &[&str],
    mut condition: F,
) -> Result<(), WaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: ErrorCode,
{
    let mut attempts = 0;
    let mut last_retryable = None;

    for delay in backoff.delays() {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        attempts += 1;

        match condition().await {
            Ok(true) => return Ok(()),
            Ok(false) => {
                trace!(attempts, "condition not met yet");
                last_retryable = None;
            }
            Err(err) if is_retryable(&err, retryable) => {
                debug!(attempts, code = ?err.code(), "retryable error");
                last_retryable = Some(err);
            }
            Err(err) => return Err(WaitError::Terminal(err)),
        }
    }

    Err(match last_retryable {
        Some(last) => WaitError::Exhausted { attempts, last },
        None => WaitError::Timeout { attempts },
    })
}
