//! Re-running commands that lost an optimistic-concurrency race.

use std::future::Future;

use crate::error::Result;

/// Runs `op`, re-running it up to `max_retries` more times while it fails
/// with a concurrency conflict.
///
/// Every attempt must reload the aggregate, so the command is re-evaluated
/// against the state that beat it. Other errors are returned at once.
pub async fn retry_on_conflict<T, F, Fut>(operation: &'static str, max_retries: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(err) if err.is_conflict() && attempt < max_retries => {
                attempt += 1;
                metrics::counter!("command_conflicts_total", "operation" => operation).increment(1);
                tracing::warn!(operation, attempt, error = %err, "concurrency conflict, retrying");
            }
            Err(err) => {
                if err.is_conflict() {
                    metrics::counter!("command_conflicts_total", "operation" => operation).increment(1);
                    tracing::warn!(operation, attempts = attempt + 1, "giving up after repeated conflicts");
                }
                return Err(err);
            }
            Ok(value) => return Ok(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrchestrationError;
    use common::AggregateId;
    use event_store::{EventStoreError, Version};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn conflict() -> OrchestrationError {
        EventStoreError::ConcurrencyConflict {
            aggregate_id: AggregateId::new(),
            expected: Version::new(1),
            actual: Version::new(2),
        }
        .into()
    }

    #[tokio::test]
    async fn test_conflicts_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = retry_on_conflict("test", 3, || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(conflict())
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = retry_on_conflict("test", 2, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(conflict())
        })
        .await;

        assert!(result.unwrap_err().is_conflict());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = retry_on_conflict("test", 5, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(OrchestrationError::Config("bad".into()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
