//! Bounded network calls
//!
//! Store queries and generation requests are blocking network operations
//! with no intrinsic timeout. Every such call goes through `bounded`, which
//! imposes the configured timeout per attempt and at most one retry;
//! exhaustion surfaces as the caller-supplied timeout error and is routed
//! into the degraded-decision path by the analyzers.

use crate::config::CallPolicy;
use std::future::Future;

/// Run `op` under the call policy: each attempt is bounded by
/// `policy.timeout`, and a failed or timed-out attempt is retried up to
/// `policy.max_retries` times.
pub async fn bounded<T, E, F, Fut>(
    policy: &CallPolicy,
    timeout_error: impl Fn(u64) -> E,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let timeout_ms = policy.timeout.as_millis() as u64;
    let mut attempt = 0;
    loop {
        let outcome = match tokio::time::timeout(policy.timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(timeout_error(timeout_ms)),
        };
        match outcome {
            Ok(value) => return Ok(value),
            Err(_) if attempt < policy.max_retries => {
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn policy(timeout_ms: u64, retries: u32) -> CallPolicy {
        CallPolicy {
            timeout: Duration::from_millis(timeout_ms),
            max_retries: retries,
        }
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let result: Result<i32, StoreError> = bounded(
            &policy(100, 1),
            |ms| StoreError::Timeout { timeout_ms: ms },
            || async { Ok(7) },
        )
        .await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_retries_once_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result: Result<i32, StoreError> = bounded(
            &policy(100, 1),
            |ms| StoreError::Timeout { timeout_ms: ms },
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(StoreError::QueryFailed {
                            reason: "transient".to_string(),
                        })
                    } else {
                        Ok(42)
                    }
                }
            },
        )
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<i32, StoreError> = bounded(
            &policy(100, 1),
            |ms| StoreError::Timeout { timeout_ms: ms },
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(StoreError::QueryFailed {
                        reason: "down".to_string(),
                    })
                }
            },
        )
        .await;
        assert!(result.is_err());
        // Initial attempt plus exactly one retry.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timeout_maps_to_supplied_error() {
        let result: Result<i32, StoreError> = bounded(
            &policy(10, 0),
            |ms| StoreError::Timeout { timeout_ms: ms },
            || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(1)
            },
        )
        .await;
        assert_eq!(result.unwrap_err(), StoreError::Timeout { timeout_ms: 10 });
    }
}
