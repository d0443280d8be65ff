//! Status polling for resources that are still being created.
//!
//! The provider offers no notification when an instance or snapshot becomes
//! usable, so callers re-read the resource at a fixed interval until it
//! leaves `creating`. Errors from a read are never retried.

use std::future::Future;
use tracing::{debug, warn};

use crate::config::PollConfig;
use crate::errors::{RdsError, Result};
use crate::rds::{Instance, ResourceStatus, Snapshot};

/// A remote record that carries a lifecycle status.
pub trait Observed {
    fn status(&self) -> &ResourceStatus;
}

impl Observed for Instance {
    fn status(&self) -> &ResourceStatus {
        &self.status
    }
}

impl Observed for Snapshot {
    fn status(&self) -> &ResourceStatus {
        &self.status
    }
}

/// Re-read a resource until its status is anything other than `creating`.
///
/// # Arguments
/// * `poll` - Delay between reads and optional attempt cap
/// * `resource_name` - Name for logging and the exhaustion error
/// * `fetch` - Reads the current record from the remote service
///
/// # Returns
/// * `Ok(record)` - The first record observed outside `creating`
/// * `Err` - The read failed, or `poll.max_attempts` reads all saw `creating`
pub async fn wait_while_creating<T, F, Fut>(
    poll: &PollConfig,
    resource_name: &str,
    fetch: F,
) -> Result<T>
where
    T: Observed,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempts = 0u32;

    loop {
        attempts = next_attempt(attempts);

        let current = match fetch().await {
            Ok(record) => record,
            Err(e) => {
                warn!(resource = %resource_name, attempt = attempts, error = %e, "Status check failed");
                return Err(e);
            }
        };

        if *current.status() != ResourceStatus::Creating {
            debug!(
                resource = %resource_name,
                attempts,
                status = %current.status(),
                "Resource finished creating"
            );
            return Ok(current);
        }

        if poll.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(RdsError::PollAttemptsExhausted {
                resource: resource_name.to_string(),
                attempts,
            });
        }

        debug!(
            resource = %resource_name,
            attempt = attempts,
            delay_ms = poll.interval.as_millis(),
            "Resource still creating, waiting"
        );
        tokio::time::sleep(poll.interval).await;
    }
}

/// Attempt counter step; pins at `u32::MAX` on an unbounded wait.
fn next_attempt(attempts: u32) -> u32 {
    attempts.saturating_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn snapshot(status: ResourceStatus) -> Snapshot {
        Snapshot {
            instance_identifier: "db".to_string(),
            snapshot_identifier: "db-final".to_string(),
            status,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_returns_first_non_creating_record() -> anyhow::Result<()> {
        let reads = Cell::new(0u32);
        let result = wait_while_creating(&PollConfig::immediate(), "db-final", || {
            let n = reads.get() + 1;
            reads.set(n);
            async move {
                Ok(snapshot(if n < 3 {
                    ResourceStatus::Creating
                } else {
                    ResourceStatus::Available
                }))
            }
        })
        .await?;

        assert_eq!(result.status, ResourceStatus::Available);
        assert_eq!(reads.get(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_any_other_status_ends_the_wait() -> anyhow::Result<()> {
        let result = wait_while_creating(&PollConfig::immediate(), "db", || async {
            Ok(snapshot(ResourceStatus::Other("failed".to_string())))
        })
        .await?;
        assert_eq!(result.status, ResourceStatus::Other("failed".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_error_aborts_without_retry() {
        let reads = Cell::new(0u32);
        let result: Result<Snapshot> = wait_while_creating(&PollConfig::immediate(), "db", || {
            reads.set(reads.get() + 1);
            async { Err(RdsError::remote(None, "connection reset")) }
        })
        .await;

        assert_eq!(result.unwrap_err().to_string(), "connection reset");
        assert_eq!(reads.get(), 1);
    }

    #[tokio::test]
    async fn test_attempt_cap() {
        let poll = PollConfig::immediate().with_max_attempts(4);
        let reads = Cell::new(0u32);
        let result = wait_while_creating(&poll, "db", || {
            reads.set(reads.get() + 1);
            async { Ok(snapshot(ResourceStatus::Creating)) }
        })
        .await;

        assert_eq!(
            result.unwrap_err(),
            RdsError::PollAttemptsExhausted {
                resource: "db".to_string(),
                attempts: 4,
            }
        );
        assert_eq!(reads.get(), 4);
    }

    #[test]
    fn test_attempt_counter_does_not_overflow() {
        assert_eq!(next_attempt(0), 1);
        assert_eq!(next_attempt(u32::MAX - 1), u32::MAX);
        assert_eq!(next_attempt(u32::MAX), u32::MAX);
    }
}
