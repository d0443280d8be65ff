use tracing::debug;

use crate::errors::{RdsError, Result};
use crate::rds::{RdsOperations, Snapshot};

/// Most recent snapshot of `identifier`.
///
/// The provider's listing order is taken as recency order: the last element
/// returned wins, without comparing creation times.
pub async fn get_last_snapshot<C: RdsOperations>(identifier: &str, client: &C) -> Result<Snapshot> {
    let snapshots = client.list_snapshots(Some(identifier)).await?;
    debug!(identifier = %identifier, count = snapshots.len(), "Found snapshots");

    snapshots
        .into_iter()
        .last()
        .ok_or_else(|| RdsError::NoSnapshot(identifier.to_string()))
}
