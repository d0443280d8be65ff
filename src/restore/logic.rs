use tracing::info;

use crate::config::PollConfig;
use crate::errors::{RdsError, Result};
use crate::provision::validation::require_identifier;
use crate::provision::{endpoint_address, wait_until_available};
use crate::rds::{Instance, RdsOperations, RestoreOverrides};
use crate::snapshot::get_last_snapshot;

/// Starts a new instance from an existing snapshot.
///
/// Returns as soon as the provider accepts the request; the new instance is
/// still `creating`. Use [`wait_until_available`] for a usable endpoint.
pub async fn restore_from_snapshot<C: RdsOperations>(
    identifier: &str,
    snapshot_id: &str,
    overrides: &RestoreOverrides,
    client: &C,
) -> Result<Instance> {
    require_identifier(identifier)?;
    if snapshot_id.trim().is_empty() {
        return Err(RdsError::MissingSnapshotId);
    }

    info!(identifier = %identifier, snapshot = %snapshot_id, "Restoring instance from snapshot");
    let instance = client
        .restore_instance_from_snapshot(identifier, snapshot_id, overrides)
        .await?;
    info!(identifier = %identifier, status = %instance.status, "Restore call accepted");
    Ok(instance)
}

/// Clones `source` into a new instance `target` from the latest snapshot of
/// `source`, waiting until the clone is up. Returns its endpoint address.
pub async fn duplicate_instance<C: RdsOperations>(
    source: &str,
    target: &str,
    overrides: &RestoreOverrides,
    poll: &PollConfig,
    client: &C,
) -> Result<String> {
    require_identifier(source)?;
    require_identifier(target)?;

    let snapshot = get_last_snapshot(source, client).await?;
    info!(
        source = %source,
        target = %target,
        snapshot = %snapshot.snapshot_identifier,
        "Duplicating instance"
    );
    restore_from_snapshot(target, &snapshot.snapshot_identifier, overrides, client).await?;

    let instance = wait_until_available(target, poll, client).await?;
    endpoint_address(instance)
}
