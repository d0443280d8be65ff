use tracing::{debug, info};

use crate::config::PollConfig;
use crate::errors::{RdsError, Result};
use crate::provision::validation::require_identifier;
use crate::rds::{DeleteRequest, DeletionRecord, RdsOperations, ResourceStatus, Snapshot};
use crate::wait::wait_while_creating;

/// Deletes an instance, capturing a final snapshot first unless skipped.
///
/// Steps run in order and the first failure stops the rest:
/// 1. Validate the request shape (identifier, final snapshot id).
/// 2. Confirm the instance exists.
/// 3. Take the final snapshot and wait until it is usable.
/// 4. Issue the delete call.
pub async fn delete_instance<C: RdsOperations>(
    request: &DeleteRequest,
    poll: &PollConfig,
    client: &C,
) -> Result<DeletionRecord> {
    require_identifier(&request.identifier)?;
    let final_snapshot_id = if request.skip_final_snapshot {
        None
    } else {
        Some(
            request
                .final_snapshot_id()
                .ok_or(RdsError::MissingFinalSnapshotId)?,
        )
    };

    let instance = client.describe_instance(&request.identifier).await?;
    debug!(identifier = %instance.identifier, status = %instance.status, "Instance found");

    let final_snapshot = match final_snapshot_id {
        Some(snapshot_id) => {
            Some(capture_final_snapshot(&request.identifier, snapshot_id, poll, client).await?)
        }
        None => {
            info!(identifier = %request.identifier, "Skipping final snapshot");
            None
        }
    };

    // Any final snapshot already exists, so the provider must not take another.
    let delete = DeleteRequest::new(request.identifier.clone()).skipping_final_snapshot();
    info!(identifier = %request.identifier, "Deleting instance");
    let mut record = client.delete_instance(&delete).await?;
    record.final_snapshot = final_snapshot;

    info!(identifier = %request.identifier, status = %record.instance.status, "Delete call accepted");
    Ok(record)
}

async fn capture_final_snapshot<C: RdsOperations>(
    identifier: &str,
    snapshot_id: &str,
    poll: &PollConfig,
    client: &C,
) -> Result<Snapshot> {
    info!(identifier = %identifier, snapshot = %snapshot_id, "Taking final snapshot");
    client.take_final_snapshot(identifier, snapshot_id).await?;

    let snapshot =
        wait_while_creating(poll, snapshot_id, || client.describe_snapshot(snapshot_id)).await?;
    if snapshot.status != ResourceStatus::Available {
        return Err(RdsError::FinalSnapshotFailed {
            snapshot_id: snapshot_id.to_string(),
            status: snapshot.status.to_string(),
        });
    }
    Ok(snapshot)
}
