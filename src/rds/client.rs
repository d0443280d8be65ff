// rdstool/src/rds/client.rs
use aws_config::{BehaviorVersion, Region};
use aws_sdk_rds as rds;
use chrono::{DateTime, Utc};
use rds::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use rds::types::{DbInstance, DbSnapshot};
use tracing::debug;

use super::operations::RdsOperations;
use super::types::{
    CreateParams, DeleteRequest, DeletionRecord, Endpoint, Instance, ModifyParams, ResourceStatus,
    RestoreOverrides, Snapshot,
};
use crate::config::AwsSettings;
use crate::errors::{RdsError, Result};

/// Provider error codes meaning the instance does not exist
const INSTANCE_NOT_FOUND_CODES: &[&str] = &["DBInstanceNotFound", "DBInstanceNotFoundFault"];

/// Provider error codes meaning the snapshot does not exist
const SNAPSHOT_NOT_FOUND_CODES: &[&str] = &["DBSnapshotNotFound", "DBSnapshotNotFoundFault"];

/// RDS client backed by the AWS SDK.
pub struct RdsClient {
    client: rds::Client,
}

impl RdsClient {
    /// Loads credentials from the environment, profile or instance role.
    pub async fn new(settings: &AwsSettings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()));
        if let Some(profile) = &settings.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint) = &settings.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        debug!(region = %settings.region, "Loaded AWS configuration");
        Self::from_client(rds::Client::new(&sdk_config))
    }

    pub fn from_client(client: rds::Client) -> Self {
        Self { client }
    }
}

/// Map a provider error code onto the error taxonomy. `resource` names the
/// instance or snapshot the failed request was about.
pub(crate) fn classify_rds_error(code: Option<&str>, message: Option<&str>, resource: &str) -> RdsError {
    match code {
        Some(c) if INSTANCE_NOT_FOUND_CODES.contains(&c) => {
            RdsError::InstanceNotFound(resource.to_string())
        }
        Some(c) if SNAPSHOT_NOT_FOUND_CODES.contains(&c) => {
            RdsError::SnapshotNotFound(resource.to_string())
        }
        _ => RdsError::remote(code, message.unwrap_or("Unknown error")),
    }
}

fn sdk_error<E>(err: SdkError<E>, resource: &str) -> RdsError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let meta = ProvideErrorMetadata::meta(&err);
    let message = meta
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
    classify_rds_error(meta.code(), Some(&message), resource)
}

fn empty_response(operation: &str, resource: &str) -> RdsError {
    RdsError::remote(None, format!("{} returned no record for {}", operation, resource))
}

fn instance_from_sdk(db: &DbInstance) -> Instance {
    Instance {
        identifier: db.db_instance_identifier().unwrap_or_default().to_string(),
        instance_class: db.db_instance_class().map(str::to_string),
        allocated_storage: db.allocated_storage().map(i64::from),
        status: db
            .db_instance_status()
            .map(ResourceStatus::from)
            .unwrap_or_else(|| ResourceStatus::Other("unknown".to_string())),
        availability_zone: db.availability_zone().map(str::to_string),
        endpoint: db.endpoint().and_then(|e| {
            Some(Endpoint {
                address: e.address()?.to_string(),
                port: e.port().unwrap_or_default(),
            })
        }),
        engine: db.engine().map(str::to_string),
        arn: db.db_instance_arn().map(str::to_string),
    }
}

fn snapshot_from_sdk(snapshot: &DbSnapshot) -> Snapshot {
    Snapshot {
        instance_identifier: snapshot.db_instance_identifier().unwrap_or_default().to_string(),
        snapshot_identifier: snapshot.db_snapshot_identifier().unwrap_or_default().to_string(),
        status: snapshot
            .status()
            .map(ResourceStatus::from)
            .unwrap_or_else(|| ResourceStatus::Other("unknown".to_string())),
        created_at: snapshot
            .snapshot_create_time()
            .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos())),
    }
}

impl RdsOperations for RdsClient {
    async fn describe_instance(&self, identifier: &str) -> Result<Instance> {
        let output = self
            .client
            .describe_db_instances()
            .db_instance_identifier(identifier)
            .send()
            .await
            .map_err(|e| sdk_error(e, identifier))?;

        output
            .db_instances()
            .first()
            .map(instance_from_sdk)
            .ok_or_else(|| RdsError::InstanceNotFound(identifier.to_string()))
    }

    async fn create_instance(&self, identifier: &str, params: &CreateParams) -> Result<Instance> {
        let storage = i32::try_from(params.allocated_storage)
            .map_err(|_| RdsError::StorageOutOfRange(params.allocated_storage))?;

        let output = self
            .client
            .create_db_instance()
            .db_instance_identifier(identifier)
            .db_instance_class(&params.instance_class)
            .engine(&params.engine)
            .master_username(&params.master_user)
            .master_user_password(&params.master_password)
            .allocated_storage(storage)
            .set_availability_zone(params.availability_zone.clone())
            .send()
            .await
            .map_err(|e| sdk_error(e, identifier))?;

        output
            .db_instance()
            .map(instance_from_sdk)
            .ok_or_else(|| empty_response("CreateDBInstance", identifier))
    }

    async fn delete_instance(&self, request: &DeleteRequest) -> Result<DeletionRecord> {
        let final_snapshot_id = if request.skip_final_snapshot {
            None
        } else {
            request.final_snapshot_id().map(str::to_string)
        };

        let output = self
            .client
            .delete_db_instance()
            .db_instance_identifier(&request.identifier)
            .skip_final_snapshot(request.skip_final_snapshot)
            .set_final_db_snapshot_identifier(final_snapshot_id.clone())
            .send()
            .await
            .map_err(|e| sdk_error(e, &request.identifier))?;

        let instance = output
            .db_instance()
            .map(instance_from_sdk)
            .ok_or_else(|| empty_response("DeleteDBInstance", &request.identifier))?;

        // The provider captures this snapshot asynchronously while deleting.
        let final_snapshot = final_snapshot_id.map(|snapshot_identifier| Snapshot {
            instance_identifier: request.identifier.clone(),
            snapshot_identifier,
            status: ResourceStatus::Creating,
            created_at: None,
        });

        Ok(DeletionRecord {
            instance,
            final_snapshot,
        })
    }

    async fn restore_instance_from_snapshot(
        &self,
        identifier: &str,
        snapshot_id: &str,
        overrides: &RestoreOverrides,
    ) -> Result<Instance> {
        let output = self
            .client
            .restore_db_instance_from_db_snapshot()
            .db_instance_identifier(identifier)
            .db_snapshot_identifier(snapshot_id)
            .set_db_instance_class(overrides.instance_class.clone())
            .set_availability_zone(overrides.availability_zone.clone())
            .set_engine(overrides.engine.clone())
            .send()
            .await
            .map_err(|e| sdk_error(e, snapshot_id))?;

        output
            .db_instance()
            .map(instance_from_sdk)
            .ok_or_else(|| empty_response("RestoreDBInstanceFromDBSnapshot", identifier))
    }

    async fn modify_instance(&self, identifier: &str, params: &ModifyParams) -> Result<Instance> {
        let storage = params
            .allocated_storage
            .map(|size| i32::try_from(size).map_err(|_| RdsError::StorageOutOfRange(size)))
            .transpose()?;

        let output = self
            .client
            .modify_db_instance()
            .db_instance_identifier(identifier)
            .set_db_instance_class(params.instance_class.clone())
            .set_allocated_storage(storage)
            .set_master_user_password(params.master_password.clone())
            .apply_immediately(params.apply_immediately)
            .send()
            .await
            .map_err(|e| sdk_error(e, identifier))?;

        output
            .db_instance()
            .map(instance_from_sdk)
            .ok_or_else(|| empty_response("ModifyDBInstance", identifier))
    }

    async fn list_snapshots(&self, instance_identifier: Option<&str>) -> Result<Vec<Snapshot>> {
        let resource = instance_identifier.unwrap_or("*");
        let mut snapshots = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .client
                .describe_db_snapshots()
                .set_db_instance_identifier(instance_identifier.map(str::to_string))
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| sdk_error(e, resource))?;

            snapshots.extend(output.db_snapshots().iter().map(snapshot_from_sdk));

            match output.marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        debug!(instance = %resource, count = snapshots.len(), "Listed snapshots");
        Ok(snapshots)
    }

    async fn take_final_snapshot(&self, identifier: &str, snapshot_id: &str) -> Result<Snapshot> {
        let output = self
            .client
            .create_db_snapshot()
            .db_instance_identifier(identifier)
            .db_snapshot_identifier(snapshot_id)
            .send()
            .await
            .map_err(|e| sdk_error(e, identifier))?;

        output
            .db_snapshot()
            .map(snapshot_from_sdk)
            .ok_or_else(|| empty_response("CreateDBSnapshot", snapshot_id))
    }

    async fn describe_snapshot(&self, snapshot_id: &str) -> Result<Snapshot> {
        let output = self
            .client
            .describe_db_snapshots()
            .db_snapshot_identifier(snapshot_id)
            .send()
            .await
            .map_err(|e| sdk_error(e, snapshot_id))?;

        output
            .db_snapshots()
            .first()
            .map(snapshot_from_sdk)
            .ok_or_else(|| RdsError::SnapshotNotFound(snapshot_id.to_string()))
    }
}
