use tracing::{debug, info};

use super::validation::{require_identifier, validate_create_params};
use crate::config::PollConfig;
use crate::errors::{RdsError, Result};
use crate::rds::{CreateParams, Instance, RdsOperations};
use crate::wait::wait_while_creating;

/// Creates an instance and waits for it to come up.
///
/// 1. Rejects an identifier that is already in use.
/// 2. Validates the creation parameters.
/// 3. Issues the create call.
/// 4. Polls until the instance leaves `creating`.
///
/// Returns the endpoint address of the new instance.
pub async fn create_instance<C: RdsOperations>(
    identifier: &str,
    params: &CreateParams,
    poll: &PollConfig,
    client: &C,
) -> Result<String> {
    require_identifier(identifier)?;

    match client.describe_instance(identifier).await {
        Ok(_) => return Err(RdsError::AlreadyExists(identifier.to_string())),
        Err(e) if e.is_instance_not_found() => {
            debug!(identifier = %identifier, "Identifier is free");
        }
        Err(e) => return Err(e),
    }

    validate_create_params(params)?;

    info!(
        identifier = %identifier,
        instance_class = %params.instance_class,
        storage = params.allocated_storage,
        "Creating instance"
    );
    let created = client.create_instance(identifier, params).await?;
    debug!(identifier = %identifier, status = %created.status, "Create call accepted");

    let instance = wait_until_available(identifier, poll, client).await?;
    endpoint_address(instance)
}

/// Polls `identifier` until it is no longer `creating` and returns that record.
pub async fn wait_until_available<C: RdsOperations>(
    identifier: &str,
    poll: &PollConfig,
    client: &C,
) -> Result<Instance> {
    let instance =
        wait_while_creating(poll, identifier, || client.describe_instance(identifier)).await?;
    info!(identifier = %identifier, status = %instance.status, "Instance ready");
    Ok(instance)
}

pub(crate) fn endpoint_address(instance: Instance) -> Result<String> {
    instance
        .endpoint
        .map(|e| e.address)
        .ok_or(RdsError::MissingEndpoint(instance.identifier))
}
