use tracing::info;

use super::validation::{require_identifier, validate_modify_params};
use crate::errors::Result;
use crate::rds::{Instance, ModifyParams, RdsOperations};

/// Changes class, storage or master password of an existing instance.
///
/// The request is checked locally first, then the instance must exist. The
/// returned record is whatever the provider reports right after the call;
/// deferred changes only show up after the next maintenance window.
pub async fn modify_instance<C: RdsOperations>(
    identifier: &str,
    params: &ModifyParams,
    client: &C,
) -> Result<Instance> {
    require_identifier(identifier)?;
    validate_modify_params(params)?;

    client.describe_instance(identifier).await?;

    info!(
        identifier = %identifier,
        instance_class = ?params.instance_class,
        storage = ?params.allocated_storage,
        password_change = params.master_password.is_some(),
        apply_immediately = params.apply_immediately,
        "Modifying instance"
    );
    let instance = client.modify_instance(identifier, params).await?;
    info!(identifier = %identifier, status = %instance.status, "Modify call accepted");
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorKind, RdsError};
    use crate::rds::simulated::Call;
    use crate::rds::{ResourceStatus, SimulatedRds};

    fn existing(identifier: &str) -> Instance {
        Instance {
            identifier: identifier.to_string(),
            instance_class: Some("db.m1.small".to_string()),
            allocated_storage: Some(5),
            status: ResourceStatus::Available,
            availability_zone: Some("us-east-1c".to_string()),
            endpoint: None,
            engine: Some("postgres".to_string()),
            arn: None,
        }
    }

    #[tokio::test]
    async fn test_immediate_change_is_visible() -> anyhow::Result<()> {
        let rds = SimulatedRds::new().with_instance(existing("staging"));
        let params = ModifyParams {
            instance_class: Some("db.m3.large".to_string()),
            allocated_storage: Some(100),
            apply_immediately: true,
            ..Default::default()
        };

        let instance = modify_instance("staging", &params, &rds).await?;

        assert_eq!(instance.instance_class.as_deref(), Some("db.m3.large"));
        assert_eq!(instance.allocated_storage, Some(100));
        assert_eq!(
            rds.calls(),
            vec![Call::DescribeInstance, Call::ModifyInstance]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_deferred_change_leaves_record_untouched() -> anyhow::Result<()> {
        let rds = SimulatedRds::new().with_instance(existing("staging"));
        let params = ModifyParams {
            instance_class: Some("db.m3.large".to_string()),
            ..Default::default()
        };

        let instance = modify_instance("staging", &params, &rds).await?;

        assert_eq!(instance.instance_class.as_deref(), Some("db.m1.small"));
        assert_eq!(rds.call_count(Call::ModifyInstance), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_request_makes_no_remote_call() {
        let rds = SimulatedRds::new().with_instance(existing("staging"));

        let err = modify_instance("staging", &ModifyParams::default(), &rds)
            .await
            .unwrap_err();
        assert_eq!(err, RdsError::NothingToModify);

        let params = ModifyParams {
            allocated_storage: Some(6145),
            ..Default::default()
        };
        let err = modify_instance("staging", &params, &rds).await.unwrap_err();
        assert_eq!(err.to_string(), "Specify size between 5 and 6144");
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = modify_instance(" ", &params, &rds).await.unwrap_err();
        assert_eq!(err, RdsError::MissingIdentifier);
        assert!(rds.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_instance() {
        let rds = SimulatedRds::new();
        let params = ModifyParams {
            master_password: Some("rotated".to_string()),
            ..Default::default()
        };

        let err = modify_instance("ghost", &params, &rds).await.unwrap_err();

        assert_eq!(err.to_string(), "No such instance ghost");
        assert_eq!(rds.call_count(Call::ModifyInstance), 0);
    }
}
