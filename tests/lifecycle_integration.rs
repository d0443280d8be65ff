//! End-to-end lifecycle scenarios against the simulated backend.

use rdstool::rds::simulated::Call;
use rdstool::rds::{
    CreateParams, DeleteRequest, ModifyParams, ResourceStatus, RestoreOverrides, SimulatedRds,
};
use rdstool::{
    ErrorKind, PollConfig, create_instance, delete_instance, duplicate_instance,
    get_last_snapshot, modify_instance, restore_from_snapshot, wait_until_available,
};

fn params(size: i64) -> CreateParams {
    CreateParams {
        instance_class: "db.m1.small".to_string(),
        master_user: "master".to_string(),
        master_password: "master".to_string(),
        allocated_storage: size,
        ..Default::default()
    }
}

#[tokio::test]
async fn create_returns_endpoint() -> anyhow::Result<()> {
    let rds = SimulatedRds::new();
    let endpoint = create_instance("test1", &params(5), &PollConfig::immediate(), &rds).await?;
    assert_eq!(endpoint, "test1.0.us-east-1.rds.amazonaws.com");
    Ok(())
}

#[tokio::test]
async fn create_with_oversized_storage_fails() {
    let rds = SimulatedRds::new();
    let result = create_instance("test1", &params(6145), &PollConfig::immediate(), &rds).await;

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "Specify size between 5 and 6144");
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(rds.instance("test1").is_none());
}

#[tokio::test]
async fn second_create_with_same_identifier_is_rejected() -> anyhow::Result<()> {
    let rds = SimulatedRds::new();
    create_instance("test1", &params(5), &PollConfig::immediate(), &rds).await?;

    let err = create_instance("test1", &params(5), &PollConfig::immediate(), &rds)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Instance test1 already exists");
    assert_eq!(rds.call_count(Call::CreateInstance), 1);
    Ok(())
}

#[tokio::test]
async fn full_lifecycle() -> anyhow::Result<()> {
    let rds = SimulatedRds::new().with_creating_reads(2);
    let poll = PollConfig::immediate();

    let endpoint = create_instance("production", &params(100), &poll, &rds).await?;
    assert_eq!(endpoint, "production.0.us-east-1.rds.amazonaws.com");

    // No snapshots until the instance is deleted behind a final one.
    let err = get_last_snapshot("production", &rds).await.unwrap_err();
    assert_eq!(err.to_string(), "No snapshot found for production instance");

    let request = DeleteRequest::new("production").with_final_snapshot("production-final");
    let record = delete_instance(&request, &poll, &rds).await?;
    assert_eq!(record.instance.status, ResourceStatus::Deleting);

    let snapshot = get_last_snapshot("production", &rds).await?;
    assert_eq!(snapshot.snapshot_identifier, "production-final");
    assert_eq!(snapshot.instance_identifier, "production");

    let restored = restore_from_snapshot(
        "production-restored",
        &snapshot.snapshot_identifier,
        &RestoreOverrides::default(),
        &rds,
    )
    .await?;
    assert_eq!(restored.status, ResourceStatus::Creating);

    let ready = wait_until_available("production-restored", &poll, &rds).await?;
    assert_eq!(ready.status, ResourceStatus::Available);
    assert_eq!(
        ready.endpoint.map(|e| e.address).as_deref(),
        Some("production-restored.0.us-east-1.rds.amazonaws.com")
    );
    Ok(())
}

#[tokio::test]
async fn deleted_identifier_can_be_reused_once_gone() -> anyhow::Result<()> {
    let rds = SimulatedRds::new();
    let poll = PollConfig::immediate();
    create_instance("scratch", &params(5), &poll, &rds).await?;
    delete_instance(&DeleteRequest::new("scratch").skipping_final_snapshot(), &poll, &rds).await?;

    // Still visible while deleting.
    let err = create_instance("scratch", &params(5), &poll, &rds)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Instance scratch already exists");

    let endpoint = create_instance("scratch", &params(5), &poll, &rds).await?;
    assert_eq!(endpoint, "scratch.0.us-east-1.rds.amazonaws.com");
    Ok(())
}

#[tokio::test]
async fn duplicate_clones_from_final_snapshot() -> anyhow::Result<()> {
    let rds = SimulatedRds::new().with_creating_reads(1);
    let poll = PollConfig::immediate();
    create_instance("production", &params(20), &poll, &rds).await?;
    delete_instance(
        &DeleteRequest::new("production").with_final_snapshot("production-final"),
        &poll,
        &rds,
    )
    .await?;

    let overrides = RestoreOverrides {
        availability_zone: Some("eu-west-1b".to_string()),
        ..Default::default()
    };
    let endpoint = duplicate_instance("production", "staging", &overrides, &poll, &rds).await?;
    assert_eq!(endpoint, "staging.0.eu-west-1.rds.amazonaws.com");
    Ok(())
}

#[tokio::test]
async fn clone_is_resized_after_restore() -> anyhow::Result<()> {
    let rds = SimulatedRds::new();
    let poll = PollConfig::immediate();
    create_instance("production", &params(20), &poll, &rds).await?;
    delete_instance(
        &DeleteRequest::new("production").with_final_snapshot("production-final"),
        &poll,
        &rds,
    )
    .await?;
    duplicate_instance("production", "staging", &RestoreOverrides::default(), &poll, &rds).await?;

    let changes = ModifyParams {
        instance_class: Some("db.m3.medium".to_string()),
        allocated_storage: Some(40),
        master_password: Some("staging-secret".to_string()),
        apply_immediately: true,
    };
    let staging = modify_instance("staging", &changes, &rds).await?;
    assert_eq!(staging.instance_class.as_deref(), Some("db.m3.medium"));
    assert_eq!(staging.allocated_storage, Some(40));
    assert_eq!(staging.status, ResourceStatus::Available);
    Ok(())
}
