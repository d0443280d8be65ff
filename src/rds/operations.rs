//! Capability trait over the remote database service

use super::types::{
    CreateParams, DeleteRequest, DeletionRecord, Instance, ModifyParams, RestoreOverrides, Snapshot,
};
use crate::errors::Result;

/// Operations the orchestrator needs from the remote service.
///
/// Implemented by [`super::RdsClient`] against AWS and by
/// [`super::SimulatedRds`] in memory, so lifecycle logic can be exercised
/// without a network.
#[allow(async_fn_in_trait)] // Used through generics only, never boxed
pub trait RdsOperations: Send + Sync {
    /// Fetch one instance, failing with `InstanceNotFound` if it is absent.
    async fn describe_instance(&self, identifier: &str) -> Result<Instance>;

    async fn create_instance(&self, identifier: &str, params: &CreateParams) -> Result<Instance>;

    async fn delete_instance(&self, request: &DeleteRequest) -> Result<DeletionRecord>;

    async fn restore_instance_from_snapshot(
        &self,
        identifier: &str,
        snapshot_id: &str,
        overrides: &RestoreOverrides,
    ) -> Result<Instance>;

    async fn modify_instance(&self, identifier: &str, params: &ModifyParams) -> Result<Instance>;

    /// List snapshots in provider order, optionally only those of one instance.
    async fn list_snapshots(&self, instance_identifier: Option<&str>) -> Result<Vec<Snapshot>>;

    /// Capture a snapshot of `identifier` ahead of its deletion.
    async fn take_final_snapshot(&self, identifier: &str, snapshot_id: &str) -> Result<Snapshot>;

    /// Fetch one snapshot, failing with `SnapshotNotFound` if it is absent.
    async fn describe_snapshot(&self, snapshot_id: &str) -> Result<Snapshot>;
}
