//! In-memory stand-in for the remote database service
//!
//! Behaves like a small RDS: validates requests the way the provider does,
//! keeps instances in `creating` for a configurable number of reads, hands out
//! endpoints in the `<id>.0.<region>.rds.amazonaws.com` form and drops deleted
//! instances once they have been observed in `deleting`. Snapshots can be held
//! in `creating` too and made to settle in any status. Every call is recorded
//! and any one of them can be made to fail, so tests can assert which remote
//! operations were (not) issued.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::operations::RdsOperations;
use super::types::{
    CreateParams, DeleteRequest, DeletionRecord, Endpoint, Instance, MAX_ALLOCATED_STORAGE,
    MIN_ALLOCATED_STORAGE, ModifyParams, ResourceStatus, RestoreOverrides, Snapshot,
};
use crate::errors::{RdsError, Result};

pub const DEFAULT_AVAILABILITY_ZONE: &str = "us-east-1c";
pub const DEFAULT_PORT: i32 = 5432;

/// Remote operation recorded by [`SimulatedRds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    DescribeInstance,
    CreateInstance,
    DeleteInstance,
    RestoreInstance,
    ModifyInstance,
    ListSnapshots,
    TakeFinalSnapshot,
    DescribeSnapshot,
}

struct SimInstance {
    instance: Instance,
    /// Reads left before a `creating` instance turns available
    creating_reads_left: u32,
}

/// Failure armed for the `nth` call (1-based) of one kind.
struct InjectedFailure {
    call: Call,
    nth: usize,
    err: RdsError,
}

#[derive(Default)]
struct SimState {
    instances: Vec<SimInstance>,
    snapshots: Vec<Snapshot>,
    /// Reads left before a `creating` snapshot settles, keyed by snapshot id
    snapshot_reads: HashMap<String, u32>,
    calls: Vec<Call>,
    failures: Vec<InjectedFailure>,
}

impl SimState {
    /// Record `call` and hand back an injected failure, if one is armed for it.
    fn record(&mut self, call: Call) -> Result<()> {
        self.calls.push(call);
        let nth = self.count(call);
        match self
            .failures
            .iter()
            .position(|f| f.call == call && f.nth == nth)
        {
            Some(idx) => Err(self.failures.remove(idx).err),
            None => Ok(()),
        }
    }

    fn count(&self, call: Call) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    fn position(&self, identifier: &str) -> Option<usize> {
        self.instances
            .iter()
            .position(|i| i.instance.identifier == identifier)
    }
}

#[derive(Default)]
pub struct SimulatedRds {
    state: Mutex<SimState>,
    creating_reads: u32,
    snapshot_creating_reads: u32,
    snapshot_outcome: Option<ResourceStatus>,
}

/// `us-east-1c` -> `us-east-1`
fn region_of(availability_zone: &str) -> &str {
    let mut chars = availability_zone.chars();
    chars.next_back();
    chars.as_str()
}

fn missing_field(input: &str, field: &str) -> RdsError {
    RdsError::remote(
        Some("InvalidParameterValue"),
        format!("missing required field, {}.{}", input, field),
    )
}

fn invalid_parameter(message: &str) -> RdsError {
    RdsError::remote(Some("InvalidParameterValue"), message)
}

impl SimulatedRds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep new instances in `creating` for `reads` describe calls before
    /// they become available. Zero flips them on the first read.
    pub fn with_creating_reads(mut self, reads: u32) -> Self {
        self.creating_reads = reads;
        self
    }

    /// Keep new snapshots in `creating` for `reads` describe calls. Zero
    /// makes them settle as soon as they are taken.
    pub fn with_snapshot_creating_reads(mut self, reads: u32) -> Self {
        self.snapshot_creating_reads = reads;
        self
    }

    /// Status new snapshots settle in; `available` unless set.
    pub fn with_snapshot_outcome(mut self, status: ResourceStatus) -> Self {
        self.snapshot_outcome = Some(status);
        self
    }

    pub fn with_instance(self, instance: Instance) -> Self {
        self.add_instance(instance);
        self
    }

    pub fn with_snapshots(self, snapshots: Vec<Snapshot>) -> Self {
        self.state().snapshots.extend(snapshots);
        self
    }

    pub fn add_instance(&self, instance: Instance) {
        self.state().instances.push(SimInstance {
            instance,
            creating_reads_left: self.creating_reads,
        });
    }

    /// Make the next call of kind `call` fail with `err`.
    pub fn fail_next(&self, call: Call, err: RdsError) {
        let mut state = self.state();
        let nth = state.count(call) + 1;
        state.failures.push(InjectedFailure { call, nth, err });
    }

    /// Make the `nth` call (1-based, counted from construction) of kind
    /// `call` fail with `err`.
    pub fn fail_on(&self, call: Call, nth: usize, err: RdsError) {
        self.state().failures.push(InjectedFailure { call, nth, err });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, call: Call) -> usize {
        self.state().count(call)
    }

    /// Current record for `identifier`, read without side effects.
    pub fn instance(&self, identifier: &str) -> Option<Instance> {
        let state = self.state();
        state
            .position(identifier)
            .map(|idx| state.instances[idx].instance.clone())
    }

    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.state().snapshots.clone()
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn new_instance(
        &self,
        identifier: &str,
        availability_zone: Option<&str>,
        instance_class: Option<String>,
        allocated_storage: Option<i64>,
        engine: Option<String>,
    ) -> SimInstance {
        let az = availability_zone.unwrap_or(DEFAULT_AVAILABILITY_ZONE);
        SimInstance {
            instance: Instance {
                identifier: identifier.to_string(),
                instance_class,
                allocated_storage,
                status: ResourceStatus::Creating,
                availability_zone: Some(az.to_string()),
                endpoint: None,
                engine,
                arn: Some(format!("arn:aws:rds:{}:0:db:{}", region_of(az), identifier)),
            },
            creating_reads_left: self.creating_reads,
        }
    }

    fn settled_snapshot_status(&self) -> ResourceStatus {
        self.snapshot_outcome
            .clone()
            .unwrap_or(ResourceStatus::Available)
    }

    fn capture_snapshot(
        &self,
        state: &mut SimState,
        identifier: &str,
        snapshot_id: &str,
    ) -> Result<Snapshot> {
        if state
            .snapshots
            .iter()
            .any(|s| s.snapshot_identifier == snapshot_id)
        {
            return Err(RdsError::remote(
                Some("DBSnapshotAlreadyExists"),
                format!("Snapshot {} already exists", snapshot_id),
            ));
        }
        let status = if self.snapshot_creating_reads > 0 {
            state
                .snapshot_reads
                .insert(snapshot_id.to_string(), self.snapshot_creating_reads);
            ResourceStatus::Creating
        } else {
            self.settled_snapshot_status()
        };
        let snapshot = Snapshot {
            instance_identifier: identifier.to_string(),
            snapshot_identifier: snapshot_id.to_string(),
            status,
            created_at: Some(Utc::now()),
        };
        state.snapshots.push(snapshot.clone());
        Ok(snapshot)
    }
}

impl RdsOperations for SimulatedRds {
    async fn describe_instance(&self, identifier: &str) -> Result<Instance> {
        let mut state = self.state();
        state.record(Call::DescribeInstance)?;

        let idx = state
            .position(identifier)
            .ok_or_else(|| RdsError::InstanceNotFound(identifier.to_string()))?;

        if state.instances[idx].instance.status == ResourceStatus::Deleting {
            return Ok(state.instances.remove(idx).instance);
        }

        let entry = &mut state.instances[idx];
        let status = entry.instance.status.clone();
        match status {
            ResourceStatus::Creating if entry.creating_reads_left > 0 => {
                entry.creating_reads_left -= 1;
            }
            ResourceStatus::Creating => {
                let az = entry
                    .instance
                    .availability_zone
                    .clone()
                    .unwrap_or_else(|| DEFAULT_AVAILABILITY_ZONE.to_string());
                entry.instance.endpoint = Some(Endpoint {
                    address: format!("{}.0.{}.rds.amazonaws.com", identifier, region_of(&az)),
                    port: DEFAULT_PORT,
                });
                entry.instance.status = ResourceStatus::Available;
            }
            _ => {}
        }
        Ok(entry.instance.clone())
    }

    async fn create_instance(&self, identifier: &str, params: &CreateParams) -> Result<Instance> {
        let mut state = self.state();
        state.record(Call::CreateInstance)?;

        if identifier.is_empty() {
            return Err(missing_field("CreateDBInstanceInput", "DBInstanceIdentifier"));
        }
        if params.instance_class.is_empty() {
            return Err(missing_field("CreateDBInstanceInput", "DBInstanceClass"));
        }
        if params.engine.is_empty() {
            return Err(missing_field("CreateDBInstanceInput", "Engine"));
        }
        if params.master_user.is_empty() {
            return Err(invalid_parameter("Specify Master User"));
        }
        if params.master_password.is_empty() {
            return Err(invalid_parameter("Specify Master User Password"));
        }
        if !(MIN_ALLOCATED_STORAGE..=MAX_ALLOCATED_STORAGE).contains(&params.allocated_storage) {
            return Err(invalid_parameter("Specify size between 5 and 6144"));
        }
        if state.position(identifier).is_some() {
            return Err(RdsError::remote(
                Some("DBInstanceAlreadyExists"),
                "DB instance already exists",
            ));
        }

        let entry = self.new_instance(
            identifier,
            params.availability_zone.as_deref(),
            Some(params.instance_class.clone()),
            Some(params.allocated_storage),
            Some(params.engine.clone()),
        );
        let instance = entry.instance.clone();
        state.instances.push(entry);
        Ok(instance)
    }

    async fn delete_instance(&self, request: &DeleteRequest) -> Result<DeletionRecord> {
        let mut state = self.state();
        state.record(Call::DeleteInstance)?;

        if request.identifier.is_empty() {
            return Err(missing_field("DeleteDBInstanceInput", "DBInstanceIdentifier"));
        }
        let idx = state
            .position(&request.identifier)
            .ok_or_else(|| RdsError::InstanceNotFound(request.identifier.clone()))?;

        let final_snapshot = if request.skip_final_snapshot {
            None
        } else {
            let snapshot_id = request
                .final_snapshot_id()
                .ok_or_else(|| invalid_parameter("Final Snapshot ID not specified"))?;
            Some(self.capture_snapshot(&mut state, &request.identifier, snapshot_id)?)
        };

        let entry = &mut state.instances[idx];
        entry.instance.status = ResourceStatus::Deleting;
        Ok(DeletionRecord {
            instance: entry.instance.clone(),
            final_snapshot,
        })
    }

    async fn restore_instance_from_snapshot(
        &self,
        identifier: &str,
        snapshot_id: &str,
        overrides: &RestoreOverrides,
    ) -> Result<Instance> {
        let mut state = self.state();
        state.record(Call::RestoreInstance)?;

        if identifier.is_empty() {
            return Err(missing_field(
                "RestoreDBInstanceFromDBSnapshotInput",
                "DBInstanceIdentifier",
            ));
        }
        if snapshot_id.is_empty() {
            return Err(missing_field(
                "RestoreDBInstanceFromDBSnapshotInput",
                "DBSnapshotIdentifier",
            ));
        }
        if !state
            .snapshots
            .iter()
            .any(|s| s.snapshot_identifier == snapshot_id)
        {
            return Err(RdsError::SnapshotNotFound(snapshot_id.to_string()));
        }
        if state.position(identifier).is_some() {
            return Err(RdsError::remote(
                Some("DBInstanceAlreadyExists"),
                "DB instance already exists",
            ));
        }

        let entry = self.new_instance(
            identifier,
            overrides.availability_zone.as_deref(),
            overrides.instance_class.clone(),
            None,
            overrides.engine.clone(),
        );
        let instance = entry.instance.clone();
        state.instances.push(entry);
        Ok(instance)
    }

    async fn modify_instance(&self, identifier: &str, params: &ModifyParams) -> Result<Instance> {
        let mut state = self.state();
        state.record(Call::ModifyInstance)?;

        if identifier.is_empty() {
            return Err(missing_field("ModifyDBInstanceInput", "DBInstanceIdentifier"));
        }
        if params
            .allocated_storage
            .is_some_and(|size| !(MIN_ALLOCATED_STORAGE..=MAX_ALLOCATED_STORAGE).contains(&size))
        {
            return Err(invalid_parameter("Specify size between 5 and 6144"));
        }
        let idx = state
            .position(identifier)
            .ok_or_else(|| RdsError::InstanceNotFound(identifier.to_string()))?;

        // Deferred changes wait for a maintenance window that never comes here.
        let entry = &mut state.instances[idx];
        if params.apply_immediately {
            if let Some(class) = &params.instance_class {
                entry.instance.instance_class = Some(class.clone());
            }
            if let Some(size) = params.allocated_storage {
                entry.instance.allocated_storage = Some(size);
            }
        }
        Ok(entry.instance.clone())
    }

    async fn list_snapshots(&self, instance_identifier: Option<&str>) -> Result<Vec<Snapshot>> {
        let mut state = self.state();
        state.record(Call::ListSnapshots)?;

        Ok(state
            .snapshots
            .iter()
            .filter(|s| instance_identifier.is_none_or(|id| s.instance_identifier == id))
            .cloned()
            .collect())
    }

    async fn take_final_snapshot(&self, identifier: &str, snapshot_id: &str) -> Result<Snapshot> {
        let mut state = self.state();
        state.record(Call::TakeFinalSnapshot)?;

        if snapshot_id.is_empty() {
            return Err(invalid_parameter("Final Snapshot ID not specified"));
        }
        if state.position(identifier).is_none() {
            return Err(RdsError::InstanceNotFound(identifier.to_string()));
        }
        self.capture_snapshot(&mut state, identifier, snapshot_id)
    }

    async fn describe_snapshot(&self, snapshot_id: &str) -> Result<Snapshot> {
        let mut guard = self.state();
        guard.record(Call::DescribeSnapshot)?;
        let state = &mut *guard;

        let snapshot = state
            .snapshots
            .iter_mut()
            .find(|s| s.snapshot_identifier == snapshot_id)
            .ok_or_else(|| RdsError::SnapshotNotFound(snapshot_id.to_string()))?;

        match state.snapshot_reads.get_mut(snapshot_id) {
            Some(left) if *left > 0 => *left -= 1,
            Some(_) => {
                state.snapshot_reads.remove(snapshot_id);
                snapshot.status = self.settled_snapshot_status();
            }
            None => {}
        }
        Ok(snapshot.clone())
    }
}
