//! Records exchanged with the remote database service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_ALLOCATED_STORAGE: i64 = 5;
pub const MAX_ALLOCATED_STORAGE: i64 = 6144;
pub const DEFAULT_ENGINE: &str = "postgres";

/// Lifecycle status of an instance or snapshot as reported by the provider.
///
/// Only the states the orchestrator reasons about get their own variant;
/// anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ResourceStatus {
    Creating,
    Available,
    Deleting,
    Other(String),
}

impl ResourceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceStatus::Creating => "creating",
            ResourceStatus::Available => "available",
            ResourceStatus::Deleting => "deleting",
            ResourceStatus::Other(s) => s,
        }
    }
}

impl From<&str> for ResourceStatus {
    fn from(s: &str) -> Self {
        match s {
            "creating" => ResourceStatus::Creating,
            "available" => ResourceStatus::Available,
            "deleting" => ResourceStatus::Deleting,
            other => ResourceStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for ResourceStatus {
    fn from(s: String) -> Self {
        ResourceStatus::from(s.as_str())
    }
}

impl From<ResourceStatus> for String {
    fn from(status: ResourceStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub address: String,
    pub port: i32,
}

/// A provisioned database instance. The remote service owns this state;
/// callers re-read it instead of caching it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub identifier: String,
    pub instance_class: Option<String>,
    pub allocated_storage: Option<i64>,
    pub status: ResourceStatus,
    pub availability_zone: Option<String>,
    /// Populated once the instance is available.
    pub endpoint: Option<Endpoint>,
    pub engine: Option<String>,
    pub arn: Option<String>,
}

/// Parameters for a single create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateParams {
    pub instance_class: String,
    pub master_user: String,
    pub master_password: String,
    pub allocated_storage: i64,
    pub engine: String,
    pub availability_zone: Option<String>,
}

impl Default for CreateParams {
    fn default() -> Self {
        Self {
            instance_class: String::new(),
            master_user: String::new(),
            master_password: String::new(),
            allocated_storage: 0,
            engine: DEFAULT_ENGINE.to_string(),
            availability_zone: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub instance_identifier: String,
    pub snapshot_identifier: String,
    pub status: ResourceStatus,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteRequest {
    pub identifier: String,
    /// When false a final snapshot is required.
    pub skip_final_snapshot: bool,
    pub final_snapshot_id: Option<String>,
}

impl DeleteRequest {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    pub fn with_final_snapshot(mut self, snapshot_id: impl Into<String>) -> Self {
        self.final_snapshot_id = Some(snapshot_id.into());
        self
    }

    pub fn skipping_final_snapshot(mut self) -> Self {
        self.skip_final_snapshot = true;
        self
    }

    /// Final snapshot identifier, treating a blank string as absent.
    pub fn final_snapshot_id(&self) -> Option<&str> {
        self.final_snapshot_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}

/// Result of a delete call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionRecord {
    pub instance: Instance,
    pub final_snapshot: Option<Snapshot>,
}

/// Changes applied to an existing instance. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifyParams {
    pub instance_class: Option<String>,
    pub allocated_storage: Option<i64>,
    pub master_password: Option<String>,
    /// Apply now rather than in the next maintenance window
    pub apply_immediately: bool,
}

impl ModifyParams {
    pub fn is_empty(&self) -> bool {
        self.instance_class.is_none()
            && self.allocated_storage.is_none()
            && self.master_password.is_none()
    }
}

/// Settings applied to an instance restored from a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreOverrides {
    pub instance_class: Option<String>,
    pub availability_zone: Option<String>,
    pub engine: Option<String>,
}
