//! Lifecycle orchestration for managed database instances.
//!
//! Creates instances and waits for them to become available, changes their
//! class, storage or password, finds their latest snapshot, restores new
//! instances from snapshots and deletes instances behind a final snapshot. All remote state lives behind the
//! [`rds::RdsOperations`] trait.

pub mod config;
pub mod decommission;
pub mod errors;
pub mod provision;
pub mod rds;
pub mod restore;
pub mod snapshot;
pub mod wait;

pub use config::{AppConfig, PollConfig};
pub use decommission::delete_instance;
pub use errors::{ErrorKind, RdsError, Result};
pub use provision::{create_instance, modify_instance, wait_until_available};
pub use restore::{duplicate_instance, restore_from_snapshot};
pub use snapshot::get_last_snapshot;
