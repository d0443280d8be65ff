//! Remote database service: capability trait, AWS client and simulated backend

mod client;
mod operations;
pub mod simulated;
mod types;

pub use client::RdsClient;
pub use operations::RdsOperations;
pub use simulated::SimulatedRds;
pub use types::{
    CreateParams, DEFAULT_ENGINE, DeleteRequest, DeletionRecord, Endpoint, Instance,
    MAX_ALLOCATED_STORAGE, MIN_ALLOCATED_STORAGE, ModifyParams, ResourceStatus, RestoreOverrides,
    Snapshot,
};
