use thiserror::Error;

/// Broad category of an [`RdsError`], used by callers that only care about
/// where a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Local precondition failed (collision, missing field, exhausted wait).
    Precondition,
    /// Creation parameters rejected by the validation layer.
    Validation,
    /// Failure reported by the remote service, passed through untouched.
    Remote,
    /// Instance or snapshot does not exist.
    NotFound,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RdsError {
    #[error("Instance {0} already exists")]
    AlreadyExists(String),

    #[error("Instance identifier not specified")]
    MissingIdentifier,

    #[error("Snapshot ID not specified")]
    MissingSnapshotId,

    #[error("Final Snapshot ID not specified")]
    MissingFinalSnapshotId,

    #[error("No modification specified")]
    NothingToModify,

    #[error("Instance {0} has no endpoint")]
    MissingEndpoint(String),

    #[error("Gave up waiting for {resource} after {attempts} attempts")]
    PollAttemptsExhausted { resource: String, attempts: u32 },

    #[error("Specify Master User")]
    MissingMasterUser,

    #[error("Specify Master User Password")]
    MissingMasterPassword,

    #[error("Specify size between 5 and 6144")]
    StorageOutOfRange(i64),

    #[error("No such instance {0}")]
    InstanceNotFound(String),

    #[error("No such snapshot {0}")]
    SnapshotNotFound(String),

    #[error("No snapshot found for {0} instance")]
    NoSnapshot(String),

    #[error("Final snapshot {snapshot_id} ended in status {status}")]
    FinalSnapshotFailed { snapshot_id: String, status: String },

    // Provider messages are shown verbatim.
    #[error("{message}")]
    Remote {
        code: Option<String>,
        message: String,
    },
}

impl RdsError {
    pub fn remote(code: Option<&str>, message: impl Into<String>) -> Self {
        RdsError::Remote {
            code: code.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RdsError::AlreadyExists(_)
            | RdsError::MissingIdentifier
            | RdsError::MissingSnapshotId
            | RdsError::MissingFinalSnapshotId
            | RdsError::NothingToModify
            | RdsError::MissingEndpoint(_)
            | RdsError::PollAttemptsExhausted { .. } => ErrorKind::Precondition,
            RdsError::MissingMasterUser
            | RdsError::MissingMasterPassword
            | RdsError::StorageOutOfRange(_) => ErrorKind::Validation,
            RdsError::Remote { .. } | RdsError::FinalSnapshotFailed { .. } => ErrorKind::Remote,
            RdsError::InstanceNotFound(_)
            | RdsError::SnapshotNotFound(_)
            | RdsError::NoSnapshot(_) => ErrorKind::NotFound,
        }
    }

    /// True when the remote service reported that the instance does not exist.
    pub fn is_instance_not_found(&self) -> bool {
        matches!(self, RdsError::InstanceNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, RdsError>;
