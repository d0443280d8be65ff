// rdstool/src/provision/validation.rs
use crate::errors::{RdsError, Result};
use crate::rds::{CreateParams, MAX_ALLOCATED_STORAGE, MIN_ALLOCATED_STORAGE, ModifyParams};

/// Checks creation parameters before anything is sent to the provider.
///
/// Rules are applied in a fixed order and only the first violation is
/// reported: master user, then master password, then storage size.
pub fn validate_create_params(params: &CreateParams) -> Result<()> {
    if params.master_user.is_empty() {
        return Err(RdsError::MissingMasterUser);
    }
    if params.master_password.is_empty() {
        return Err(RdsError::MissingMasterPassword);
    }
    if !(MIN_ALLOCATED_STORAGE..=MAX_ALLOCATED_STORAGE).contains(&params.allocated_storage) {
        return Err(RdsError::StorageOutOfRange(params.allocated_storage));
    }
    Ok(())
}

/// Checks a modification request the same way, skipping unset fields.
pub fn validate_modify_params(params: &ModifyParams) -> Result<()> {
    if params.is_empty() {
        return Err(RdsError::NothingToModify);
    }
    if params.master_password.as_deref().is_some_and(str::is_empty) {
        return Err(RdsError::MissingMasterPassword);
    }
    if let Some(size) = params
        .allocated_storage
        .filter(|size| !(MIN_ALLOCATED_STORAGE..=MAX_ALLOCATED_STORAGE).contains(size))
    {
        return Err(RdsError::StorageOutOfRange(size));
    }
    Ok(())
}

pub fn require_identifier(identifier: &str) -> Result<()> {
    if identifier.trim().is_empty() {
        return Err(RdsError::MissingIdentifier);
    }
    Ok(())
}
