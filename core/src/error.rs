use std::fmt;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeeperAction {
    Grant,
    Revoke,
}

impl fmt::Display for KeeperAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeeperAction::Grant => write!(f, "grant"),
            KeeperAction::Revoke => write!(f, "revoke"),
        }
    }
}

/// Failures returned by [`crate::KeepersService`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeeperError {
    #[error("{field} must not be empty")]
    Validation { field: &'static str },

    #[error("{actor} is not allowed to {action} stewardship")]
    AccessDenied { actor: String, action: KeeperAction },

    #[error("direction {direction} already has an active keeper ({holder})")]
    DirectionAlreadyActive { direction: String, holder: String },

    #[error("no active keeper {uuid} for direction {direction}")]
    NotFound { uuid: String, direction: String },

    #[error("keeper store unavailable: {0}")]
    StoreUnavailable(String),
}

impl KeeperError {
    /// Stable identifier for outer layers that map errors to their own codes.
    pub fn code(&self) -> &'static str {
        match self {
            KeeperError::Validation { .. } => "validation_error",
            KeeperError::AccessDenied { .. } => "access_denied",
            KeeperError::DirectionAlreadyActive { .. } => "direction_already_active",
            KeeperError::NotFound { .. } => "not_found",
            KeeperError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("direction {direction} is already kept by {holder}")]
    Conflict { direction: String, holder: String },

    #[error("no active keeper record {id}")]
    NotFound { id: String },

    #[error("{0}")]
    Unavailable(String),
}

impl From<StoreError> for KeeperError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { direction, holder } => {
                KeeperError::DirectionAlreadyActive { direction, holder }
            }
            // The service maps misses on mark_inactive to a request-shaped NotFound.
            StoreError::NotFound { id } => {
                KeeperError::StoreUnavailable(format!("keeper record {id} disappeared"))
            }
            StoreError::Unavailable(reason) => KeeperError::StoreUnavailable(reason),
        }
    }
}
