//! Errors surfaced by the hub.

use taskhub_storage::StorageError;

/// Everything a [`TaskHub`](crate::TaskHub) operation can fail with.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// Rejected by a manager (bad input, unknown id, bad enum value)
    #[error(transparent)]
    Record(#[from] taskhub_core::Error),

    /// Persistence failure while loading or saving a snapshot
    #[error("storage: {0}")]
    Storage(#[from] StorageError),
}

impl HubError {
    /// The manager error, if this is one.
    pub fn as_record(&self) -> Option<&taskhub_core::Error> {
        match self {
            HubError::Record(e) => Some(e),
            HubError::Storage(_) => None,
        }
    }
}
