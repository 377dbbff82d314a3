//! Error taxonomy for record operations.

/// Result alias for record operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised synchronously at the call that received bad input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A required field is absent, empty, or malformed
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A value outside a closed enumeration
    #[error("invalid {kind}: {value:?}")]
    InvalidEnumeration {
        /// Name of the enumeration
        kind: &'static str,
        /// The rejected input
        value: String,
    },

    /// The addressed record does not exist
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind ("task", "user")
        kind: &'static str,
        /// The identifier that was looked up
        id: String,
    },
}

impl Error {
    /// Shorthand for [`Error::InvalidArgument`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Shorthand for a missing task.
    pub fn task_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound { kind: "task", id: id.to_string() }
    }

    /// Shorthand for a missing user.
    pub fn user_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound { kind: "user", id: id.to_string() }
    }

    /// Whether this is a [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
