//! User model - a collaborator tasks can be assigned to.

use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::id::UserId;

/// A collaborator. The id is chosen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: UserId,

    /// Display name
    pub name: String,

    /// Contact email
    pub email: String,
}

impl User {
    /// Create a new user.
    pub fn new(id: impl Into<UserId>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
        }
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.email)
    }
}

/// Partial update for a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    /// New name (must not be blank)
    pub name: Option<String>,

    /// New email (must not be blank)
    pub email: Option<String>,
}

impl UserUpdate {
    /// Apply to `user`. Nothing is changed if validation fails.
    pub fn apply(&self, user: &mut User) -> Result<()> {
        let name = self.name.as_deref().map(str::trim);
        let email = self.email.as_deref().map(str::trim);

        if name.is_some_and(str::is_empty) {
            return Err(Error::invalid("user name cannot be empty"));
        }
        if email.is_some_and(str::is_empty) {
            return Err(Error::invalid("user email cannot be empty"));
        }

        if let Some(name) = name {
            user.name = name.to_string();
        }
        if let Some(email) = email {
            user.email = email.to_string();
        }
        Ok(())
    }
}
