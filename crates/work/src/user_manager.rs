//! User management.

use taskhub_core::{Error, Result, User, UserUpdate};
use taskhub_storage::RecordStore;
use tracing::{debug, info};

/// Owns the user store and enforces identity rules.
///
/// Adding a user whose id already exists overwrites it entirely. Removing a
/// user never touches tasks that still reference it.
#[derive(Debug, Default)]
pub struct UserManager {
    users: RecordStore<User>,
}

impl UserManager {
    /// Create a manager with an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or fully overwrite a user. The id must not be blank.
    pub fn add_user(&self, user: User) -> Result<()> {
        validate(&user)?;
        let id = user.id.clone();
        match self.users.put(id.as_str(), user) {
            Some(_) => info!(user_id = %id, "User overwritten"),
            None => info!(user_id = %id, "User added"),
        }
        Ok(())
    }

    /// Insert only if the id is free. Returns whether the user was added;
    /// an existing user is left untouched.
    pub fn add_user_if_absent(&self, user: User) -> Result<bool> {
        validate(&user)?;
        let id = user.id.clone();
        let added = self.users.insert_new(id.as_str(), user);
        if added {
            info!(user_id = %id, "User added");
        }
        Ok(added)
    }

    /// Look up a user.
    pub fn get_user(&self, id: &str) -> Option<User> {
        self.users.get(id)
    }

    /// Whether a user with `id` exists.
    pub fn contains(&self, id: &str) -> bool {
        self.users.contains(id)
    }

    /// Snapshot of every user.
    pub fn get_all_users(&self) -> Vec<User> {
        self.users.list_all()
    }

    /// Change some fields of an existing user.
    pub fn update_user(&self, id: &str, update: &UserUpdate) -> Result<User> {
        let user = self
            .users
            .try_update(id, |user| {
                update.apply(user)?;
                Ok::<_, Error>(user.clone())
            })?
            .ok_or_else(|| Error::user_not_found(id))?;

        debug!(user_id = id, "User updated");
        Ok(user)
    }

    /// Delete a user. Returns `false` if it was not there.
    pub fn remove_user(&self, id: &str) -> bool {
        let removed = self.users.remove(id);
        if removed {
            info!(user_id = id, "User removed");
        }
        removed
    }

    /// Number of users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// True when there are no users.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Replace every user with a persisted snapshot.
    pub fn restore(&self, users: Vec<User>) {
        let count = users.len();
        self.users
            .replace_all(users.into_iter().map(|user| (user.id.to_string(), user)));
        debug!(count, "Users restored");
    }
}

fn validate(user: &User) -> Result<()> {
    if user.id.is_blank() {
        return Err(Error::invalid("invalid user data: id cannot be empty"));
    }
    Ok(())
}
