//! Accounts: registration, lookup and password authentication.

use super::{METADATA, Store, USERNAMES, USERS, allocate, io, load, save};
use crate::password::{hash_password, verify_missing_user, verify_password};
use crate::types::{EducaError, Role, User, UserId};
use crate::validation;
use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable, ReadableTableMetadata};

impl Store {
    /// Register a new account. Usernames are unique (case-sensitive).
    pub fn create_user(&self, username: &str, password: &str, role: Role) -> Result<User, EducaError> {
        let username = validation::username(username)?;
        validation::password(password)?;
        // Hashing is slow on purpose; keep it outside the write transaction.
        let password_hash = hash_password(password);

        let write_txn = self.db.begin_write().map_err(io)?;
        let user = {
            let mut usernames = write_txn.open_table(USERNAMES).map_err(io)?;
            if usernames.get(username.as_str()).map_err(io)?.is_some() {
                return Err(EducaError::Conflict(format!(
                    "a user with username '{username}' already exists"
                )));
            }
            let mut meta = write_txn.open_table(METADATA).map_err(io)?;
            let id = UserId(allocate(&mut meta, "next_user_id")?);

            let user = User {
                id,
                username,
                password_hash,
                role,
                date_joined: Utc::now(),
            };
            let mut users = write_txn.open_table(USERS).map_err(io)?;
            save(&mut users, id.0, &user)?;
            usernames.insert(user.username.as_str(), id.0).map_err(io)?;
            user
        };
        write_txn.commit().map_err(io)?;
        Ok(user)
    }

    pub fn user(&self, id: UserId) -> Result<Option<User>, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let users = read_txn.open_table(USERS).map_err(io)?;
        load(&users, id.0)
    }

    pub fn user_by_username(&self, username: &str) -> Result<Option<User>, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let usernames = read_txn.open_table(USERNAMES).map_err(io)?;
        let Some(id) = usernames.get(username).map_err(io)?.map(|v| v.value()) else {
            return Ok(None);
        };
        let users = read_txn.open_table(USERS).map_err(io)?;
        load(&users, id)
    }

    /// Check credentials. Unknown usernames and wrong passwords both yield
    /// `None` after the same hashing work.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>, EducaError> {
        let Some(user) = self.user_by_username(username)? else {
            verify_missing_user(password);
            return Ok(None);
        };
        if verify_password(password, &user.password_hash) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub fn user_count(&self) -> Result<u64, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        read_txn.open_table(USERS).map_err(io)?.len().map_err(io)
    }

    /// Promote or demote an account.
    pub fn set_role(&self, id: UserId, role: Role) -> Result<User, EducaError> {
        let write_txn = self.db.begin_write().map_err(io)?;
        let user = {
            let mut users = write_txn.open_table(USERS).map_err(io)?;
            let mut user: User =
                load(&users, id.0)?.ok_or_else(|| EducaError::not_found("user", id))?;
            user.role = role;
            save(&mut users, id.0, &user)?;
            user
        };
        write_txn.commit().map_err(io)?;
        Ok(user)
    }
}

// =============================================================================
// TESTS
// =============================================================================
