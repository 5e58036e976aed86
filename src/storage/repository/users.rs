// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User credential repository.
//!
//! Users are stored as JSON under their id; `user_emails` maps each email to
//! its user id and is the uniqueness constraint for registration.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};

use super::super::database::{USERS, USER_EMAILS};
use super::super::{LedgerDatabase, StorageError, StorageResult};
use crate::auth::Role;

/// User credential record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    /// Unique user identifier (UUID)
    pub id: String,
    pub name: String,
    /// Unique login email
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Repository for user credentials.
pub struct UserRepository<'a> {
    db: &'a LedgerDatabase,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a LedgerDatabase) -> Self {
        Self { db }
    }

    /// Insert a new user.
    ///
    /// # Errors
    /// `StorageError::AlreadyExists` if the email is already registered.
    pub fn create(&self, user: &StoredUser) -> StorageResult<()> {
        let json = serde_json::to_vec(user)?;

        let write_txn = self.db.raw().begin_write()?;
        {
            let mut emails = write_txn.open_table(USER_EMAILS)?;
            if emails.get(user.email.as_str())?.is_some() {
                drop(emails);
                write_txn.abort()?;
                return Err(StorageError::AlreadyExists(format!("Email {}", user.email)));
            }
            emails.insert(user.email.as_str(), user.id.as_str())?;

            let mut users = write_txn.open_table(USERS)?;
            users.insert(user.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a user by ID.
    pub fn get(&self, user_id: &str) -> StorageResult<StoredUser> {
        let read_txn = self.db.raw().begin_read()?;
        let users = read_txn.open_table(USERS)?;
        let user = match users.get(user_id)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Err(StorageError::NotFound(format!("User {user_id}"))),
        };
        Ok(user)
    }

    /// Look up a user by exact email.
    pub fn find_by_email(&self, email: &str) -> StorageResult<Option<StoredUser>> {
        let read_txn = self.db.raw().begin_read()?;
        let emails = read_txn.open_table(USER_EMAILS)?;
        let Some(user_id) = emails.get(email)? else {
            return Ok(None);
        };

        let users = read_txn.open_table(USERS)?;
        let user = match users.get(user_id.value())? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Err(StorageError::NotFound(format!("User {}", user_id.value()))),
        };
        Ok(Some(user))
    }
}
