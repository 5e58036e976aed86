// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded ledger database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized StoredUser
//! - `user_emails`: email → user_id (uniqueness index)
//! - `loans`: loan_id → serialized Loan
//! - `owner_loans`: composite key (owner|created_at_be|loan_id) → loan_id
//! - `audit_events`: composite key (timestamp_be|event_id) → serialized AuditEvent

use std::path::Path;

use redb::{Database, ReadableDatabase, TableDefinition};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary user table: user_id → JSON bytes.
pub(super) const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Email index: email → user_id.
pub(super) const USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails");

/// Primary loan table: loan_id → JSON bytes.
pub(super) const LOANS: TableDefinition<&str, &[u8]> = TableDefinition::new("loans");

/// Index: `owner | created_at_be | loan_id` → loan_id, oldest first.
pub(super) const OWNER_LOANS: TableDefinition<&[u8], &str> = TableDefinition::new("owner_loans");

/// Audit log: `timestamp_be | event_id` → JSON bytes.
pub(super) const AUDIT_EVENTS: TableDefinition<&[u8], &[u8]> =
    TableDefinition::new("audit_events");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("permission denied: user {user_id} cannot access {resource}")]
    PermissionDenied { user_id: String, resource: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Key Helpers
// =============================================================================

/// Microseconds since the epoch as big-endian bytes, clamped at zero so that
/// byte order matches chronological order.
pub(super) fn timestamp_key(micros: i64) -> [u8; 8] {
    (micros.max(0) as u64).to_be_bytes()
}

// =============================================================================
// LedgerDatabase
// =============================================================================

/// Embedded ACID database holding users, loans and the audit log.
pub struct LedgerDatabase {
    db: Database,
}

impl LedgerDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_EMAILS)?;
            let _ = write_txn.open_table(LOANS)?;
            let _ = write_txn.open_table(OWNER_LOANS)?;
            let _ = write_txn.open_table(AUDIT_EVENTS)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "Ledger database opened");
        Ok(Self { db })
    }

    /// Verify every table can be opened for reading.
    pub fn health_check(&self) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(USERS)?;
        let _ = read_txn.open_table(USER_EMAILS)?;
        let _ = read_txn.open_table(LOANS)?;
        let _ = read_txn.open_table(OWNER_LOANS)?;
        let _ = read_txn.open_table(AUDIT_EVENTS)?;
        Ok(())
    }

    pub(super) fn raw(&self) -> &Database {
        &self.db
    }
}
