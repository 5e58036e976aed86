// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Loan repository.
//!
//! Loans (with their embedded repayment schedule) are stored as JSON under
//! their id. `owner_loans` indexes each loan by `owner | created_at | id` so a
//! prefix scan returns one owner's loans in creation order.

use redb::{ReadableDatabase, ReadableTable, WriteTransaction};

use super::super::database::{timestamp_key, LOANS, OWNER_LOANS};
use super::super::{LedgerDatabase, StorageError, StorageResult};
use crate::lending::Loan;

/// Build a composite key for the owner_loans table.
fn make_owner_key(owner: &str, created_micros: i64, loan_id: &str) -> Vec<u8> {
    let mut key = make_prefix(owner);
    key.extend_from_slice(&timestamp_key(created_micros));
    key.push(b'|');
    key.extend_from_slice(loan_id.as_bytes());
    key
}

/// Prefix shared by every index entry of one owner.
fn make_prefix(owner: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(owner.len() + 1 + 8 + 1 + 36);
    prefix.extend_from_slice(owner.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Upper bound for a prefix scan: the prefix with its separator bumped by one.
fn make_prefix_end(owner: &str) -> Vec<u8> {
    let mut end = Vec::with_capacity(owner.len() + 1);
    end.extend_from_slice(owner.as_bytes());
    end.push(b'|' + 1);
    end
}

/// Repository for loans.
pub struct LoanRepository<'a> {
    db: &'a LedgerDatabase,
}

impl<'a> LoanRepository<'a> {
    pub fn new(db: &'a LedgerDatabase) -> Self {
        Self { db }
    }

    /// Insert a new loan and its owner index entry.
    pub fn insert(&self, loan: &Loan) -> StorageResult<()> {
        let json = serde_json::to_vec(loan)?;
        let index_key = make_owner_key(
            &loan.user_id,
            loan.created_at.timestamp_micros(),
            &loan.id,
        );

        let write_txn = self.db.raw().begin_write()?;
        {
            let mut loans = write_txn.open_table(LOANS)?;
            if loans.get(loan.id.as_str())?.is_some() {
                drop(loans);
                write_txn.abort()?;
                return Err(StorageError::AlreadyExists(format!("Loan {}", loan.id)));
            }
            loans.insert(loan.id.as_str(), json.as_slice())?;

            let mut index = write_txn.open_table(OWNER_LOANS)?;
            index.insert(index_key.as_slice(), loan.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a loan by ID.
    pub fn get(&self, loan_id: &str) -> StorageResult<Loan> {
        let read_txn = self.db.raw().begin_read()?;
        let loans = read_txn.open_table(LOANS)?;
        let loan = match loans.get(loan_id)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Err(StorageError::NotFound(format!("Loan {loan_id}"))),
        };
        Ok(loan)
    }

    /// All loans of one owner, oldest first.
    pub fn list_by_owner(&self, owner: &str) -> StorageResult<Vec<Loan>> {
        let read_txn = self.db.raw().begin_read()?;
        let index = read_txn.open_table(OWNER_LOANS)?;
        let loans = read_txn.open_table(LOANS)?;

        let start = make_prefix(owner);
        let end = make_prefix_end(owner);

        let mut result = Vec::new();
        for entry in index.range(start.as_slice()..end.as_slice())? {
            let (_, loan_id) = entry?;
            let Some(value) = loans.get(loan_id.value())? else {
                tracing::warn!(loan_id = %loan_id.value(), "Owner index points at missing loan");
                continue;
            };
            result.push(serde_json::from_slice(value.value())?);
        }
        Ok(result)
    }

    /// Every loan, oldest first.
    pub fn list_all(&self) -> StorageResult<Vec<Loan>> {
        let read_txn = self.db.raw().begin_read()?;
        let loans = read_txn.open_table(LOANS)?;

        let mut result: Vec<Loan> = Vec::new();
        for entry in loans.iter()? {
            let (_, value) = entry?;
            result.push(serde_json::from_slice(value.value())?);
        }
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(result)
    }

    /// Read-modify-write a loan inside a single write transaction.
    ///
    /// `f` receives the current stored loan. If it returns `Ok`, the mutated
    /// loan is written and committed; if it returns `Err`, the transaction is
    /// aborted and nothing is written. Concurrent updates are serialized by
    /// redb's single-writer lock.
    pub fn update<T, E, F>(&self, loan_id: &str, f: F) -> Result<T, E>
    where
        E: From<StorageError>,
        F: FnOnce(&mut Loan) -> Result<T, E>,
    {
        let write_txn = self.db.raw().begin_write().map_err(StorageError::from)?;

        match apply_update(&write_txn, loan_id, f) {
            Ok(value) => {
                write_txn.commit().map_err(StorageError::from)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort) = write_txn.abort() {
                    tracing::warn!(loan_id = %loan_id, error = %abort, "Failed to abort loan update");
                }
                Err(e)
            }
        }
    }
}

fn apply_update<T, E, F>(write_txn: &WriteTransaction, loan_id: &str, f: F) -> Result<T, E>
where
    E: From<StorageError>,
    F: FnOnce(&mut Loan) -> Result<T, E>,
{
    let mut loans = write_txn.open_table(LOANS).map_err(StorageError::from)?;

    let stored = loans
        .get(loan_id)
        .map_err(StorageError::from)?
        .ok_or_else(|| StorageError::NotFound(format!("Loan {loan_id}")))?;
    let mut loan: Loan = serde_json::from_slice(stored.value()).map_err(StorageError::from)?;
    drop(stored);

    let out = f(&mut loan)?;

    let json = serde_json::to_vec(&loan).map_err(StorageError::from)?;
    loans
        .insert(loan_id, json.as_slice())
        .map_err(StorageError::from)?;
    Ok(out)
}
