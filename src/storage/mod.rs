// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Ledger Storage
//!
//! Persistent storage for users, loans and the audit trail in a single
//! embedded redb database.
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/lending.redb
//!   users          user_id -> StoredUser (JSON)
//!   user_emails    email -> user_id
//!   loans          loan_id -> Loan (JSON, repayments embedded)
//!   owner_loans    owner|created_at|loan_id -> loan_id
//!   audit_events   timestamp|event_id -> AuditEvent (JSON)
//! ```
//!
//! Every multi-table change (user + email index, loan + owner index) and
//! every loan read-modify-write happens inside one write transaction.

pub mod audit;
pub mod database;
pub mod ownership;
pub mod repository;

pub use audit::{AuditEvent, AuditEventType, AuditFilter, AuditRepository};
pub use database::{LedgerDatabase, StorageError, StorageResult};
pub use ownership::{OwnedResource, OwnershipEnforcer};
pub use repository::{LoanRepository, StoredUser, UserRepository};
