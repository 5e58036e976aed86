// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the ledger database.
//!
//! Each repository provides the operations for a specific entity type and
//! keeps its secondary indexes consistent inside the same write transaction.

pub mod loans;
pub mod users;

pub use loans::LoanRepository;
pub use users::{StoredUser, UserRepository};
