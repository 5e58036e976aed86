// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Loan Lifecycle
//!
//! Loan creation with a weekly repayment schedule, admin approval, and
//! sequential repayment until the loan is fully paid.

pub mod error;
pub mod loan;
pub mod money;
pub mod service;

pub use error::LoanError;
pub use loan::{Loan, LoanStatus, Repayment, RepaymentStatus, MAX_TERM, REPAYMENT_INTERVAL_DAYS};
pub use money::{Money, MoneyError};
pub use service::LoanService;
