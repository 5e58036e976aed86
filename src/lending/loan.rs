// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Loan documents and their state machine.
//!
//! ```text
//! PENDING --approve--> APPROVED --last repayment--> PAID
//! ```
//!
//! Repayments are embedded in the loan, ordered by due date, and consumed
//! strictly in order: a repayment only ever advances the earliest one still
//! pending.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{LoanError, Money};
use crate::storage::OwnedResource;

/// Days between consecutive due dates.
pub const REPAYMENT_INTERVAL_DAYS: i64 = 7;

/// Longest schedule accepted, in weekly periods (20 years).
pub const MAX_TERM: i64 = 1040;

/// Loan status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    /// Awaiting admin approval.
    Pending,
    /// Approved, accepting repayments.
    Approved,
    /// Every repayment has been paid.
    Paid,
}

impl LoanStatus {
    /// Parse a status name, case-insensitively.
    pub fn from_str(s: &str) -> Option<LoanStatus> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(LoanStatus::Pending),
            "APPROVED" => Some(LoanStatus::Approved),
            "PAID" => Some(LoanStatus::Paid),
            _ => None,
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoanStatus::Pending => write!(f, "PENDING"),
            LoanStatus::Approved => write!(f, "APPROVED"),
            LoanStatus::Paid => write!(f, "PAID"),
        }
    }
}

/// Status of a single scheduled repayment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepaymentStatus {
    Pending,
    Paid,
}

/// One scheduled installment of a loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Repayment {
    /// When this installment is due.
    pub due_date: DateTime<Utc>,
    /// Scheduled amount, fixed at loan creation.
    #[schema(value_type = f64, example = 33.33)]
    pub amount: Money,
    pub status: RepaymentStatus,
    /// When the installment was paid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
}

/// A loan with its embedded repayment schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    /// Unique loan identifier (UUID).
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Principal.
    #[schema(value_type = f64, example = 100.0)]
    pub amount: Money,
    /// Number of weekly repayments.
    pub term: u32,
    pub status: LoanStatus,
    /// Schedule, ordered by due date.
    pub repayments: Vec<Repayment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnedResource for Loan {
    fn owner_user_id(&self) -> &str {
        &self.user_id
    }

    fn resource_kind(&self) -> &'static str {
        "loan"
    }
}

impl Loan {
    /// Create a pending loan with its weekly schedule.
    ///
    /// Each repayment is due `7 * (i + 1)` days after `created_at` and carries
    /// `amount / term`, rounded to the cent.
    pub fn new(
        user_id: impl Into<String>,
        amount: Money,
        term: i64,
        created_at: DateTime<Utc>,
    ) -> Result<Self, LoanError> {
        if !amount.is_positive() || term <= 0 || term > MAX_TERM {
            return Err(LoanError::InvalidTerms);
        }
        let term = term as u32;
        let installment = amount.installment(term);

        let repayments = (1..=i64::from(term))
            .map(|week| Repayment {
                due_date: created_at + Duration::days(REPAYMENT_INTERVAL_DAYS * week),
                amount: installment,
                status: RepaymentStatus::Pending,
                paid_at: None,
            })
            .collect();

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            amount,
            term,
            status: LoanStatus::Pending,
            repayments,
            created_at,
            updated_at: created_at,
        })
    }

    /// PENDING -> APPROVED.
    pub fn approve(&mut self, now: DateTime<Utc>) -> Result<(), LoanError> {
        if self.status != LoanStatus::Pending {
            return Err(LoanError::NotPending);
        }
        self.status = LoanStatus::Approved;
        self.updated_at = now;
        Ok(())
    }

    /// Index of the earliest repayment still pending.
    pub fn next_pending(&self) -> Option<usize> {
        self.repayments
            .iter()
            .position(|r| r.status == RepaymentStatus::Pending)
    }

    pub fn is_fully_repaid(&self) -> bool {
        self.repayments
            .iter()
            .all(|r| r.status == RepaymentStatus::Paid)
    }

    /// Pay the earliest pending repayment.
    ///
    /// `amount` must cover that repayment's scheduled amount; any excess is
    /// discarded. Returns the index of the repayment that was paid. When the
    /// last repayment is paid the loan moves to PAID.
    pub fn apply_repayment(
        &mut self,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<usize, LoanError> {
        if self.status != LoanStatus::Approved {
            return Err(LoanError::NotApproved);
        }
        let index = self.next_pending().ok_or(LoanError::NoPendingRepayments)?;

        let repayment = &mut self.repayments[index];
        if !amount.is_positive() || amount < repayment.amount {
            return Err(LoanError::InsufficientAmount {
                required: repayment.amount,
                offered: amount,
            });
        }
        repayment.status = RepaymentStatus::Paid;
        repayment.paid_at = Some(now);

        if self.is_fully_repaid() {
            self.status = LoanStatus::Paid;
        }
        self.updated_at = now;
        Ok(index)
    }

    /// Sum of all scheduled installments.
    pub fn scheduled_total(&self) -> Money {
        self.repayments.iter().map(|r| r.amount).sum()
    }
}
