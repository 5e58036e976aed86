// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Loan lifecycle operations on behalf of an authenticated caller.
//!
//! Approval and repayment run as a single read-modify-write inside one
//! database write transaction, so concurrent requests against the same loan
//! are applied one after the other and never overwrite each other.

use chrono::Utc;

use super::{Loan, LoanError, LoanStatus, Money};
use crate::{
    audit_log,
    auth::AuthenticatedUser,
    storage::{
        AuditEvent, AuditEventType, AuditRepository, LedgerDatabase, LoanRepository,
        OwnershipEnforcer,
    },
};

/// Loan service bound to a database handle.
pub struct LoanService<'a> {
    db: &'a LedgerDatabase,
}

impl<'a> LoanService<'a> {
    pub fn new(db: &'a LedgerDatabase) -> Self {
        Self { db }
    }

    fn loans(&self) -> LoanRepository<'a> {
        LoanRepository::new(self.db)
    }

    /// Create a pending loan owned by `user`.
    pub fn create_loan(
        &self,
        user: &AuthenticatedUser,
        amount: Money,
        term: i64,
    ) -> Result<Loan, LoanError> {
        let loan = Loan::new(&user.user_id, amount, term, Utc::now())?;
        self.loans().insert(&loan)?;

        tracing::info!(
            loan_id = %loan.id,
            user_id = %user.user_id,
            amount = %loan.amount,
            term = loan.term,
            scheduled_total = %loan.scheduled_total(),
            "Loan created"
        );
        AuditRepository::new(self.db).record(
            &AuditEvent::new(AuditEventType::LoanCreated)
                .with_user(&user.user_id)
                .with_resource("loan", &loan.id)
                .with_details(serde_json::json!({
                    "amount": loan.amount,
                    "term": loan.term,
                    "scheduledTotal": loan.scheduled_total(),
                })),
        );

        Ok(loan)
    }

    /// Approve a pending loan. Admin only.
    pub fn approve_loan(&self, user: &AuthenticatedUser, loan_id: &str) -> Result<Loan, LoanError> {
        if !user.is_admin() {
            audit_log!(self.db, AuditEventType::PermissionDenied, user, "loan", loan_id);
            return Err(LoanError::AdminRequired);
        }

        let loan = self.loans().update(loan_id, |loan| {
            loan.approve(Utc::now())?;
            Ok::<_, LoanError>(loan.clone())
        })?;

        tracing::info!(loan_id = %loan.id, admin_id = %user.user_id, "Loan approved");
        audit_log!(self.db, AuditEventType::LoanApproved, user, "loan", &loan.id);

        Ok(loan)
    }

    /// All loans owned by `user`, oldest first.
    pub fn user_loans(&self, user: &AuthenticatedUser) -> Result<Vec<Loan>, LoanError> {
        Ok(self.loans().list_by_owner(&user.user_id)?)
    }

    /// All loans, optionally restricted to one status, oldest first.
    pub fn all_loans(&self, status: Option<LoanStatus>) -> Result<Vec<Loan>, LoanError> {
        let loans = self.loans().list_all()?;
        Ok(match status {
            Some(status) => loans.into_iter().filter(|l| l.status == status).collect(),
            None => loans,
        })
    }

    /// Pay the earliest pending repayment of one of the caller's loans.
    pub fn add_repayment(
        &self,
        user: &AuthenticatedUser,
        loan_id: &str,
        amount: Money,
    ) -> Result<Loan, LoanError> {
        let result = self.loans().update(loan_id, |loan| {
            loan.verify_ownership(user)?;
            let index = loan.apply_repayment(amount, Utc::now())?;
            Ok::<_, LoanError>((index, loan.clone()))
        });

        let (index, loan) = match result {
            Ok(paid) => paid,
            Err(LoanError::NotOwner) => {
                audit_log!(self.db, AuditEventType::PermissionDenied, user, "loan", loan_id);
                return Err(LoanError::NotOwner);
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            loan_id = %loan.id,
            user_id = %user.user_id,
            installment = index + 1,
            amount = %amount,
            "Repayment recorded"
        );
        audit_log!(self.db, AuditEventType::RepaymentRecorded, user, "loan", &loan.id);

        if loan.status == LoanStatus::Paid {
            tracing::info!(loan_id = %loan.id, "Loan fully repaid");
            audit_log!(self.db, AuditEventType::LoanPaid, user, "loan", &loan.id);
        }

        Ok(loan)
    }
}
