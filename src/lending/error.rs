// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Loan lifecycle errors.

use axum::http::StatusCode;

use super::Money;
use crate::error::ApiError;
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum LoanError {
    #[error("Invalid amount or term.")]
    InvalidTerms,

    #[error("Loan not found")]
    NotFound,

    /// Approval attempted by a non-admin.
    #[error("Access denied")]
    AdminRequired,

    /// Repayment attempted by someone other than the owner.
    #[error("Unauthorized")]
    NotOwner,

    #[error("Loan is already approved or paid")]
    NotPending,

    #[error("Loan is not approved for repayments")]
    NotApproved,

    #[error("No pending repayments")]
    NoPendingRepayments,

    #[error("Repayment amount is insufficient")]
    InsufficientAmount { required: Money, offered: Money },

    #[error("{0}")]
    Storage(StorageError),
}

impl LoanError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LoanError::NotFound => StatusCode::NOT_FOUND,
            LoanError::AdminRequired | LoanError::NotOwner => StatusCode::FORBIDDEN,
            LoanError::InvalidTerms
            | LoanError::NotPending
            | LoanError::NotApproved
            | LoanError::NoPendingRepayments
            | LoanError::InsufficientAmount { .. }
            | LoanError::Storage(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<StorageError> for LoanError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(_) => LoanError::NotFound,
            StorageError::PermissionDenied { .. } => LoanError::NotOwner,
            other => LoanError::Storage(other),
        }
    }
}

impl From<LoanError> for ApiError {
    fn from(e: LoanError) -> Self {
        if let LoanError::Storage(inner) = &e {
            tracing::error!(error = %inner, "Loan store operation failed");
        }
        ApiError::new(e.status_code(), e.to_string())
    }
}
