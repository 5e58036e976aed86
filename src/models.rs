// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. All types derive `ToSchema`
//! for OpenAPI documentation; field names are camelCase on the wire.
//!
//! ## Model Categories
//!
//! - **Identity**: registration, login, and the caller's profile
//! - **Loans**: loan creation, repayment, and loan listings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;
use crate::lending::{Loan, Money};
use crate::storage::StoredUser;

// =============================================================================
// Identity Models
// =============================================================================

/// Request body for `POST /auth/register`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub password: String,
    /// `customer` (default) or `admin`.
    #[serde(default)]
    #[schema(example = "customer")]
    pub role: Option<String>,
}

/// Plain confirmation message.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// When present, must match the stored role (case-insensitive).
    #[serde(default)]
    pub role: Option<String>,
}

/// Successful login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token, valid for one hour.
    pub token: String,
    pub role: Role,
}

/// The caller's stored profile (never includes the password hash).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<StoredUser> for UserProfile {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

// =============================================================================
// Loan Models
// =============================================================================

/// Request body for `POST /loans`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateLoanRequest {
    /// Principal, at most two decimal places.
    #[schema(value_type = f64, example = 100.0)]
    pub amount: Money,
    /// Number of weekly repayments.
    #[schema(example = 3)]
    pub term: i64,
}

/// Request body for `POST /loans/repayment`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepaymentRequest {
    pub loan_id: String,
    /// Must cover the next pending installment.
    #[schema(value_type = f64, example = 33.33)]
    pub amount: Money,
}

/// A message together with the affected loan.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanEnvelope {
    pub message: String,
    pub loan: Loan,
}

impl LoanEnvelope {
    pub fn new(message: impl Into<String>, loan: Loan) -> Self {
        Self {
            message: message.into(),
            loan,
        }
    }
}

/// The caller's loans.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanListResponse {
    pub loans: Vec<Loan>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repayment_request_uses_camel_case() {
        let request: RepaymentRequest =
            serde_json::from_str(r#"{"loanId":"abc","amount":33.33}"#).unwrap();
        assert_eq!(request.loan_id, "abc");
        assert_eq!(request.amount, Money::from_cents(3_333));
    }

    #[test]
    fn register_role_is_optional() {
        let request: RegisterRequest =
            serde_json::from_str(r#"{"name":"Ada","email":"ada@example.com","password":"pw"}"#)
                .unwrap();
        assert!(request.role.is_none());
    }

    #[test]
    fn profile_omits_password_hash() {
        let profile = UserProfile::from(StoredUser {
            id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::Customer,
            created_at: Utc::now(),
        });
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["role"], "customer");
        assert!(json.get("createdAt").is_some());
        assert!(!json.to_string().contains("argon2"));
    }
}
