// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Loan endpoints. Every route here sits behind the bearer-token gate; the
//! caller's identity comes from the verified token, never from the body.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{extract::ApiJson, run_blocking};
use crate::{
    auth::Auth,
    error::{ApiError, ErrorResponse},
    lending::LoanService,
    models::{CreateLoanRequest, LoanEnvelope, LoanListResponse, RepaymentRequest},
    state::AppState,
};

/// Request a new loan.
///
/// The schedule has `term` weekly repayments of `amount / term` each,
/// rounded to the cent. The loan starts out PENDING.
#[utoipa::path(
    post,
    path = "/loans",
    tag = "Loans",
    request_body = CreateLoanRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Loan created", body = LoanEnvelope),
        (status = 400, description = "Invalid amount or term", body = ErrorResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_loan(
    Auth(user): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateLoanRequest>,
) -> Result<(StatusCode, Json<LoanEnvelope>), ApiError> {
    let loan = run_blocking(move || {
        LoanService::new(&state.db).create_loan(&user, request.amount, request.term)
    })
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(LoanEnvelope::new("Loan created successfully", loan)),
    ))
}

/// List the caller's loans in creation order.
#[utoipa::path(
    get,
    path = "/loans",
    tag = "Loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The caller's loans", body = LoanListResponse),
        (status = 400, description = "Store failure", body = ErrorResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_loans(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<LoanListResponse>, ApiError> {
    let loans = run_blocking(move || LoanService::new(&state.db).user_loans(&user)).await?;
    Ok(Json(LoanListResponse { loans }))
}

/// Pay the earliest pending installment of one of the caller's loans.
///
/// The amount must cover the scheduled installment; any excess is discarded.
#[utoipa::path(
    post,
    path = "/loans/repayment",
    tag = "Loans",
    request_body = RepaymentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Repayment recorded", body = LoanEnvelope),
        (status = 400, description = "Loan not approved, nothing pending, or amount insufficient", body = ErrorResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller does not own the loan", body = ErrorResponse),
        (status = 404, description = "Loan not found", body = ErrorResponse)
    )
)]
pub async fn add_repayment(
    Auth(user): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RepaymentRequest>,
) -> Result<Json<LoanEnvelope>, ApiError> {
    let loan = run_blocking(move || {
        LoanService::new(&state.db).add_repayment(&user, &request.loan_id, request.amount)
    })
    .await?;
    Ok(Json(LoanEnvelope::new("Repayment successful", loan)))
}

/// Approve a pending loan. Admin only.
#[utoipa::path(
    patch,
    path = "/loans/{id}/approve",
    tag = "Loans",
    params(
        ("id" = String, Path, description = "Loan identifier")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Loan approved", body = LoanEnvelope),
        (status = 400, description = "Loan is already approved or paid", body = ErrorResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Loan not found", body = ErrorResponse)
    )
)]
pub async fn approve_loan(
    Auth(user): Auth,
    Path(loan_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LoanEnvelope>, ApiError> {
    let loan =
        run_blocking(move || LoanService::new(&state.db).approve_loan(&user, &loan_id)).await?;
    Ok(Json(LoanEnvelope::new("Loan approved", loan)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, Role};
    use crate::lending::{LoanStatus, Money, RepaymentStatus};
    use crate::state::test_state;

    fn user(id: &str, role: Role) -> Auth {
        Auth(AuthenticatedUser {
            user_id: id.to_string(),
            role,
            expires_at: 0,
        })
    }

    async fn create(state: &AppState, owner: &str, cents: i64, term: i64) -> LoanEnvelope {
        let (status, Json(envelope)) = create_loan(
            user(owner, Role::Customer),
            State(state.clone()),
            ApiJson(CreateLoanRequest {
                amount: Money::from_cents(cents),
                term,
            }),
        )
        .await
        .expect("loan creation succeeds");
        assert_eq!(status, StatusCode::CREATED);
        envelope
    }

    async fn approve(state: &AppState, loan_id: &str) -> Result<Json<LoanEnvelope>, ApiError> {
        approve_loan(
            user("admin_1", Role::Admin),
            Path(loan_id.to_string()),
            State(state.clone()),
        )
        .await
    }

    async fn repay(
        state: &AppState,
        caller: &str,
        loan_id: &str,
        cents: i64,
    ) -> Result<Json<LoanEnvelope>, ApiError> {
        add_repayment(
            user(caller, Role::Customer),
            State(state.clone()),
            ApiJson(RepaymentRequest {
                loan_id: loan_id.to_string(),
                amount: Money::from_cents(cents),
            }),
        )
        .await
    }

    #[tokio::test]
    async fn create_loan_builds_weekly_schedule() {
        let (state, _dir) = test_state();

        let envelope = create(&state, "user_1", 10_000, 3).await;
        assert_eq!(envelope.message, "Loan created successfully");
        assert_eq!(envelope.loan.status, LoanStatus::Pending);
        assert_eq!(envelope.loan.user_id, "user_1");
        assert_eq!(envelope.loan.repayments.len(), 3);
        for repayment in &envelope.loan.repayments {
            assert_eq!(repayment.amount, Money::from_cents(3_333));
            assert_eq!(repayment.status, RepaymentStatus::Pending);
        }
    }

    #[tokio::test]
    async fn create_loan_rejects_zero_term() {
        let (state, _dir) = test_state();

        let err = create_loan(
            user("user_1", Role::Customer),
            State(state),
            ApiJson(CreateLoanRequest {
                amount: Money::from_cents(10_000),
                term: 0,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid amount or term.");
    }

    #[tokio::test]
    async fn list_loans_only_returns_own_loans() {
        let (state, _dir) = test_state();
        let mine = create(&state, "user_1", 10_000, 3).await.loan;
        create(&state, "user_2", 5_000, 2).await;

        let Json(body) = list_loans(user("user_1", Role::Customer), State(state))
            .await
            .unwrap();
        assert_eq!(body.loans, vec![mine]);
    }

    #[tokio::test]
    async fn approve_requires_admin() {
        let (state, _dir) = test_state();
        let loan = create(&state, "user_1", 10_000, 3).await.loan;

        let err = approve_loan(
            user("user_1", Role::Customer),
            Path(loan.id.clone()),
            State(state.clone()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.message, "Access denied");

        let Json(approved) = approve(&state, &loan.id).await.unwrap();
        assert_eq!(approved.message, "Loan approved");
        assert_eq!(approved.loan.status, LoanStatus::Approved);

        let again = approve(&state, &loan.id).await.unwrap_err();
        assert_eq!(again.status, StatusCode::BAD_REQUEST);
        assert_eq!(again.message, "Loan is already approved or paid");
    }

    #[tokio::test]
    async fn approve_missing_loan_is_not_found() {
        let (state, _dir) = test_state();

        let err = approve(&state, "missing").await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Loan not found");
    }

    #[tokio::test]
    async fn repayments_pay_down_loan_in_order() {
        let (state, _dir) = test_state();
        let loan = create(&state, "user_1", 10_000, 3).await.loan;

        let err = repay(&state, "user_1", &loan.id, 3_333).await.unwrap_err();
        assert_eq!(err.message, "Loan is not approved for repayments");

        let Json(approved) = approve(&state, &loan.id).await.unwrap();
        assert_eq!(approved.loan.status, LoanStatus::Approved);

        let err = repay(&state, "user_1", &loan.id, 3_332).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Repayment amount is insufficient");

        let Json(first) = repay(&state, "user_1", &loan.id, 3_333).await.unwrap();
        assert_eq!(first.message, "Repayment successful");
        assert_eq!(first.loan.repayments[0].status, RepaymentStatus::Paid);
        assert_eq!(first.loan.repayments[1].status, RepaymentStatus::Pending);

        let Json(second) = repay(&state, "user_1", &loan.id, 3_333).await.unwrap();
        assert_eq!(second.loan.repayments[1].status, RepaymentStatus::Paid);
        let Json(last) = repay(&state, "user_1", &loan.id, 5_000).await.unwrap();
        assert_eq!(last.loan.status, LoanStatus::Paid);

        let err = repay(&state, "user_1", &loan.id, 3_333).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn repayment_by_non_owner_is_forbidden() {
        let (state, _dir) = test_state();
        let loan = create(&state, "user_1", 10_000, 3).await.loan;
        let Json(approved) = approve(&state, &loan.id).await.unwrap();
        assert_eq!(approved.loan.id, loan.id);

        let err = repay(&state, "user_2", &loan.id, 3_333).await.unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.message, "Unauthorized");

        let err = repay(&state, "user_1", "missing", 3_333).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
