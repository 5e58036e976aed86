// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only API endpoints.
//!
//! These endpoints require the Admin role and provide:
//! - A view of every loan, optionally filtered by status
//! - Audit log queries

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{extract::ApiQuery, run_blocking};
use crate::{
    audit_log,
    auth::AdminOnly,
    error::{ApiError, ErrorResponse},
    lending::{Loan, LoanService, LoanStatus},
    state::AppState,
    storage::{AuditEvent, AuditEventType, AuditFilter, AuditRepository},
};

/// Default number of audit events per page.
const DEFAULT_AUDIT_LIMIT: usize = 100;

/// Largest page an audit query may request.
const MAX_AUDIT_LIMIT: usize = 1000;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for the admin loan list.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoanQueryParams {
    /// Filter by status (PENDING, APPROVED or PAID; case-insensitive).
    pub status: Option<String>,
}

/// Response for the admin loan list.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminLoanListResponse {
    /// Matching loans, oldest first.
    pub loans: Vec<Loan>,
    /// Total count.
    pub total: usize,
}

/// Query parameters for audit log queries.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditQueryParams {
    /// Filter by user ID.
    pub user_id: Option<String>,
    /// Filter by resource ID.
    pub resource_id: Option<String>,
    /// Filter by event type (e.g. `loan_approved`).
    pub event_type: Option<String>,
    /// Maximum number of results (default 100, max 1000).
    pub limit: Option<usize>,
    /// Offset for pagination.
    pub offset: Option<usize>,
}

/// Response for audit log queries.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLogResponse {
    /// Audit events matching the query, newest first.
    pub events: Vec<AuditEvent>,
    /// Total count (before limit/offset).
    pub total: usize,
    /// Whether there are more results.
    pub has_more: bool,
}

fn parse_event_type(raw: &str) -> Result<AuditEventType, ApiError> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_lowercase()))
        .map_err(|_| ApiError::bad_request(format!("Invalid event_type: {raw}")))
}

// ============================================================================
// Handlers
// ============================================================================

/// List all loans (admin view).
///
/// Returns every loan across all users, optionally filtered by status.
#[utoipa::path(
    get,
    path = "/admin/loans",
    tag = "Admin",
    params(LoanQueryParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All loans", body = AdminLoanListResponse),
        (status = 400, description = "Invalid status filter", body = ErrorResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn list_all_loans(
    AdminOnly(admin_user): AdminOnly,
    ApiQuery(params): ApiQuery<LoanQueryParams>,
    State(state): State<AppState>,
) -> Result<Json<AdminLoanListResponse>, ApiError> {
    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            LoanStatus::from_str(raw)
                .ok_or_else(|| ApiError::bad_request(format!("Invalid status: {raw}")))?,
        ),
    };

    let loans = run_blocking(move || {
        let loans = LoanService::new(&state.db).all_loans(status)?;
        audit_log!(&state.db, AuditEventType::AdminAccess, &admin_user);
        Ok::<_, ApiError>(loans)
    })
    .await?;
    let total = loans.len();

    Ok(Json(AdminLoanListResponse { loans, total }))
}

/// Query audit logs.
///
/// Search audit log entries, newest first. Supports user ID, resource ID
/// and event type filtering. Admin only.
#[utoipa::path(
    get,
    path = "/admin/audit",
    tag = "Admin",
    params(AuditQueryParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Audit events", body = AuditLogResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn query_audit_logs(
    AdminOnly(admin_user): AdminOnly,
    ApiQuery(params): ApiQuery<AuditQueryParams>,
    State(state): State<AppState>,
) -> Result<Json<AuditLogResponse>, ApiError> {
    let event_type = params
        .event_type
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(parse_event_type)
        .transpose()?;

    let filter = AuditFilter {
        user_id: params.user_id,
        resource_id: params.resource_id,
        event_type,
    };
    let limit = params
        .limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .min(MAX_AUDIT_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let (events, total) = run_blocking(move || {
        let page = AuditRepository::new(&state.db)
            .query(&filter, offset, limit)
            .map_err(|e| {
                tracing::error!(error = %e, "Audit query failed");
                ApiError::internal("Failed to read audit log")
            })?;
        // Recorded after the query; it never appears in its own results.
        audit_log!(&state.db, AuditEventType::AdminAccess, &admin_user);
        Ok::<_, ApiError>(page)
    })
    .await?;
    let has_more = offset + events.len() < total;

    Ok(Json(AuditLogResponse {
        events,
        total,
        has_more,
    }))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, Role};
    use crate::lending::Money;
    use crate::state::test_state;
    use axum::http::StatusCode;

    fn admin() -> AdminOnly {
        AdminOnly(AuthenticatedUser {
            user_id: "admin_1".to_string(),
            role: Role::Admin,
            expires_at: 0,
        })
    }

    fn customer(id: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: id.to_string(),
            role: Role::Customer,
            expires_at: 0,
        }
    }

    fn audit_params() -> AuditQueryParams {
        AuditQueryParams {
            user_id: None,
            resource_id: None,
            event_type: None,
            limit: None,
            offset: None,
        }
    }

    #[tokio::test]
    async fn lists_loans_with_status_filter() {
        let (state, _dir) = test_state();
        let service = LoanService::new(&state.db);
        let first = service
            .create_loan(&customer("user_1"), Money::from_cents(10_000), 3)
            .unwrap();
        service
            .create_loan(&customer("user_2"), Money::from_cents(5_000), 2)
            .unwrap();
        service.approve_loan(&admin().0, &first.id).unwrap();

        let Json(all) = list_all_loans(
            admin(),
            ApiQuery(LoanQueryParams { status: None }),
            State(state.clone()),
        )
        .await
        .unwrap();
        assert_eq!(all.total, 2);

        let Json(approved) = list_all_loans(
            admin(),
            ApiQuery(LoanQueryParams {
                status: Some("approved".into()),
            }),
            State(state),
        )
        .await
        .unwrap();
        assert_eq!(approved.total, 1);
        assert_eq!(approved.loans[0].id, first.id);
    }

    #[tokio::test]
    async fn unknown_status_is_bad_request() {
        let (state, _dir) = test_state();

        let err = list_all_loans(
            admin(),
            ApiQuery(LoanQueryParams {
                status: Some("REJECTED".into()),
            }),
            State(state),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn audit_query_filters_and_pages() {
        let (state, _dir) = test_state();
        let service = LoanService::new(&state.db);
        let loan = service
            .create_loan(&customer("user_1"), Money::from_cents(10_000), 3)
            .unwrap();
        service.approve_loan(&admin().0, &loan.id).unwrap();

        let Json(by_loan) = query_audit_logs(
            admin(),
            ApiQuery(AuditQueryParams {
                resource_id: Some(loan.id.clone()),
                ..audit_params()
            }),
            State(state.clone()),
        )
        .await
        .unwrap();
        assert_eq!(by_loan.total, 2);
        assert_eq!(by_loan.events[0].event_type, AuditEventType::LoanApproved);
        assert!(!by_loan.has_more);

        let Json(paged) = query_audit_logs(
            admin(),
            ApiQuery(AuditQueryParams {
                resource_id: Some(loan.id.clone()),
                limit: Some(1),
                ..audit_params()
            }),
            State(state.clone()),
        )
        .await
        .unwrap();
        assert_eq!(paged.events.len(), 1);
        assert!(paged.has_more);

        let Json(created) = query_audit_logs(
            admin(),
            ApiQuery(AuditQueryParams {
                event_type: Some("LOAN_CREATED".into()),
                ..audit_params()
            }),
            State(state),
        )
        .await
        .unwrap();
        assert_eq!(created.total, 1);
        assert_eq!(created.events[0].user_id.as_deref(), Some("user_1"));
    }

    #[tokio::test]
    async fn audit_query_records_admin_access() {
        let (state, _dir) = test_state();

        let Json(first) = query_audit_logs(admin(), ApiQuery(audit_params()), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(first.total, 0);

        let Json(second) = query_audit_logs(admin(), ApiQuery(audit_params()), State(state))
            .await
            .unwrap();
        assert_eq!(second.total, 1);
        assert_eq!(second.events[0].event_type, AuditEventType::AdminAccess);
    }

    #[tokio::test]
    async fn invalid_event_type_is_bad_request() {
        let (state, _dir) = test_state();

        let err = query_audit_logs(
            admin(),
            ApiQuery(AuditQueryParams {
                event_type: Some("coffee_break".into()),
                ..audit_params()
            }),
            State(state),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
