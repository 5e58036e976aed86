// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::Request,
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{require_auth, Role},
    error::{ApiError, ErrorResponse},
    lending::{Loan, LoanStatus, Repayment, RepaymentStatus},
    models::{
        CreateLoanRequest, LoanEnvelope, LoanListResponse, LoginRequest, LoginResponse,
        MessageResponse, RegisterRequest, RepaymentRequest, UserProfile,
    },
    state::AppState,
    storage::{AuditEvent, AuditEventType},
};

pub mod admin;
pub mod auth;
pub mod extract;
pub mod health;
pub mod loans;
pub mod users;

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Token-gated: rejected with 401 before any handler runs.
    let protected_routes = Router::new()
        .route("/loans", get(loans::list_loans).post(loans::create_loan))
        .route("/loans/repayment", post(loans::add_repayment))
        .route("/loans/{id}/approve", patch(loans::approve_loan))
        .route("/users/me", get(users::get_current_user))
        .route("/admin/loans", get(admin::list_all_loans))
        .route("/admin/audit", get(admin::query_audit_logs))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive()),
        )
}

/// Run password hashing and store transactions on the blocking pool.
///
/// Handlers await the result, so the async workers keep serving other
/// requests while argon2 or a redb commit is in progress.
pub(crate) async fn run_blocking<T, E, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(work).await.map_err(|e| {
        tracing::error!(error = %e, "Blocking task failed");
        ApiError::internal("Server error")
    })?;
    result.map_err(Into::into)
}

/// Registers the `bearer_auth` scheme referenced by protected operations.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    Http::builder()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        loans::create_loan,
        loans::list_loans,
        loans::add_repayment,
        loans::approve_loan,
        users::get_current_user,
        admin::list_all_loans,
        admin::query_audit_logs,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            MessageResponse,
            UserProfile,
            Role,
            CreateLoanRequest,
            RepaymentRequest,
            LoanEnvelope,
            LoanListResponse,
            Loan,
            LoanStatus,
            Repayment,
            RepaymentStatus,
            AuditEvent,
            AuditEventType,
            ErrorResponse,
            admin::AdminLoanListResponse,
            admin::AuditLogResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Loans", description = "Loan requests, approval and repayments"),
        (name = "Users", description = "The caller's profile"),
        (name = "Admin", description = "Admin-only views of loans and the audit log"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
