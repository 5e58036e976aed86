// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration and login endpoints. Both are public.

use axum::{extract::State, http::StatusCode, Json};

use super::{extract::ApiJson, run_blocking};
use crate::{
    error::{ApiError, ErrorResponse},
    identity::IdentityService,
    models::{LoginRequest, LoginResponse, MessageResponse, RegisterRequest},
    state::AppState,
};

/// Register a new user.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = MessageResponse),
        (status = 400, description = "Invalid input or email already registered", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    run_blocking(move || {
        IdentityService::new(&state.db, &state.passwords, &state.tokens).register(
            &request.name,
            &request.email,
            &request.password,
            request.role.as_deref(),
        )
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully!".to_string(),
        }),
    ))
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Invalid email or password", body = ErrorResponse),
        (status = 403, description = "Role mismatch", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (token, role) = run_blocking(move || {
        IdentityService::new(&state.db, &state.passwords, &state.tokens).login(
            &request.email,
            &request.password,
            request.role.as_deref(),
        )
    })
    .await?;

    Ok(Json(LoginResponse { token, role }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::state::test_state;
    use std::time::{Duration, Instant};

    fn register_request(email: &str, role: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            name: "Ada".into(),
            email: email.into(),
            password: "correct horse".into(),
            role: role.map(str::to_string),
        }
    }

    async fn register_user(state: &AppState, email: &str, role: Option<&str>) {
        let (status, _) = register(State(state.clone()), ApiJson(register_request(email, role)))
            .await
            .expect("registration succeeds");
        assert_eq!(status, StatusCode::CREATED);
    }

    fn login_request(email: &str, password: &str, role: Option<&str>) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
            role: role.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn register_returns_created() {
        let (state, _dir) = test_state();

        let (status, Json(body)) = register(
            State(state),
            ApiJson(register_request("ada@example.com", None)),
        )
        .await
        .expect("registration succeeds");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.message, "User registered successfully!");
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let (state, _dir) = test_state();
        register_user(&state, "ada@example.com", None).await;

        let err = register(
            State(state),
            ApiJson(register_request("ada@example.com", None)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Email is already registered");
    }

    #[tokio::test]
    async fn login_returns_token_for_stored_role() {
        let (state, _dir) = test_state();
        register_user(&state, "root@example.com", Some("admin")).await;

        let Json(body) = login(
            State(state.clone()),
            ApiJson(login_request("root@example.com", "correct horse", Some("Admin"))),
        )
        .await
        .expect("login succeeds");

        assert_eq!(body.role, Role::Admin);
        let user = state.tokens.verify(&body.token).unwrap();
        assert!(user.is_admin());
    }

    #[tokio::test]
    async fn login_role_mismatch_is_forbidden() {
        let (state, _dir) = test_state();
        register_user(&state, "ada@example.com", None).await;

        let err = login(
            State(state),
            ApiJson(login_request("ada@example.com", "correct horse", Some("admin"))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.message, "Role mismatch");
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_bad_request() {
        let (state, _dir) = test_state();
        register_user(&state, "ada@example.com", None).await;

        let err = login(
            State(state),
            ApiJson(login_request("ada@example.com", "nope", None)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid email or password");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn hashing_leaves_runtime_free_for_other_tasks() {
        let (state, _dir) = test_state();

        let timer = async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Instant::now()
        };
        let registration = async {
            let result = register(
                State(state.clone()),
                ApiJson(register_request("ada@example.com", None)),
            )
            .await;
            (result.is_ok(), Instant::now())
        };
        let (timer_fired, (registered, register_done)) = tokio::join!(timer, registration);
        assert!(registered);
        assert!(timer_fired < register_done);

        let timer = async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Instant::now()
        };
        let logging_in = async {
            let result = login(
                State(state.clone()),
                ApiJson(login_request("ada@example.com", "correct horse", None)),
            )
            .await;
            (result.is_ok(), Instant::now())
        };
        let (timer_fired, (logged_in, login_done)) = tokio::join!(timer, logging_in);
        assert!(logged_in);
        assert!(timer_fired < login_done);
    }
}
