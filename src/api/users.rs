// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{extract::State, Json};

use super::run_blocking;
use crate::{
    auth::Auth,
    error::{ApiError, ErrorResponse},
    models::UserProfile,
    state::AppState,
    storage::{StorageError, UserRepository},
};

/// Get the current authenticated user's profile.
///
/// Looks up the user named by the token; the password hash is never returned.
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_current_user(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, ApiError> {
    let stored = run_blocking(move || {
        UserRepository::new(&state.db)
            .get(&user.user_id)
            .map_err(|e| match e {
                StorageError::NotFound(_) => ApiError::not_found("User not found"),
                other => {
                    tracing::error!(user_id = %user.user_id, error = %other, "Failed to load user");
                    ApiError::internal("Server error")
                }
            })
    })
    .await?;

    Ok(Json(stored.into()))
}
