// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Applied with `route_layer` to every protected router subtree so that a
//! missing, malformed or expired token is rejected before the handler runs.
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/loans", get(list_loans))
//!     .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth));
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::extractor::bearer_token;
use crate::state::AppState;

/// Verify the bearer token and attach the [`super::AuthenticatedUser`] to
/// the request extensions.
pub async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let user = match bearer_token(&parts).and_then(|token| state.tokens.verify(token)) {
        Ok(user) => user,
        Err(e) => {
            tracing::debug!(
                path = %parts.uri.path(),
                error_code = e.error_code(),
                "Rejected unauthenticated request"
            );
            return e.into_response();
        }
    };

    parts.extensions.insert(user);
    next.run(Request::from_parts(parts, body)).await
}
