// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Local credential authentication for the lending API.
//!
//! ## Auth Flow
//!
//! 1. Client calls `POST /auth/login` with email and password
//! 2. Server verifies the argon2 hash and issues an HS256 JWT carrying
//!    `{userId, role}` with a one-hour expiry
//! 3. Client sends `Authorization: Bearer <token>` on protected routes
//! 4. The `require_auth` middleware verifies signature and expiry and
//!    attaches an [`AuthenticatedUser`] to the request
//!
//! ## Security
//!
//! - Rejections happen before any handler runs (401 with an `error_code`)
//! - Identity is taken from the token only, never from request bodies
//! - Expiry is enforced without leeway

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod roles;
pub mod tokens;

pub use claims::{AuthenticatedUser, TokenClaims};
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use middleware::require_auth;
pub use password::{PasswordError, PasswordService};
pub use roles::Role;
pub use tokens::{TokenError, TokenService, TOKEN_TTL_SECS};
