// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration and login.
//!
//! Credentials live in the user store; passwords are argon2 hashed and
//! never logged. Login issues a one-hour bearer token carrying the user id
//! and role.

use axum::http::StatusCode;
use chrono::Utc;
use thiserror::Error;

use crate::auth::{PasswordService, Role, TokenService};
use crate::error::ApiError;
use crate::storage::{
    AuditEvent, AuditEventType, AuditRepository, LedgerDatabase, StorageError, StoredUser,
    UserRepository,
};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("{0}")]
    Validation(String),

    #[error("Email is already registered")]
    EmailTaken,

    /// Unknown email or wrong password; the two are indistinguishable.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Role mismatch")]
    RoleMismatch,

    /// Store or hashing failure during registration.
    #[error("{0}")]
    Registration(String),

    /// Unexpected failure during login; the detail is logged, not returned.
    #[error("Server error")]
    Internal(String),
}

impl IdentityError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            IdentityError::Validation(_)
            | IdentityError::EmailTaken
            | IdentityError::InvalidCredentials
            | IdentityError::Registration(_) => StatusCode::BAD_REQUEST,
            IdentityError::RoleMismatch => StatusCode::FORBIDDEN,
            IdentityError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(e: IdentityError) -> Self {
        match &e {
            IdentityError::Registration(detail) => {
                tracing::error!(error = %detail, "Registration failed");
            }
            IdentityError::Internal(detail) => {
                tracing::error!(error = %detail, "Login failed");
            }
            _ => {}
        }
        ApiError::new(e.status_code(), e.to_string())
    }
}

/// Identity operations over the user store.
pub struct IdentityService<'a> {
    db: &'a LedgerDatabase,
    passwords: &'a PasswordService,
    tokens: &'a TokenService,
}

impl<'a> IdentityService<'a> {
    pub fn new(
        db: &'a LedgerDatabase,
        passwords: &'a PasswordService,
        tokens: &'a TokenService,
    ) -> Self {
        Self {
            db,
            passwords,
            tokens,
        }
    }

    /// Create a user with a hashed password.
    pub fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Option<&str>,
    ) -> Result<StoredUser, IdentityError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() {
            return Err(IdentityError::Validation("Name is required".into()));
        }
        if email.is_empty() {
            return Err(IdentityError::Validation("Email is required".into()));
        }
        if !email.contains('@') {
            return Err(IdentityError::Validation("Email is invalid".into()));
        }
        if password.is_empty() {
            return Err(IdentityError::Validation("Password is required".into()));
        }
        let role = match role.map(str::trim).filter(|r| !r.is_empty()) {
            Some(raw) => Role::from_str(raw)
                .ok_or_else(|| IdentityError::Validation(format!("Invalid role: {raw}")))?,
            None => Role::default(),
        };

        let users = UserRepository::new(self.db);
        if users
            .find_by_email(email)
            .map_err(|e| IdentityError::Registration(e.to_string()))?
            .is_some()
        {
            return Err(IdentityError::EmailTaken);
        }

        let password_hash = self
            .passwords
            .hash(password)
            .map_err(|e| IdentityError::Registration(e.to_string()))?;

        let user = StoredUser {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            role,
            created_at: Utc::now(),
        };

        // The store re-checks the email inside its write transaction.
        users.create(&user).map_err(|e| match e {
            StorageError::AlreadyExists(_) => IdentityError::EmailTaken,
            other => IdentityError::Registration(other.to_string()),
        })?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        AuditRepository::new(self.db).record(
            &AuditEvent::new(AuditEventType::UserRegistered)
                .with_user(&user.id)
                .with_resource("user", &user.id),
        );

        Ok(user)
    }

    /// Verify credentials and issue a token. Returns the token and the
    /// stored role.
    ///
    /// The email is trimmed the same way [`Self::register`] trims it before
    /// storing, so surrounding whitespace never changes which account matches.
    pub fn login(
        &self,
        email: &str,
        password: &str,
        role: Option<&str>,
    ) -> Result<(String, Role), IdentityError> {
        let user = UserRepository::new(self.db)
            .find_by_email(email.trim())
            .map_err(|e| IdentityError::Internal(e.to_string()))?;

        let Some(user) = user else {
            self.audit_login_failure(None, "unknown email");
            return Err(IdentityError::InvalidCredentials);
        };

        let matches = self
            .passwords
            .verify(password, &user.password_hash)
            .map_err(|e| IdentityError::Internal(e.to_string()))?;
        if !matches {
            self.audit_login_failure(Some(&user.id), "wrong password");
            return Err(IdentityError::InvalidCredentials);
        }

        if let Some(requested) = role.map(str::trim).filter(|r| !r.is_empty()) {
            if !requested.eq_ignore_ascii_case(user.role.as_str()) {
                self.audit_login_failure(Some(&user.id), "role mismatch");
                return Err(IdentityError::RoleMismatch);
            }
        }

        let token = self
            .tokens
            .issue(&user.id, user.role)
            .map_err(|e| IdentityError::Internal(e.to_string()))?;

        tracing::info!(user_id = %user.id, role = %user.role, "User logged in");
        AuditRepository::new(self.db)
            .record(&AuditEvent::new(AuditEventType::LoginSucceeded).with_user(&user.id));

        Ok((token, user.role))
    }

    fn audit_login_failure(&self, user_id: Option<&str>, reason: &str) {
        tracing::info!(user_id = ?user_id, reason, "Login rejected");
        let mut event = AuditEvent::new(AuditEventType::LoginFailed).failed(reason);
        if let Some(user_id) = user_id {
            event = event.with_user(user_id);
        }
        AuditRepository::new(self.db).record(&event);
    }
}
