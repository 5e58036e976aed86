// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{PasswordService, TokenService};
use crate::storage::LedgerDatabase;

/// Shared handler state. Cloning is cheap; everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<LedgerDatabase>,
    pub tokens: Arc<TokenService>,
    pub passwords: Arc<PasswordService>,
}

impl AppState {
    pub fn new(db: LedgerDatabase, tokens: TokenService) -> Self {
        Self {
            db: Arc::new(db),
            tokens: Arc::new(tokens),
            passwords: Arc::new(PasswordService::new()),
        }
    }
}

/// State backed by a throwaway database. Keep the `TempDir` alive for the
/// duration of the test.
#[cfg(test)]
pub(crate) fn test_state() -> (AppState, tempfile::TempDir) {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let db = LedgerDatabase::open(&temp_dir.path().join("test.redb"))
        .expect("Failed to open test database");
    let state = AppState::new(db, TokenService::new("test-secret"));
    (state, temp_dir)
}
