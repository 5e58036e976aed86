// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Lending Server - loan lifecycle and repayment service
//!
//! Customers register, log in with a bearer token, request loans with a
//! weekly repayment schedule and repay them installment by installment.
//! Admins approve loans before repayments are accepted.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token issuance/verification, password hashing, roles
//! - `identity` - Registration and login
//! - `lending` - Loan state machine, money arithmetic, loan service
//! - `storage` - Embedded redb storage and audit trail

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod identity;
pub mod lending;
pub mod models;
pub mod state;
pub mod storage;
