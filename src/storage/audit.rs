// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit logging for security-sensitive operations.
//!
//! Authentication events, loan lifecycle changes and denied accesses are
//! appended to the `audit_events` table. Keys start with the big-endian
//! timestamp and a process-wide sequence number so a reverse scan yields
//! newest-first.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::database::{timestamp_key, AUDIT_EVENTS};
use super::{LedgerDatabase, StorageResult};

/// Breaks ties between events logged within the same microsecond.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Types of auditable events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // Identity events
    UserRegistered,
    LoginSucceeded,
    LoginFailed,

    // Loan events
    LoanCreated,
    LoanApproved,
    RepaymentRecorded,
    LoanPaid,

    // Access control
    PermissionDenied,
    AdminAccess,
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: AuditEventType,
    /// User who triggered the event (if known).
    pub user_id: Option<String>,
    /// Resource affected (loan_id, user_id).
    pub resource_id: Option<String>,
    /// Resource type (loan, user).
    pub resource_type: Option<String>,
    /// Additional details as JSON.
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error message if operation failed.
    pub error: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event.
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            user_id: None,
            resource_id: None,
            resource_type: None,
            details: None,
            success: true,
            error: None,
        }
    }

    /// Set the user ID.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the resource.
    pub fn with_resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Add details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failed with error message.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }

    fn key(&self, sequence: u64) -> Vec<u8> {
        let mut key = Vec::with_capacity(16 + self.event_id.len());
        key.extend_from_slice(&timestamp_key(self.timestamp.timestamp_micros()));
        key.extend_from_slice(&sequence.to_be_bytes());
        key.extend_from_slice(self.event_id.as_bytes());
        key
    }

    fn matches(&self, filter: &AuditFilter) -> bool {
        let user_ok = filter
            .user_id
            .as_deref()
            .is_none_or(|id| self.user_id.as_deref() == Some(id));
        let resource_ok = filter
            .resource_id
            .as_deref()
            .is_none_or(|id| self.resource_id.as_deref() == Some(id));
        let type_ok = filter
            .event_type
            .as_ref()
            .is_none_or(|t| &self.event_type == t);
        user_ok && resource_ok && type_ok
    }
}

/// Optional constraints for audit queries.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub user_id: Option<String>,
    pub resource_id: Option<String>,
    pub event_type: Option<AuditEventType>,
}

/// Repository for audit events.
pub struct AuditRepository<'a> {
    db: &'a LedgerDatabase,
}

impl<'a> AuditRepository<'a> {
    /// Create a new audit repository.
    pub fn new(db: &'a LedgerDatabase) -> Self {
        Self { db }
    }

    /// Append an audit event.
    pub fn log(&self, event: &AuditEvent) -> StorageResult<()> {
        let json = serde_json::to_vec(event)?;
        let key = event.key(SEQUENCE.fetch_add(1, Ordering::Relaxed));

        let write_txn = self.db.raw().begin_write()?;
        {
            let mut table = write_txn.open_table(AUDIT_EVENTS)?;
            table.insert(key.as_slice(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Append an audit event, logging instead of failing.
    pub fn record(&self, event: &AuditEvent) {
        if let Err(e) = self.log(event) {
            tracing::warn!(
                error = %e,
                event_type = ?event.event_type,
                "Failed to write audit event"
            );
        }
    }

    /// Matching events, newest first, after skipping `offset` matches; plus
    /// the total number of matches.
    pub fn query(
        &self,
        filter: &AuditFilter,
        offset: usize,
        limit: usize,
    ) -> StorageResult<(Vec<AuditEvent>, usize)> {
        let read_txn = self.db.raw().begin_read()?;
        let table = read_txn.open_table(AUDIT_EVENTS)?;

        let mut events = Vec::new();
        let mut total = 0;
        for entry in table.iter()?.rev() {
            let (_, value) = entry?;
            let event: AuditEvent = serde_json::from_slice(value.value())?;
            if !event.matches(filter) {
                continue;
            }
            total += 1;
            if total > offset && events.len() < limit {
                events.push(event);
            }
        }

        Ok((events, total))
    }
}

/// Helper macro for logging audit events on behalf of an authenticated user.
#[macro_export]
macro_rules! audit_log {
    ($db:expr, $event_type:expr, $user:expr) => {{
        let repo = $crate::storage::AuditRepository::new($db);
        let event = $crate::storage::AuditEvent::new($event_type).with_user(&$user.user_id);
        repo.record(&event);
    }};
    ($db:expr, $event_type:expr, $user:expr, $resource_type:expr, $resource_id:expr) => {{
        let repo = $crate::storage::AuditRepository::new($db);
        let event = $crate::storage::AuditEvent::new($event_type)
            .with_user(&$user.user_id)
            .with_resource($resource_type, $resource_id);
        repo.record(&event);
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, LedgerDatabase) {
        let temp = TempDir::new().unwrap();
        let db = LedgerDatabase::open(&temp.path().join("audit.redb")).unwrap();
        (temp, db)
    }

    #[test]
    fn create_audit_event() {
        let event = AuditEvent::new(AuditEventType::LoanCreated)
            .with_user("user_123")
            .with_resource("loan", "loan_abc")
            .with_details(serde_json::json!({ "term": 3 }));

        assert_eq!(event.event_type, AuditEventType::LoanCreated);
        assert_eq!(event.user_id, Some("user_123".to_string()));
        assert_eq!(event.resource_type, Some("loan".to_string()));
        assert_eq!(event.resource_id, Some("loan_abc".to_string()));
        assert_eq!(event.details.as_ref().unwrap()["term"], 3);
        assert!(event.success);
    }

    #[test]
    fn failed_event() {
        let event = AuditEvent::new(AuditEventType::LoginFailed)
            .with_user("user_123")
            .failed("Invalid email or password");

        assert!(!event.success);
        assert_eq!(event.error, Some("Invalid email or password".to_string()));
    }

    #[test]
    fn query_returns_newest_first() {
        let (_temp, db) = setup();
        let repo = AuditRepository::new(&db);

        let mut first = AuditEvent::new(AuditEventType::UserRegistered).with_user("user_1");
        first.timestamp = Utc::now() - chrono::Duration::seconds(10);
        let second = AuditEvent::new(AuditEventType::LoginSucceeded).with_user("user_1");

        repo.log(&first).unwrap();
        repo.log(&second).unwrap();

        let (events, total) = repo.query(&AuditFilter::default(), 0, 10).unwrap();
        assert_eq!(total, 2);
        assert_eq!(events[0].event_type, AuditEventType::LoginSucceeded);
        assert_eq!(events[1].event_type, AuditEventType::UserRegistered);
    }

    #[test]
    fn query_filters_by_user_and_resource() {
        let (_temp, db) = setup();
        let repo = AuditRepository::new(&db);

        repo.log(
            &AuditEvent::new(AuditEventType::LoanCreated)
                .with_user("user_target")
                .with_resource("loan", "l1"),
        )
        .unwrap();
        repo.log(
            &AuditEvent::new(AuditEventType::LoanCreated)
                .with_user("user_other")
                .with_resource("loan", "l2"),
        )
        .unwrap();
        repo.log(
            &AuditEvent::new(AuditEventType::LoanApproved)
                .with_user("admin")
                .with_resource("loan", "l1"),
        )
        .unwrap();

        let by_user = AuditFilter {
            user_id: Some("user_target".into()),
            ..Default::default()
        };
        let (events, total) = repo.query(&by_user, 0, 10).unwrap();
        assert_eq!(total, 1);
        assert_eq!(events[0].user_id.as_deref(), Some("user_target"));

        let by_resource = AuditFilter {
            resource_id: Some("l1".into()),
            ..Default::default()
        };
        let (_, total) = repo.query(&by_resource, 0, 10).unwrap();
        assert_eq!(total, 2);
    }

    #[test]
    fn query_limit_keeps_total() {
        let (_temp, db) = setup();
        let repo = AuditRepository::new(&db);
        for _ in 0..5 {
            repo.log(&AuditEvent::new(AuditEventType::LoginFailed)).unwrap();
        }

        let (events, total) = repo.query(&AuditFilter::default(), 0, 2).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(total, 5);

        let (events, total) = repo.query(&AuditFilter::default(), 4, 2).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(total, 5);
    }

    #[test]
    fn query_filters_by_event_type() {
        let (_temp, db) = setup();
        let repo = AuditRepository::new(&db);
        repo.log(&AuditEvent::new(AuditEventType::LoginFailed)).unwrap();
        repo.log(&AuditEvent::new(AuditEventType::LoginSucceeded)).unwrap();

        let filter = AuditFilter {
            event_type: Some(AuditEventType::LoginFailed),
            ..Default::default()
        };
        let (events, total) = repo.query(&filter, 0, 10).unwrap();
        assert_eq!(total, 1);
        assert_eq!(events[0].event_type, AuditEventType::LoginFailed);
    }
}
