use std::future::Future;
use std::pin::Pin;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::permission::PermissionOutcome;

/// One permission decision, as recorded.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub session_id: Uuid,
    pub tool_name: String,
    pub outcome: PermissionOutcome,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl DecisionRecord {
    pub fn new(
        session_id: Uuid,
        tool_name: impl Into<String>,
        outcome: PermissionOutcome,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            session_id,
            tool_name: tool_name.into(),
            outcome,
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only log of permission decisions, shared across sessions.
///
/// Dyn-compatible so implementations (in-memory, file, database) can be
/// swapped behind an `Arc<dyn DecisionLog>`.
pub trait DecisionLog: Send + Sync {
    fn record(&self, record: DecisionRecord) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    fn entries(&self) -> Pin<Box<dyn Future<Output = Vec<DecisionRecord>> + Send + '_>>;
}

/// In-memory decision log. The lock is never held across an await point.
#[derive(Default)]
pub struct InMemoryDecisionLog {
    records: RwLock<Vec<DecisionRecord>>,
}

impl InMemoryDecisionLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DecisionLog for InMemoryDecisionLog {
    fn record(&self, record: DecisionRecord) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        if let Ok(mut records) = self.records.write() {
            records.push(record);
        }
        Box::pin(async {})
    }

    fn entries(&self) -> Pin<Box<dyn Future<Output = Vec<DecisionRecord>> + Send + '_>> {
        let snapshot = self
            .records
            .read()
            .map(|r| r.clone())
            .unwrap_or_default();
        Box::pin(async move { snapshot })
    }
}
