use std::sync::Arc;

use async_trait::async_trait;
use sunlog_types::{session::SessionRecord, Result, SunlogError};
use tokio::sync::RwLock;

use crate::sort_descending;

/// Upstream record store, queried per user.
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// Newest first. Stores without a usable date index return an error.
    async fn sessions_by_date_desc(&self, user_id: &str) -> Result<Vec<SessionRecord>>;
    /// No ordering guarantee.
    async fn sessions_unordered(&self, user_id: &str) -> Result<Vec<SessionRecord>>;
}

/// Query capabilities of an [`InMemorySessionSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMode {
    #[default]
    Ordered,
    /// Ordered queries fail as if the date index were missing.
    Unindexed,
    /// Every query fails.
    Unavailable,
}

/// In-process store for development and tests.
#[derive(Clone, Default)]
pub struct InMemorySessionSource {
    records: Arc<RwLock<Vec<SessionRecord>>>,
    mode: SourceMode,
}

impl InMemorySessionSource {
    pub fn new(mode: SourceMode) -> Self {
        Self {
            records: Arc::default(),
            mode,
        }
    }

    pub fn with_records(mode: SourceMode, records: Vec<SessionRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
            mode,
        }
    }

    pub async fn insert(&self, record: SessionRecord) {
        self.records.write().await.push(record);
    }

    async fn for_user(&self, user_id: &str) -> Vec<SessionRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SessionSource for InMemorySessionSource {
    async fn sessions_by_date_desc(&self, user_id: &str) -> Result<Vec<SessionRecord>> {
        match self.mode {
            SourceMode::Ordered => {
                let mut records = self.for_user(user_id).await;
                sort_descending(&mut records);
                Ok(records)
            }
            SourceMode::Unindexed => Err(store_error(
                "ordered query needs a composite index on (userId, date)",
            )),
            SourceMode::Unavailable => Err(store_error("session store unavailable")),
        }
    }

    async fn sessions_unordered(&self, user_id: &str) -> Result<Vec<SessionRecord>> {
        match self.mode {
            SourceMode::Unavailable => Err(store_error("session store unavailable")),
            _ => Ok(self.for_user(user_id).await),
        }
    }
}

pub fn store_error(message: impl Into<String>) -> SunlogError {
    SunlogError::Store(message.into())
}
