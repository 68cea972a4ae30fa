use std::path::PathBuf;

use async_trait::async_trait;
use sunlog_stats::{sort_descending, store_error, SessionSource};
use sunlog_types::{session::SessionRecord, Result};

/// Session store backed by a JSON array on disk, re-read on every query.
pub struct JsonFileSource {
    path: PathBuf,
    indexed: bool,
}

impl JsonFileSource {
    /// `indexed = false` makes ordered queries fail, exercising the local-sort path.
    pub fn new(path: PathBuf, indexed: bool) -> Self {
        Self { path, indexed }
    }

    async fn load(&self, user_id: &str) -> Result<Vec<SessionRecord>> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|err| {
            store_error(format!("unable to read {}: {err}", self.path.display()))
        })?;
        let records: Vec<SessionRecord> = serde_json::from_str(&contents).map_err(|err| {
            store_error(format!("malformed sessions in {}: {err}", self.path.display()))
        })?;
        Ok(records
            .into_iter()
            .filter(|record| record.user_id == user_id)
            .collect())
    }
}

#[async_trait]
impl SessionSource for JsonFileSource {
    async fn sessions_by_date_desc(&self, user_id: &str) -> Result<Vec<SessionRecord>> {
        if !self.indexed {
            return Err(store_error("file source opened without a date index"));
        }
        let mut records = self.load(user_id).await?;
        sort_descending(&mut records);
        Ok(records)
    }

    async fn sessions_unordered(&self, user_id: &str) -> Result<Vec<SessionRecord>> {
        self.load(user_id).await
    }
}
