use crate::model::core::backup::history::BackupHistory;
use crate::model::error::Error;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Newest first.
    async fn load_history(&self, limit: usize) -> Result<Vec<BackupHistory>, Error>;

    /// Newest first.
    async fn load_history_for_job(
        &self,
        job_id: Uuid,
        limit: usize,
    ) -> Result<Vec<BackupHistory>, Error>;

    async fn save_history(&self, record: &BackupHistory) -> Result<(), Error>;

    /// Deletes records that started more than `keep_days` ago and returns how many.
    /// `keep_days == 0` keeps everything.
    async fn cleanup_history(&self, keep_days: u32) -> Result<u64, Error>;
}
