use crate::interface::repository::history::HistoryRepository;
use crate::interface::repository::job::JobRepository;
use crate::model::core::backup::history::BackupHistory;
use crate::model::core::backup::job::BackupJob;
use crate::model::error::Error;
use async_trait::async_trait;
use chrono::{Duration, Local};
use dashmap::DashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local storage, nothing survives a restart.
#[derive(Default)]
pub struct MemoryStorage {
    jobs: DashMap<Uuid, BackupJob>,
    history: RwLock<Vec<BackupHistory>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_job(&self, job_id: Uuid) -> Option<BackupJob> {
        self.jobs.get(&job_id).map(|job| job.value().clone())
    }
}

#[async_trait]
impl JobRepository for MemoryStorage {
    async fn load_jobs(&self) -> Result<Vec<BackupJob>, Error> {
        let mut jobs: Vec<BackupJob> = self.jobs.iter().map(|x| x.value().clone()).collect();
        jobs.sort_by_key(|job| job.created_at);
        Ok(jobs)
    }

    async fn load_job(&self, job_id: Uuid) -> Result<Option<BackupJob>, Error> {
        Ok(self.get_job(job_id))
    }

    async fn save_job(&self, job: &mut BackupJob) -> Result<(), Error> {
        let now = Local::now().naive_local();
        match self.jobs.get(&job.id) {
            Some(stored) => job.created_at = stored.created_at,
            None => job.created_at = now,
        }
        job.modified_at = now;
        self.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn delete_job(&self, job_id: Uuid) -> Result<(), Error> {
        self.jobs.remove(&job_id);
        Ok(())
    }
}

#[async_trait]
impl HistoryRepository for MemoryStorage {
    async fn load_history(&self, limit: usize) -> Result<Vec<BackupHistory>, Error> {
        let history = self.history.read().await;
        let mut records = history.clone();
        records.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        records.truncate(limit);
        Ok(records)
    }

    async fn load_history_for_job(
        &self,
        job_id: Uuid,
        limit: usize,
    ) -> Result<Vec<BackupHistory>, Error> {
        let history = self.history.read().await;
        let mut records: Vec<BackupHistory> = history
            .iter()
            .filter(|record| record.job_id == job_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        records.truncate(limit);
        Ok(records)
    }

    async fn save_history(&self, record: &BackupHistory) -> Result<(), Error> {
        self.history.write().await.push(record.clone());
        Ok(())
    }

    async fn cleanup_history(&self, keep_days: u32) -> Result<u64, Error> {
        if keep_days == 0 {
            return Ok(0);
        }
        let cutoff = Local::now().naive_local() - Duration::days(keep_days as i64);
        let mut history = self.history.write().await;
        let before = history.len();
        history.retain(|record| record.start_time >= cutoff);
        Ok((before - history.len()) as u64)
    }
}
