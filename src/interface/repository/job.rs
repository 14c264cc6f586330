use crate::model::core::backup::job::BackupJob;
use crate::model::error::Error;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn load_jobs(&self) -> Result<Vec<BackupJob>, Error>;

    async fn load_job(&self, job_id: Uuid) -> Result<Option<BackupJob>, Error>;

    /// Upserts by id. Stamps `created_at` on first save and `modified_at` on every save.
    async fn save_job(&self, job: &mut BackupJob) -> Result<(), Error>;

    async fn delete_job(&self, job_id: Uuid) -> Result<(), Error>;
}
