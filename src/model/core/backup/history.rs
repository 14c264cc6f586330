use crate::model::core::backup::job::{BackupJob, JobStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Log entry of one attempted execution. Never mutated once persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BackupHistory {
    pub id: Uuid,
    pub job_id: Uuid,
    pub job_name: String,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub status: JobStatus,
    pub error_message: Option<String>,
    pub total_files: u64,
    pub processed_files: u64,
    pub failed_files: u64,
    pub total_bytes: u64,
    pub processed_bytes: u64,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub destination_path: PathBuf,
}

impl BackupHistory {
    pub fn start(job: &BackupJob, start_time: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id: job.id,
            job_name: job.name.clone(),
            start_time,
            end_time: None,
            status: JobStatus::Running,
            error_message: None,
            total_files: 0,
            processed_files: 0,
            failed_files: 0,
            total_bytes: 0,
            processed_bytes: 0,
            warnings: Vec::new(),
            errors: Vec::new(),
            destination_path: job.destination_path.clone(),
        }
    }

    pub fn finish(&mut self, status: JobStatus, end_time: NaiveDateTime) {
        self.status = status;
        self.end_time = Some(end_time);
    }

    pub fn fail(&mut self, message: impl Into<String>, end_time: NaiveDateTime) {
        self.error_message = Some(message.into());
        self.finish(JobStatus::Failed, end_time);
    }
}
