use crate::model::core::backup::history::BackupHistory;
use chrono::{Local, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Recurrence rule of a job. Times of day are local wall-clock times.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Manual,
    EveryMinutes(u32),
    EveryHours(u32),
    Daily(NaiveTime),
    Weekly(Weekday, NaiveTime),
    // Day of month 1..=31, clamped to the month's last day
    Monthly(u32, NaiveTime),
}

impl Schedule {
    pub fn is_manual(&self) -> bool {
        matches!(self, Schedule::Manual)
    }
}

/// Outcome of the latest execution, also the state machine of one run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    NeverRun,
    Running,
    Completed,
    CompletedWithWarnings,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Runs that produced a usable snapshot.
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::CompletedWithWarnings)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BackupOptions {
    pub include_hidden: bool,
    pub include_system: bool,
    pub exclude_patterns: Vec<String>,
    pub include_patterns: Vec<String>,
    pub preserve_attributes: bool,
    pub preserve_timestamps: bool,
    pub verify_after_backup: bool,
    pub enable_retention: bool,
    pub max_backup_count: u32,  // 0 = unlimited
    pub retention_days: u32,    // 0 = unlimited
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            include_hidden: false,
            include_system: false,
            exclude_patterns: Vec::new(),
            include_patterns: Vec::new(),
            preserve_attributes: true,
            preserve_timestamps: true,
            verify_after_backup: false,
            enable_retention: false,
            max_backup_count: 0,
            retention_days: 0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BackupJob {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_enabled: bool,
    pub source_paths: Vec<PathBuf>,
    pub destination_path: PathBuf,
    pub schedule: Schedule,
    pub options: BackupOptions,
    pub last_run_time: Option<NaiveDateTime>,
    pub last_run_status: JobStatus,
    pub last_backup_size: u64,
    pub total_backup_count: u64,
    pub next_run_time: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub modified_at: NaiveDateTime,
}

impl BackupJob {
    pub fn new(
        name: impl Into<String>,
        source_paths: Vec<PathBuf>,
        destination_path: impl Into<PathBuf>,
        schedule: Schedule,
    ) -> Self {
        let now = Local::now().naive_local();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            is_enabled: true,
            source_paths,
            destination_path: destination_path.into(),
            schedule,
            options: BackupOptions::default(),
            last_run_time: None,
            last_run_status: JobStatus::NeverRun,
            last_backup_size: 0,
            total_backup_count: 0,
            next_run_time: None,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn with_options(mut self, options: BackupOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_enabled(mut self, is_enabled: bool) -> Self {
        self.is_enabled = is_enabled;
        self
    }

    /// Prefix shared by every snapshot directory this job produces.
    pub fn snapshot_prefix(&self) -> String {
        format!("{}_", self.id)
    }

    /// Folds the statistics of a finished execution into the job.
    pub fn record_run(&mut self, history: &BackupHistory) {
        self.last_run_time = Some(history.start_time);
        self.last_run_status = history.status;
        self.last_backup_size = history.processed_bytes;
        self.total_backup_count += 1;
    }

    /// Takes the run statistics of `ran` and leaves the definition untouched.
    pub fn merge_run_statistics(&mut self, ran: &BackupJob) {
        self.last_run_time = ran.last_run_time;
        self.last_run_status = ran.last_run_status;
        self.last_backup_size = ran.last_backup_size;
        self.total_backup_count = ran.total_backup_count;
    }
}
