use crate::model::core::backup::job::BackupJob;
use chrono::NaiveDateTime;

/// In-memory pairing of a job with the instant it is due next.
#[derive(Debug, Clone)]
pub struct ScheduledEntry {
    pub job: BackupJob,
    pub next_run: NaiveDateTime,
}

impl ScheduledEntry {
    pub fn new(job: BackupJob, next_run: NaiveDateTime) -> Self {
        Self { job, next_run }
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.next_run <= now
    }
}
