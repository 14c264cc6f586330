use crate::model::core::backup::history::BackupHistory;
use crate::model::core::backup::job::BackupJob;

/// Notifications published by the scheduler for presentation layers.
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    BackupStarted(BackupJob),
    BackupCompleted(BackupHistory),
    BackupFailed { job: BackupJob, error: String },
}
