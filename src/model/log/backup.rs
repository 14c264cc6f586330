use crate::model::core::backup::job::JobStatus;
use macros::loggable;
use std::path::PathBuf;

loggable! {
    BackupLog {
        #[error("Backup of {job_name} started into {snapshot:?}")]
        ExecutionStarted { job_name: String, snapshot: PathBuf } => tracing::Level::INFO,

        #[error("Backup of {job_name} finished with status {status:?}")]
        ExecutionFinished { job_name: String, status: JobStatus } => tracing::Level::INFO,

        #[error("Backup of {job_name} was cancelled")]
        ExecutionCancelled { job_name: String } => tracing::Level::WARN,

        #[error("Source path does not exist: {path:?}")]
        SourceMissing { path: PathBuf } => tracing::Level::WARN,

        #[error("Skipped symlinked directory {path:?}")]
        LinkedDirectorySkipped { path: PathBuf } => tracing::Level::WARN,

        #[error("Verification of {path:?} reported {warnings} warnings")]
        VerificationFinished { path: PathBuf, warnings: usize } => tracing::Level::INFO,

        #[error("Retention removed snapshot {path:?}")]
        SnapshotRemoved { path: PathBuf } => tracing::Level::INFO,

        #[error("Restore of {path:?} finished, {restored} restored, {failed} failed")]
        RestoreFinished { path: PathBuf, restored: u64, failed: u64 } => tracing::Level::INFO,
    }
}
