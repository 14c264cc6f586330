use macros::traceable;
use uuid::Uuid;

traceable! {
    TaskError {
        #[no_source]
        #[error("Job {job_id} is already executing")]
        ExecutionAlreadyRunning { job_id: Uuid } => tracing::Level::WARN,

        #[no_source]
        #[error("Scheduler is already running")]
        SchedulerAlreadyRunning => tracing::Level::INFO,

        #[no_source]
        #[error("Scheduler is not running")]
        SchedulerNotRunning => tracing::Level::INFO,

        #[no_source]
        #[error("Job {job_id} has no further run time and is not scheduled")]
        NoNextRunTime { job_id: Uuid } => tracing::Level::WARN,

        #[error("Failed to load jobs: {err}")]
        LoadJobsFailed => tracing::Level::ERROR,

        #[error("Invalid file pattern {pattern}: {err}")]
        InvalidPattern { pattern: String } => tracing::Level::ERROR,

        #[error("Failed to prepare snapshot directory {path:?}: {err}")]
        SnapshotSetupFailed { path: std::path::PathBuf } => tracing::Level::ERROR,
    }
}
