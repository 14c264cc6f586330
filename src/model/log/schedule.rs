use chrono::NaiveDateTime;
use macros::loggable;

loggable! {
    ScheduleLog {
        #[error("Scheduler started with {job_count} scheduled jobs")]
        SchedulerStarted { job_count: usize } => tracing::Level::INFO,

        #[error("Scheduler stopped")]
        SchedulerStopped => tracing::Level::INFO,

        #[error("Job {job_name} scheduled for {next_run}")]
        JobScheduled { job_name: String, next_run: NaiveDateTime } => tracing::Level::INFO,

        #[error("Job {job_name} is manual and will not be scheduled")]
        ManualJobSkipped { job_name: String } => tracing::Level::DEBUG,

        #[error("Job {job_name} is disabled and will not be scheduled")]
        DisabledJobSkipped { job_name: String } => tracing::Level::DEBUG,

        #[error("Job {job_name} removed from schedule")]
        JobUnscheduled { job_name: String } => tracing::Level::INFO,

        #[error("Job {job_name} is due")]
        JobDue { job_name: String } => tracing::Level::INFO,

        #[error("Job {job_name} is still executing, skipping this tick")]
        JobStillRunning { job_name: String } => tracing::Level::WARN,

        #[error("Job {job_name} has no further occurrence and fell out of schedule")]
        JobLeftSchedule { job_name: String } => tracing::Level::INFO,
    }
}
