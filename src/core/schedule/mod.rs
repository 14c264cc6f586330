pub mod job_scheduler;
pub mod schedule_calculator;
pub mod schedule_timer;
