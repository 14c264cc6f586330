pub mod backup;
pub mod schedule;
