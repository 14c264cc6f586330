pub mod backup_executor;
pub mod file_filter;
pub mod retention_manager;
