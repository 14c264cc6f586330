pub mod file_system;
pub mod progress_sink;
pub mod repository;
