pub mod app_config;
pub mod database_manager;
pub mod event_broadcaster;
pub mod io_manager;
pub mod memory_storage;
