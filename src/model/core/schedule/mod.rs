pub mod event;
pub mod scheduled_entry;
