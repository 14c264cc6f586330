use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct ConfigTable {
    #[serde(rename = "Config")]
    pub config: Config,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub tick_interval: u64,         // second
    pub max_file_operations: usize, // number
    pub database_path: PathBuf,
    pub log_directory: PathBuf,
    pub log_level: String,
    pub history_keep_days: u32, // day, 0 = keep forever
    pub channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval: 60,
            max_file_operations: 32,
            database_path: PathBuf::from("./backup.db"),
            log_directory: PathBuf::from("./logs"),
            log_level: String::from("info"),
            history_keep_days: 0,
            channel_capacity: 64,
        }
    }
}
