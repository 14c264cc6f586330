pub const CONFIG_PATH: &str = "./config.toml";
pub const LOG_FILE_PREFIX: &str = "backup-sphere.log";
// Snapshot directory suffix, local time
pub const SNAPSHOT_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
