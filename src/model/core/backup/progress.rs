use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupProgress {
    pub total_files: u64,
    pub total_bytes: u64,
    pub processed_files: u64,
    pub failed_files: u64,
    pub processed_bytes: u64,
    pub current_file: Option<PathBuf>,
}

impl BackupProgress {
    pub fn new(total_files: u64, total_bytes: u64) -> Self {
        Self {
            total_files,
            total_bytes,
            ..Default::default()
        }
    }

    pub fn finished_files(&self) -> u64 {
        self.processed_files + self.failed_files
    }
}

/// Result of copying a snapshot back to a target directory.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub total_files: u64,
    pub restored_files: u64,
    pub failed_files: u64,
    pub restored_bytes: u64,
    pub errors: Vec<String>,
    pub cancelled: bool,
}
