use crate::interface::file_system::FileSystemTrait;
use crate::model::config::Config;
use crate::platform::file_system::FileSystem;
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::Semaphore;

pub struct IOManager {
    file_system: FileSystem,
}

impl IOManager {
    pub fn new(config: &Config) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_file_operations));
        Self {
            file_system: FileSystem::new(semaphore),
        }
    }

    /// Rejects every filesystem operation that has not acquired a permit yet.
    pub fn terminate(&self) {
        self.file_system.semaphore().close();
    }
}

impl Deref for IOManager {
    type Target = FileSystem;

    fn deref(&self) -> &Self::Target {
        &self.file_system
    }
}
