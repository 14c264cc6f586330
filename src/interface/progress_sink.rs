use crate::model::core::backup::progress::BackupProgress;
use tokio::sync::mpsc;

/// Receives progress snapshots while a backup or restore runs.
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: &BackupProgress);
}

impl ProgressSink for mpsc::UnboundedSender<BackupProgress> {
    fn report(&self, progress: &BackupProgress) {
        // A dropped receiver only means nobody is watching anymore.
        let _ = self.send(progress.clone());
    }
}
