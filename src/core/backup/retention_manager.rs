use crate::core::infrastructure::io_manager::IOManager;
use crate::interface::file_system::FileSystemTrait;
use crate::model::core::backup::job::{BackupJob, BackupOptions};
use crate::model::log::backup::BackupLog;
use macros::log;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub path: PathBuf,
    pub created: SystemTime,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionReport {
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Prunes old snapshot directories of a job by count and by age.
pub struct RetentionManager {
    io_manager: Arc<IOManager>,
}

impl RetentionManager {
    pub fn new(io_manager: Arc<IOManager>) -> Self {
        Self { io_manager }
    }

    pub async fn cleanup(&self, job: &BackupJob) -> RetentionReport {
        self.cleanup_at(job, SystemTime::now()).await
    }

    pub async fn cleanup_at(&self, job: &BackupJob, now: SystemTime) -> RetentionReport {
        let mut report = RetentionReport::default();
        if !job.options.enable_retention || !self.io_manager.exists(&job.destination_path).await {
            return report;
        }

        let snapshots = self.list_snapshots(job).await;
        for path in Self::select_expired(snapshots, &job.options, now) {
            match self.io_manager.delete_directory(&path).await {
                Ok(()) => {
                    log!(BackupLog::SnapshotRemoved { path: path.clone() });
                    report.deleted.push(path);
                }
                Err(err) => {
                    log!(err, job.name);
                    report.failed.push(path);
                }
            }
        }
        report
    }

    /// Snapshot directories of `job`, newest first.
    pub async fn list_snapshots(&self, job: &BackupJob) -> Vec<Snapshot> {
        let entries = match self.io_manager.list_directory(&job.destination_path).await {
            Ok(entries) => entries,
            Err(err) => {
                log!(err, job.name);
                return Vec::new();
            }
        };

        let prefix = job.snapshot_prefix();
        let mut snapshots = Vec::new();
        for path in entries {
            let matches_prefix = path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with(&prefix));
            if !matches_prefix || !self.io_manager.is_directory(&path).await {
                continue;
            }
            match self.io_manager.created_time(&path).await {
                Ok(created) => snapshots.push(Snapshot { path, created }),
                Err(err) => log!(err, job.name),
            }
        }
        snapshots.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.path.cmp(&a.path)));
        snapshots
    }

    /// Applies the count policy and the age policy independently, a snapshot
    /// selected by either one is expired. `snapshots` must be newest first.
    pub fn select_expired(
        snapshots: Vec<Snapshot>,
        options: &BackupOptions,
        now: SystemTime,
    ) -> Vec<PathBuf> {
        let max_count = options.max_backup_count as usize;
        let cutoff = match options.retention_days {
            0 => None,
            days => now.checked_sub(Duration::from_secs(days as u64 * SECONDS_PER_DAY)),
        };

        snapshots
            .into_iter()
            .enumerate()
            .filter(|(index, snapshot)| {
                let over_count = max_count > 0 && *index >= max_count;
                let too_old = cutoff.is_some_and(|cutoff| snapshot.created < cutoff);
                over_count || too_old
            })
            .map(|(_, snapshot)| snapshot.path)
            .collect()
    }
}
