use crate::core::backup::file_filter::FileFilter;
use crate::core::backup::retention_manager::RetentionManager;
use crate::core::infrastructure::io_manager::IOManager;
use crate::interface::file_system::{FileSystemTrait, MetadataPolicy, WalkedFile};
use crate::interface::progress_sink::ProgressSink;
use crate::interface::repository::Storage;
use crate::model::core::backup::history::BackupHistory;
use crate::model::core::backup::job::{BackupJob, JobStatus};
use crate::model::core::backup::progress::{BackupProgress, RestoreSummary};
use crate::model::error::Error;
use crate::model::error::io::IOError;
use crate::model::error::task::TaskError;
use crate::model::log::backup::BackupLog;
use crate::platform::constants::SNAPSHOT_TIME_FORMAT;
use chrono::Local;
use dashmap::DashSet;
use macros::log;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Result of handling one candidate file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Copied { bytes: u64, warning: Option<String> },
    Failed { message: String },
}

impl FileOutcome {
    fn failed(relative_path: &Path, err: Error) -> Self {
        FileOutcome::Failed {
            message: format!("{}: {}", relative_path.display(), err),
        }
    }
}

// Marks a job as executing until dropped.
struct ExecutionGuard<'a> {
    running: &'a DashSet<Uuid>,
    job_id: Uuid,
}

impl<'a> ExecutionGuard<'a> {
    fn acquire(running: &'a DashSet<Uuid>, job_id: Uuid) -> Result<Self, Error> {
        if !running.insert(job_id) {
            Err(TaskError::execution_already_running(job_id))?
        }
        Ok(Self { running, job_id })
    }
}

impl Drop for ExecutionGuard<'_> {
    fn drop(&mut self) {
        self.running.remove(&self.job_id);
    }
}

pub struct BackupExecutor {
    io_manager: Arc<IOManager>,
    storage: Arc<dyn Storage>,
    retention_manager: RetentionManager,
    running: DashSet<Uuid>,
}

impl BackupExecutor {
    pub fn new(io_manager: Arc<IOManager>, storage: Arc<dyn Storage>) -> Self {
        Self {
            retention_manager: RetentionManager::new(io_manager.clone()),
            io_manager,
            storage,
            running: DashSet::new(),
        }
    }

    pub fn is_running(&self, job_id: Uuid) -> bool {
        self.running.contains(&job_id)
    }

    /// Runs one backup of `job` and folds the outcome into its statistics.
    ///
    /// Every failure during the run ends up in the returned record. `Err` is
    /// only returned when the same job is already executing.
    pub async fn execute(
        &self,
        job: &mut BackupJob,
        progress: Option<&dyn ProgressSink>,
        cancel: Option<&CancellationToken>,
    ) -> Result<BackupHistory, Error> {
        let _guard = ExecutionGuard::acquire(&self.running, job.id)?;

        let start_time = Local::now().naive_local();
        let mut history = BackupHistory::start(job, start_time);
        let snapshot = job.destination_path.join(format!(
            "{}{}",
            job.snapshot_prefix(),
            start_time.format(SNAPSHOT_TIME_FORMAT)
        ));
        history.destination_path = snapshot.clone();

        match self
            .run_backup(job, &snapshot, &mut history, progress, cancel)
            .await
        {
            Ok(JobStatus::Cancelled) => {
                BackupLog::ExecutionCancelled {
                    job_name: job.name.clone(),
                }
                .log();
                history.finish(JobStatus::Cancelled, Local::now().naive_local());
            }
            Ok(status) => history.finish(status, Local::now().naive_local()),
            Err(err) => {
                log!(err, job.name);
                history.fail(err.to_string(), Local::now().naive_local());
            }
        }
        BackupLog::ExecutionFinished {
            job_name: job.name.clone(),
            status: history.status,
        }
        .log();

        job.record_run(&history);
        if let Err(err) = self.save_statistics(job).await {
            log!(err, job.name);
            history
                .warnings
                .push(format!("Failed to save job statistics: {err}"));
        }
        if let Err(err) = self.storage.save_history(&history).await {
            log!(err, job.name);
        }

        if history.status.is_success() {
            let report = self.retention_manager.cleanup(job).await;
            if !report.failed.is_empty() {
                tracing::warn!(
                    job_name = %job.name,
                    failed = report.failed.len(),
                    "Some snapshots could not be removed"
                );
            }
        }

        Ok(history)
    }

    // The stored definition may have changed while the run was in progress,
    // only the run statistics are written over it.
    async fn save_statistics(&self, job: &BackupJob) -> Result<(), Error> {
        let mut stored = match self.storage.load_job(job.id).await? {
            Some(mut stored) => {
                stored.merge_run_statistics(job);
                stored
            }
            None => job.clone(),
        };
        self.storage.save_job(&mut stored).await
    }

    async fn run_backup(
        &self,
        job: &BackupJob,
        snapshot: &Path,
        history: &mut BackupHistory,
        progress: Option<&dyn ProgressSink>,
        cancel: Option<&CancellationToken>,
    ) -> Result<JobStatus, Error> {
        let filter = FileFilter::new(&job.options)?;
        self.io_manager
            .create_directory(snapshot)
            .await
            .map_err(|err| TaskError::snapshot_setup_failed(snapshot, err))?;
        BackupLog::ExecutionStarted {
            job_name: job.name.clone(),
            snapshot: snapshot.to_path_buf(),
        }
        .log();

        let candidates = self.collect_candidates(job, &filter, history).await?;
        history.total_files = candidates.len() as u64;
        history.total_bytes = candidates.iter().map(|file| file.size).sum();

        let mut state = BackupProgress::new(history.total_files, history.total_bytes);
        report(progress, &state);

        let policy = MetadataPolicy {
            attributes: job.options.preserve_attributes,
            timestamps: job.options.preserve_timestamps,
        };
        for file in candidates {
            if is_cancelled(cancel) {
                return Ok(JobStatus::Cancelled);
            }
            state.current_file = Some(file.relative_path.clone());
            match self.copy_into(&file, snapshot, policy).await {
                FileOutcome::Copied { bytes, warning } => {
                    state.processed_files += 1;
                    state.processed_bytes += bytes;
                    history.warnings.extend(warning);
                }
                FileOutcome::Failed { message } => {
                    state.failed_files += 1;
                    history.errors.push(message);
                }
            }
            history.processed_files = state.processed_files;
            history.failed_files = state.failed_files;
            history.processed_bytes = state.processed_bytes;
            report(progress, &state);
        }

        if job.options.verify_after_backup {
            let warnings = self.verify_snapshot(snapshot).await;
            BackupLog::VerificationFinished {
                path: snapshot.to_path_buf(),
                warnings: warnings.len(),
            }
            .log();
            history.warnings.extend(warnings);
        }

        if history.failed_files > 0 {
            Ok(JobStatus::CompletedWithWarnings)
        } else {
            Ok(JobStatus::Completed)
        }
    }

    // Files of every source, in source order, that pass the filter.
    async fn collect_candidates(
        &self,
        job: &BackupJob,
        filter: &FileFilter,
        history: &mut BackupHistory,
    ) -> Result<Vec<WalkedFile>, Error> {
        let mut candidates = Vec::new();
        for source in &job.source_paths {
            if !self.io_manager.exists(source).await {
                BackupLog::SourceMissing {
                    path: source.clone(),
                }
                .log();
                history
                    .warnings
                    .push(format!("Source path does not exist: {}", source.display()));
                continue;
            }

            let files = if self.io_manager.is_directory(source).await {
                let tree = self.io_manager.walk_files(source).await?;
                for path in tree.linked_directories {
                    BackupLog::LinkedDirectorySkipped { path: path.clone() }.log();
                    history
                        .warnings
                        .push(format!("Skipped symlinked directory: {}", path.display()));
                }
                tree.files
            } else {
                let attributes = self.io_manager.get_attributes(source).await?;
                let relative_path = source
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| source.clone());
                vec![WalkedFile {
                    path: source.clone(),
                    relative_path,
                    size: attributes.size,
                }]
            };

            for file in files {
                let attributes = self.io_manager.get_attributes(&file.path).await.ok();
                if filter.accepts(&file.path, attributes.as_ref()) {
                    candidates.push(file);
                }
            }
        }
        Ok(candidates)
    }

    async fn copy_into(
        &self,
        file: &WalkedFile,
        target_root: &Path,
        policy: MetadataPolicy,
    ) -> FileOutcome {
        let target = target_root.join(&file.relative_path);
        if let Some(parent) = target.parent() {
            if let Err(err) = self.io_manager.create_directory(parent).await {
                return FileOutcome::failed(&file.relative_path, err);
            }
        }
        let bytes = match self.io_manager.copy_file(&file.path, &target).await {
            Ok(bytes) => bytes,
            Err(err) => return FileOutcome::failed(&file.relative_path, err),
        };
        if policy.is_empty() {
            return FileOutcome::Copied {
                bytes,
                warning: None,
            };
        }

        // Metadata that cannot be carried over leaves the copy itself intact.
        let result = match self.io_manager.get_attributes(&file.path).await {
            Ok(attributes) => {
                self.io_manager
                    .set_attributes(&target, &attributes, policy)
                    .await
            }
            Err(err) => Err(err),
        };
        FileOutcome::Copied {
            bytes,
            warning: result
                .err()
                .map(|err| format!("{}: {}", file.relative_path.display(), err)),
        }
    }

    async fn verify_snapshot(&self, snapshot: &Path) -> Vec<String> {
        let files = match self.io_manager.walk_files(snapshot).await {
            Ok(tree) => tree.files,
            Err(err) => return vec![format!("Verification could not list the snapshot: {err}")],
        };
        let mut warnings = Vec::new();
        for file in files {
            if let Err(err) = self.io_manager.try_read(&file.path).await {
                warnings.push(format!(
                    "Verification failed for {}: {}",
                    file.relative_path.display(),
                    err
                ));
            }
        }
        warnings
    }

    /// True when every file under `path` can be opened and read.
    pub async fn verify_backup(&self, path: &Path) -> bool {
        self.io_manager.is_directory(path).await && self.verify_snapshot(path).await.is_empty()
    }

    /// Copies every file of `snapshot` back under `destination`, keeping the layout.
    pub async fn restore_backup(
        &self,
        snapshot: &Path,
        destination: &Path,
        progress: Option<&dyn ProgressSink>,
        cancel: Option<&CancellationToken>,
    ) -> Result<RestoreSummary, Error> {
        if !self.io_manager.is_directory(snapshot).await {
            Err(IOError::path_not_found(snapshot))?
        }
        let files = self.io_manager.walk_files(snapshot).await?.files;
        self.io_manager.create_directory(destination).await?;

        let mut summary = RestoreSummary {
            total_files: files.len() as u64,
            ..Default::default()
        };
        let mut state =
            BackupProgress::new(summary.total_files, files.iter().map(|file| file.size).sum());
        report(progress, &state);

        for file in files {
            if is_cancelled(cancel) {
                summary.cancelled = true;
                break;
            }
            state.current_file = Some(file.relative_path.clone());
            match self.copy_into(&file, destination, MetadataPolicy::ALL).await {
                FileOutcome::Copied { bytes, warning } => {
                    state.processed_files += 1;
                    state.processed_bytes += bytes;
                    if let Some(warning) = warning {
                        tracing::warn!("{}", warning);
                    }
                }
                FileOutcome::Failed { message } => {
                    state.failed_files += 1;
                    summary.errors.push(message);
                }
            }
            report(progress, &state);
        }

        summary.restored_files = state.processed_files;
        summary.failed_files = state.failed_files;
        summary.restored_bytes = state.processed_bytes;
        BackupLog::RestoreFinished {
            path: snapshot.to_path_buf(),
            restored: summary.restored_files,
            failed: summary.failed_files,
        }
        .log();
        Ok(summary)
    }
}

fn report(progress: Option<&dyn ProgressSink>, state: &BackupProgress) {
    if let Some(progress) = progress {
        progress.report(state);
    }
}

fn is_cancelled(cancel: Option<&CancellationToken>) -> bool {
    cancel.is_some_and(|token| token.is_cancelled())
}
