use crate::core::backup::backup_executor::BackupExecutor;
use crate::core::infrastructure::app_config::AppConfig;
use crate::core::infrastructure::event_broadcaster::EventBroadcaster;
use crate::core::schedule::schedule_calculator::ScheduleCalculator;
use crate::core::schedule::schedule_timer::ScheduleTimer;
use crate::interface::progress_sink::ProgressSink;
use crate::interface::repository::Storage;
use crate::model::core::backup::history::BackupHistory;
use crate::model::core::backup::job::{BackupJob, JobStatus};
use crate::model::core::schedule::event::SchedulerEvent;
use crate::model::core::schedule::scheduled_entry::ScheduledEntry;
use crate::model::error::Error;
use crate::model::error::system::SystemError;
use crate::model::error::task::TaskError;
use crate::model::log::schedule::ScheduleLog;
use chrono::{Local, NaiveDateTime};
use macros::log;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Default)]
struct SchedulerState {
    running: bool,
    entries: HashMap<Uuid, ScheduledEntry>,
    // Scheduled runs dispatched by a tick and not yet post-processed, with
    // the due time they were dispatched for
    in_flight: HashMap<Uuid, NaiveDateTime>,
    timer_shutdown: Option<oneshot::Sender<()>>,
    cancel: CancellationToken,
}

/// Owns the table of scheduled jobs and dispatches them when due.
///
/// Cloning yields another handle to the same scheduler.
#[derive(Clone)]
pub struct JobScheduler {
    app_config: Arc<AppConfig>,
    storage: Arc<dyn Storage>,
    executor: Arc<BackupExecutor>,
    events: Arc<EventBroadcaster>,
    state: Arc<Mutex<SchedulerState>>,
}

impl JobScheduler {
    pub fn new(
        app_config: Arc<AppConfig>,
        storage: Arc<dyn Storage>,
        executor: Arc<BackupExecutor>,
    ) -> Self {
        let events = Arc::new(EventBroadcaster::new(app_config.channel_capacity));
        Self {
            app_config,
            storage,
            executor,
            events,
            state: Arc::new(Mutex::new(SchedulerState::default())),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.events.subscribe()
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.running
    }

    pub fn is_job_running(&self, job_id: Uuid) -> bool {
        self.executor.is_running(job_id)
    }

    /// Builds the table from storage and starts the periodic tick.
    pub async fn start(&self) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        if state.running {
            log!(TaskError::SchedulerAlreadyRunning);
            return Ok(());
        }

        if self.app_config.history_keep_days > 0 {
            if let Err(err) = self
                .storage
                .cleanup_history(self.app_config.history_keep_days)
                .await
            {
                log!(err);
            }
        }

        let jobs = self
            .storage
            .load_jobs()
            .await
            .map_err(TaskError::load_jobs_failed)?;
        let now = Local::now().naive_local();
        let mut entries = HashMap::new();
        for mut job in jobs {
            if let Some(next_run) = self.plan(&mut job, now) {
                if let Err(err) = self.storage.save_job(&mut job).await {
                    log!(err, job.name);
                }
                entries.insert(job.id, ScheduledEntry::new(job, next_run));
            }
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let timer = ScheduleTimer::new(
            self.clone(),
            Duration::from_secs(self.app_config.tick_interval),
            shutdown_rx,
        );
        tokio::spawn(timer.run());

        ScheduleLog::SchedulerStarted {
            job_count: entries.len(),
        }
        .log();
        state.entries = entries;
        state.timer_shutdown = Some(shutdown_tx);
        state.cancel = CancellationToken::new();
        state.running = true;
        Ok(())
    }

    /// Stops the tick, clears the table and cancels scheduled runs still executing.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        if !state.running {
            log!(TaskError::SchedulerNotRunning);
            return;
        }
        if let Some(shutdown_tx) = state.timer_shutdown.take() {
            if shutdown_tx.send(()).is_err() {
                log!(SystemError::ShutdownSignalFailed);
            }
        }
        state.cancel.cancel();
        state.cancel = CancellationToken::new();
        state.entries.clear();
        state.running = false;
        ScheduleLog::SchedulerStopped.log();
    }

    /// Computes the next run of `job` and stores it on the job. `None` when
    /// the job does not belong in the table.
    fn plan(&self, job: &mut BackupJob, now: NaiveDateTime) -> Option<NaiveDateTime> {
        if !job.is_enabled {
            ScheduleLog::DisabledJobSkipped {
                job_name: job.name.clone(),
            }
            .log();
            return None;
        }
        if job.schedule.is_manual() {
            ScheduleLog::ManualJobSkipped {
                job_name: job.name.clone(),
            }
            .log();
            return None;
        }
        match ScheduleCalculator::next_run(&job.schedule, now) {
            Some(next_run) => {
                job.next_run_time = Some(next_run);
                Some(next_run)
            }
            None => {
                log!(TaskError::no_next_run_time(job.id), job.name);
                None
            }
        }
    }

    /// Adds or replaces the entry of `job` and persists its next run time.
    /// The table only changes while the scheduler is running. Run statistics
    /// already stored for the job are kept.
    pub async fn schedule_job(&self, mut job: BackupJob) -> Result<(), Error> {
        let Some(next_run) = self.plan(&mut job, Local::now().naive_local()) else {
            return Ok(());
        };
        if let Some(stored) = self.storage.load_job(job.id).await? {
            job.merge_run_statistics(&stored);
        }
        self.storage.save_job(&mut job).await?;

        let mut state = self.state.lock().await;
        if state.running {
            ScheduleLog::JobScheduled {
                job_name: job.name.clone(),
                next_run,
            }
            .log();
            state
                .entries
                .insert(job.id, ScheduledEntry::new(job, next_run));
        }
        Ok(())
    }

    pub async fn unschedule_job(&self, job_id: Uuid) {
        let mut state = self.state.lock().await;
        if let Some(entry) = state.entries.remove(&job_id) {
            ScheduleLog::JobUnscheduled {
                job_name: entry.job.name,
            }
            .log();
        }
    }

    pub async fn reschedule_job(&self, job: BackupJob) -> Result<(), Error> {
        self.unschedule_job(job.id).await;
        self.schedule_job(job).await
    }

    pub fn get_next_run_time(&self, job: &BackupJob) -> Option<NaiveDateTime> {
        ScheduleCalculator::next_run(&job.schedule, Local::now().naive_local())
    }

    /// Snapshot of the table, earliest first.
    pub async fn scheduled_entries(&self) -> Vec<ScheduledEntry> {
        let state = self.state.lock().await;
        let mut entries: Vec<ScheduledEntry> = state.entries.values().cloned().collect();
        entries.sort_by_key(|entry| entry.next_run);
        entries
    }

    pub async fn tick(&self) -> Vec<JoinHandle<()>> {
        self.tick_at(Local::now().naive_local()).await
    }

    /// Dispatches every entry due at `now` and returns without waiting for them.
    pub async fn tick_at(&self, now: NaiveDateTime) -> Vec<JoinHandle<()>> {
        let (due, cancel) = {
            let mut state = self.state.lock().await;
            if !state.running {
                return Vec::new();
            }
            let due_entries: Vec<ScheduledEntry> = state
                .entries
                .values()
                .filter(|entry| entry.is_due(now))
                .cloned()
                .collect();

            let mut due = Vec::new();
            for ScheduledEntry { job, next_run } in due_entries {
                if state.in_flight.contains_key(&job.id) || self.executor.is_running(job.id) {
                    ScheduleLog::JobStillRunning { job_name: job.name }.log();
                    continue;
                }
                state.in_flight.insert(job.id, next_run);
                due.push(job);
            }
            (due, state.cancel.clone())
        };

        due.into_iter()
            .map(|job| {
                ScheduleLog::JobDue {
                    job_name: job.name.clone(),
                }
                .log();
                self.dispatch(job, cancel.clone())
            })
            .collect()
    }

    fn dispatch(&self, job: BackupJob, cancel: CancellationToken) -> JoinHandle<()> {
        let scheduler = self.clone();
        tokio::spawn(async move {
            let runner = scheduler.clone();
            let mut executed = job.clone();
            let execution = tokio::spawn(async move {
                let _ = runner
                    .execute_and_notify(&mut executed, None, Some(&cancel))
                    .await;
                executed
            });
            let ran = match execution.await {
                Ok(executed) => Some(executed),
                Err(err) => {
                    let err = Error::from(SystemError::thread_panic(err));
                    log!(err, job.name);
                    scheduler.events.publish(SchedulerEvent::BackupFailed {
                        job: job.clone(),
                        error: err.to_string(),
                    });
                    None
                }
            };
            scheduler.finish_scheduled(job.id, ran.as_ref()).await;
        })
    }

    async fn execute_and_notify(
        &self,
        job: &mut BackupJob,
        progress: Option<&dyn ProgressSink>,
        cancel: Option<&CancellationToken>,
    ) -> Result<BackupHistory, Error> {
        self.events
            .publish(SchedulerEvent::BackupStarted(job.clone()));
        let result = self.executor.execute(job, progress, cancel).await;
        match &result {
            Ok(history) if history.status == JobStatus::Failed => {
                self.events.publish(SchedulerEvent::BackupFailed {
                    job: job.clone(),
                    error: history.error_message.clone().unwrap_or_default(),
                });
            }
            Ok(history) => {
                self.events
                    .publish(SchedulerEvent::BackupCompleted(history.clone()));
            }
            Err(err) => {
                log!(err, job.name);
                self.events.publish(SchedulerEvent::BackupFailed {
                    job: job.clone(),
                    error: err.to_string(),
                });
            }
        }
        result
    }

    // Folds a finished scheduled run into the entry currently in the table.
    // Only the run statistics come from `ran`, the definition is the entry's.
    async fn finish_scheduled(&self, job_id: Uuid, ran: Option<&BackupJob>) {
        let mut state = self.state.lock().await;
        let dispatched_for = state.in_flight.remove(&job_id);
        let Some(entry) = state.entries.get(&job_id) else {
            return;
        };

        let mut job = entry.job.clone();
        if let Some(ran) = ran {
            job.merge_run_statistics(ran);
        }
        // A different due time means the entry was replaced after the dispatch
        let next_run = if dispatched_for == Some(entry.next_run) {
            ScheduleCalculator::next_run(&job.schedule, Local::now().naive_local())
        } else {
            Some(entry.next_run)
        };

        job.next_run_time = next_run;
        match next_run {
            Some(next_run) => {
                state
                    .entries
                    .insert(job_id, ScheduledEntry::new(job.clone(), next_run));
                ScheduleLog::JobScheduled {
                    job_name: job.name.clone(),
                    next_run,
                }
                .log();
            }
            None => {
                state.entries.remove(&job_id);
                ScheduleLog::JobLeftSchedule {
                    job_name: job.name.clone(),
                }
                .log();
            }
        }
        drop(state);

        if let Err(err) = self.storage.save_job(&mut job).await {
            log!(err, job.name);
        }
    }

    /// Runs `job` right away through the same executor and notifications as
    /// a scheduled run. Its table entry, if any, keeps its definition and its
    /// next run time and only takes the run statistics.
    pub async fn run_now(
        &self,
        mut job: BackupJob,
        progress: Option<&dyn ProgressSink>,
        cancel: Option<&CancellationToken>,
    ) -> Result<BackupHistory, Error> {
        let history = self.execute_and_notify(&mut job, progress, cancel).await?;
        let mut state = self.state.lock().await;
        if let Some(entry) = state.entries.get_mut(&job.id) {
            entry.job.merge_run_statistics(&job);
        }
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::infrastructure::io_manager::IOManager;
    use crate::core::infrastructure::memory_storage::MemoryStorage;
    use crate::interface::repository::history::HistoryRepository;
    use crate::interface::repository::job::JobRepository;
    use crate::model::config::Config;
    use crate::model::core::backup::job::Schedule;
    use chrono::{NaiveTime, TimeDelta};
    use std::path::Path;
    use tempfile::TempDir;

    struct Fixture {
        temp_dir: TempDir,
        storage: Arc<MemoryStorage>,
        scheduler: JobScheduler,
    }

    fn fixture_with(config: Config) -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("data");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("a.txt"), "a").unwrap();

        let app_config = Arc::new(AppConfig::from_config(config).unwrap());
        let storage = Arc::new(MemoryStorage::new());
        let io_manager = Arc::new(IOManager::new(&app_config));
        let executor = Arc::new(BackupExecutor::new(io_manager, storage.clone()));
        let scheduler = JobScheduler::new(app_config, storage.clone(), executor);
        Fixture {
            temp_dir,
            storage,
            scheduler,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(Config::default())
    }

    fn job(root: &Path, name: &str, schedule: Schedule) -> BackupJob {
        BackupJob::new(
            name,
            vec![root.join("data")],
            root.join("backup"),
            schedule,
        )
    }

    async fn stored(fixture: &Fixture, job: BackupJob) -> BackupJob {
        let mut job = job;
        fixture.storage.save_job(&mut job).await.unwrap();
        job
    }

    async fn join(handles: Vec<JoinHandle<()>>) {
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn start_schedules_enabled_recurring_jobs_only() {
        let fixture = fixture();
        let root = fixture.temp_dir.path();
        let hourly = stored(&fixture, job(root, "hourly", Schedule::EveryHours(1))).await;
        stored(&fixture, job(root, "manual", Schedule::Manual)).await;
        stored(
            &fixture,
            job(root, "disabled", Schedule::EveryHours(1)).with_enabled(false),
        )
        .await;
        stored(&fixture, job(root, "zero", Schedule::EveryMinutes(0))).await;

        fixture.scheduler.start().await.unwrap();

        assert!(fixture.scheduler.is_running().await);
        let entries = fixture.scheduler.scheduled_entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].job.id, hourly.id);
        let persisted = fixture.storage.get_job(hourly.id).unwrap();
        assert_eq!(persisted.next_run_time, Some(entries[0].next_run));

        fixture.scheduler.stop().await;
        assert!(!fixture.scheduler.is_running().await);
        assert!(fixture.scheduler.scheduled_entries().await.is_empty());
        assert_eq!(fixture.storage.load_jobs().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let fixture = fixture();
        let root = fixture.temp_dir.path();
        stored(&fixture, job(root, "hourly", Schedule::EveryHours(1))).await;

        fixture.scheduler.stop().await;
        fixture.scheduler.start().await.unwrap();
        stored(&fixture, job(root, "later", Schedule::EveryHours(2))).await;
        fixture.scheduler.start().await.unwrap();

        assert_eq!(fixture.scheduler.scheduled_entries().await.len(), 1);
        fixture.scheduler.stop().await;
        fixture.scheduler.stop().await;
        assert!(!fixture.scheduler.is_running().await);
    }

    #[tokio::test]
    async fn schedule_job_twice_keeps_one_entry() {
        let fixture = fixture();
        let root = fixture.temp_dir.path();
        fixture.scheduler.start().await.unwrap();
        let job = job(root, "daily", Schedule::EveryMinutes(30));

        fixture.scheduler.schedule_job(job.clone()).await.unwrap();
        fixture.scheduler.schedule_job(job.clone()).await.unwrap();

        let entries = fixture.scheduler.scheduled_entries().await;
        assert_eq!(entries.len(), 1);
        let persisted = fixture.storage.get_job(job.id).unwrap();
        assert_eq!(persisted.next_run_time, Some(entries[0].next_run));
        fixture.scheduler.stop().await;
    }

    #[tokio::test]
    async fn manual_and_stopped_scheduling_leave_the_table_alone() {
        let fixture = fixture();
        let root = fixture.temp_dir.path();

        let stopped = job(root, "stopped", Schedule::EveryHours(1));
        fixture.scheduler.schedule_job(stopped.clone()).await.unwrap();
        assert!(fixture.storage.get_job(stopped.id).unwrap().next_run_time.is_some());

        fixture.scheduler.start().await.unwrap();
        let entries = fixture.scheduler.scheduled_entries().await;
        assert_eq!(entries.len(), 1);

        let manual = job(root, "manual", Schedule::Manual);
        fixture.scheduler.schedule_job(manual.clone()).await.unwrap();
        assert_eq!(fixture.scheduler.scheduled_entries().await.len(), 1);
        assert!(fixture.storage.get_job(manual.id).is_none());
        fixture.scheduler.stop().await;
    }

    #[tokio::test]
    async fn unschedule_and_reschedule() {
        let fixture = fixture();
        let root = fixture.temp_dir.path();
        fixture.scheduler.start().await.unwrap();
        let mut job = job(root, "job", Schedule::EveryHours(1));
        fixture.scheduler.schedule_job(job.clone()).await.unwrap();

        fixture.scheduler.unschedule_job(job.id).await;
        fixture.scheduler.unschedule_job(job.id).await;
        assert!(fixture.scheduler.scheduled_entries().await.is_empty());

        job.schedule = Schedule::Daily(NaiveTime::from_hms_opt(3, 0, 0).unwrap());
        fixture.scheduler.reschedule_job(job.clone()).await.unwrap();
        let entries = fixture.scheduler.scheduled_entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].next_run.time(), NaiveTime::from_hms_opt(3, 0, 0).unwrap());
        assert_eq!(
            fixture.scheduler.get_next_run_time(&job),
            Some(entries[0].next_run)
        );
        fixture.scheduler.stop().await;
    }

    #[tokio::test]
    async fn reschedule_during_a_run_takes_effect() {
        let fixture = fixture();
        let root = fixture.temp_dir.path();
        let mut job = stored(&fixture, job(root, "job", Schedule::EveryHours(1))).await;
        fixture.scheduler.start().await.unwrap();
        let first = fixture.scheduler.scheduled_entries().await[0].next_run;
        let three_am = NaiveTime::from_hms_opt(3, 0, 0).unwrap();

        let handles = fixture.scheduler.tick_at(first).await;
        assert_eq!(handles.len(), 1);
        job.schedule = Schedule::Daily(three_am);
        fixture.scheduler.reschedule_job(job.clone()).await.unwrap();
        let rescheduled = fixture.scheduler.scheduled_entries().await[0].next_run;
        join(handles).await;

        let entries = fixture.scheduler.scheduled_entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].job.schedule, Schedule::Daily(three_am));
        assert_eq!(entries[0].next_run, rescheduled);
        assert_eq!(entries[0].next_run.time(), three_am);
        assert_eq!(entries[0].job.total_backup_count, 1);

        let persisted = fixture.storage.get_job(job.id).unwrap();
        assert_eq!(persisted.schedule, Schedule::Daily(three_am));
        assert_eq!(persisted.next_run_time, Some(rescheduled));
        assert_eq!(persisted.total_backup_count, 1);
        assert_eq!(persisted.last_run_status, JobStatus::Completed);
        fixture.scheduler.stop().await;
    }

    #[tokio::test]
    async fn unschedule_during_a_run_keeps_the_job_out() {
        let fixture = fixture();
        let root = fixture.temp_dir.path();
        let job = stored(&fixture, job(root, "job", Schedule::EveryHours(1))).await;
        fixture.scheduler.start().await.unwrap();
        let first = fixture.scheduler.scheduled_entries().await[0].next_run;

        let handles = fixture.scheduler.tick_at(first).await;
        fixture.scheduler.unschedule_job(job.id).await;
        join(handles).await;

        assert!(fixture.scheduler.scheduled_entries().await.is_empty());
        let persisted = fixture.storage.get_job(job.id).unwrap();
        assert_eq!(persisted.schedule, Schedule::EveryHours(1));
        assert_eq!(persisted.total_backup_count, 1);
        fixture.scheduler.stop().await;
    }

    #[tokio::test]
    async fn restart_during_a_run_keeps_the_new_entry() {
        let fixture = fixture();
        let root = fixture.temp_dir.path();
        let job = stored(&fixture, job(root, "job", Schedule::EveryHours(1))).await;
        fixture.scheduler.start().await.unwrap();
        let first = fixture.scheduler.scheduled_entries().await[0].next_run;

        let handles = fixture.scheduler.tick_at(first).await;
        fixture.scheduler.stop().await;
        let mut changed = fixture.storage.get_job(job.id).unwrap();
        changed.schedule = Schedule::EveryHours(4);
        fixture.storage.save_job(&mut changed).await.unwrap();
        fixture.scheduler.start().await.unwrap();
        let restarted = fixture.scheduler.scheduled_entries().await[0].next_run;
        join(handles).await;

        let entries = fixture.scheduler.scheduled_entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].job.schedule, Schedule::EveryHours(4));
        assert_eq!(entries[0].next_run, restarted);
        // The stop cancelled the run before its first file
        assert_eq!(entries[0].job.last_run_status, JobStatus::Cancelled);

        let persisted = fixture.storage.get_job(job.id).unwrap();
        assert_eq!(persisted.schedule, Schedule::EveryHours(4));
        assert_eq!(persisted.next_run_time, Some(restarted));
        assert_eq!(persisted.total_backup_count, 1);
        fixture.scheduler.stop().await;
    }

    #[tokio::test]
    async fn tick_runs_due_jobs_and_recomputes_next_run() {
        let fixture = fixture();
        let root = fixture.temp_dir.path();
        let job = stored(&fixture, job(root, "hourly", Schedule::EveryHours(1))).await;
        fixture.scheduler.start().await.unwrap();
        let mut events = fixture.scheduler.subscribe();
        let first = fixture.scheduler.scheduled_entries().await[0].next_run;

        assert!(fixture.scheduler.tick_at(first - TimeDelta::minutes(1)).await.is_empty());
        let handles = fixture.scheduler.tick_at(first).await;
        assert_eq!(handles.len(), 1);
        join(handles).await;

        let history = fixture.storage.load_history_for_job(job.id, 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, JobStatus::Completed);

        let entries = fixture.scheduler.scheduled_entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].job.total_backup_count, 1);
        assert!(entries[0].next_run > Local::now().naive_local());
        let persisted = fixture.storage.get_job(job.id).unwrap();
        assert_eq!(persisted.next_run_time, Some(entries[0].next_run));
        assert_eq!(persisted.last_run_status, JobStatus::Completed);

        assert!(matches!(events.try_recv(), Ok(SchedulerEvent::BackupStarted(_))));
        assert!(matches!(events.try_recv(), Ok(SchedulerEvent::BackupCompleted(_))));
        fixture.scheduler.stop().await;
    }

    #[tokio::test]
    async fn job_without_further_occurrence_leaves_the_table() {
        let fixture = fixture();
        let root = fixture.temp_dir.path();
        fixture.scheduler.start().await.unwrap();
        let job = job(root, "once", Schedule::EveryMinutes(0));
        let now = Local::now().naive_local();
        fixture
            .scheduler
            .state
            .lock()
            .await
            .entries
            .insert(job.id, ScheduledEntry::new(job.clone(), now));

        join(fixture.scheduler.tick_at(now).await).await;

        assert!(fixture.scheduler.scheduled_entries().await.is_empty());
        assert_eq!(fixture.storage.get_job(job.id).unwrap().next_run_time, None);
        fixture.scheduler.stop().await;
    }

    #[tokio::test]
    async fn job_still_in_flight_is_not_dispatched_again() {
        let fixture = fixture();
        let root = fixture.temp_dir.path();
        let job = stored(&fixture, job(root, "hourly", Schedule::EveryHours(1))).await;
        fixture.scheduler.start().await.unwrap();
        let due = fixture.scheduler.scheduled_entries().await[0].next_run;
        fixture.scheduler.state.lock().await.in_flight.insert(job.id, due);

        let later = Local::now().naive_local() + TimeDelta::hours(2);
        assert!(fixture.scheduler.tick_at(later).await.is_empty());
        fixture.scheduler.stop().await;
    }

    #[tokio::test]
    async fn stopped_scheduler_does_not_tick() {
        let fixture = fixture();
        let root = fixture.temp_dir.path();
        stored(&fixture, job(root, "hourly", Schedule::EveryHours(1))).await;
        let later = Local::now().naive_local() + TimeDelta::hours(2);
        assert!(fixture.scheduler.tick_at(later).await.is_empty());
    }

    #[tokio::test]
    async fn failed_run_is_reported_and_stays_scheduled() {
        let fixture = fixture();
        let root = fixture.temp_dir.path();
        std::fs::write(root.join("backup"), "not a directory").unwrap();
        let job = stored(&fixture, job(root, "broken", Schedule::EveryHours(1))).await;
        fixture.scheduler.start().await.unwrap();
        let mut events = fixture.scheduler.subscribe();

        let later = Local::now().naive_local() + TimeDelta::hours(2);
        join(fixture.scheduler.tick_at(later).await).await;

        assert!(matches!(events.try_recv(), Ok(SchedulerEvent::BackupStarted(_))));
        match events.try_recv() {
            Ok(SchedulerEvent::BackupFailed { job: failed, error }) => {
                assert_eq!(failed.id, job.id);
                assert!(!error.is_empty());
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(fixture.scheduler.scheduled_entries().await.len(), 1);
        fixture.scheduler.stop().await;
    }

    #[tokio::test]
    async fn run_now_keeps_the_scheduled_time() {
        let fixture = fixture();
        let root = fixture.temp_dir.path();
        let job = stored(&fixture, job(root, "hourly", Schedule::EveryHours(1))).await;
        fixture.scheduler.start().await.unwrap();
        let before = fixture.scheduler.scheduled_entries().await[0].next_run;

        let history = fixture.scheduler.run_now(job.clone(), None, None).await.unwrap();

        assert_eq!(history.status, JobStatus::Completed);
        assert!(!fixture.scheduler.is_job_running(job.id));
        let entries = fixture.scheduler.scheduled_entries().await;
        assert_eq!(entries[0].next_run, before);
        assert_eq!(entries[0].job.total_backup_count, 1);
        fixture.scheduler.stop().await;
    }

    #[tokio::test]
    async fn timer_dispatches_due_jobs() {
        let fixture = fixture_with(Config {
            tick_interval: 1,
            ..Default::default()
        });
        let root = fixture.temp_dir.path();
        fixture.scheduler.start().await.unwrap();
        let job = job(root, "due", Schedule::EveryHours(1));
        fixture
            .scheduler
            .state
            .lock()
            .await
            .entries
            .insert(job.id, ScheduledEntry::new(job.clone(), Local::now().naive_local()));

        let mut records = Vec::new();
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            records = fixture.storage.load_history_for_job(job.id, 10).await.unwrap();
            if !records.is_empty() {
                break;
            }
        }
        assert_eq!(records.len(), 1);
        fixture.scheduler.stop().await;
    }
}
