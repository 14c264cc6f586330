use crate::core::backup::backup_executor::BackupExecutor;
use crate::core::infrastructure::app_config::AppConfig;
use crate::core::infrastructure::database_manager::DatabaseManager;
use crate::core::infrastructure::io_manager::IOManager;
use crate::core::schedule::job_scheduler::JobScheduler;
use crate::model::error::Error;
use crate::model::error::system::SystemError;
use crate::model::log::system::SystemLog;
use std::sync::Arc;

pub struct System {
    io_manager: Arc<IOManager>,
    database_manager: Arc<DatabaseManager>,
    scheduler: JobScheduler,
}

impl System {
    pub async fn initialize(app_config: AppConfig) -> Result<Self, Error> {
        SystemLog::Initializing.log();
        let app_config = Arc::new(app_config);
        let io_manager = Arc::new(IOManager::new(&app_config));
        let database_manager = Arc::new(DatabaseManager::new(&app_config.database_path).await?);
        let executor = Arc::new(BackupExecutor::new(
            io_manager.clone(),
            database_manager.clone(),
        ));
        let scheduler = JobScheduler::new(app_config, database_manager.clone(), executor);
        SystemLog::InitializeComplete.log();
        Ok(Self {
            io_manager,
            database_manager,
            scheduler,
        })
    }

    pub fn scheduler(&self) -> &JobScheduler {
        &self.scheduler
    }

    /// Starts the scheduler and blocks until Ctrl-C.
    pub async fn run(&self) -> Result<(), Error> {
        self.scheduler.start().await?;
        SystemLog::Online.log();
        tokio::signal::ctrl_c()
            .await
            .map_err(SystemError::signal_listen_failed)?;
        Ok(())
    }

    pub async fn terminate(&self) {
        SystemLog::Terminating.log();
        self.scheduler.stop().await;
        self.io_manager.terminate();
        self.database_manager.close_connection().await;
        SystemLog::TerminateComplete.log();
    }
}
