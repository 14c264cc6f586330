use crate::model::config::Config;
use crate::model::error::Error;
use crate::model::error::system::SystemError;
use crate::platform::constants::LOG_FILE_PREFIX;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

pub struct Logging;

impl Logging {
    /// Logs to stdout and to a daily rolling file under `log_directory`.
    ///
    /// `RUST_LOG` overrides the configured level. The returned guard flushes
    /// the file writer when dropped, keep it alive for the whole process.
    pub fn initialize(config: &Config) -> Result<WorkerGuard, Error> {
        std::fs::create_dir_all(&config.log_directory)
            .map_err(SystemError::logging_init_failed)?;

        let file_appender = rolling::daily(&config.log_directory, LOG_FILE_PREFIX);
        let (file_writer, guard) = non_blocking(file_appender);

        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.log_level))
            .map_err(SystemError::logging_init_failed)?;

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false))
            .with(fmt::layer().with_ansi(false).with_writer(file_writer))
            .try_init()
            .map_err(SystemError::logging_init_failed)?;

        log_panics::init();
        Ok(guard)
    }
}
