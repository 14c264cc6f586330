use macros::traceable;

traceable! {
    SystemError {
        #[error("Configuration not found: {err}")]
        ConfigNotFound => tracing::Level::ERROR,

        #[error("Invalid configuration: {err}")]
        InvalidConfig => tracing::Level::ERROR,

        #[no_source]
        #[error("Invalid configuration value: {field}")]
        InvalidConfigValue { field: String } => tracing::Level::ERROR,

        #[error("Failed to initialize logging: {err}")]
        LoggingInitFailed => tracing::Level::ERROR,

        #[error("Task panicked: {err}")]
        ThreadPanic => tracing::Level::ERROR,

        #[error("Failed to listen for the shutdown signal: {err}")]
        SignalListenFailed => tracing::Level::ERROR,

        #[no_source]
        #[error("Failed to send shutdown signal")]
        ShutdownSignalFailed => tracing::Level::ERROR,
    }
}
