use macros::loggable;

loggable! {
    DatabaseLog {
        #[error("Connected to database successfully")]
        DatabaseConnectSuccess => tracing::Level::INFO,

        #[error("Created table {table}")]
        TableCreated { table: String } => tracing::Level::INFO,

        #[error("Removed {count} history records older than {keep_days} days")]
        HistoryPruned { count: u64, keep_days: u32 } => tracing::Level::INFO,
    }
}
