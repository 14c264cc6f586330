use crate::interface::repository::history::HistoryRepository;
use crate::interface::repository::job::JobRepository;
use crate::model::core::backup::history::BackupHistory;
use crate::model::core::backup::job::BackupJob;
use crate::model::error::Error;
use crate::model::error::database::DatabaseError;
use crate::model::error::misc::MiscError;
use crate::model::log::database::DatabaseLog;
use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDateTime};
use macros::log;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::fs::File;
use uuid::Uuid;

const JOB_COLUMNS: &str = r#"
    uuid,
    name,
    description,
    is_enabled,
    source_paths,
    destination_path,
    schedule,
    options,
    last_run_time,
    last_run_status,
    last_backup_size,
    total_backup_count,
    next_run_time,
    created_at,
    modified_at
"#;

const HISTORY_COLUMNS: &str = r#"
    uuid,
    job_id,
    job_name,
    start_time,
    end_time,
    status,
    error_message,
    total_files,
    processed_files,
    failed_files,
    total_bytes,
    processed_bytes,
    warnings,
    errors,
    destination_path
"#;

#[derive(Debug)]
pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    pub async fn new(database_path: &Path) -> Result<Self, Error> {
        if !Self::exist_database(database_path).await {
            Self::create_database(database_path).await?;
        }
        let options = SqliteConnectOptions::new().filename(database_path);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(DatabaseError::database_connect_failed)?;
        log!(DatabaseLog::DatabaseConnectSuccess);
        let database_manager = Self { pool };
        if !database_manager.exist_table("BackupJobs").await {
            database_manager.create_backup_job_table().await?;
        }
        if !database_manager.exist_table("BackupHistory").await {
            database_manager.create_backup_history_table().await?;
        }
        Ok(database_manager)
    }

    pub async fn close_connection(&self) {
        self.pool.close().await
    }

    pub async fn exist_database(database_path: &Path) -> bool {
        fs::metadata(database_path).await.is_ok()
    }

    pub async fn create_database(database_path: &Path) -> Result<(), Error> {
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(DatabaseError::create_database_failed)?;
            }
        }
        let _ = File::create(database_path)
            .await
            .map_err(DatabaseError::create_database_failed)?;
        Ok(())
    }

    pub async fn exist_table(&self, table_name: &str) -> bool {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type='table' AND name = ?)",
        )
        .bind(table_name)
        .fetch_one(&self.pool)
        .await
        .unwrap_or(false)
    }

    async fn create_backup_job_table(&self) -> Result<(), Error> {
        sqlx::query(
            r#"
            CREATE TABLE BackupJobs (
                uuid BLOB PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                is_enabled INTEGER NOT NULL,
                source_paths TEXT NOT NULL,
                destination_path TEXT NOT NULL,
                schedule TEXT NOT NULL,
                options TEXT NOT NULL,
                last_run_time TEXT,
                last_run_status TEXT NOT NULL,
                last_backup_size INTEGER NOT NULL,
                total_backup_count INTEGER NOT NULL,
                next_run_time TEXT,
                created_at TEXT NOT NULL,
                modified_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::statement_execution_failed)?;
        log!(DatabaseLog::TableCreated {
            table: "BackupJobs".to_string()
        });
        Ok(())
    }

    async fn create_backup_history_table(&self) -> Result<(), Error> {
        sqlx::query(
            r#"
            CREATE TABLE BackupHistory (
                uuid BLOB PRIMARY KEY,
                job_id BLOB NOT NULL,
                job_name TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT,
                status TEXT NOT NULL,
                error_message TEXT,
                total_files INTEGER NOT NULL,
                processed_files INTEGER NOT NULL,
                failed_files INTEGER NOT NULL,
                total_bytes INTEGER NOT NULL,
                processed_bytes INTEGER NOT NULL,
                warnings TEXT NOT NULL,
                errors TEXT NOT NULL,
                destination_path TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::statement_execution_failed)?;
        sqlx::query("CREATE INDEX BackupHistoryJobIndex ON BackupHistory (job_id, start_time)")
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::statement_execution_failed)?;
        log!(DatabaseLog::TableCreated {
            table: "BackupHistory".to_string()
        });
        Ok(())
    }

    async fn stored_created_at(&self, job_id: Uuid) -> Result<Option<NaiveDateTime>, Error> {
        let created_at = sqlx::query_scalar::<_, NaiveDateTime>(
            "SELECT created_at FROM BackupJobs WHERE uuid = ?",
        )
        .bind(job_id.as_bytes().as_slice())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::statement_execution_failed)?;
        Ok(created_at)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, Error> {
    Ok(serde_json::to_string(value).map_err(MiscError::serialize_error)?)
}

fn json_column<T: DeserializeOwned>(row: &SqliteRow, column: &str) -> Result<T, Error> {
    let text: String = value_column(row, column)?;
    Ok(serde_json::from_str(&text).map_err(MiscError::deserialize_error)?)
}

fn value_column<'r, T>(row: &'r SqliteRow, column: &str) -> Result<T, Error>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    Ok(row
        .try_get::<T, _>(column)
        .map_err(|err| DatabaseError::data_corrupted(column, err))?)
}

fn uuid_column(row: &SqliteRow, column: &str) -> Result<Uuid, Error> {
    let bytes: Vec<u8> = value_column(row, column)?;
    Ok(Uuid::from_slice(&bytes).map_err(|err| DatabaseError::data_corrupted(column, err))?)
}

fn count_column(row: &SqliteRow, column: &str) -> Result<u64, Error> {
    let value: i64 = value_column(row, column)?;
    Ok(value.max(0) as u64)
}

fn path_column(row: &SqliteRow, column: &str) -> Result<PathBuf, Error> {
    let path: String = value_column(row, column)?;
    Ok(PathBuf::from(path))
}

fn job_from_row(row: &SqliteRow) -> Result<BackupJob, Error> {
    Ok(BackupJob {
        id: uuid_column(row, "uuid")?,
        name: value_column(row, "name")?,
        description: value_column(row, "description")?,
        is_enabled: value_column(row, "is_enabled")?,
        source_paths: json_column(row, "source_paths")?,
        destination_path: path_column(row, "destination_path")?,
        schedule: json_column(row, "schedule")?,
        options: json_column(row, "options")?,
        last_run_time: value_column(row, "last_run_time")?,
        last_run_status: json_column(row, "last_run_status")?,
        last_backup_size: count_column(row, "last_backup_size")?,
        total_backup_count: count_column(row, "total_backup_count")?,
        next_run_time: value_column(row, "next_run_time")?,
        created_at: value_column(row, "created_at")?,
        modified_at: value_column(row, "modified_at")?,
    })
}

fn history_from_row(row: &SqliteRow) -> Result<BackupHistory, Error> {
    Ok(BackupHistory {
        id: uuid_column(row, "uuid")?,
        job_id: uuid_column(row, "job_id")?,
        job_name: value_column(row, "job_name")?,
        start_time: value_column(row, "start_time")?,
        end_time: value_column(row, "end_time")?,
        status: json_column(row, "status")?,
        error_message: value_column(row, "error_message")?,
        total_files: count_column(row, "total_files")?,
        processed_files: count_column(row, "processed_files")?,
        failed_files: count_column(row, "failed_files")?,
        total_bytes: count_column(row, "total_bytes")?,
        processed_bytes: count_column(row, "processed_bytes")?,
        warnings: json_column(row, "warnings")?,
        errors: json_column(row, "errors")?,
        destination_path: path_column(row, "destination_path")?,
    })
}

#[async_trait]
impl JobRepository for DatabaseManager {
    async fn load_jobs(&self) -> Result<Vec<BackupJob>, Error> {
        let rows = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM BackupJobs ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::statement_execution_failed)?;

        rows.iter().map(job_from_row).collect()
    }

    async fn load_job(&self, job_id: Uuid) -> Result<Option<BackupJob>, Error> {
        let row = sqlx::query(&format!("SELECT {JOB_COLUMNS} FROM BackupJobs WHERE uuid = ?"))
            .bind(job_id.as_bytes().as_slice())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::statement_execution_failed)?;

        row.as_ref().map(job_from_row).transpose()
    }

    async fn save_job(&self, job: &mut BackupJob) -> Result<(), Error> {
        let now = Local::now().naive_local();
        job.created_at = self.stored_created_at(job.id).await?.unwrap_or(now);
        job.modified_at = now;

        sqlx::query(&format!(
            r#"
            INSERT INTO BackupJobs ({JOB_COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(uuid) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                is_enabled = excluded.is_enabled,
                source_paths = excluded.source_paths,
                destination_path = excluded.destination_path,
                schedule = excluded.schedule,
                options = excluded.options,
                last_run_time = excluded.last_run_time,
                last_run_status = excluded.last_run_status,
                last_backup_size = excluded.last_backup_size,
                total_backup_count = excluded.total_backup_count,
                next_run_time = excluded.next_run_time,
                modified_at = excluded.modified_at
            "#
        ))
        .bind(job.id.as_bytes().as_slice())
        .bind(&job.name)
        .bind(&job.description)
        .bind(job.is_enabled)
        .bind(to_json(&job.source_paths)?)
        .bind(job.destination_path.to_string_lossy().to_string())
        .bind(to_json(&job.schedule)?)
        .bind(to_json(&job.options)?)
        .bind(job.last_run_time)
        .bind(to_json(&job.last_run_status)?)
        .bind(job.last_backup_size as i64)
        .bind(job.total_backup_count as i64)
        .bind(job.next_run_time)
        .bind(job.created_at)
        .bind(job.modified_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::statement_execution_failed)?;
        Ok(())
    }

    async fn delete_job(&self, job_id: Uuid) -> Result<(), Error> {
        sqlx::query("DELETE FROM BackupJobs WHERE uuid = ?")
            .bind(job_id.as_bytes().as_slice())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::statement_execution_failed)?;
        Ok(())
    }
}

#[async_trait]
impl HistoryRepository for DatabaseManager {
    async fn load_history(&self, limit: usize) -> Result<Vec<BackupHistory>, Error> {
        let rows = sqlx::query(&format!(
            "SELECT {HISTORY_COLUMNS} FROM BackupHistory ORDER BY start_time DESC LIMIT ?"
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::statement_execution_failed)?;

        rows.iter().map(history_from_row).collect()
    }

    async fn load_history_for_job(
        &self,
        job_id: Uuid,
        limit: usize,
    ) -> Result<Vec<BackupHistory>, Error> {
        let rows = sqlx::query(&format!(
            "SELECT {HISTORY_COLUMNS} FROM BackupHistory WHERE job_id = ? ORDER BY start_time DESC LIMIT ?"
        ))
        .bind(job_id.as_bytes().as_slice())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::statement_execution_failed)?;

        rows.iter().map(history_from_row).collect()
    }

    async fn save_history(&self, record: &BackupHistory) -> Result<(), Error> {
        sqlx::query(&format!(
            "INSERT INTO BackupHistory ({HISTORY_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(record.id.as_bytes().as_slice())
        .bind(record.job_id.as_bytes().as_slice())
        .bind(&record.job_name)
        .bind(record.start_time)
        .bind(record.end_time)
        .bind(to_json(&record.status)?)
        .bind(&record.error_message)
        .bind(record.total_files as i64)
        .bind(record.processed_files as i64)
        .bind(record.failed_files as i64)
        .bind(record.total_bytes as i64)
        .bind(record.processed_bytes as i64)
        .bind(to_json(&record.warnings)?)
        .bind(to_json(&record.errors)?)
        .bind(record.destination_path.to_string_lossy().to_string())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::statement_execution_failed)?;
        Ok(())
    }

    async fn cleanup_history(&self, keep_days: u32) -> Result<u64, Error> {
        if keep_days == 0 {
            return Ok(0);
        }
        let cutoff = Local::now().naive_local() - Duration::days(keep_days as i64);
        let result = sqlx::query("DELETE FROM BackupHistory WHERE start_time < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::statement_execution_failed)?;
        let count = result.rows_affected();
        log!(DatabaseLog::HistoryPruned { count, keep_days });
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::core::backup::job::{BackupOptions, JobStatus, Schedule};
    use chrono::{NaiveTime, Weekday};
    use tempfile::TempDir;

    async fn database() -> (TempDir, DatabaseManager) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state").join("backup.db");
        let database = DatabaseManager::new(&path).await.unwrap();
        (temp_dir, database)
    }

    #[tokio::test]
    async fn creates_database_file_and_tables() {
        let (temp_dir, database) = database().await;
        assert!(temp_dir.path().join("state").join("backup.db").exists());
        assert!(database.exist_table("BackupJobs").await);
        assert!(database.exist_table("BackupHistory").await);
        database.close_connection().await;
    }

    #[tokio::test]
    async fn job_round_trips_through_upsert() {
        let (_temp_dir, database) = database().await;
        let time = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        let mut job = BackupJob::new(
            "photos",
            vec!["/home/user/photos".into(), "/home/user/notes.txt".into()],
            "/mnt/backup",
            Schedule::Weekly(Weekday::Wed, time),
        )
        .with_options(BackupOptions {
            exclude_patterns: vec!["*.tmp".to_string()],
            enable_retention: true,
            max_backup_count: 3,
            ..Default::default()
        });

        database.save_job(&mut job).await.unwrap();
        let created_at = job.created_at;

        job.total_backup_count = 4;
        job.last_run_status = JobStatus::CompletedWithWarnings;
        database.save_job(&mut job).await.unwrap();

        let loaded = database.load_job(job.id).await.unwrap().unwrap();
        assert_eq!(loaded.total_backup_count, 4);
        assert!(database.load_job(Uuid::new_v4()).await.unwrap().is_none());

        let jobs = database.load_jobs().await.unwrap();
        assert_eq!(jobs.len(), 1);
        let stored = &jobs[0];
        assert_eq!(stored.id, job.id);
        assert_eq!(stored.schedule, Schedule::Weekly(Weekday::Wed, time));
        assert_eq!(stored.options.exclude_patterns, vec!["*.tmp".to_string()]);
        assert_eq!(stored.source_paths.len(), 2);
        assert_eq!(stored.total_backup_count, 4);
        assert_eq!(stored.last_run_status, JobStatus::CompletedWithWarnings);
        assert_eq!(stored.created_at, created_at);

        database.delete_job(job.id).await.unwrap();
        assert!(database.load_jobs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_is_ordered_and_pruned() {
        let (_temp_dir, database) = database().await;
        let job = BackupJob::new("docs", vec![], "/mnt/backup", Schedule::Manual);
        let now = Local::now().naive_local();

        let mut old = BackupHistory::start(&job, now - Duration::days(60));
        old.errors.push("a.txt: Access denied".to_string());
        old.finish(JobStatus::CompletedWithWarnings, now - Duration::days(60));
        database.save_history(&old).await.unwrap();

        let recent = BackupHistory::start(&job, now - Duration::hours(1));
        database.save_history(&recent).await.unwrap();

        let records = database.load_history_for_job(job.id, 10).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, recent.id);
        assert_eq!(records[1].errors, old.errors);
        assert_eq!(records[1].status, JobStatus::CompletedWithWarnings);

        assert_eq!(database.load_history(1).await.unwrap().len(), 1);
        assert_eq!(database.cleanup_history(30).await.unwrap(), 1);
        assert_eq!(database.load_history(10).await.unwrap().len(), 1);
    }
}
