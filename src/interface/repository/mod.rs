pub mod history;
pub mod job;

use crate::interface::repository::history::HistoryRepository;
use crate::interface::repository::job::JobRepository;

/// Persistence collaborator for jobs and their history.
pub trait Storage: JobRepository + HistoryRepository {}

impl<T: JobRepository + HistoryRepository> Storage for T {}
