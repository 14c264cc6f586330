pub mod database;
pub mod io;
pub mod misc;
pub mod system;
pub mod task;

use crate::model::error::database::DatabaseError;
use crate::model::error::io::IOError;
use crate::model::error::misc::MiscError;
use crate::model::error::system::SystemError;
use crate::model::error::task::TaskError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
pub enum Error {
    #[error(transparent)]
    Database(DatabaseError),
    #[error(transparent)]
    IO(IOError),
    #[error(transparent)]
    Misc(MiscError),
    #[error(transparent)]
    System(SystemError),
    #[error(transparent)]
    Task(TaskError),
}

impl Error {
    pub fn level(&self) -> tracing::Level {
        match self {
            Error::Database(err) => err.level(),
            Error::IO(err) => err.level(),
            Error::Misc(err) => err.level(),
            Error::System(err) => err.level(),
            Error::Task(err) => err.level(),
        }
    }

    pub fn log(&self) {
        macros::log!(self)
    }
}

impl From<DatabaseError> for Error {
    fn from(error: DatabaseError) -> Self {
        Self::Database(error)
    }
}

impl From<IOError> for Error {
    fn from(error: IOError) -> Self {
        Self::IO(error)
    }
}

impl From<MiscError> for Error {
    fn from(error: MiscError) -> Self {
        Self::Misc(error)
    }
}

impl From<SystemError> for Error {
    fn from(error: SystemError) -> Self {
        Self::System(error)
    }
}

impl From<TaskError> for Error {
    fn from(error: TaskError) -> Self {
        Self::Task(error)
    }
}
