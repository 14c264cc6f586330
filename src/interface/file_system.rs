use crate::model::error::Error;
use crate::model::error::io::IOError;
use crate::model::error::system::SystemError;
use crate::platform::attributes::FileAttributes;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReadDirStream;
use walkdir::WalkDir;

/// Which parts of a file's metadata to carry over to a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataPolicy {
    pub attributes: bool,
    pub timestamps: bool,
}

impl MetadataPolicy {
    pub const ALL: MetadataPolicy = MetadataPolicy {
        attributes: true,
        timestamps: true,
    };

    pub fn is_empty(&self) -> bool {
        !self.attributes && !self.timestamps
    }
}

/// A file found under a walked root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub size: u64,
}

/// Result of walking one root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkedTree {
    pub files: Vec<WalkedFile>,
    // Symlinks resolving to a directory, never descended into
    pub linked_directories: Vec<PathBuf>,
}

#[async_trait]
pub trait FileSystemTrait: Send + Sync {
    fn new(semaphore: Arc<Semaphore>) -> Self
    where
        Self: Sized;

    fn semaphore(&self) -> Arc<Semaphore>;

    async fn get_attributes(&self, path: &Path) -> Result<FileAttributes, Error>;

    async fn set_attributes(
        &self,
        path: &Path,
        attributes: &FileAttributes,
        policy: MetadataPolicy,
    ) -> Result<(), Error>;

    async fn acquire(&self) -> Result<OwnedSemaphorePermit, Error> {
        let permit = self
            .semaphore()
            .acquire_owned()
            .await
            .map_err(|_| IOError::SemaphoreClosed)?;
        Ok(permit)
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn is_directory(&self, path: &Path) -> bool {
        fs::metadata(path)
            .await
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false)
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>, Error> {
        let _permit = self.acquire().await?;
        let mut result = Vec::new();
        let reader = fs::read_dir(path).await.map_err(|err| {
            IOError::classify(path, err, IOError::read_directory_failed)
        })?;
        let mut entries = ReadDirStream::new(reader);
        while let Some(entry) = entries.next().await {
            let entry = entry.map_err(|err| IOError::read_directory_failed(path, err))?;
            result.push(entry.path());
        }
        Ok(result)
    }

    /// Every file below `root`, sorted by relative path. Symlinks are not
    /// followed. A symlink to a directory is set aside, any other symlink is
    /// reported as a file.
    async fn walk_files(&self, root: &Path) -> Result<WalkedTree, Error> {
        let _permit = self.acquire().await?;
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<WalkedTree, Error> {
            let mut tree = WalkedTree::default();
            for entry in WalkDir::new(&root).sort_by_file_name() {
                let entry = entry.map_err(|err| {
                    let path = err.path().unwrap_or(&root).to_path_buf();
                    match err.into_io_error() {
                        Some(io_err) => {
                            IOError::classify(path, io_err, IOError::read_directory_failed)
                        }
                        None => IOError::read_directory_failed(path, "filesystem loop"),
                    }
                })?;
                if entry.file_type().is_dir() {
                    continue;
                }
                if entry.path_is_symlink()
                    && std::fs::metadata(entry.path()).is_ok_and(|target| target.is_dir())
                {
                    tree.linked_directories.push(entry.into_path());
                    continue;
                }
                let relative_path = match entry.path().strip_prefix(&root) {
                    Ok(relative) => relative.to_path_buf(),
                    Err(_) => PathBuf::from(entry.file_name()),
                };
                let size = entry.metadata().map(|metadata| metadata.len()).unwrap_or(0);
                tree.files.push(WalkedFile {
                    path: entry.into_path(),
                    relative_path,
                    size,
                });
            }
            Ok(tree)
        })
        .await
        .map_err(SystemError::thread_panic)?
    }

    async fn create_directory(&self, path: &Path) -> Result<(), Error> {
        let _permit = self.acquire().await?;
        fs::create_dir_all(path).await.map_err(|err| {
            IOError::classify(path, err, IOError::create_directory_failed)
        })?;
        Ok(())
    }

    /// Copies with overwrite and returns the number of bytes written.
    async fn copy_file(&self, source: &Path, destination: &Path) -> Result<u64, Error> {
        let _permit = self.acquire().await?;
        let bytes = fs::copy(source, destination).await.map_err(|err| {
            IOError::classify(source, err, |src, err| {
                IOError::copy_file_failed(src, destination, err)
            })
        })?;
        Ok(bytes)
    }

    async fn delete_directory(&self, path: &Path) -> Result<(), Error> {
        let _permit = self.acquire().await?;
        fs::remove_dir_all(path).await.map_err(|err| {
            IOError::classify(path, err, IOError::delete_directory_failed)
        })?;
        Ok(())
    }

    /// Creation time where the platform records one, modification time otherwise.
    async fn created_time(&self, path: &Path) -> Result<SystemTime, Error> {
        let metadata = fs::metadata(path)
            .await
            .map_err(|err| IOError::classify(path, err, IOError::get_metadata_failed))?;
        metadata
            .created()
            .or_else(|_| metadata.modified())
            .map_err(|err| IOError::get_metadata_failed(path, err).into())
    }

    /// Opens the file and reads at most one byte.
    async fn try_read(&self, path: &Path) -> Result<(), Error> {
        let _permit = self.acquire().await?;
        let mut file = fs::File::open(path)
            .await
            .map_err(|err| IOError::classify(path, err, IOError::read_file_failed))?;
        let mut buffer = [0u8; 1];
        file.read(&mut buffer)
            .await
            .map_err(|err| IOError::read_file_failed(path, err))?;
        Ok(())
    }
}
