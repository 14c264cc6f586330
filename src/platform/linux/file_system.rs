use crate::interface::file_system::{FileSystemTrait, MetadataPolicy};
use crate::model::error::Error;
use crate::model::error::io::IOError;
use crate::model::error::system::SystemError;
use crate::platform::attributes::FileAttributes;
use async_trait::async_trait;
use std::fs::{FileTimes, Permissions};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Semaphore;

pub struct FileSystem {
    semaphore: Arc<Semaphore>,
}

#[async_trait]
impl FileSystemTrait for FileSystem {
    fn new(semaphore: Arc<Semaphore>) -> Self {
        FileSystem { semaphore }
    }

    fn semaphore(&self) -> Arc<Semaphore> {
        self.semaphore.clone()
    }

    async fn get_attributes(&self, path: &Path) -> Result<FileAttributes, Error> {
        let metadata = fs::metadata(path)
            .await
            .map_err(|err| IOError::classify(path, err, IOError::get_metadata_failed))?;

        let hidden = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.'));
        let permissions = metadata.permissions();

        Ok(FileAttributes {
            hidden,
            system: false,
            read_only: permissions.readonly(),
            mode: permissions.mode(),
            size: metadata.len(),
            created: metadata.created().ok(),
            modified: metadata.modified().ok(),
            accessed: metadata.accessed().ok(),
        })
    }

    async fn set_attributes(
        &self,
        path: &Path,
        attributes: &FileAttributes,
        policy: MetadataPolicy,
    ) -> Result<(), Error> {
        let _permit = self.acquire().await?;

        // Creation time cannot be set on this platform.
        if policy.timestamps {
            let target = path.to_path_buf();
            let mut times = FileTimes::new();
            if let Some(accessed) = attributes.accessed {
                times = times.set_accessed(accessed);
            }
            if let Some(modified) = attributes.modified {
                times = times.set_modified(modified);
            }
            tokio::task::spawn_blocking(move || {
                std::fs::File::open(&target).and_then(|file| file.set_times(times))
            })
            .await
            .map_err(SystemError::thread_panic)?
            .map_err(|err| IOError::classify(path, err, IOError::set_metadata_failed))?;
        }

        if policy.attributes {
            fs::set_permissions(path, Permissions::from_mode(attributes.mode))
                .await
                .map_err(|err| IOError::classify(path, err, IOError::set_metadata_failed))?;
        }

        Ok(())
    }
}
