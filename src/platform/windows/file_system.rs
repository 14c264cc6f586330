use crate::interface::file_system::{FileSystemTrait, MetadataPolicy};
use crate::model::error::Error;
use crate::model::error::io::IOError;
use crate::model::error::system::SystemError;
use crate::platform::attributes::FileAttributes;
use async_trait::async_trait;
use std::fs::{FileTimes, OpenOptions};
use std::os::windows::ffi::OsStrExt;
use std::os::windows::fs::{FileTimesExt, MetadataExt};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Semaphore;
use windows::Win32::Storage::FileSystem::{
    FILE_ATTRIBUTE_HIDDEN, FILE_ATTRIBUTE_READONLY, FILE_ATTRIBUTE_SYSTEM,
    FILE_FLAGS_AND_ATTRIBUTES, SetFileAttributesW,
};
use windows::core::PCWSTR;

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

        let attributes = metadata.file_attributes();

        Ok(FileAttributes {
            hidden: attributes & FILE_ATTRIBUTE_HIDDEN.0 != 0,
            system: attributes & FILE_ATTRIBUTE_SYSTEM.0 != 0,
            read_only: attributes & FILE_ATTRIBUTE_READONLY.0 != 0,
            attributes,
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

        // Times first, a read-only file can no longer be opened for writing.
        if policy.timestamps {
            let target = path.to_path_buf();
            let mut times = FileTimes::new();
            if let Some(created) = attributes.created {
                times = times.set_created(created);
            }
            if let Some(accessed) = attributes.accessed {
                times = times.set_accessed(accessed);
            }
            if let Some(modified) = attributes.modified {
                times = times.set_modified(modified);
            }
            tokio::task::spawn_blocking(move || {
                OpenOptions::new()
                    .write(true)
                    .open(&target)
                    .and_then(|file| file.set_times(times))
            })
            .await
            .map_err(SystemError::thread_panic)?
            .map_err(|err| IOError::classify(path, err, IOError::set_metadata_failed))?;
        }

        if policy.attributes {
            let wide_path: Vec<u16> = path.as_os_str().encode_wide().chain(Some(0)).collect();
            unsafe {
                SetFileAttributesW(
                    PCWSTR(wide_path.as_ptr()),
                    FILE_FLAGS_AND_ATTRIBUTES(attributes.attributes),
                )
            }
            .map_err(|err| IOError::set_metadata_failed(path, err))?;
        }

        Ok(())
    }
}
