use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;

use crate::domain::photo::{ImageCache, PhotoStorage, StorageError};

impl From<io::Error> for StorageError {
    fn from(value: io::Error) -> Self {
        StorageError::Io(value.to_string())
    }
}

/// Profile photos stored as plain files in one directory
#[derive(Clone, Debug)]
pub struct FsPhotoStorage {
    directory: Arc<PathBuf>,
}

impl FsPhotoStorage {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Arc::new(directory.into()),
        }
    }

    /// Only bare file names are addressable, never a path leaving the directory.
    fn path_of(&self, file_name: &str) -> Result<PathBuf, StorageError> {
        let is_plain = !file_name.is_empty()
            && Path::new(file_name).file_name().and_then(|n| n.to_str()) == Some(file_name);
        if !is_plain {
            return Err(StorageError::Io(format!("invalid photo file name '{}'", file_name)));
        }
        Ok(self.directory.join(file_name))
    }
}

/// Writes into a temp file next to the target, then renames it into place.
fn write_atomically(directory: &Path, target: &Path, bytes: &[u8]) -> io::Result<()> {
    std::fs::create_dir_all(directory)?;
    let mut file = NamedTempFile::new_in(directory)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(target).map_err(|e| e.error)?;
    Ok(())
}

impl PhotoStorage for FsPhotoStorage {
    async fn store(&self, file_name: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let target = self.path_of(file_name)?;
        let directory = self.directory.clone();

        tokio::task::spawn_blocking(move || write_atomically(&directory, &target, &bytes))
            .await
            .map_err(|e| StorageError::Io(format!("photo write task failed: {}", e)))??;

        Ok(())
    }

    async fn exists(&self, file_name: &str) -> bool {
        match self.path_of(file_name) {
            Ok(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn remove(&self, file_name: &str) -> Result<(), StorageError> {
        let path = self.path_of(file_name)?;
        tokio::fs::remove_file(path).await?;
        Ok(())
    }
}

/// Cached image variants laid out as `{directory}/{filter}/{path}`
#[derive(Clone, Debug)]
pub struct FsImageCache {
    directory: Arc<PathBuf>,
    filters: Arc<Vec<String>>,
}

impl FsImageCache {
    pub fn new(directory: impl Into<PathBuf>, filters: Vec<String>) -> Self {
        Self {
            directory: Arc::new(directory.into()),
            filters: Arc::new(filters),
        }
    }
}

impl ImageCache for FsImageCache {
    async fn remove(&self, path: &str) -> Result<(), StorageError> {
        if path.split('/').any(|segment| segment == "..") {
            return Err(StorageError::Io(format!("invalid cache path '{}'", path)));
        }

        for filter in self.filters.iter() {
            let cached = self.directory.join(filter).join(path);
            match tokio::fs::remove_file(&cached).await {
                Ok(()) => tracing::debug!("removed cached image {}", cached.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
