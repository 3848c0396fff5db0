use std::future::Future;

use crate::domain::{
    RepositoryError,
    user::{User, UserId, UserRepository},
};

/// Image-cache entries of profile photos live under this path
pub const PHOTO_CACHE_PREFIX: &str = "images/profils/";

#[derive(Debug)]
pub enum StorageError {
    Io(String),
}

#[derive(Debug)]
pub enum PhotoError {
    Storage(StorageError),
    Repository(RepositoryError),
}

/// Formats accepted for a profile photo, recognised by their magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
}

impl ImageFormat {
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }
}

/// An uploaded image whose format has been recognised
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl PhotoUpload {
    pub fn new(bytes: Vec<u8>) -> Option<Self> {
        let format = ImageFormat::detect(&bytes)?;
        Some(Self { bytes, format })
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

/// Where profile photos are kept, addressed by file name
pub trait PhotoStorage: Clone + Send + Sync + 'static {
    /// Put `bytes` in place under `file_name`, replacing any previous file atomically
    fn store(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn exists(&self, file_name: &str) -> impl Future<Output = bool> + Send;

    fn remove(&self, file_name: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Derived images (thumbnails) keyed by the original's public path
pub trait ImageCache: Clone + Send + Sync + 'static {
    fn remove(&self, path: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// `user{id}.{ext}`
pub fn photo_file_name(user_id: UserId, format: ImageFormat) -> String {
    format!("user{}.{}", user_id.0, format.extension())
}

/// Replaces the profile photo of `user` and returns the new file name.
///
/// The file is put in place first and the user record is updated second, so the
/// stored name never points to a missing file. The previous photo and its cache
/// entry are only cleaned up once the new name is committed; a failure there is
/// logged and does not fail the replacement.
pub async fn replace_photo<U, P, C>(
    users: &U,
    photos: &P,
    cache: &C,
    user: &User,
    upload: PhotoUpload,
) -> Result<String, PhotoError>
where
    U: UserRepository,
    P: PhotoStorage,
    C: ImageCache,
{
    let new_file_name = photo_file_name(user.id, upload.format);
    let old_file_name = user.photo.as_deref();

    photos
        .store(&new_file_name, upload.bytes)
        .await
        .map_err(PhotoError::Storage)?;

    if let Err(e) = users.update_photo(user.id, &new_file_name).await {
        // a same-named old photo was overwritten, nothing left to roll back
        if old_file_name != Some(new_file_name.as_str()) {
            if let Err(cleanup) = photos.remove(&new_file_name).await {
                tracing::warn!("failed to remove orphan photo {}: {:?}", new_file_name, cleanup);
            }
        }
        return Err(PhotoError::Repository(e));
    }

    if let Some(old_file_name) = old_file_name {
        if photos.exists(old_file_name).await {
            let cache_path = format!("{}{}", PHOTO_CACHE_PREFIX, old_file_name);
            if let Err(e) = cache.remove(&cache_path).await {
                tracing::warn!("failed to invalidate cached {}: {:?}", cache_path, e);
            }
            if old_file_name != new_file_name {
                if let Err(e) = photos.remove(old_file_name).await {
                    tracing::warn!("failed to remove old photo {}: {:?}", old_file_name, e);
                }
            }
        }
    }

    tracing::info!(user = %user.id, photo = %new_file_name, "profile photo replaced");
    Ok(new_file_name)
}
