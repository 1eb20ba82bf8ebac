use std::fs;
use std::path::{Path, PathBuf};
use blob_store::{BlobStore, ImageSummary, StoreResult, StoredImage};
use serde::Deserialize;
use validator::Validate;
use crate::errors::TransferErr;

const MAX_FILENAME_LEN: usize = 255;

#[derive(Deserialize, Validate, Debug, Default)]
pub struct UploadRequest {
    #[validate(required)]
    pub filename: Option<String>,
    #[validate(required)]
    pub description: Option<String>,
    /// Local path the image content is read from
    #[validate(required)]
    pub path: Option<String>,
}

/// The record operations the transfer service needs from its backing store.
pub trait ImageStore: Send + Sync {
    fn exists(&self, filename: &str) -> StoreResult<bool>;
    fn put(&self, filename: &str, description: &str, content: &[u8]) -> StoreResult<()>;
    fn get(&self, filename: &str) -> StoreResult<StoredImage>;
    fn list(&self) -> StoreResult<Vec<ImageSummary>>;
}

impl ImageStore for BlobStore {
    fn exists(&self, filename: &str) -> StoreResult<bool> {
        BlobStore::exists(self, filename)
    }

    fn put(&self, filename: &str, description: &str, content: &[u8]) -> StoreResult<()> {
        BlobStore::put(self, filename, description, content)
    }

    fn get(&self, filename: &str) -> StoreResult<StoredImage> {
        BlobStore::get(self, filename)
    }

    fn list(&self) -> StoreResult<Vec<ImageSummary>> {
        BlobStore::list(self)
    }
}

/// Moves whole images between local files and an [`ImageStore`].
#[derive(Clone)]
pub struct TransferService<S = BlobStore> {
    store: S,
}

impl<S: ImageStore> TransferService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn upload(&self, req: UploadRequest) -> Result<(), TransferErr> {
        req.validate().map_err(|e| TransferErr::InvalidRequest(e.to_string()))?;
        // all three are `Some` once validated
        let filename = req.filename.unwrap_or_default();
        let description = req.description.unwrap_or_default();
        let path = req.path.unwrap_or_default();
        check_filename(&filename)?;
        if path.is_empty() {
            return Err(TransferErr::InvalidRequest("path must not be empty".to_string()));
        }

        if self.store.exists(&filename)? {
            tracing::warn!(filename = %filename, "rejected upload of existing image");
            return Err(TransferErr::AlreadyExists(filename));
        }

        let content = fs::read(&path).map_err(|source| {
            tracing::error!("Reading image file {} failed: {}", path, source);
            TransferErr::SourceUnreadable { path: PathBuf::from(&path), source }
        })?;

        self.store.put(&filename, &description, &content).map_err(|e| {
            tracing::error!(filename = %filename, "Uploading image to db failed: {}", e);
            TransferErr::from(e)
        })?;
        Ok(())
    }

    /// Every stored image. An unreachable store yields an empty listing.
    pub fn list_all(&self) -> Vec<ImageSummary> {
        self.store.list().unwrap_or_else(|e| {
            tracing::error!("Listing content failed: {}", e);
            Vec::new()
        })
    }

    /// Writes the content of `filename` to `destination_dir/filename`,
    /// replacing any file already there. Returns the written path.
    pub fn download(&self, filename: &str, destination_dir: &Path) -> Result<PathBuf, TransferErr> {
        check_filename(filename)?;
        let image = self.store.get(filename).map_err(|e| {
            tracing::warn!(filename, "download failed: {}", e);
            TransferErr::from(e)
        })?;

        let path = destination_dir.join(filename);
        fs::write(&path, &image.content).map_err(|source| {
            tracing::error!("Writing image file {} failed: {}", path.display(), source);
            TransferErr::DestinationUnwritable { path: path.clone(), source }
        })?;
        tracing::info!(filename, bytes = image.content.len(), "downloaded image to {}", path.display());
        Ok(path)
    }
}

/// Rejects names that could escape the download directory or are not a
/// single path component.
pub fn check_filename(filename: &str) -> Result<(), TransferErr> {
    let reason = if filename.is_empty() {
        "filename must not be empty"
    } else if filename.len() > MAX_FILENAME_LEN {
        "filename is too long"
    } else if filename == "." || filename == ".." {
        "filename must name a file"
    } else if filename.contains(['/', '\\', '\0']) {
        "filename must not contain path separators"
    } else {
        return Ok(());
    };
    Err(TransferErr::InvalidRequest(format!("{reason}: {filename:?}")))
}
