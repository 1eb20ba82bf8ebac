use std::sync::Arc;
use std::time::Duration;

use rocksdb::{ErrorKind, IteratorMode, TransactionOptions, WriteOptions};

use crate::engine::Engine;
use crate::error::{StoreError, StoreResult};
use crate::record::{FileDocument, ImageSummary, StorageId, StoredImage};

/// Named, immutable image content with a description.
///
/// A record is only ever visible once both its chunk and its metadata
/// document are persisted. The chunk is written first, so an interrupted
/// `put` leaves at most an unreferenced chunk behind.
#[derive(Clone)]
pub struct BlobStore {
    engine: Arc<Engine>,
    /// Per-transaction wait for a filename locked by a racing writer.
    /// `None` keeps the engine-wide default.
    lock_timeout: Option<Duration>,
}

impl BlobStore {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine, lock_timeout: None }
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = Some(lock_timeout);
        self
    }

    /// Whether metadata is registered under `filename`. No side effects.
    pub fn exists(&self, filename: &str) -> StoreResult<bool> {
        let files = self.engine.files()?;
        Ok(self.engine.db().get_cf(files, filename)?.is_some())
    }

    /// Stores `content` under `filename`, failing with
    /// [`StoreError::DuplicateName`] instead of overwriting an existing record.
    pub fn put(&self, filename: &str, description: &str, content: &[u8]) -> StoreResult<()> {
        // Cheap rejection before paying for a chunk write. The transaction in
        // `register` is what actually guarantees uniqueness.
        if self.exists(filename)? {
            return Err(StoreError::DuplicateName(filename.to_string()));
        }

        let document = FileDocument::new(filename, description, content);
        self.engine
            .chunks()
            .put_chunk(document.storage_id.as_str(), content)
            .map_err(|e| StoreError::Unavailable(format!("storing content for {filename:?} failed: {e}")))?;

        match self.register(&document) {
            Ok(()) => {
                tracing::info!(filename, bytes = content.len(), "stored image");
                Ok(())
            }
            Err(err) => {
                self.discard_chunk(filename, &document.storage_id);
                Err(err)
            }
        }
    }

    /// Registers the metadata document, holding an exclusive lock on the
    /// filename so that of two racing writers only the first commits.
    fn register(&self, document: &FileDocument) -> StoreResult<()> {
        let files = self.engine.files()?;
        let body = document.encode()?;

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(true);
        let mut txn_opts = TransactionOptions::default();
        if let Some(lock_timeout) = self.lock_timeout {
            txn_opts.set_lock_timeout(lock_timeout.as_millis() as i64);
        }
        let txn = self.engine.db().transaction_opt(&write_opts, &txn_opts);

        let current = match txn.get_for_update_cf(files, &document.filename, true) {
            Ok(current) => current,
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Busy) => {
                // The lock holder may have committed since; only its outcome decides.
                return Err(if self.exists(&document.filename)? {
                    StoreError::DuplicateName(document.filename.clone())
                } else {
                    StoreError::Unavailable(format!(
                        "timed out waiting for the lock on {:?}: {}",
                        document.filename,
                        e.into_string()
                    ))
                });
            }
            Err(e) => return Err(e.into()),
        };
        if current.is_some() {
            txn.rollback()?;
            return Err(StoreError::DuplicateName(document.filename.clone()));
        }
        txn.put_cf(files, &document.filename, body)?;
        txn.commit()?;
        Ok(())
    }

    // Leaves an orphan chunk behind if the delete fails too.
    fn discard_chunk(&self, filename: &str, storage_id: &StorageId) {
        if let Err(e) = self.engine.chunks().delete_chunk(storage_id.as_str()) {
            tracing::error!(filename, "failed to discard unregistered chunk {}: {}", storage_id.as_str(), e);
        }
    }

    /// Looks up `filename` and returns its description and content.
    ///
    /// Metadata whose chunk is missing, unreadable or does not match the
    /// recorded length and checksum is reported as [`StoreError::Corrupted`].
    pub fn get(&self, filename: &str) -> StoreResult<StoredImage> {
        let files = self.engine.files()?;
        let raw = self
            .engine
            .db()
            .get_cf(files, filename)?
            .ok_or_else(|| StoreError::NotFound(filename.to_string()))?;
        let document = FileDocument::decode(filename, &raw)?;

        let content = match self.engine.chunks().get_chunk(document.storage_id.as_str()) {
            Ok(Some(content)) => content,
            Ok(None) => return Err(StoreError::corrupted(filename, "content is missing")),
            Err(e) => return Err(StoreError::corrupted(filename, format!("content is unreadable: {e}"))),
        };
        document.verify(&content)?;

        Ok(StoredImage {
            description: document.description,
            content,
        })
    }

    /// Filename and description of every record, in no particular order.
    pub fn list(&self) -> StoreResult<Vec<ImageSummary>> {
        let files = self.engine.files()?;
        let mut images = Vec::new();
        for item in self.engine.db().iterator_cf(files, IteratorMode::Start) {
            let (key, value) = item?;
            let filename = String::from_utf8_lossy(&key);
            match FileDocument::decode(&filename, &value) {
                Ok(document) => images.push(document.summary()),
                Err(e) => tracing::warn!("skipping file document: {}", e),
            }
        }
        Ok(images)
    }
}
