use std::error::Error;
use std::sync::Arc;

use rocksdb::{TransactionDB, WriteOptions};

use crate::engine::CHUNKS_CF;
use crate::local_store::LocalChunkStore;

pub type ChunkResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Trait for storing and fetching immutable chunks by their IDs.
pub trait ChunkStore: Send + Sync {
    /// Durably stores a chunk. Returns only once the content is persisted.
    fn put_chunk(&self, chunk_id: &str, data: &[u8]) -> ChunkResult<()>;

    /// Retrieves a chunk by its id, `None` if no such chunk exists.
    fn get_chunk(&self, chunk_id: &str) -> ChunkResult<Option<Vec<u8>>>;

    /// Removes a chunk. Removing a missing chunk is not an error.
    fn delete_chunk(&self, chunk_id: &str) -> ChunkResult<()>;
}

/// Chunks kept in the `chunks` column family next to the metadata documents.
#[derive(Clone)]
pub struct RocksChunkStore {
    db: Arc<TransactionDB>,
}

impl RocksChunkStore {
    pub fn new(db: Arc<TransactionDB>) -> Self {
        Self { db }
    }

    fn write_options() -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(true);
        opts
    }
}

impl ChunkStore for RocksChunkStore {
    fn put_chunk(&self, chunk_id: &str, data: &[u8]) -> ChunkResult<()> {
        let cf = self.db.cf_handle(CHUNKS_CF).ok_or("missing chunks column family")?;
        self.db.put_cf_opt(cf, chunk_id, data, &Self::write_options())?;
        Ok(())
    }

    fn get_chunk(&self, chunk_id: &str) -> ChunkResult<Option<Vec<u8>>> {
        let cf = self.db.cf_handle(CHUNKS_CF).ok_or("missing chunks column family")?;
        Ok(self.db.get_cf(cf, chunk_id)?)
    }

    fn delete_chunk(&self, chunk_id: &str) -> ChunkResult<()> {
        let cf = self.db.cf_handle(CHUNKS_CF).ok_or("missing chunks column family")?;
        self.db.delete_cf_opt(cf, chunk_id, &Self::write_options())?;
        Ok(())
    }
}

pub enum ChunkStores {
    Rocks(RocksChunkStore),
    Local(LocalChunkStore),
}

impl ChunkStores {
    /// Returns a reference to the inner value as a trait object.
    pub fn as_trait(&self) -> &dyn ChunkStore {
        match self {
            ChunkStores::Rocks(a) => a,
            ChunkStores::Local(b) => b,
        }
    }
}
