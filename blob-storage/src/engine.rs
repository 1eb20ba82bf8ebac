use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Options, TransactionDB, TransactionDBOptions};

use crate::chunk_store::{ChunkStore, ChunkStores, RocksChunkStore};
use crate::error::{StoreError, StoreResult};
use crate::local_store::LocalChunkStore;

/// Metadata documents, keyed by filename.
pub const FILES_CF: &str = "files";
/// Chunk content, keyed by storage id.
pub const CHUNKS_CF: &str = "chunks";

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);

/// How long a writer waits for the lock on a filename held by a racing writer.
/// On expiry the writer re-checks the name, see `BlobStore::with_lock_timeout`.
const TXN_LOCK_TIMEOUT_MS: i64 = 5000;

const SCHEME: &str = "rocksdb://";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkBackend {
    Rocks,
    Local(PathBuf),
}

/// Parsed form of `rocksdb://<path>[?chunks=<dir>]`. A bare path is accepted too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub db_path: PathBuf,
    pub chunks: ChunkBackend,
}

impl FromStr for ConnectionString {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StoreError::InvalidConnectionString(s.to_string());
        let rest = match s.strip_prefix(SCHEME) {
            Some(rest) => rest,
            None if s.contains("://") => return Err(invalid()),
            None => s,
        };

        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };
        if path.is_empty() {
            return Err(invalid());
        }

        let chunks = match query {
            None => ChunkBackend::Rocks,
            Some(query) => match query.split_once('=') {
                Some(("chunks", dir)) if !dir.is_empty() => ChunkBackend::Local(PathBuf::from(dir)),
                _ => return Err(invalid()),
            },
        };

        Ok(Self {
            db_path: PathBuf::from(path),
            chunks,
        })
    }
}

/// The process-wide storage engine handle.
///
/// Opened once at startup and shared behind an `Arc`; the database is closed
/// when the last handle is dropped.
pub struct Engine {
    db: Arc<TransactionDB>,
    chunks: ChunkStores,
}

impl Engine {
    /// Opens the engine named by `conn_str`, giving up after `timeout`.
    pub fn connect(conn_str: &str, timeout: Duration) -> StoreResult<Self> {
        let conn: ConnectionString = conn_str.parse()?;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            // a late result is dropped here, closing the database again
            let _ = tx.send(Engine::open(&conn));
        });

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(StoreError::Unavailable(format!(
                "timed out after {}ms opening {}",
                timeout.as_millis(),
                conn_str
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(StoreError::Unavailable(format!(
                "opening {} was aborted",
                conn_str
            ))),
        }
    }

    fn open(conn: &ConnectionString) -> StoreResult<Self> {
        let mut db_opts = Options::default();
        db_opts.create_missing_column_families(true);
        db_opts.create_if_missing(true);

        let mut txn_db_opts = TransactionDBOptions::default();
        txn_db_opts.set_txn_lock_timeout(TXN_LOCK_TIMEOUT_MS);

        let files = ColumnFamilyDescriptor::new(FILES_CF, Options::default());
        let chunks = ColumnFamilyDescriptor::new(CHUNKS_CF, Options::default());

        let db = TransactionDB::open_cf_descriptors(&db_opts, &txn_db_opts, &conn.db_path, vec![files, chunks])?;
        let db = Arc::new(db);

        let chunks = match &conn.chunks {
            ChunkBackend::Rocks => ChunkStores::Rocks(RocksChunkStore::new(db.clone())),
            ChunkBackend::Local(dir) => {
                fs::create_dir_all(dir).map_err(|e| {
                    StoreError::Unavailable(format!("cannot create chunk directory {}: {e}", dir.display()))
                })?;
                ChunkStores::Local(LocalChunkStore::new(dir.clone()))
            }
        };

        tracing::info!("opened storage engine at {}", conn.db_path.display());
        Ok(Self { db, chunks })
    }

    pub(crate) fn db(&self) -> &TransactionDB {
        &self.db
    }

    /// Returns a handle to the "files" column family
    pub(crate) fn files(&self) -> StoreResult<&ColumnFamily> {
        self.db
            .cf_handle(FILES_CF)
            .ok_or_else(|| StoreError::Unavailable("missing files column family".to_string()))
    }

    pub(crate) fn chunks(&self) -> &dyn ChunkStore {
        self.chunks.as_trait()
    }
}
