use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::PathBuf;

use crate::chunk_store::{ChunkResult, ChunkStore};

/// Chunks kept as one file per chunk id under `base_path`.
#[derive(Clone, Debug)]
pub struct LocalChunkStore {
    base_path: PathBuf,
}

impl LocalChunkStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    fn chunk_path(&self, chunk_id: &str) -> PathBuf {
        self.base_path.join(chunk_id)
    }

    /// Makes a created or removed directory entry durable.
    fn sync_dir(&self) -> io::Result<()> {
        File::open(&self.base_path)?.sync_all()
    }
}

impl ChunkStore for LocalChunkStore {
    fn put_chunk(&self, chunk_id: &str, data: &[u8]) -> ChunkResult<()> {
        // chunks are immutable, never reuse an id
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.chunk_path(chunk_id))?;
        file.write_all(data)?;
        file.sync_all()?;
        self.sync_dir()?;
        Ok(())
    }

    fn get_chunk(&self, chunk_id: &str) -> ChunkResult<Option<Vec<u8>>> {
        match fs::read(self.chunk_path(chunk_id)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_chunk(&self, chunk_id: &str) -> ChunkResult<()> {
        match fs::remove_file(self.chunk_path(chunk_id)) {
            Ok(()) => Ok(self.sync_dir()?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use uuid::Uuid;

    #[test]
    fn test_put_chunk() {
        let temp_dir = tempdir().unwrap();
        let store = LocalChunkStore::new(temp_dir.path());

        let chunk_id = Uuid::new_v4().to_string();
        let data = b"test data";

        store.put_chunk(&chunk_id, data).unwrap();

        // Verify the file was created and contains the correct data
        let on_disk = fs::read(temp_dir.path().join(&chunk_id)).unwrap();
        assert_eq!(on_disk, data);
        assert_eq!(store.get_chunk(&chunk_id).unwrap().unwrap(), data);
    }

    #[test]
    fn test_put_chunk_refuses_overwrite() {
        let temp_dir = tempdir().unwrap();
        let store = LocalChunkStore::new(temp_dir.path());

        let chunk_id = "test_chunk";
        let data1 = b"test data 1";
        let data2 = b"test data 2";

        store.put_chunk(chunk_id, data1).unwrap();
        assert!(store.put_chunk(chunk_id, data2).is_err());

        // First write wins
        assert_eq!(store.get_chunk(chunk_id).unwrap().unwrap(), data1);
    }

    #[test]
    fn test_put_chunk_without_directory_fails() {
        let temp_dir = tempdir().unwrap();
        let base_path = temp_dir.path().join("chunks");
        let store = LocalChunkStore::new(&base_path);

        assert!(store.put_chunk("orphan", b"bytes").is_err());

        // Writes and the directory sync succeed once the directory exists.
        fs::create_dir(&base_path).unwrap();
        store.put_chunk("orphan", b"bytes").unwrap();
        store.sync_dir().unwrap();
        assert_eq!(fs::read_dir(&base_path).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_chunk() {
        let temp_dir = tempdir().unwrap();
        let store = LocalChunkStore::new(temp_dir.path());

        assert!(store.get_chunk("nope").unwrap().is_none());
        store.delete_chunk("nope").unwrap();
    }

    #[test]
    fn test_delete_chunk() {
        let temp_dir = tempdir().unwrap();
        let store = LocalChunkStore::new(temp_dir.path());

        store.put_chunk("gone", b"bytes").unwrap();
        store.delete_chunk("gone").unwrap();
        assert!(store.get_chunk("gone").unwrap().is_none());
    }
}
