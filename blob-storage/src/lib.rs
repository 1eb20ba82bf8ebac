//! Duplicate-free storage of named image content with description metadata.
//!
//! Metadata documents and chunk content live behind a single [`Engine`] handle.
//! [`BlobStore`] is the only writer: content is persisted as an immutable chunk
//! first and the metadata document is registered afterwards, inside a
//! transaction that holds an exclusive lock on the filename.

pub mod blob_store;
pub mod chunk_store;
pub mod engine;
pub mod error;
pub mod local_store;
pub mod record;

pub use blob_store::BlobStore;
pub use engine::{ConnectionString, Engine, DEFAULT_CONNECT_TIMEOUT};
pub use error::{StoreError, StoreResult};
pub use record::{ImageSummary, StoredImage};
