use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// Engine-assigned identifier of a stored chunk. Never leaves this crate.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub(crate) struct StorageId(String);

impl StorageId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

/// The metadata document registered under a filename in the `files` column family.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct FileDocument {
    pub filename: String,
    pub description: String,
    pub storage_id: StorageId,
    /// Content length in bytes
    pub length: u64,
    /// Hex encoded SHA-256 of the content
    pub sha256: String,
    /// Seconds since the unix epoch
    pub uploaded_at: u64,
}

impl FileDocument {
    pub(crate) fn new(filename: &str, description: &str, content: &[u8]) -> Self {
        let uploaded_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            filename: filename.to_string(),
            description: description.to_string(),
            storage_id: StorageId::generate(),
            length: content.len() as u64,
            sha256: compute_hash(content),
            uploaded_at,
        }
    }

    pub(crate) fn encode(&self) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| StoreError::corrupted(&self.filename, e.to_string()))
    }

    pub(crate) fn decode(filename: &str, raw: &[u8]) -> StoreResult<Self> {
        serde_json::from_slice(raw)
            .map_err(|e| StoreError::corrupted(filename, format!("undecodable metadata: {e}")))
    }

    /// Checks that `content` is the chunk this document was registered with.
    pub(crate) fn verify(&self, content: &[u8]) -> StoreResult<()> {
        if content.len() as u64 != self.length {
            return Err(StoreError::corrupted(
                &self.filename,
                format!("expected {} bytes, found {}", self.length, content.len()),
            ));
        }
        if compute_hash(content) != self.sha256 {
            return Err(StoreError::corrupted(&self.filename, "checksum mismatch"));
        }
        Ok(())
    }

    pub(crate) fn summary(&self) -> ImageSummary {
        ImageSummary {
            filename: self.filename.clone(),
            description: self.description.clone(),
        }
    }
}

/// A listing entry. Carries no content so listing stays cheap.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ImageSummary {
    pub filename: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub description: String,
    pub content: Vec<u8>,
}

// SHA-256 of the data as lowercase hex.
pub(crate) fn compute_hash(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    result.iter().map(|byte| format!("{:02x}", byte)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_survives_json() {
        let doc = FileDocument::new("dice.png", "a die", b"0123456789");
        let raw = doc.encode().unwrap();
        let decoded = FileDocument::decode("dice.png", &raw).unwrap();
        assert_eq!(decoded, doc);
        assert_eq!(decoded.length, 10);
    }

    #[test]
    fn test_verify_rejects_other_content() {
        let doc = FileDocument::new("dice.png", "a die", b"0123456789");
        assert!(doc.verify(b"0123456789").is_ok());
        assert!(matches!(doc.verify(b"012345678"), Err(StoreError::Corrupted { .. })));
        assert!(matches!(doc.verify(b"9876543210"), Err(StoreError::Corrupted { .. })));
    }

    #[test]
    fn test_decode_garbage_is_corrupted() {
        let err = FileDocument::decode("x.png", b"not json").unwrap_err();
        assert!(matches!(err, StoreError::Corrupted { ref filename, .. } if filename == "x.png"));
    }

    #[test]
    fn test_compute_hash_known_value() {
        assert_eq!(
            compute_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
