use bytes::Bytes;
use cartage_types::Checksum;
use serde::{Deserialize, Serialize};

/// Metadata persisted alongside an archive's bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveMetadata {
    /// MD5 of the stored bytes, computed by the store at write time.
    pub checksum: Checksum,
    /// Upstream content type, if the origin declared one.
    pub content_type: Option<String>,
    /// Size of the stored bytes.
    pub size: u64,
}

/// A stored archive: the bytes plus their metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredArchive {
    pub bytes: Bytes,
    pub metadata: ArchiveMetadata,
}

impl StoredArchive {
    /// Assemble a stored archive, computing the metadata checksum and size
    /// from the bytes.
    pub fn new(bytes: Bytes, content_type: Option<String>) -> Self {
        let metadata = ArchiveMetadata {
            checksum: Checksum::of(&bytes),
            content_type,
            size: bytes.len() as u64,
        };
        Self { bytes, metadata }
    }
}
