pub mod filesystem;

pub use filesystem::FsObjectStore;

use sha2::{Digest, Sha256};

use crate::error::StorageError;

/// Object metadata as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub size_bytes: u64,
}

/// Container/key addressed blob storage.
pub trait ObjectStore: Send + Sync {
    fn head(&self, container: &str, key: &str) -> Result<ObjectMetadata, StorageError>;

    fn get(&self, container: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Writes `content` at `key`, replacing any existing object.
    fn put(&self, container: &str, key: &str, content: &[u8]) -> Result<(), StorageError>;

    /// Keys in `container` starting with `prefix`, sorted.
    fn list(&self, container: &str, prefix: Option<&str>) -> Result<Vec<String>, StorageError>;
}

/// Lowercase hex SHA-256 of `content`.
pub fn sha256_hex(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}
