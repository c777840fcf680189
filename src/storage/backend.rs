//! # Blob Store Trait

use std::io::Read;

use super::path::StoragePath;
use crate::errors::DocumentResult;

/// Storage capability over the public and private roots
pub trait BlobStore: Send + Sync + std::fmt::Debug {
    /// Check if a file or folder exists
    fn exists(&self, path: &StoragePath) -> DocumentResult<bool>;

    /// Check if a regular file exists
    fn is_file(&self, path: &StoragePath) -> DocumentResult<bool>;

    /// Read a whole file
    fn read(&self, path: &StoragePath) -> DocumentResult<Vec<u8>>;

    /// Stream data into a file, creating parent folders. Returns bytes written.
    fn write_stream(&self, path: &StoragePath, reader: &mut dyn Read) -> DocumentResult<u64>;

    /// Write data to a file, creating parent folders
    fn write(&self, path: &StoragePath, data: &[u8]) -> DocumentResult<u64> {
        let mut reader = data;
        self.write_stream(path, &mut reader)
    }

    /// Delete a file. Missing files are an error; callers check `exists` first.
    fn delete(&self, path: &StoragePath) -> DocumentResult<()>;

    /// Move a file. Fails with StorageConflict if the source is missing or
    /// the destination is occupied; never overwrites.
    fn rename(&self, from: &StoragePath, to: &StoragePath) -> DocumentResult<()>;

    /// Copy a file with the same conflict rules as `rename`
    fn copy(&self, from: &StoragePath, to: &StoragePath) -> DocumentResult<()>;

    /// Entry names directly inside a folder
    fn list_contents(&self, folder: &StoragePath) -> DocumentResult<Vec<String>>;

    fn directory_exists(&self, folder: &StoragePath) -> DocumentResult<bool>;

    /// Delete an empty folder
    fn delete_directory(&self, folder: &StoragePath) -> DocumentResult<()>;
}
