//! # Local Filesystem Blob Store

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::PathBuf;

use super::backend::BlobStore;
use super::path::{ensure_plain_component, StoragePath};
use crate::document::Visibility;
use crate::errors::{DocumentError, DocumentResult};

/// Blob store backed by two local directories
#[derive(Debug)]
pub struct LocalBlobStore {
    public_root: PathBuf,
    private_root: PathBuf,
}

fn io_err(context: &str, path: &StoragePath, e: io::Error) -> DocumentError {
    DocumentError::TransientIo(format!("{} {}: {}", context, path, e))
}

impl LocalBlobStore {
    pub fn new(public_root: PathBuf, private_root: PathBuf) -> Self {
        Self {
            public_root,
            private_root,
        }
    }

    /// Absolute location of `path`; folder and filename must be plain segments
    fn full_path(&self, path: &StoragePath) -> DocumentResult<PathBuf> {
        let root = match path.visibility {
            Visibility::Public => &self.public_root,
            Visibility::Private => &self.private_root,
        };
        ensure_plain_component(&path.folder)?;
        let mut full = root.join(&path.folder);
        if let Some(name) = &path.filename {
            ensure_plain_component(name)?;
            full.push(name);
        }
        Ok(full)
    }

    fn ensure_parent(&self, path: &StoragePath) -> DocumentResult<()> {
        let full = self.full_path(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err("create parent of", path, e))?;
        }
        Ok(())
    }

    fn check_transfer(&self, from: &StoragePath, to: &StoragePath) -> DocumentResult<()> {
        if !self.is_file(from)? {
            return Err(DocumentError::StorageConflict(format!(
                "Source {} does not exist",
                from
            )));
        }
        if self.exists(to)? {
            return Err(DocumentError::StorageConflict(format!(
                "Destination {} already exists",
                to
            )));
        }
        Ok(())
    }
}

impl BlobStore for LocalBlobStore {
    fn exists(&self, path: &StoragePath) -> DocumentResult<bool> {
        Ok(self.full_path(path)?.exists())
    }

    fn is_file(&self, path: &StoragePath) -> DocumentResult<bool> {
        Ok(self.full_path(path)?.is_file())
    }

    fn read(&self, path: &StoragePath) -> DocumentResult<Vec<u8>> {
        fs::read(self.full_path(path)?).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                DocumentError::StorageConflict(format!("File {} does not exist", path))
            } else {
                io_err("read", path, e)
            }
        })
    }

    fn write_stream(&self, path: &StoragePath, reader: &mut dyn Read) -> DocumentResult<u64> {
        self.ensure_parent(path)?;
        let mut file = File::create(self.full_path(path)?).map_err(|e| io_err("create", path, e))?;
        io::copy(reader, &mut file).map_err(|e| io_err("write", path, e))
    }

    fn delete(&self, path: &StoragePath) -> DocumentResult<()> {
        fs::remove_file(self.full_path(path)?).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                DocumentError::StorageConflict(format!("File {} does not exist", path))
            } else {
                io_err("delete", path, e)
            }
        })
    }

    fn rename(&self, from: &StoragePath, to: &StoragePath) -> DocumentResult<()> {
        self.check_transfer(from, to)?;
        self.ensure_parent(to)?;

        let source = self.full_path(from)?;
        let target = self.full_path(to)?;
        if let Err(rename_err) = fs::rename(&source, &target) {
            // Roots on different devices: fall back to copy + unlink
            fs::copy(&source, &target).map_err(|_| io_err("move", from, rename_err))?;
            if let Err(e) = fs::remove_file(&source) {
                let _ = fs::remove_file(&target);
                return Err(io_err("unlink moved", from, e));
            }
        }
        Ok(())
    }

    fn copy(&self, from: &StoragePath, to: &StoragePath) -> DocumentResult<()> {
        self.check_transfer(from, to)?;
        self.ensure_parent(to)?;
        fs::copy(self.full_path(from)?, self.full_path(to)?)
            .map(|_| ())
            .map_err(|e| io_err("copy", from, e))
    }

    fn list_contents(&self, folder: &StoragePath) -> DocumentResult<Vec<String>> {
        let full = self.full_path(folder)?;
        let mut names = Vec::new();
        if full.is_dir() {
            for entry in fs::read_dir(&full).map_err(|e| io_err("list", folder, e))? {
                let entry = entry.map_err(|e| io_err("list", folder, e))?;
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn directory_exists(&self, folder: &StoragePath) -> DocumentResult<bool> {
        Ok(self.full_path(folder)?.is_dir())
    }

    fn delete_directory(&self, folder: &StoragePath) -> DocumentResult<()> {
        // remove_dir refuses non-empty folders
        fs::remove_dir(self.full_path(folder)?).map_err(|e| io_err("delete folder", folder, e))
    }
}
