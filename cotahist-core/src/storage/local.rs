//! Directory-backed store.
//!
//! Layout: `{root}/{name}`. The root is created lazily on the first listing
//! or write. Writes go to `{name}.tmp` and are renamed into place.

use super::{validate_name, BlobStore, StorageError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const TMP_SUFFIX: &str = ".tmp";

pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> Result<PathBuf, StorageError> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    fn ensure_root(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)
            .map_err(|e| StorageError::io("create dir", &self.root.display().to_string(), e))
    }
}

impl BlobStore for LocalStore {
    fn list(&self) -> Result<Vec<String>, StorageError> {
        self.ensure_root()?;
        let entries = fs::read_dir(&self.root)
            .map_err(|e| StorageError::io("list", &self.root.display().to_string(), e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| StorageError::io("list", &self.root.display().to_string(), e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!(name = ?raw, "skipping file with a non UTF-8 name");
                    continue;
                }
            };
            if name.ends_with(TMP_SUFFIX) {
                continue;
            }
            if validate_name(&name).is_err() {
                warn!(name, "skipping file with an unusable name");
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        fs::read(self.path(name)?).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(name.to_string()),
            _ => StorageError::io("read", name, e),
        })
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path(name)?;
        self.ensure_root()?;

        let tmp_path = self.root.join(format!("{name}{TMP_SUFFIX}"));
        fs::write(&tmp_path, bytes).map_err(|e| StorageError::io("write", name, e))?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StorageError::io("rename", name, e)
        })?;

        debug!(name, bytes = bytes.len(), "stored artifact");
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        fs::remove_file(self.path(name)?).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(name.to_string()),
            _ => StorageError::io("delete", name, e),
        })
    }

    fn location(&self, name: &str) -> String {
        self.root.join(name).display().to_string()
    }
}
