//! Descriptor storage.
//!
//! Backups live under `<root>/<package_name>/<user_handle>/`, with the
//! descriptor at the well-known [`META_FILE`] name inside that directory.

use crate::config::StorageConfig;
use crate::descriptor::META_FILE;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Filesystem access used for descriptor files.
///
/// Implementations may route through a privileged helper; paths are always
/// absolute paths produced by [`BackupStorage::backup_dir`].
pub trait BackupStorage {
    /// Root directory holding every package's backups.
    fn root(&self) -> &Path;

    fn exists(&self, path: &Path) -> bool;

    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Replace `path` with `data` so readers see either the old or the new
    /// contents, never a partial write.
    fn write_atomic(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Names of the entries directly under `path`; empty when it does not exist.
    fn list(&self, path: &Path) -> io::Result<Vec<String>>;

    fn package_dir(&self, package_name: &str) -> PathBuf {
        self.root().join(package_name)
    }

    fn backup_dir(&self, package_name: &str, user_handle: i32) -> PathBuf {
        self.package_dir(package_name).join(user_handle.to_string())
    }

    fn descriptor_path(&self, package_name: &str, user_handle: i32) -> PathBuf {
        self.backup_dir(package_name, user_handle).join(META_FILE)
    }
}

/// Plain local filesystem storage.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.backups_dir.clone())
    }
}

impl BackupStorage for LocalStorage {
    fn root(&self) -> &Path {
        &self.root
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_atomic(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");
        let result = (|| {
            let mut file = File::create(&temp_path)?;
            file.write_all(data)?;
            file.sync_all()?;
            fs::rename(&temp_path, path)
        })();

        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }

    fn list(&self, path: &Path) -> io::Result<Vec<String>> {
        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut names = Vec::new();
        for entry in entries {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}
