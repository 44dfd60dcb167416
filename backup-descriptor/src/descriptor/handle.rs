//! Per-package descriptor handles and the keyed handle cache.

use super::{codec, Descriptor, DescriptorBuilder};
use crate::fs::storage::BackupStorage;
use crate::utils::errors::{DescriptorError, Result};
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Whether a descriptor exists for `package_name` under `user_handle`.
pub fn has_descriptor(storage: &dyn BackupStorage, package_name: &str, user_handle: i32) -> bool {
    storage.exists(&storage.descriptor_path(package_name, user_handle))
}

/// Owns the in-flight descriptor of one package.
///
/// Each handle carries a process-unique generation number, so callers can
/// tell a reused handle from a freshly created one.
#[derive(Debug)]
pub struct DescriptorHandle {
    package_name: String,
    generation: u64,
    descriptor: Option<Descriptor>,
}

impl DescriptorHandle {
    pub fn new(package_name: &str) -> Self {
        Self {
            package_name: package_name.to_string(),
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            descriptor: None,
        }
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn descriptor(&self) -> Option<&Descriptor> {
        self.descriptor.as_ref()
    }

    pub fn descriptor_mut(&mut self) -> Option<&mut Descriptor> {
        self.descriptor.as_mut()
    }

    pub fn set_descriptor(&mut self, descriptor: Descriptor) -> Result<()> {
        if descriptor.package_name != self.package_name {
            return Err(DescriptorError::Validation(format!(
                "descriptor for {} cannot be held by the handle for {}",
                descriptor.package_name, self.package_name
            )));
        }
        self.descriptor = Some(descriptor);
        Ok(())
    }

    /// Build a fresh descriptor and hold it.
    pub fn setup(&mut self, builder: DescriptorBuilder<'_>) -> Result<&Descriptor> {
        let descriptor = builder.build()?;
        self.set_descriptor(descriptor)?;
        self.descriptor().ok_or(DescriptorError::NotSet)
    }

    /// Load the stored descriptor for `user_handle`.
    ///
    /// On any failure the previously held descriptor is left untouched.
    pub fn read(&mut self, storage: &dyn BackupStorage, user_handle: i32) -> Result<&Descriptor> {
        let path = storage.descriptor_path(&self.package_name, user_handle);
        let bytes = storage.read(&path)?;
        let descriptor = codec::from_bytes(&bytes)?;

        if descriptor.package_name != self.package_name || descriptor.user_handle != user_handle {
            return Err(DescriptorError::Inconsistent(format!(
                "{} describes {} (user {})",
                path.display(),
                descriptor.package_name,
                descriptor.user_handle
            )));
        }

        debug!("Read descriptor {}", path.display());
        self.descriptor = Some(descriptor);
        self.descriptor().ok_or(DescriptorError::NotSet)
    }

    /// Persist the held descriptor, returning where it was written.
    pub fn write(&self, storage: &dyn BackupStorage) -> Result<PathBuf> {
        let descriptor = self.descriptor.as_ref().ok_or(DescriptorError::NotSet)?;
        let bytes = codec::to_bytes(descriptor)?;
        let path = storage.descriptor_path(&descriptor.package_name, descriptor.user_handle);
        storage.write_atomic(&path, &bytes)?;

        debug!("Wrote descriptor {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

/// Cache of the descriptor handle in use, keyed by package name.
///
/// Acquiring a handle for one package evicts the handles of every other
/// package first. Do not hold a returned handle across another call to
/// [`HandleStore::acquire`]; the map shard stays locked while it is alive.
#[derive(Debug, Default)]
pub struct HandleStore {
    handles: DashMap<String, DescriptorHandle>,
}

impl HandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, package_name: &str) -> RefMut<'_, String, DescriptorHandle> {
        self.handles.retain(|key, handle| {
            let keep = key == package_name;
            if !keep {
                debug!(
                    "Discarding descriptor handle for {} (generation {})",
                    key,
                    handle.generation()
                );
            }
            keep
        });

        self.handles
            .entry(package_name.to_string())
            .or_insert_with(|| {
                let handle = DescriptorHandle::new(package_name);
                debug!(
                    "Created descriptor handle for {} (generation {})",
                    package_name,
                    handle.generation()
                );
                handle
            })
    }

    /// Drop the handle for `package_name`, returning it if it was cached.
    pub fn release(&self, package_name: &str) -> Option<DescriptorHandle> {
        self.handles.remove(package_name).map(|(_, handle)| handle)
    }

    /// Package whose handle is currently cached.
    pub fn current(&self) -> Option<String> {
        self.handles.iter().next().map(|entry| entry.key().clone())
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::tests::sample_descriptor;
    use crate::descriptor::{BackupFlags, TarType};
    use crate::fs::storage::LocalStorage;
    use crate::package::PackageFacts;
    use tempfile::TempDir;

    #[test]
    fn test_switching_packages_discards_previous_handle() {
        let store = HandleStore::new();

        let first_a = store.acquire("com.example.a").generation();
        assert_eq!(store.acquire("com.example.a").generation(), first_a);

        let b = store.acquire("com.example.b").generation();
        assert_ne!(b, first_a);
        assert_eq!(store.len(), 1);
        assert_eq!(store.current().as_deref(), Some("com.example.b"));

        let second_a = store.acquire("com.example.a").generation();
        assert_ne!(second_a, first_a);
        assert_ne!(second_a, b);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_handle_state_survives_reacquire_of_same_package() {
        let store = HandleStore::new();
        store
            .acquire("com.example.app")
            .set_descriptor(sample_descriptor())
            .unwrap();

        assert!(store.acquire("com.example.app").descriptor().is_some());
        assert!(store.acquire("com.example.other").descriptor().is_none());
        assert!(store.acquire("com.example.app").descriptor().is_none());
    }

    #[test]
    fn test_release() {
        let store = HandleStore::new();
        let generation = store.acquire("com.example.app").generation();
        let released = store.release("com.example.app").unwrap();
        assert_eq!(released.generation(), generation);
        assert!(store.is_empty());
        assert!(store.release("com.example.app").is_none());
    }

    #[test]
    fn test_set_descriptor_rejects_other_package() {
        let mut handle = DescriptorHandle::new("com.example.other");
        assert!(matches!(
            handle.set_descriptor(sample_descriptor()),
            Err(DescriptorError::Validation(_))
        ));
        assert!(handle.descriptor().is_none());
    }

    #[test]
    fn test_write_without_descriptor() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        let handle = DescriptorHandle::new("com.example.app");

        assert!(matches!(handle.write(&storage), Err(DescriptorError::NotSet)));
        assert!(!has_descriptor(&storage, "com.example.app", 0));
    }

    #[test]
    fn test_setup_write_read() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let storage = LocalStorage::new(temp_dir.path());
        let facts = PackageFacts {
            label: "App".to_string(),
            package_name: "com.example.app".to_string(),
            source_dir: PathBuf::from("/data/app/com.example.app/base.apk"),
            instruction_set: "x86_64".to_string(),
            ..Default::default()
        };

        let mut handle = DescriptorHandle::new("com.example.app");
        handle.setup(
            DescriptorBuilder::new(&facts)
                .flags(BackupFlags::SOURCE)
                .tar_type(TarType::Gzip)
                .user_handle(10),
        )?;
        let path = handle.write(&storage)?;
        assert_eq!(path, storage.descriptor_path("com.example.app", 10));
        assert!(has_descriptor(&storage, "com.example.app", 10));
        assert!(!has_descriptor(&storage, "com.example.app", 0));

        let mut reader = DescriptorHandle::new("com.example.app");
        let read = reader.read(&storage, 10)?.clone();
        assert_eq!(Some(&read), handle.descriptor());
        Ok(())
    }

    #[test]
    fn test_failed_read_keeps_previous_descriptor() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let storage = LocalStorage::new(temp_dir.path());
        storage.write_atomic(&storage.descriptor_path("com.example.app", 0), b"   ")?;

        let mut handle = DescriptorHandle::new("com.example.app");
        handle.set_descriptor(sample_descriptor())?;

        assert!(matches!(handle.read(&storage, 0), Err(DescriptorError::EmptyInput)));
        assert!(matches!(handle.read(&storage, 5), Err(DescriptorError::Io(_))));
        assert_eq!(handle.descriptor(), Some(&sample_descriptor()));
        Ok(())
    }

    #[test]
    fn test_read_rejects_descriptor_of_other_user() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let storage = LocalStorage::new(temp_dir.path());
        let bytes = codec::to_bytes(&sample_descriptor())?;
        storage.write_atomic(&storage.descriptor_path("com.example.app", 11), &bytes)?;

        let mut handle = DescriptorHandle::new("com.example.app");
        assert!(matches!(
            handle.read(&storage, 11),
            Err(DescriptorError::Inconsistent(_))
        ));
        Ok(())
    }
}
