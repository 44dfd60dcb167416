//! Listing of restorable backups.
//!
//! A backup is listed only when its descriptor reads back cleanly and has
//! been committed (non-zero backup time). Anything else is skipped with a
//! warning.

use crate::descriptor::handle::DescriptorHandle;
use crate::descriptor::Descriptor;
use crate::fs::storage::BackupStorage;
use std::io;
use tracing::warn;

/// All restorable backups under the storage root, ordered by package name
/// then user handle.
pub fn list_restorable(storage: &dyn BackupStorage) -> io::Result<Vec<Descriptor>> {
    let mut restorable = Vec::new();
    for package_name in storage.list(storage.root())? {
        match list_package(storage, &package_name) {
            Ok(descriptors) => restorable.extend(descriptors),
            Err(e) => warn!("Skipping unreadable package entry {}: {}", package_name, e),
        }
    }
    Ok(restorable)
}

/// Restorable backups of one package, one per user handle.
pub fn list_package(storage: &dyn BackupStorage, package_name: &str) -> io::Result<Vec<Descriptor>> {
    let mut users: Vec<i32> = storage
        .list(&storage.package_dir(package_name))?
        .iter()
        .filter_map(|name| name.parse().ok())
        .collect();
    users.sort_unstable();

    let mut restorable = Vec::new();
    for user_handle in users {
        if !storage.exists(&storage.descriptor_path(package_name, user_handle)) {
            continue;
        }

        let mut handle = DescriptorHandle::new(package_name);
        match handle.read(storage, user_handle) {
            Ok(descriptor) if descriptor.is_finalized() => restorable.push(descriptor.clone()),
            Ok(_) => warn!(
                "Skipping uncommitted backup of {} (user {})",
                package_name, user_handle
            ),
            Err(e) => warn!(
                "Skipping unreadable backup of {} (user {}): {}",
                package_name, user_handle, e
            ),
        }
    }
    Ok(restorable)
}
