//! Filesystem access: descriptor storage and data-directory traversal.

pub mod storage;
pub mod walker;

pub use storage::{BackupStorage, LocalStorage};
