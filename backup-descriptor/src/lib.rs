//! Backup Descriptor Library
//!
//! Metadata descriptors for application backups: construction from installed
//! package facts, a versioned wire format, atomic persistence, and checksum
//! verification at restore time.

pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod fs;
pub mod integrity;
pub mod package;
pub mod rules;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use descriptor::{
    BackupFlags, Descriptor, DescriptorBuilder, DescriptorHandle, HandleStore, TarType, META_FILE,
    METADATA_VERSION,
};
pub use package::{DataDirs, PackageFacts};
pub use utils::errors::{DescriptorError, Result};
