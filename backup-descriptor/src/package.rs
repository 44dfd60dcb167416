//! Installed-package facts supplied by the platform package manager.
//!
//! These are plain values; querying the platform for them happens outside
//! this crate.

use std::path::{Path, PathBuf};

/// `ApplicationInfo.FLAG_SYSTEM`
pub const FLAG_SYSTEM: u32 = 1;

/// Data directories of an installed package, grouped by the capability that
/// selects them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataDirs {
    /// Credential- and device-protected internal storage
    pub internal: Vec<String>,
    /// `Android/data/<package>` on shared storage
    pub external: Vec<String>,
    /// `Android/media/<package>` and `Android/obb/<package>`
    pub media_obb: Vec<String>,
}

/// Everything the builder needs to know about one installed package.
#[derive(Debug, Clone, Default)]
pub struct PackageFacts {
    /// Display label; may be blank when the package declares none
    pub label: String,
    pub package_name: String,
    pub version_name: String,
    pub version_code: i64,
    /// Platform application flags
    pub app_flags: u32,
    /// Path of the primary (base) APK
    pub source_dir: PathBuf,
    /// Per-split configuration identifiers, `None` for a monolithic APK
    pub split_configs: Option<Vec<String>>,
    /// Source paths of the split APKs, parallel to `split_configs`
    pub split_source_dirs: Vec<PathBuf>,
    pub data_dirs: DataDirs,
    /// DER-encoded signing certificates, in signer order
    pub signing_certificates: Vec<Vec<u8>>,
    /// CPU ABI the package was installed for
    pub instruction_set: String,
    /// Whether the platform keystore holds entries for the package's uid
    pub has_key_store: bool,
}

impl PackageFacts {
    pub fn is_system(&self) -> bool {
        self.app_flags & FLAG_SYSTEM != 0
    }

    /// Base file name of the primary APK.
    pub fn apk_name(&self) -> Option<String> {
        file_name(&self.source_dir)
    }
}

/// Last path component as a string.
pub(crate) fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}
