//! Backup descriptor: the metadata record stored next to every app backup.
//!
//! A descriptor is built when a backup starts, finalized once the payload has
//! been captured, persisted through [`codec`], and read back for listing and
//! restore.

pub mod builder;
pub mod codec;
pub mod flags;
pub mod handle;

pub use builder::DescriptorBuilder;
pub use flags::BackupFlags;
pub use handle::{has_descriptor, DescriptorHandle, HandleStore};

use crate::utils::errors::{DescriptorError, Result};
use serde::{Deserialize, Serialize};

/// Well-known descriptor file name inside a package/user backup directory.
pub const META_FILE: &str = "meta.am.v1";

/// Wire schema version written by this crate.
pub const METADATA_VERSION: i32 = 1;

/// Archive compression used for the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TarType {
    #[serde(rename = "t", alias = "plain")]
    Plain,
    #[serde(rename = "z", alias = "gzip")]
    Gzip,
}

impl TarType {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TarType::Plain => "t",
            TarType::Gzip => "z",
        }
    }

    /// Accepts the wire value as well as the long name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "t" | "plain" => Some(TarType::Plain),
            "z" | "gzip" => Some(TarType::Gzip),
            _ => None,
        }
    }

    /// File extension for payload archives of this type.
    pub fn extension(&self) -> &'static str {
        match self {
            TarType::Plain => "tar",
            TarType::Gzip => "tar.gz",
        }
    }
}

/// Metadata of one backup of one installed application.
///
/// Field names are the wire keys. Every list is always present; an empty list
/// stands for "nothing captured".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub label: String,
    pub package_name: String,
    pub version_name: String,
    pub version_code: i64,
    pub data_dirs: Vec<String>,
    pub is_system: bool,
    pub is_split_apk: bool,
    pub split_configs: Vec<String>,
    pub split_names: Vec<String>,
    pub has_rules: bool,
    /// Epoch seconds; 0 until the backup is committed
    pub backup_time: i64,
    /// One digest per signer, in signer order
    pub cert_sha256_checksum: Vec<String>,
    /// Empty until the archive is finalized
    pub source_sha256_checksum: String,
    /// Parallel to `data_dirs`
    pub data_sha256_checksum: Vec<String>,
    pub mode: i32,
    pub version: i32,
    pub apk_name: String,
    pub instruction_set: String,
    pub flags: BackupFlags,
    pub user_handle: i32,
    pub tar_type: TarType,
    pub key_store: bool,
}

impl Descriptor {
    /// Check the parallel-list and split-layout invariants.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        if self.is_split_apk == self.split_configs.is_empty() {
            return Err(format!(
                "is_split_apk is {} but split_configs has {} entries",
                self.is_split_apk,
                self.split_configs.len()
            ));
        }
        if self.data_sha256_checksum.len() != self.data_dirs.len() {
            return Err(format!(
                "data_sha256_checksum has {} entries but data_dirs has {}",
                self.data_sha256_checksum.len(),
                self.data_dirs.len()
            ));
        }
        if self.split_configs.len() != self.split_names.len() {
            return Err(format!(
                "split_configs has {} entries but split_names has {}",
                self.split_configs.len(),
                self.split_names.len()
            ));
        }
        Ok(())
    }

    /// True once checksums and backup time have been committed.
    pub fn is_finalized(&self) -> bool {
        self.backup_time != 0
    }

    /// Commit the payload checksums and the backup time in one step.
    ///
    /// Nothing is modified when `data_checksums` does not line up with
    /// `data_dirs`.
    pub fn finalize(
        &mut self,
        source_checksum: String,
        data_checksums: Vec<String>,
        backup_time: i64,
    ) -> Result<()> {
        if data_checksums.len() != self.data_dirs.len() {
            return Err(DescriptorError::InvariantViolation(format!(
                "{} data checksums supplied for {} data directories",
                data_checksums.len(),
                self.data_dirs.len()
            )));
        }
        if backup_time <= 0 {
            return Err(DescriptorError::InvariantViolation(format!(
                "backup time must be positive, got {}",
                backup_time
            )));
        }

        self.source_sha256_checksum = source_checksum;
        self.data_sha256_checksum = data_checksums;
        self.backup_time = backup_time;

        tracing::info!(
            "Finalized descriptor for {} (user {}) at {}",
            self.package_name,
            self.user_handle,
            self.backup_time
        );
        Ok(())
    }

    /// [`finalize`](Self::finalize) stamped with the current time.
    pub fn finalize_now(&mut self, source_checksum: String, data_checksums: Vec<String>) -> Result<()> {
        self.finalize(source_checksum, data_checksums, chrono::Utc::now().timestamp())
    }

    /// Backup time as a UTC timestamp, if committed.
    pub fn backup_datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        if self.backup_time == 0 {
            return None;
        }
        chrono::DateTime::from_timestamp(self.backup_time, 0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_descriptor() -> Descriptor {
        Descriptor {
            label: "Example".to_string(),
            package_name: "com.example.app".to_string(),
            version_name: "2.4.1".to_string(),
            version_code: 241,
            data_dirs: vec![
                "/data/user/0/com.example.app".to_string(),
                "/storage/emulated/0/Android/data/com.example.app".to_string(),
            ],
            is_system: false,
            is_split_apk: true,
            split_configs: vec!["config.en".to_string(), "config.hi".to_string()],
            split_names: vec!["split_config.en.apk".to_string(), "split_config.hi.apk".to_string()],
            has_rules: true,
            backup_time: 0,
            cert_sha256_checksum: vec!["ab".repeat(32)],
            source_sha256_checksum: String::new(),
            data_sha256_checksum: vec![String::new(), String::new()],
            mode: 0,
            version: METADATA_VERSION,
            apk_name: "base.apk".to_string(),
            instruction_set: "arm64".to_string(),
            flags: BackupFlags::SOURCE | BackupFlags::DATA | BackupFlags::EXT_DATA,
            user_handle: 0,
            tar_type: TarType::Gzip,
            key_store: false,
        }
    }

    #[test]
    fn test_invariants_hold_for_sample() {
        assert!(sample_descriptor().check_invariants().is_ok());
    }

    #[test]
    fn test_invariants_detect_length_mismatch() {
        let mut descriptor = sample_descriptor();
        descriptor.data_sha256_checksum.pop();
        assert!(descriptor.check_invariants().is_err());

        let mut descriptor = sample_descriptor();
        descriptor.split_names.push("extra.apk".to_string());
        assert!(descriptor.check_invariants().is_err());
    }

    #[test]
    fn test_invariants_tie_split_flag_to_configs() {
        let mut descriptor = sample_descriptor();
        descriptor.is_split_apk = false;
        assert!(descriptor.check_invariants().is_err());

        descriptor.split_configs.clear();
        descriptor.split_names.clear();
        assert!(descriptor.check_invariants().is_ok());

        descriptor.is_split_apk = true;
        assert!(descriptor.check_invariants().is_err());
    }

    #[test]
    fn test_finalize_sets_checksums_and_time_together() {
        let mut descriptor = sample_descriptor();
        assert!(!descriptor.is_finalized());
        assert_eq!(descriptor.backup_datetime(), None);

        descriptor
            .finalize("cd".repeat(32), vec!["01".repeat(32), "02".repeat(32)], 1_700_000_000)
            .unwrap();

        assert!(descriptor.is_finalized());
        assert_eq!(descriptor.source_sha256_checksum, "cd".repeat(32));
        assert_eq!(descriptor.data_sha256_checksum[1], "02".repeat(32));
        assert_eq!(descriptor.backup_time, 1_700_000_000);
        assert_eq!(descriptor.backup_datetime().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_finalize_rejects_wrong_checksum_count_without_mutation() {
        let mut descriptor = sample_descriptor();
        let before = descriptor.clone();

        let err = descriptor
            .finalize("cd".repeat(32), vec!["01".repeat(32)], 1_700_000_000)
            .unwrap_err();

        assert!(matches!(err, DescriptorError::InvariantViolation(_)));
        assert_eq!(descriptor, before);
    }

    #[test]
    fn test_finalize_now_uses_current_time() {
        let mut descriptor = sample_descriptor();
        let start = chrono::Utc::now().timestamp();
        descriptor
            .finalize_now(String::new(), vec![String::new(), String::new()])
            .unwrap();
        assert!(descriptor.backup_time >= start);
    }

    #[test]
    fn test_tar_type_names() {
        assert_eq!(TarType::parse("z"), Some(TarType::Gzip));
        assert_eq!(TarType::parse("gzip"), Some(TarType::Gzip));
        assert_eq!(TarType::parse("plain"), Some(TarType::Plain));
        assert_eq!(TarType::parse("bz2"), None);
        assert_eq!(TarType::Gzip.as_str(), "z");
        assert_eq!(TarType::Plain.extension(), "tar");
        assert_eq!(serde_json::to_string(&TarType::Gzip).unwrap(), "\"z\"");
    }
}
