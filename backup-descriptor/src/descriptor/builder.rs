//! Fresh descriptors from installed-package facts.

use super::{BackupFlags, Descriptor, TarType, METADATA_VERSION};
use crate::integrity::cert_checksums;
use crate::package::{file_name, PackageFacts};
use crate::rules::{self, RuleStore};
use crate::utils::errors::{DescriptorError, Result};

/// Assembles the descriptor a backup starts from.
///
/// Certificate checksums are filled in immediately. Payload checksums are
/// empty placeholders and `backup_time` is 0 until
/// [`Descriptor::finalize`] runs.
pub struct DescriptorBuilder<'a> {
    facts: &'a PackageFacts,
    flags: Option<BackupFlags>,
    tar_type: Option<TarType>,
    user_handle: i32,
    mode: i32,
    rule_store: Option<&'a dyn RuleStore>,
}

impl<'a> DescriptorBuilder<'a> {
    pub fn new(facts: &'a PackageFacts) -> Self {
        Self {
            facts,
            flags: None,
            tar_type: None,
            user_handle: 0,
            mode: 0,
            rule_store: None,
        }
    }

    /// Requested capabilities. Required.
    pub fn flags(mut self, flags: BackupFlags) -> Self {
        self.flags = Some(flags);
        self
    }

    /// Payload archive type. Required.
    pub fn tar_type(mut self, tar_type: TarType) -> Self {
        self.tar_type = Some(tar_type);
        self
    }

    pub fn user_handle(mut self, user_handle: i32) -> Self {
        self.user_handle = user_handle;
        self
    }

    pub fn mode(mut self, mode: i32) -> Self {
        self.mode = mode;
        self
    }

    /// Rule collaborator, consulted when [`BackupFlags::RULES`] is requested.
    pub fn rule_store(mut self, store: &'a dyn RuleStore) -> Self {
        self.rule_store = Some(store);
        self
    }

    pub fn build(self) -> Result<Descriptor> {
        let facts = self.facts;

        if facts.package_name.trim().is_empty() {
            return Err(DescriptorError::Validation("package name is missing".into()));
        }
        let flags = self
            .flags
            .ok_or_else(|| DescriptorError::Validation("backup flags are not set".into()))?;
        let tar_type = self
            .tar_type
            .ok_or_else(|| DescriptorError::Validation("archive type is not set".into()))?;
        let apk_name = facts.apk_name().ok_or_else(|| {
            DescriptorError::Validation(format!(
                "primary APK path {} has no file name",
                facts.source_dir.display()
            ))
        })?;

        let label = if facts.label.trim().is_empty() {
            facts.package_name.clone()
        } else {
            facts.label.clone()
        };

        let data_dirs = select_data_dirs(facts, flags);
        let (split_configs, split_names) = split_layout(facts)?;

        let has_rules = if flags.backup_rules() {
            let store = self.rule_store.ok_or_else(|| {
                DescriptorError::Validation("rules requested without a rule store".into())
            })?;
            rules::has_rules(store, &facts.package_name)?
        } else {
            false
        };

        let data_sha256_checksum = vec![String::new(); data_dirs.len()];

        let descriptor = Descriptor {
            label,
            package_name: facts.package_name.clone(),
            version_name: facts.version_name.clone(),
            version_code: facts.version_code,
            data_dirs,
            is_system: facts.is_system(),
            is_split_apk: !split_configs.is_empty(),
            split_configs,
            split_names,
            has_rules,
            backup_time: 0,
            cert_sha256_checksum: cert_checksums(&facts.signing_certificates),
            source_sha256_checksum: String::new(),
            data_sha256_checksum,
            mode: self.mode,
            version: METADATA_VERSION,
            apk_name,
            instruction_set: facts.instruction_set.clone(),
            flags,
            user_handle: self.user_handle,
            tar_type,
            key_store: flags.backup_key_store() && facts.has_key_store,
        };

        tracing::debug!(
            "Built descriptor for {} (user {}, flags {:#x}, {} data dirs, {} splits)",
            descriptor.package_name,
            descriptor.user_handle,
            flags.raw(),
            descriptor.data_dirs.len(),
            descriptor.split_configs.len()
        );

        Ok(descriptor)
    }
}

fn select_data_dirs(facts: &PackageFacts, flags: BackupFlags) -> Vec<String> {
    if !flags.backup_data() {
        return Vec::new();
    }

    let dirs = &facts.data_dirs;
    let mut selected = dirs.internal.clone();
    if flags.backup_ext_data() {
        selected.extend(dirs.external.iter().cloned());
    }
    if flags.backup_media_obb() {
        selected.extend(dirs.media_obb.iter().cloned());
    }
    selected
}

fn split_layout(facts: &PackageFacts) -> Result<(Vec<String>, Vec<String>)> {
    let configs = match &facts.split_configs {
        Some(configs) if !configs.is_empty() => configs,
        _ => return Ok((Vec::new(), Vec::new())),
    };

    if configs.len() != facts.split_source_dirs.len() {
        return Err(DescriptorError::InvariantViolation(format!(
            "{} split configs but {} split source paths",
            configs.len(),
            facts.split_source_dirs.len()
        )));
    }

    let names = facts
        .split_source_dirs
        .iter()
        .map(|path| {
            file_name(path).ok_or_else(|| {
                DescriptorError::Validation(format!(
                    "split APK path {} has no file name",
                    path.display()
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((configs.clone(), names))
}
