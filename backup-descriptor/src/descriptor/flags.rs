//! Capability bitset selecting what a backup captures.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Backup capabilities packed into a single integer.
    ///
    /// The integer is the only state. Bits outside the named set are kept
    /// as-is so descriptors written by newer releases survive a round trip.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BackupFlags: u32 {
        const SOURCE             = 1 << 0;
        const DATA               = 1 << 1;
        const EXT_DATA           = 1 << 2;
        const EXT_OBB_MEDIA      = 1 << 3;
        const RULES              = 1 << 4;
        const NO_SIGNATURE_CHECK = 1 << 5;
        const MULTIPLE           = 1 << 6;
        const CACHE              = 1 << 7;
        const KEY_STORE          = 1 << 8;
    }
}

impl BackupFlags {
    /// No capability selected.
    pub const fn none() -> Self {
        Self::empty()
    }

    /// Wrap a stored integer, unknown bits included.
    pub const fn from_raw(raw: u32) -> Self {
        Self::from_bits_retain(raw)
    }

    /// The integer written to the wire.
    pub const fn raw(&self) -> u32 {
        self.bits()
    }

    pub const fn with(self, other: Self) -> Self {
        self.union(other)
    }

    pub const fn without(self, other: Self) -> Self {
        self.difference(other)
    }

    pub const fn backup_source(&self) -> bool {
        self.contains(Self::SOURCE)
    }

    pub const fn backup_data(&self) -> bool {
        self.contains(Self::DATA)
    }

    pub const fn backup_ext_data(&self) -> bool {
        self.contains(Self::EXT_DATA)
    }

    pub const fn backup_media_obb(&self) -> bool {
        self.contains(Self::EXT_OBB_MEDIA)
    }

    pub const fn backup_rules(&self) -> bool {
        self.contains(Self::RULES)
    }

    pub const fn skip_signature_check(&self) -> bool {
        self.contains(Self::NO_SIGNATURE_CHECK)
    }

    pub const fn backup_multiple(&self) -> bool {
        self.contains(Self::MULTIPLE)
    }

    pub const fn backup_cache(&self) -> bool {
        self.contains(Self::CACHE)
    }

    pub const fn backup_key_store(&self) -> bool {
        self.contains(Self::KEY_STORE)
    }
}

impl Default for BackupFlags {
    fn default() -> Self {
        Self::none()
    }
}

impl Serialize for BackupFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.raw())
    }
}

impl<'de> Deserialize<'de> for BackupFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(Self::from_raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_five_sets_bits_zero_and_two() {
        let flags = BackupFlags::from_raw(5);

        assert!(flags.backup_source());
        assert!(flags.backup_ext_data());
        assert!(!flags.backup_data());
        assert!(!flags.backup_media_obb());
        assert!(!flags.backup_rules());
        assert!(!flags.skip_signature_check());
        assert!(!flags.backup_multiple());
        assert!(!flags.backup_cache());
        assert!(!flags.backup_key_store());
        assert_eq!(flags.raw(), 5);
    }

    #[test]
    fn test_default_selects_nothing() {
        assert_eq!(BackupFlags::default(), BackupFlags::none());
        assert_eq!(BackupFlags::none().raw(), 0);
    }

    #[test]
    fn test_unknown_bits_are_retained() {
        let raw = (1 << 31) | (1 << 20) | BackupFlags::DATA.bits();
        let flags = BackupFlags::from_raw(raw);

        assert!(flags.backup_data());
        assert!(!flags.backup_source());
        assert_eq!(flags.raw(), raw);

        let json = serde_json::to_string(&flags).unwrap();
        let back: BackupFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(back.raw(), raw);
    }

    #[test]
    fn test_build_from_selected_capabilities() {
        let flags: BackupFlags = [BackupFlags::DATA, BackupFlags::RULES].into_iter().collect();
        assert_eq!(flags, BackupFlags::none().with(BackupFlags::DATA).with(BackupFlags::RULES));
        assert_eq!(flags.raw(), 0b1_0010);

        let trimmed = flags.without(BackupFlags::RULES);
        assert!(trimmed.backup_data());
        assert!(!trimmed.backup_rules());
    }

    #[test]
    fn test_equality_is_by_value() {
        assert_eq!(BackupFlags::from_raw(18), BackupFlags::DATA | BackupFlags::RULES);
    }

    #[test]
    fn test_serializes_as_integer() {
        let flags = BackupFlags::SOURCE | BackupFlags::KEY_STORE;
        assert_eq!(serde_json::to_string(&flags).unwrap(), "257");
    }
}
