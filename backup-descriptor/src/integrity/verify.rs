//! Restore-time checksum comparison.
//!
//! A mismatch is a value, not an error: the restore orchestrator decides
//! whether to abort or to continue with a warning.

use crate::descriptor::Descriptor;
use std::fmt;

/// First position at which two digest lists disagree. `None` on one side
/// means that list ended before `index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub index: usize,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Match,
    Mismatch(Mismatch),
}

impl Verification {
    pub fn is_match(&self) -> bool {
        matches!(self, Verification::Match)
    }

    pub fn mismatch(&self) -> Option<&Mismatch> {
        match self {
            Verification::Match => None,
            Verification::Mismatch(m) => Some(m),
        }
    }
}

/// Compare digest lists position by position.
///
/// Lengths must agree and every entry must be byte-for-byte equal.
pub fn verify<E, A>(expected: &[E], actual: &[A]) -> Verification
where
    E: AsRef<str>,
    A: AsRef<str>,
{
    let longest = expected.len().max(actual.len());
    for index in 0..longest {
        let e: Option<&str> = expected.get(index).map(|s| s.as_ref());
        let a: Option<&str> = actual.get(index).map(|s| s.as_ref());
        let equal = match (e, a) {
            (Some(e), Some(a)) => e == a,
            _ => false,
        };
        if !equal {
            return Verification::Mismatch(Mismatch {
                index,
                expected: e.map(str::to_string),
                actual: a.map(str::to_string),
            });
        }
    }
    Verification::Match
}

/// Checksums recomputed from the stored payload at restore time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreshChecksums {
    pub source: String,
    pub data: Vec<String>,
    pub certificates: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Source,
    Data,
    Certificates,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Source => write!(f, "source"),
            Component::Data => write!(f, "data"),
            Component::Certificates => write!(f, "certificates"),
        }
    }
}

/// Per-component outcome of [`verify_descriptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityReport {
    pub source: Verification,
    pub data: Verification,
    pub certificates: Verification,
}

impl IntegrityReport {
    pub fn is_intact(&self) -> bool {
        self.source.is_match() && self.data.is_match() && self.certificates.is_match()
    }

    /// First failing component, checked in source, data, certificates order.
    pub fn first_mismatch(&self) -> Option<(Component, &Mismatch)> {
        [
            (Component::Source, &self.source),
            (Component::Data, &self.data),
            (Component::Certificates, &self.certificates),
        ]
        .into_iter()
        .find_map(|(component, result)| result.mismatch().map(|m| (component, m)))
    }
}

/// Compare a stored descriptor's checksums against freshly computed ones.
///
/// A descriptor that requested the source archive but recorded no source
/// digest never verifies: there is nothing to compare the fresh digest with.
pub fn verify_descriptor(stored: &Descriptor, fresh: &FreshChecksums) -> IntegrityReport {
    let source = if stored.flags.backup_source() && stored.source_sha256_checksum.is_empty() {
        Verification::Mismatch(Mismatch {
            index: 0,
            expected: None,
            actual: Some(fresh.source.clone()),
        })
    } else {
        verify(
            std::slice::from_ref(&stored.source_sha256_checksum),
            std::slice::from_ref(&fresh.source),
        )
    };

    let report = IntegrityReport {
        source,
        data: verify(&stored.data_sha256_checksum, &fresh.data),
        certificates: verify(&stored.cert_sha256_checksum, &fresh.certificates),
    };

    if let Some((component, mismatch)) = report.first_mismatch() {
        tracing::warn!(
            "Integrity mismatch for {} (user {}): {} entry {} expected {:?}, found {:?}",
            stored.package_name,
            stored.user_handle,
            component,
            mismatch.index,
            mismatch.expected,
            mismatch.actual
        );
    } else {
        tracing::debug!("Integrity verified for {}", stored.package_name);
    }

    report
}
