//! Checksum computation and verification for backup payloads.

pub mod checksum;
pub mod verify;

pub use checksum::{cert_checksums, compute, compute_bytes, compute_file, digest_directory};
pub use verify::{
    verify, verify_descriptor, Component, FreshChecksums, IntegrityReport, Mismatch, Verification,
};
