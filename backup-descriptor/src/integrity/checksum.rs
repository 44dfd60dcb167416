//! SHA-256 content checksums, hex-encoded.
//!
//! Descriptor version 1 uses SHA-256 for every checksum field.

use crate::fs::walker::{walk_directory, WalkOptions};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Digest a byte stream.
pub fn compute<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Digest an in-memory buffer.
pub fn compute_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Digest a file, e.g. an APK or a packed data archive.
pub fn compute_file(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    compute(file)
}

/// One digest per signing certificate, in signer order.
pub fn cert_checksums<C: AsRef<[u8]>>(certificates: &[C]) -> Vec<String> {
    certificates.iter().map(|cert| compute_bytes(cert.as_ref())).collect()
}

/// Digest the files under `root`.
///
/// Files are visited in path order. Each contributes its relative path, a NUL
/// byte, its length as little-endian u64 and its contents, so renames and
/// moves change the digest as well as content edits.
pub fn digest_directory(root: &Path, options: WalkOptions) -> io::Result<String> {
    let mut files = walk_directory(root, options)?;
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    let mut hasher = Sha256::new();
    for file in &files {
        let relative = file.relative_path.to_string_lossy();
        hasher.update(relative.as_bytes());
        hasher.update([0u8]);
        hasher.update(file.size.to_le_bytes());

        let mut reader = File::open(&file.path)?.take(file.size);
        let copied = io::copy(&mut reader, &mut hasher)?;
        if copied != file.size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{} shrank while being hashed", file.path.display()),
            ));
        }
    }

    tracing::debug!("Digested {} files under {}", files.len(), root.display());
    Ok(hex::encode(hasher.finalize()))
}
