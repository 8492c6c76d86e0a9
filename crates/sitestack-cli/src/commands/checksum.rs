//! Generator archive digests, in the form the build's `sha256sum -c` expects.

use anyhow::{Context, Result, bail};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const BUFFER_SIZE: usize = 64 * 1024;

/// Hex-encoded SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

pub fn run(path: &Path, expect: Option<&str>) -> Result<()> {
    let digest =
        sha256_file(path).with_context(|| format!("Failed to read {}", path.display()))?;

    if let Some(expected) = expect {
        if !digest.eq_ignore_ascii_case(expected.trim()) {
            bail!(
                "checksum mismatch for {}: expected {}, got {}",
                path.display(),
                expected.trim(),
                digest
            );
        }
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    println!("{}  {}", digest, name);
    Ok(())
}
