// Streamed SHA-256 digest gate for checkpoint files.
//
// Checkpoints are read in fixed 64 KiB chunks so multi-GB weight files
// never fully reside in memory. The hex digest is compared against a
// pinned constant before a checkpoint is trusted.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::ExtractError;

const CHUNK_SIZE: usize = 1 << 16;

/// Hex SHA-256 of a file's contents.
pub fn file_digest(path: &Path) -> Result<String, ExtractError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ExtractError::MissingAsset(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    digest_reader(file, CHUNK_SIZE)
}

/// Check a file against a pinned digest. Returns the digest on match so
/// callers can embed it in the model name.
pub fn verify_digest(path: &Path, expected: &str) -> Result<String, ExtractError> {
    let actual = file_digest(path)?;
    if actual != expected {
        return Err(ExtractError::DigestMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(actual)
}

fn digest_reader<R: Read>(mut reader: R, chunk_size: usize) -> Result<String, ExtractError> {
    let mut sha256 = Sha256::new();
    let mut buf = vec![0u8; chunk_size];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        sha256.update(&buf[..n]);
    }
    Ok(hex::encode(sha256.finalize()))
}
