//! Content digests (SHA-256, lowercase hex)

use crate::error::StorageError;
use crate::types::Digest;
use sha2::{Digest as _, Sha256};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Stream `reader` through SHA-256.
pub fn digest_reader<R: Read>(reader: R) -> io::Result<Digest> {
    let mut reader = BufReader::new(reader);
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(Digest::from_hex(hex::encode(hasher.finalize())))
}

pub fn digest_bytes(bytes: &[u8]) -> Digest {
    Digest::from_hex(hex::encode(Sha256::digest(bytes)))
}

/// Digest of a file's contents, read without loading it whole.
pub fn digest_file(path: &Path) -> Result<Digest, StorageError> {
    let file = File::open(path)?;
    Ok(digest_reader(file)?)
}
