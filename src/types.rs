//! Core value types shared across the tree, store and sync layers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex-encoded SHA-256 digest of a regular file's content
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// Wrap an already hex-encoded digest string.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Digest(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// File mode: a type tag plus permission bits.
///
/// The bit layout matches the published snapshot format: the directory flag
/// is bit 31 and the symlink flag is bit 27, with the low nine bits holding
/// the permission bits. A value with neither flag set is a regular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mode(u32);

impl Mode {
    pub const DIR: u32 = 1 << 31;
    pub const SYMLINK: u32 = 1 << 27;
    pub const PERM_MASK: u32 = 0o777;

    pub fn directory(perm: u32) -> Self {
        Mode(Self::DIR | (perm & Self::PERM_MASK))
    }

    pub fn regular(perm: u32) -> Self {
        Mode(perm & Self::PERM_MASK)
    }

    pub fn symlink(perm: u32) -> Self {
        Mode(Self::SYMLINK | (perm & Self::PERM_MASK))
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_dir(self) -> bool {
        self.0 & Self::DIR != 0
    }

    pub fn is_symlink(self) -> bool {
        self.0 & Self::SYMLINK != 0
    }

    pub fn is_regular(self) -> bool {
        self.0 & (Self::DIR | Self::SYMLINK) == 0
    }

    pub fn permissions(self) -> u32 {
        self.0 & Self::PERM_MASK
    }
}
