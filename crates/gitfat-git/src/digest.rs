// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Content digests
//!
//! Objects are named by the lowercase hex SHA-1 of their raw bytes. The same
//! string is the file name in the object cache and the digest field of a
//! placeholder record.

use crate::error::{FatError, FatResult};
use serde::Serialize;
use sha1::{Digest as _, Sha1};
use std::fmt;
use std::io;
use std::str::FromStr;

/// Length of a rendered digest in characters
pub const DIGEST_HEX_LEN: usize = 40;

/// A validated content digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// Parses a rendered digest; only 40 lowercase hex characters are accepted.
    pub fn parse(s: &str) -> FatResult<Self> {
        if Self::is_valid(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(FatError::InvalidDigest(s.to_string()))
        }
    }

    /// Whether `s` is a well-formed digest.
    pub fn is_valid(s: &str) -> bool {
        s.len() == DIGEST_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Digest of an in-memory buffer.
    pub fn of(bytes: &[u8]) -> Self {
        let mut writer = DigestWriter::new();
        writer.update(bytes);
        writer.finish()
    }

    /// The hex rendering
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Digest {
    type Err = FatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Running digest accumulator that also counts bytes.
#[derive(Default, Clone)]
pub struct DigestWriter {
    hasher: Sha1,
    bytes: u64,
}

impl DigestWriter {
    /// Starts an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one block
    pub fn update(&mut self, block: &[u8]) {
        self.hasher.update(block);
        self.bytes += block.len() as u64;
    }

    /// Bytes fed so far
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Consumes the accumulator
    pub fn finish(self) -> Digest {
        Digest(hex::encode(self.hasher.finalize()))
    }
}

impl io::Write for DigestWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            Digest::of(b"hello").as_str(),
            "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
        );
        assert_eq!(
            Digest::of(b"").as_str(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }

    #[test]
    fn test_streaming_matches_one_shot() {
        let mut writer = DigestWriter::new();
        writer.update(b"hel");
        writer.update(b"lo");
        assert_eq!(writer.bytes(), 5);
        assert_eq!(writer.finish(), Digest::of(b"hello"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Digest::parse("aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d").is_ok());
        assert!(Digest::parse("AAF4C61DDCC5E8A2DABEDE0F3B482CD9AEA9434D").is_err());
        assert!(Digest::parse("aaf4c61d").is_err());
        assert!(Digest::parse(".tmpA1b2C3").is_err());
        assert!(matches!(
            "zzf4c61ddcc5e8a2dabede0f3b482cd9aea9434d".parse::<Digest>(),
            Err(FatError::InvalidDigest(_))
        ));
    }
}
