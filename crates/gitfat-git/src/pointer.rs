// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Placeholder records
//!
//! A placeholder is the single line committed to history in place of a large
//! file. Every known wire version renders to a fixed length, which lets
//! callers reject candidates by size before looking at content.
//!
//! ## Format Specification
//!
//! ```text
//! v1: "#$# git-fat " <40 hex digest> "\n"                          (53 bytes)
//! v2: "#$# git-fat " <40 hex digest> " " <size, width 20> "\n"     (74 bytes)
//! ```
//!
//! New records are always written in the codec's current version; any known
//! version is accepted on read.

use crate::digest::{Digest, DIGEST_HEX_LEN};
use crate::error::{FatError, FatResult};
use gitfat_config::Config;
use serde::Serialize;

/// Prefix shared by every placeholder version
pub const MAGIC_COOKIE: &str = "#$# git-fat ";

/// Width of the right-aligned decimal size field in version 2
pub const SIZE_FIELD_WIDTH: usize = 20;

/// Placeholder wire version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PlaceholderVersion {
    /// Digest only
    V1,
    /// Digest and byte count
    V2,
}

impl PlaceholderVersion {
    /// Every version the decoder understands
    pub const ALL: [PlaceholderVersion; 2] = [PlaceholderVersion::V1, PlaceholderVersion::V2];

    /// Exact length of a record in this version
    pub const fn encoded_len(self) -> usize {
        match self {
            PlaceholderVersion::V1 => MAGIC_COOKIE.len() + DIGEST_HEX_LEN + 1,
            PlaceholderVersion::V2 => MAGIC_COOKIE.len() + DIGEST_HEX_LEN + 1 + SIZE_FIELD_WIDTH + 1,
        }
    }

    /// Version number as configured
    pub fn number(self) -> u8 {
        match self {
            PlaceholderVersion::V1 => 1,
            PlaceholderVersion::V2 => 2,
        }
    }

    fn for_len(len: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.encoded_len() == len)
    }
}

impl TryFrom<u8> for PlaceholderVersion {
    type Error = FatError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PlaceholderVersion::V1),
            2 => Ok(PlaceholderVersion::V2),
            other => Err(FatError::Config(gitfat_config::ConfigError::invalid_value(
                "placeholder.version",
                format!("unknown placeholder version {}", other),
            ))),
        }
    }
}

/// A decoded placeholder record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placeholder {
    /// Digest of the real content
    pub digest: Digest,

    /// Size of the real content; version 1 records do not carry it
    pub size: Option<u64>,

    /// Version the record was written in
    pub version: PlaceholderVersion,
}

/// Encoder/decoder for placeholder records.
///
/// Cheap to copy; the longest known rendering is computed once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderCodec {
    current: PlaceholderVersion,
    max_len: usize,
}

impl PlaceholderCodec {
    /// Creates a codec that writes `current`
    pub fn new(current: PlaceholderVersion) -> Self {
        let max_len = PlaceholderVersion::ALL
            .iter()
            .map(|v| v.encoded_len())
            .max()
            .unwrap_or(0);
        Self { current, max_len }
    }

    /// Codec for the configured wire version
    pub fn from_config(config: &Config) -> FatResult<Self> {
        Ok(Self::new(PlaceholderVersion::try_from(config.placeholder.version)?))
    }

    /// Version used for new records
    pub fn current(&self) -> PlaceholderVersion {
        self.current
    }

    /// Longest rendering of any known version
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Lengths of every known version, in version order
    pub fn known_lens(&self) -> [usize; 2] {
        PlaceholderVersion::ALL.map(PlaceholderVersion::encoded_len)
    }

    /// Whether a blob or file of `len` bytes could be a placeholder at all
    pub fn is_candidate_len(&self, len: u64) -> bool {
        PlaceholderVersion::ALL
            .iter()
            .any(|v| v.encoded_len() as u64 == len)
    }

    /// Renders a record in the current version
    pub fn encode(&self, digest: &Digest, size: u64) -> Vec<u8> {
        Self::encode_as(self.current, digest, size)
    }

    /// Renders a record in a specific version
    pub fn encode_as(version: PlaceholderVersion, digest: &Digest, size: u64) -> Vec<u8> {
        match version {
            PlaceholderVersion::V1 => format!("{}{}\n", MAGIC_COOKIE, digest),
            PlaceholderVersion::V2 => {
                format!("{}{} {:>width$}\n", MAGIC_COOKIE, digest, size, width = SIZE_FIELD_WIDTH)
            }
        }
        .into_bytes()
    }

    /// Strict decode: anything that is not a well-formed record of a known
    /// version is a [`FatError::Decode`].
    pub fn decode(&self, bytes: &[u8]) -> FatResult<Placeholder> {
        let version = PlaceholderVersion::for_len(bytes.len()).ok_or_else(|| {
            FatError::Decode(format!("{} bytes is not a placeholder length", bytes.len()))
        })?;

        let text = std::str::from_utf8(bytes)
            .map_err(|_| FatError::Decode("placeholder is not valid UTF-8".to_string()))?;

        let body = text
            .strip_prefix(MAGIC_COOKIE)
            .and_then(|rest| rest.strip_suffix('\n'))
            .ok_or_else(|| FatError::Decode(format!("missing cookie or newline: {:?}", text)))?;

        let (digest_field, rest) = match (body.get(..DIGEST_HEX_LEN), body.get(DIGEST_HEX_LEN..)) {
            (Some(digest), Some(rest)) => (digest, rest),
            _ => return Err(FatError::Decode(format!("truncated digest: {:?}", body))),
        };

        let digest = Digest::parse(digest_field)
            .map_err(|_| FatError::Decode(format!("invalid digest field: {:?}", digest_field)))?;

        let size = match version {
            PlaceholderVersion::V1 => None,
            PlaceholderVersion::V2 => Some(parse_size_field(rest)?),
        };

        Ok(Placeholder { digest, size, version })
    }

    /// Non-strict decode: `None` for anything that is not a placeholder.
    pub fn try_decode(&self, bytes: &[u8]) -> Option<Placeholder> {
        if !self.is_candidate_len(bytes.len() as u64) {
            return None;
        }
        self.decode(bytes).ok()
    }
}

impl Default for PlaceholderCodec {
    fn default() -> Self {
        Self::new(PlaceholderVersion::V2)
    }
}

/// Parses `" " + right-aligned decimal` from a version 2 record.
fn parse_size_field(field: &str) -> FatResult<u64> {
    let digits = field
        .strip_prefix(' ')
        .map(|f| f.trim_start_matches(' '))
        .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| FatError::Decode(format!("invalid size field: {:?}", field)))?;

    digits
        .parse::<u64>()
        .map_err(|e| FatError::Decode(format!("invalid size value {:?}: {}", digits, e)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const HELLO: &str = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";

    fn hello() -> Digest {
        Digest::parse(HELLO).unwrap()
    }

    #[test]
    fn test_encoded_lengths() {
        assert_eq!(PlaceholderVersion::V1.encoded_len(), 53);
        assert_eq!(PlaceholderVersion::V2.encoded_len(), 74);
        assert_eq!(PlaceholderCodec::default().max_len(), 74);
    }

    #[test]
    fn test_encode_v2_matches_wire_format() {
        let codec = PlaceholderCodec::new(PlaceholderVersion::V2);
        let record = codec.encode(&hello(), 5);
        let expected = format!("#$# git-fat {} {:>20}\n", HELLO, 5);
        assert_eq!(record, expected.as_bytes());
        assert!(String::from_utf8(record).unwrap().ends_with("                   5\n"));
    }

    #[test]
    fn test_encode_v1_has_no_size() {
        let codec = PlaceholderCodec::new(PlaceholderVersion::V1);
        assert_eq!(codec.encode(&hello(), 5), format!("#$# git-fat {}\n", HELLO).into_bytes());
    }

    #[test]
    fn test_encode_is_deterministic() {
        let codec = PlaceholderCodec::default();
        assert_eq!(codec.encode(&hello(), 1 << 40), codec.encode(&hello(), 1 << 40));
    }

    #[test]
    fn test_decode_accepts_every_known_version() {
        // A codec writing v1 still reads v2 records and vice versa.
        for writer in PlaceholderVersion::ALL {
            for reader in PlaceholderVersion::ALL {
                let record = PlaceholderCodec::encode_as(writer, &hello(), 12345);
                let decoded = PlaceholderCodec::new(reader).decode(&record).unwrap();
                assert_eq!(decoded.digest, hello());
                assert_eq!(decoded.version, writer);
            }
        }
    }

    #[test]
    fn test_decode_size_only_in_v2() {
        let codec = PlaceholderCodec::default();
        let v1 = PlaceholderCodec::encode_as(PlaceholderVersion::V1, &hello(), 5);
        let v2 = PlaceholderCodec::encode_as(PlaceholderVersion::V2, &hello(), u64::MAX);
        assert_eq!(codec.decode(&v1).unwrap().size, None);
        assert_eq!(codec.decode(&v2).unwrap().size, Some(u64::MAX));
    }

    #[test]
    fn test_wrong_length_short_circuits() {
        let codec = PlaceholderCodec::default();
        let mut record = codec.encode(&hello(), 5);
        record.push(b'\n');

        assert!(!codec.is_candidate_len(record.len() as u64));
        assert!(codec.try_decode(&record).is_none());
        let err = codec.decode(&record).unwrap_err();
        assert!(err.to_string().contains("not a placeholder length"));
    }

    #[test]
    fn test_right_length_wrong_content() {
        let codec = PlaceholderCodec::default();
        let imposter = vec![b'x'; PlaceholderVersion::V1.encoded_len()];
        assert!(codec.is_candidate_len(imposter.len() as u64));
        assert!(matches!(codec.decode(&imposter), Err(FatError::Decode(_))));
        assert!(codec.try_decode(&imposter).is_none());
    }

    #[test]
    fn test_decode_rejects_bad_digest() {
        let codec = PlaceholderCodec::default();
        let record = format!("#$# git-fat {}\n", "g".repeat(40));
        assert!(matches!(codec.decode(record.as_bytes()), Err(FatError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_bad_size_field() {
        let codec = PlaceholderCodec::default();
        let record = format!("#$# git-fat {} {:>20}\n", HELLO, "12a");
        assert_eq!(record.len(), PlaceholderVersion::V2.encoded_len());
        assert!(codec.decode(record.as_bytes()).is_err());

        let blank = format!("#$# git-fat {} {:>20}\n", HELLO, "");
        assert!(codec.decode(blank.as_bytes()).is_err());
    }

    #[test]
    fn test_decode_rejects_non_utf8() {
        let codec = PlaceholderCodec::default();
        let mut record = codec.encode(&hello(), 5);
        record[20] = 0xff;
        assert!(codec.decode(&record).is_err());
    }

    #[test]
    fn test_version_from_config_number() {
        assert_eq!(PlaceholderVersion::try_from(1).unwrap(), PlaceholderVersion::V1);
        assert_eq!(PlaceholderVersion::try_from(2).unwrap().number(), 2);
        assert!(PlaceholderVersion::try_from(9).is_err());
    }
}
