//! Request body integrity.
//!
//! S3 verifies the body of an ACL request against its `Content-MD5` header,
//! which carries the base64-encoded MD5 digest of the exact bytes sent.

use std::fmt;

use base64::Engine;

/// A checksum algorithm that can compute checksums from data.
#[derive(Debug, Clone, Copy)]
pub enum Hasher {
    /// MD5, as used by the `Content-MD5` header.
    Md5,
}

impl Hasher {
    /// Compute the checksum of the given data using this algorithm.
    pub fn checksum(&self, data: &[u8]) -> Checksum {
        match self {
            Hasher::Md5 => Checksum::Md5(md5::compute(data).0),
        }
    }
}

/// A checksum algorithm and its computed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checksum {
    Md5([u8; 16]),
}

impl Checksum {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Checksum::Md5(digest) => digest,
        }
    }

    /// Name of the header carrying this checksum.
    pub fn header_name(&self) -> &'static str {
        match self {
            Checksum::Md5(_) => "content-md5",
        }
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&base64::engine::general_purpose::STANDARD.encode(self.as_bytes()))
    }
}
