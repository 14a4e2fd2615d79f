//! Digest names accepted for signing.

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};

use crate::auth::AuthError;

/// Hash algorithm backing the HMAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

/// Returned when a digest name is not one of the supported algorithms.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported digest: {0}")]
pub struct UnsupportedDigest(pub String);

macro_rules! keyed_digest {
    ($hash:ty, $key:expr, $data:expr) => {{
        let mut mac = <Hmac<$hash> as Mac>::new_from_slice($key)?;
        mac.update($data);
        mac.finalize().into_bytes().to_vec()
    }};
}

impl DigestAlgorithm {
    /// All supported algorithms.
    pub const ALL: [DigestAlgorithm; 6] = [
        DigestAlgorithm::Md5,
        DigestAlgorithm::Sha1,
        DigestAlgorithm::Sha224,
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Sha384,
        DigestAlgorithm::Sha512,
    ];

    /// Name as it appears on the command line and in signature headers.
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "md5",
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Sha224 => "sha224",
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha384 => "sha384",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }

    /// Compute the HMAC of `data` under `key`.
    pub fn hmac(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>, AuthError> {
        let tag = match self {
            DigestAlgorithm::Md5 => keyed_digest!(Md5, key, data),
            DigestAlgorithm::Sha1 => keyed_digest!(Sha1, key, data),
            DigestAlgorithm::Sha224 => keyed_digest!(Sha224, key, data),
            DigestAlgorithm::Sha256 => keyed_digest!(Sha256, key, data),
            DigestAlgorithm::Sha384 => keyed_digest!(Sha384, key, data),
            DigestAlgorithm::Sha512 => keyed_digest!(Sha512, key, data),
        };
        Ok(tag)
    }
}

impl FromStr for DigestAlgorithm {
    type Err = UnsupportedDigest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DigestAlgorithm::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| UnsupportedDigest(s.to_string()))
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
