//! Request authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Signing side (no auth):
//!     request → string to sign → HMAC → signature header → forward
//!
//! Authenticating side:
//!     request → read signature header → recompute → constant-time compare
//!         → AuthResult::Match | anything else
//! ```
//!
//! # Design Decisions
//! - Handlers only see `Authenticator`, never the HMAC details
//! - Every non-match result is answered identically by the handlers
//! - The result detail exists for logging only

pub mod digest;
pub mod signer;

use axum::body::Body;
use axum::http::Request;

pub use digest::{DigestAlgorithm, UnsupportedDigest};
pub use signer::HmacAuthenticator;

/// Header consulted instead of the request URI when present.
pub const X_ORIGINAL_URI: &str = "x-original-uri";

/// Errors raised while computing a signature.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid HMAC key: {0}")]
    Key(#[from] hmac::digest::InvalidLength),

    #[error("signature is not a valid header value: {0}")]
    HeaderValue(#[from] axum::http::header::InvalidHeaderValue),
}

/// Result of checking a request's signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthResult {
    /// No signature header, or an empty one.
    NoSignature,
    /// The header is not `<digest> <signature>`.
    InvalidFormat,
    /// The header names a digest this gateway does not know.
    UnsupportedAlgorithm,
    /// Signature matches.
    Match,
    /// Signature does not match.
    Mismatch,
}

impl AuthResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthResult::NoSignature => "no_signature",
            AuthResult::InvalidFormat => "invalid_format",
            AuthResult::UnsupportedAlgorithm => "unsupported_algorithm",
            AuthResult::Match => "match",
            AuthResult::Mismatch => "mismatch",
        }
    }
}

/// Outcome of [`Authenticator::validate`] with diagnostic detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub result: AuthResult,
    /// Signature as received, if any.
    pub header_signature: Option<String>,
    /// Signature the gateway computed, if it got that far.
    pub computed_signature: Option<String>,
}

impl AuthOutcome {
    pub fn is_match(&self) -> bool {
        self.result == AuthResult::Match
    }
}

/// Signing and verification capability used by the request handlers.
pub trait Authenticator: Send + Sync + std::fmt::Debug {
    /// Attach (or overwrite) the signature header on `request`.
    fn sign(&self, request: &mut Request<Body>) -> Result<(), AuthError>;

    /// Check the signature carried by `request`.
    fn validate(&self, request: &Request<Body>) -> AuthOutcome;
}
