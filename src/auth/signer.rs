//! HMAC request signing and verification.
//!
//! # String to sign
//! ```text
//! METHOD\n
//! value-of-header-1\n        (multiple values joined with ",")
//! value-of-header-2\n        (missing header → empty line)
//! ...
//! /request/uri?query         (or X-Original-URI when present)
//! ```
//!
//! The signature header carries `<digest> <base64 tag>`.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use subtle::ConstantTimeEq;

use crate::auth::{
    AuthError, AuthOutcome, AuthResult, Authenticator, DigestAlgorithm, X_ORIGINAL_URI,
};

/// Authenticator backed by a shared secret.
#[derive(Clone)]
pub struct HmacAuthenticator {
    digest: DigestAlgorithm,
    secret: Vec<u8>,
    sign_header: HeaderName,
    headers: Vec<HeaderName>,
}

impl std::fmt::Debug for HmacAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacAuthenticator")
            .field("digest", &self.digest)
            .field("secret", &"<redacted>")
            .field("sign_header", &self.sign_header)
            .field("headers", &self.headers)
            .finish()
    }
}

impl HmacAuthenticator {
    /// Create an authenticator. The signature header is dropped from the
    /// covered list if it appears there.
    pub fn new(
        digest: DigestAlgorithm,
        secret: impl Into<Vec<u8>>,
        sign_header: HeaderName,
        headers: Vec<HeaderName>,
    ) -> Self {
        let headers = headers.into_iter().filter(|h| *h != sign_header).collect();
        Self {
            digest,
            secret: secret.into(),
            sign_header,
            headers,
        }
    }

    /// Canonical string covered by the signature.
    pub fn string_to_sign(&self, request: &Request<Body>) -> Vec<u8> {
        let mut buf = Vec::with_capacity(128);
        buf.extend_from_slice(request.method().as_str().as_bytes());
        buf.push(b'\n');

        for name in &self.headers {
            append_values(&mut buf, request.headers(), name);
            buf.push(b'\n');
        }

        match request
            .headers()
            .get(X_ORIGINAL_URI)
            .filter(|v| !v.is_empty())
        {
            Some(original) => buf.extend_from_slice(original.as_bytes()),
            None => {
                let uri = request
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .filter(|pq| !pq.is_empty())
                    .unwrap_or("/");
                buf.extend_from_slice(uri.as_bytes());
            }
        }
        buf
    }

    /// Signature header value for `request` under `digest`.
    pub fn request_signature(
        &self,
        request: &Request<Body>,
        digest: DigestAlgorithm,
    ) -> Result<String, AuthError> {
        let tag = digest.hmac(&self.secret, &self.string_to_sign(request))?;
        Ok(format!("{} {}", digest.name(), STANDARD.encode(tag)))
    }

    fn outcome(
        result: AuthResult,
        header_signature: Option<String>,
        computed_signature: Option<String>,
    ) -> AuthOutcome {
        AuthOutcome {
            result,
            header_signature,
            computed_signature,
        }
    }
}

fn append_values(buf: &mut Vec<u8>, headers: &HeaderMap, name: &HeaderName) {
    for (i, value) in headers.get_all(name).iter().enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        buf.extend_from_slice(value.as_bytes());
    }
}

impl Authenticator for HmacAuthenticator {
    fn sign(&self, request: &mut Request<Body>) -> Result<(), AuthError> {
        let signature = self.request_signature(request, self.digest)?;
        let value = HeaderValue::from_str(&signature)?;
        request.headers_mut().insert(self.sign_header.clone(), value);
        Ok(())
    }

    fn validate(&self, request: &Request<Body>) -> AuthOutcome {
        let header = match request
            .headers()
            .get(&self.sign_header)
            .filter(|v| !v.is_empty())
        {
            Some(value) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
            None => return Self::outcome(AuthResult::NoSignature, None, None),
        };

        let mut parts = header.split(' ');
        let name = match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(_), None) => name,
            _ => return Self::outcome(AuthResult::InvalidFormat, Some(header), None),
        };

        let digest = match name.parse::<DigestAlgorithm>() {
            Ok(digest) => digest,
            Err(_) => return Self::outcome(AuthResult::UnsupportedAlgorithm, Some(header), None),
        };

        let computed = match self.request_signature(request, self.digest) {
            Ok(computed) => computed,
            Err(e) => {
                tracing::error!(error = %e, "Failed to compute signature");
                return Self::outcome(AuthResult::Mismatch, Some(header), None);
            }
        };

        let equal: bool = header.as_bytes().ct_eq(computed.as_bytes()).into();
        let result = if equal && digest == self.digest {
            AuthResult::Match
        } else {
            AuthResult::Mismatch
        };
        Self::outcome(result, Some(header), Some(computed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator(digest: DigestAlgorithm, secret: &str, header: &str, covered: &[&str]) -> HmacAuthenticator {
        HmacAuthenticator::new(
            digest,
            secret.as_bytes(),
            HeaderName::from_bytes(header.as_bytes()).unwrap(),
            covered
                .iter()
                .map(|h| HeaderName::from_bytes(h.as_bytes()).unwrap())
                .collect(),
        )
    }

    fn request() -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("http://localhost/foo/bar?baz=quux")
            .header("Content-Type", "application/json")
            .header("Date", "Tue, 20 Oct 2015 23:46:22 GMT")
            .body(Body::empty())
            .unwrap()
    }

    fn signed_by(auth: &HmacAuthenticator) -> Request<Body> {
        let mut req = request();
        auth.sign(&mut req).unwrap();
        req
    }

    #[test]
    fn test_string_to_sign() {
        let auth = authenticator(
            DigestAlgorithm::Sha1,
            "foobar",
            "Gap-Signature",
            &["Content-Type", "Date", "X-Missing"],
        );
        let mut req = request();
        req.headers_mut().append("date", HeaderValue::from_static("later"));

        let expected = "POST\n\
                        application/json\n\
                        Tue, 20 Oct 2015 23:46:22 GMT,later\n\
                        \n\
                        /foo/bar?baz=quux";
        assert_eq!(auth.string_to_sign(&req), expected.as_bytes());
    }

    #[test]
    fn test_original_uri_overrides_path() {
        let auth = authenticator(DigestAlgorithm::Sha1, "foobar", "Gap-Signature", &[]);
        let mut req = request();
        req.headers_mut()
            .insert(X_ORIGINAL_URI, HeaderValue::from_static("/original?x=1"));
        assert_eq!(auth.string_to_sign(&req), b"POST\n/original?x=1");
    }

    #[test]
    fn test_sign_writes_header() {
        let auth = authenticator(DigestAlgorithm::Sha256, "foobar", "Gap-Signature", &["Content-Type"]);
        let mut req = request();
        req.headers_mut()
            .insert("gap-signature", HeaderValue::from_static("stale"));
        auth.sign(&mut req).unwrap();

        let values: Vec<_> = req.headers().get_all("gap-signature").iter().collect();
        assert_eq!(values.len(), 1);
        let value = values[0].to_str().unwrap();
        assert!(value.starts_with("sha256 "));
        assert_eq!(value, auth.request_signature(&req, DigestAlgorithm::Sha256).unwrap());
    }

    #[test]
    fn test_signing_is_idempotent() {
        let auth = authenticator(DigestAlgorithm::Sha1, "foobar", "Gap-Signature", &["Content-Type"]);
        let mut req = signed_by(&auth);
        let first = req.headers().get("gap-signature").cloned();
        auth.sign(&mut req).unwrap();
        assert_eq!(req.headers().get("gap-signature").cloned(), first);
    }

    #[test]
    fn test_round_trip_matches() {
        let covered = ["Content-Type", "Date"];
        for digest in DigestAlgorithm::ALL {
            let signer = authenticator(digest, "foobar", "Gap-Signature", &covered);
            let validator = authenticator(digest, "foobar", "gap-signature", &["content-type", "DATE"]);
            let outcome = validator.validate(&signed_by(&signer));
            assert_eq!(outcome.result, AuthResult::Match, "digest {}", digest);
            assert_eq!(outcome.header_signature, outcome.computed_signature);
        }
    }

    #[test]
    fn test_any_single_change_flips_to_mismatch() {
        let covered = ["Content-Type", "Date"];
        let validator = authenticator(DigestAlgorithm::Sha1, "foobar", "Gap-Signature", &covered);

        let other_digest = authenticator(DigestAlgorithm::Md5, "foobar", "Gap-Signature", &covered);
        assert_eq!(validator.validate(&signed_by(&other_digest)).result, AuthResult::Mismatch);

        let other_secret = authenticator(DigestAlgorithm::Sha1, "bazquux", "Gap-Signature", &covered);
        assert_eq!(validator.validate(&signed_by(&other_secret)).result, AuthResult::Mismatch);

        let other_header = authenticator(DigestAlgorithm::Sha1, "foobar", "X-Signature", &covered);
        assert!(!validator.validate(&signed_by(&other_header)).is_match());

        let reordered = authenticator(DigestAlgorithm::Sha1, "foobar", "Gap-Signature", &["Date", "Content-Type"]);
        assert_eq!(validator.validate(&signed_by(&reordered)).result, AuthResult::Mismatch);

        let signer = authenticator(DigestAlgorithm::Sha1, "foobar", "Gap-Signature", &covered);
        let mut req = signed_by(&signer);
        req.headers_mut()
            .insert("content-type", HeaderValue::from_static("text/plain"));
        assert_eq!(validator.validate(&req).result, AuthResult::Mismatch);
    }

    #[test]
    fn test_malformed_headers() {
        let auth = authenticator(DigestAlgorithm::Sha1, "foobar", "Gap-Signature", &[]);

        assert_eq!(auth.validate(&request()).result, AuthResult::NoSignature);

        let mut req = request();
        req.headers_mut()
            .insert("gap-signature", HeaderValue::from_static("sha1"));
        assert_eq!(auth.validate(&req).result, AuthResult::InvalidFormat);

        req.headers_mut()
            .insert("gap-signature", HeaderValue::from_static("sha1 abc def"));
        assert_eq!(auth.validate(&req).result, AuthResult::InvalidFormat);

        req.headers_mut()
            .insert("gap-signature", HeaderValue::from_static("whirlpool abc"));
        let outcome = auth.validate(&req);
        assert_eq!(outcome.result, AuthResult::UnsupportedAlgorithm);
        assert_eq!(outcome.header_signature.as_deref(), Some("whirlpool abc"));
        assert_eq!(outcome.computed_signature, None);
    }

    #[test]
    fn test_signature_header_never_covered() {
        let signer = authenticator(DigestAlgorithm::Sha1, "foobar", "Gap-Signature", &["Gap-Signature"]);
        let outcome = signer.validate(&signed_by(&signer));
        assert!(outcome.is_match());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let auth = authenticator(DigestAlgorithm::Sha1, "foobar", "Gap-Signature", &[]);
        assert!(!format!("{:?}", auth).contains("foobar"));
    }
}
