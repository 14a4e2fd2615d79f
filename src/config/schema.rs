//! Configuration schema definitions.
//!
//! `ProxyOptions` is the raw, unchecked option set as it arrives from a
//! config file or the command line. `ProxyConfig` is what validation hands
//! to the rest of the system: typed, complete and immutable.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use axum::http::HeaderName;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::DigestAlgorithm;
use crate::config::mode::Mode;

/// Raw gateway options.
///
/// Empty strings are treated the same as absent values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyOptions {
    /// Port on which to listen for requests.
    pub port: i64,

    /// Authenticate requests rather than signing them.
    pub auth: bool,

    /// Hash algorithm name used for the HMAC.
    pub digest: String,

    /// Shared secret key.
    pub secret: String,

    /// Header carrying the request signature.
    pub sign_header: String,

    /// Headers factored into the signature, in order.
    pub headers: Vec<String>,

    /// Signed/authenticated requests are proxied to this origin.
    pub upstream: Option<String>,

    /// Root of the file tree served to authenticated requests.
    pub file_root: Option<PathBuf>,

    /// Server certificate (PEM).
    pub ssl_cert: Option<PathBuf>,

    /// Key for `ssl_cert` (PEM).
    pub ssl_key: Option<PathBuf>,

    /// Interface to bind.
    pub bind_address: IpAddr,

    /// Default log filter when RUST_LOG is unset.
    pub log_level: String,

    /// Upstream connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Optional Prometheus exporter address.
    pub metrics_address: Option<SocketAddr>,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self {
            port: 0,
            auth: false,
            digest: "sha1".to_string(),
            secret: String::new(),
            sign_header: String::new(),
            headers: Vec::new(),
            upstream: None,
            file_root: None,
            ssl_cert: None,
            ssl_key: None,
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            log_level: "info".to_string(),
            connect_timeout_secs: 10,
            metrics_address: None,
        }
    }
}

impl ProxyOptions {
    /// The upstream string, if one was supplied.
    pub fn upstream(&self) -> Option<&str> {
        self.upstream.as_deref().filter(|s| !s.is_empty())
    }

    /// The file root, if one was supplied.
    pub fn file_root(&self) -> Option<&PathBuf> {
        non_empty_path(&self.file_root)
    }

    /// The certificate path, if one was supplied.
    pub fn ssl_cert(&self) -> Option<&PathBuf> {
        non_empty_path(&self.ssl_cert)
    }

    /// The key path, if one was supplied.
    pub fn ssl_key(&self) -> Option<&PathBuf> {
        non_empty_path(&self.ssl_key)
    }

    /// Covered header names with whitespace trimmed and blanks dropped.
    pub fn covered_headers(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(|h| h.trim()).filter(|h| !h.is_empty())
    }
}

fn non_empty_path(path: &Option<PathBuf>) -> Option<&PathBuf> {
    path.as_ref().filter(|p| !p.as_os_str().is_empty())
}

/// An upstream origin, kept both as written and parsed.
#[derive(Debug, Clone)]
pub struct Upstream {
    /// The string the operator supplied.
    pub raw: String,
    /// Parsed origin (scheme + host, root path).
    pub url: Url,
}

/// Certificate and key for serving HTTPS.
#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Validated gateway configuration.
///
/// Only produced by [`ProxyOptions::validate`](crate::config::ProxyOptions::validate).
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub port: u16,
    pub mode: Mode,
    pub digest: DigestAlgorithm,
    pub secret: Vec<u8>,
    pub sign_header: HeaderName,
    pub headers: Vec<HeaderName>,
    pub upstream: Option<Upstream>,
    pub file_root: Option<PathBuf>,
    pub tls: Option<TlsPaths>,
    pub bind_address: IpAddr,
    pub log_level: String,
    pub connect_timeout_secs: u64,
    pub metrics_address: Option<SocketAddr>,
}

impl ProxyConfig {
    /// Address the listener binds to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}
