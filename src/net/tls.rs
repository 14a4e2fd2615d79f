//! TLS termination for the gateway listener.
//!
//! Paths have already passed option validation; they are checked again here
//! because the files may have changed between validation and startup.

use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;

#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("ssl-{kind} not found: {}", path.display())]
    Missing { kind: &'static str, path: PathBuf },

    #[error("failed to load certificate pair: {0}")]
    Load(#[source] std::io::Error),
}

/// Build a rustls server config from a PEM certificate chain and private key.
pub async fn load_tls_config(cert: &Path, key: &Path) -> Result<RustlsConfig, TlsError> {
    for (kind, path) in [("cert", cert), ("key", key)] {
        if !path.is_file() {
            return Err(TlsError::Missing {
                kind,
                path: path.to_path_buf(),
            });
        }
    }

    let config = RustlsConfig::from_pem_file(cert, key)
        .await
        .map_err(TlsError::Load)?;
    tracing::debug!(cert = %cert.display(), key = %key.display(), "TLS certificate pair loaded");
    Ok(config)
}
