//! Mode dispatch: one request handler per operating mode.
//!
//! # Responsibilities
//! - Map a validated configuration and an authenticator to a `Handler`
//! - Produce the one-line description logged at startup
//!
//! # Design Decisions
//! - `Handler` is a closed enum; each variant owns only what it needs
//! - Any authentication result other than a match is answered with the same
//!   401, so callers cannot learn why a request was rejected
//! - Handlers hold no per-request state and are shared behind an `Arc`

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;

use crate::auth::Authenticator;
use crate::config::{Mode, ProxyConfig, Upstream};
use crate::http::forward::{self, FileServer, Forwarder};
use crate::http::request::RequestIdExt;
use crate::http::response;
use crate::observability::metrics;

/// Errors raised while building a handler.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("mode {0} requires an upstream target")]
    MissingUpstream(Mode),

    #[error("mode {0} requires a file root")]
    MissingFileRoot(Mode),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// What a handler delegates to once a request is allowed through.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Upstream(&'a Upstream),
    FileRoot(&'a Path),
    None,
}

impl<'a> Target<'a> {
    /// The target a validated configuration carries.
    pub fn of(config: &'a ProxyConfig) -> Self {
        match (&config.upstream, &config.file_root) {
            (Some(upstream), _) => Target::Upstream(upstream),
            (None, Some(root)) => Target::FileRoot(root),
            (None, None) => Target::None,
        }
    }
}

/// Settings for the forwarding client.
#[derive(Debug, Clone, Copy)]
pub struct ForwardSettings {
    pub connect_timeout: Duration,
}

impl ForwardSettings {
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }
}

impl Default for ForwardSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Runtime request behavior for one mode.
#[derive(Debug, Clone)]
pub enum Handler {
    SignAndForward {
        auth: Arc<dyn Authenticator>,
        forwarder: Forwarder,
    },
    AuthenticateAndForward {
        auth: Arc<dyn Authenticator>,
        forwarder: Forwarder,
    },
    AuthenticateForFiles {
        auth: Arc<dyn Authenticator>,
        files: FileServer,
    },
    AuthenticateOnly {
        auth: Arc<dyn Authenticator>,
    },
}

/// Build the handler for `mode` and describe it.
pub fn build(
    mode: Mode,
    auth: Arc<dyn Authenticator>,
    target: Target<'_>,
    settings: ForwardSettings,
) -> Result<(Handler, String), DispatchError> {
    let forwarder =
        |upstream: &Upstream| Forwarder::new(upstream.url.clone(), settings.connect_timeout);

    let built = match (mode, target) {
        (Mode::SignAndForward, Target::Upstream(upstream)) => (
            Handler::SignAndForward {
                auth,
                forwarder: forwarder(upstream)?,
            },
            format!("proxying signed requests to: {}", upstream.raw),
        ),
        (Mode::AuthenticateAndForward, Target::Upstream(upstream)) => (
            Handler::AuthenticateAndForward {
                auth,
                forwarder: forwarder(upstream)?,
            },
            format!("proxying authenticated requests to: {}", upstream.raw),
        ),
        (Mode::AuthenticateForFiles, Target::FileRoot(root)) => (
            Handler::AuthenticateForFiles {
                auth,
                files: FileServer::new(root),
            },
            format!("serving files from {} for authenticated requests", root.display()),
        ),
        (Mode::AuthenticateOnly, _) => (
            Handler::AuthenticateOnly { auth },
            "responding Accepted/Unauthorized for auth queries".to_string(),
        ),
        (Mode::AuthenticateForFiles, _) => return Err(DispatchError::MissingFileRoot(mode)),
        (mode, _) => return Err(DispatchError::MissingUpstream(mode)),
    };
    Ok(built)
}

/// Build the handler a validated configuration calls for.
pub fn build_from_config(
    config: &ProxyConfig,
    auth: Arc<dyn Authenticator>,
) -> Result<(Handler, String), DispatchError> {
    build(
        config.mode,
        auth,
        Target::of(config),
        ForwardSettings::from_config(config),
    )
}

impl Handler {
    pub fn mode(&self) -> Mode {
        match self {
            Handler::SignAndForward { .. } => Mode::SignAndForward,
            Handler::AuthenticateAndForward { .. } => Mode::AuthenticateAndForward,
            Handler::AuthenticateForFiles { .. } => Mode::AuthenticateForFiles,
            Handler::AuthenticateOnly { .. } => Mode::AuthenticateOnly,
        }
    }

    /// Handle one request.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let mode = self.mode();
        match self {
            Handler::SignAndForward { auth, forwarder } => {
                // Signature covers the URI and headers the upstream sees.
                let request_id = request.request_id().to_string();
                let mut outgoing = match forwarder.prepare(request) {
                    Ok(outgoing) => outgoing,
                    Err(e) => return forward::rewrite_failed(&request_id, &e),
                };
                if let Err(e) = auth.sign(&mut outgoing) {
                    tracing::error!(request_id = %request_id, error = %e, "Signing failed");
                    metrics::record_request(mode, "sign_failed");
                    return response::error(StatusCode::INTERNAL_SERVER_ERROR, "signing failed");
                }
                metrics::record_request(mode, "signed");
                forwarder.send(outgoing).await
            }
            Handler::AuthenticateAndForward { auth, forwarder } => {
                if !authenticate(auth.as_ref(), &request, mode) {
                    return response::unauthorized();
                }
                forwarder.forward(request).await
            }
            Handler::AuthenticateForFiles { auth, files, .. } => {
                if !authenticate(auth.as_ref(), &request, mode) {
                    return response::unauthorized();
                }
                files.serve(request).await
            }
            Handler::AuthenticateOnly { auth } => {
                if !authenticate(auth.as_ref(), &request, mode) {
                    return response::unauthorized();
                }
                response::accepted()
            }
        }
    }
}

fn authenticate(auth: &dyn Authenticator, request: &Request<Body>, mode: Mode) -> bool {
    let outcome = auth.validate(request);
    metrics::record_request(mode, outcome.result.as_str());
    if outcome.is_match() {
        tracing::debug!(request_id = %request.request_id(), "Request authenticated");
        return true;
    }

    tracing::warn!(
        request_id = %request.request_id(),
        method = %request.method(),
        path = %request.uri().path(),
        result = outcome.result.as_str(),
        "Rejected unauthenticated request"
    );
    false
}
