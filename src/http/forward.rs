//! Upstream forwarding and local file serving.
//!
//! # Responsibilities
//! - Rewrite the request to the configured origin and send it
//! - Preserve method, path, query, headers and body
//! - Stream the upstream response back
//! - Serve files from a rooted directory
//!
//! # Design Decisions
//! - Forwarding is split into `prepare` and `send` so a signature can be
//!   computed over the exact request that goes on the wire
//! - Request and response bodies are streamed, never buffered
//! - No retries and no request timeout here; only a connect timeout
//! - Upstream failures map to 502/504, never to 401
//! - Redirects are passed to the client, not followed

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use axum::body::{Body, HttpBody};
use axum::extract::ConnectInfo;
use axum::http::uri::InvalidUri;
use axum::http::{Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeDir;
use url::Url;

use crate::http::request::RequestIdExt;
use crate::http::response;
use crate::security::headers::{append_forwarded_for, strip_hop_by_hop};

/// Forwards requests to a single upstream origin.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    origin: Url,
}

impl Forwarder {
    /// Create a forwarder for `origin`.
    pub fn new(origin: Url, connect_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self { client, origin })
    }

    /// Upstream URL for an inbound request URI.
    ///
    /// The result is in the URL's normalized form, which is what the client
    /// puts on the wire (reserved characters percent-encoded, dot segments
    /// removed).
    pub fn target_url(&self, uri: &Uri) -> Url {
        let mut url = self.origin.clone();
        url.set_path(uri.path());
        url.set_query(uri.query());
        url
    }

    /// Turn an inbound request into the request the upstream will receive.
    ///
    /// The URI becomes the absolute upstream URI, hop-by-hop headers are
    /// dropped and the client address is appended to X-Forwarded-For. The
    /// body is left untouched.
    pub fn prepare(&self, request: Request<Body>) -> Result<Request<Body>, InvalidUri> {
        let client_ip = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let (mut parts, body) = request.into_parts();
        parts.uri = self.target_url(&parts.uri).as_str().parse()?;
        strip_hop_by_hop(&mut parts.headers);
        if let Some(ip) = client_ip {
            append_forwarded_for(&mut parts.headers, ip);
        }
        Ok(Request::from_parts(parts, body))
    }

    /// Send a request built by [`prepare`](Self::prepare) and return the
    /// upstream response.
    pub async fn send(&self, request: Request<Body>) -> Response {
        let request_id = request.request_id().to_string();
        let (parts, body) = request.into_parts();
        let url = parts.uri.to_string();
        tracing::debug!(
            request_id = %request_id,
            method = %parts.method,
            upstream = %url,
            "Forwarding request"
        );

        let mut outgoing = self
            .client
            .request(parts.method, url)
            .headers(parts.headers);
        if body.size_hint().exact() != Some(0) {
            outgoing = outgoing.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        match outgoing.send().await {
            Ok(upstream) => {
                let status = upstream.status();
                let mut headers = upstream.headers().clone();
                strip_hop_by_hop(&mut headers);

                let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
                *response.status_mut() = status;
                *response.headers_mut() = headers;
                response
            }
            Err(e) if e.is_timeout() => {
                tracing::error!(request_id = %request_id, error = %e, "Upstream timed out");
                response::error(StatusCode::GATEWAY_TIMEOUT, "Upstream request timed out")
            }
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Upstream error");
                response::error(StatusCode::BAD_GATEWAY, "Upstream request failed")
            }
        }
    }

    /// Prepare and send `request` unchanged apart from the rewrite.
    pub async fn forward(&self, request: Request<Body>) -> Response {
        let request_id = request.request_id().to_string();
        match self.prepare(request) {
            Ok(outgoing) => self.send(outgoing).await,
            Err(e) => rewrite_failed(&request_id, &e),
        }
    }
}

/// Response for a request whose upstream URI could not be built.
pub fn rewrite_failed(request_id: &str, error: &InvalidUri) -> Response {
    tracing::error!(request_id = %request_id, error = %error, "Upstream URI rejected");
    response::error(StatusCode::BAD_GATEWAY, "Upstream request failed")
}

/// Serves files below a root directory.
#[derive(Debug, Clone)]
pub struct FileServer {
    dir: ServeDir,
}

impl FileServer {
    pub fn new(root: &Path) -> Self {
        Self {
            dir: ServeDir::new(root),
        }
    }

    pub async fn serve(&self, request: Request<Body>) -> Response {
        match self.dir.clone().oneshot(request).await {
            Ok(response) => response.into_response(),
            Err(never) => match never {},
        }
    }
}
