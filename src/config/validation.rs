//! Configuration validation.
//!
//! # Responsibilities
//! - Check every option independently and report all problems at once
//! - Derive the operating `Mode`
//! - Turn raw strings into typed values (digest, header names, upstream URL)
//!
//! # Design Decisions
//! - Each check is a plain function over the options and the accumulating
//!   state; all of them run, in a fixed order, regardless of earlier failures
//! - Mode is computed even for invalid options; callers only act on it when
//!   the report is empty

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::http::HeaderName;
use url::{ParseError, Url};

use crate::auth::DigestAlgorithm;
use crate::config::mode::Mode;
use crate::config::schema::{ProxyConfig, ProxyOptions, TlsPaths, Upstream};

/// Ordered list of configuration problems. Empty means usable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    messages: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid options:")?;
        for message in &self.messages {
            write!(f, "\n  {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

/// State threaded through the checks.
struct Checked<'a> {
    opts: &'a ProxyOptions,
    report: ValidationReport,
    mode: Mode,
    digest: Option<DigestAlgorithm>,
    sign_header: Option<HeaderName>,
    headers: Vec<HeaderName>,
    upstream: Option<Url>,
}

type Check = fn(&mut Checked<'_>);

/// All checks, in reporting order.
const CHECKS: [Check; 6] = [
    check_mode,
    check_port,
    check_auth_params,
    check_upstream,
    check_file_root,
    check_tls,
];

fn run_checks(opts: &ProxyOptions) -> Checked<'_> {
    let mut checked = Checked {
        opts,
        report: ValidationReport::new(),
        mode: Mode::derive(opts.auth, opts.upstream().is_some(), opts.file_root().is_some()),
        digest: None,
        sign_header: None,
        headers: Vec::new(),
        upstream: None,
    };
    for check in CHECKS {
        check(&mut checked);
    }
    checked
}

/// Validate raw options, returning the derived mode and every problem found.
pub fn validate(opts: &ProxyOptions) -> (Mode, ValidationReport) {
    let checked = run_checks(opts);
    (checked.mode, checked.report)
}

impl ProxyOptions {
    /// Validate and convert into an immutable [`ProxyConfig`].
    pub fn validate(&self) -> Result<ProxyConfig, ValidationReport> {
        let checked = run_checks(self);
        if !checked.report.is_empty() {
            return Err(checked.report);
        }

        let mut report = ValidationReport::new();
        let digest = checked.digest;
        let sign_header = checked.sign_header;
        let port = u16::try_from(self.port).ok();
        let upstream = match (self.upstream(), checked.upstream) {
            (Some(raw), Some(url)) => Some(Upstream {
                raw: raw.to_string(),
                url,
            }),
            (None, None) => None,
            _ => {
                report.push("internal error: upstream was not parsed");
                None
            }
        };

        let (Some(digest), Some(sign_header), Some(port)) = (digest, sign_header, port) else {
            report.push("internal error: validated options are incomplete");
            return Err(report);
        };
        if !report.is_empty() {
            return Err(report);
        }

        let tls = match (self.ssl_cert(), self.ssl_key()) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.clone(),
                key: key.clone(),
            }),
            _ => None,
        };

        Ok(ProxyConfig {
            port,
            mode: checked.mode,
            digest,
            secret: self.secret.as_bytes().to_vec(),
            sign_header,
            headers: checked.headers,
            upstream,
            file_root: self.file_root().cloned(),
            tls,
            bind_address: self.bind_address,
            log_level: self.log_level.clone(),
            connect_timeout_secs: self.connect_timeout_secs,
            metrics_address: self.metrics_address,
        })
    }
}

fn check_mode(c: &mut Checked<'_>) {
    let upstream_set = c.opts.upstream().is_some();
    let file_root_set = c.opts.file_root().is_some();

    if !(upstream_set || file_root_set || c.opts.auth) {
        c.report.push("neither upstream, file-root, nor auth specified");
    } else if upstream_set && file_root_set {
        c.report.push("both upstream and file-root specified");
    }
    if file_root_set && !c.opts.auth {
        c.report.push("auth must be specified with file-root");
    }
}

fn check_port(c: &mut Checked<'_>) {
    if c.opts.port <= 0 {
        c.report.push("port must be specified and greater than zero");
    } else if c.opts.port > i64::from(u16::MAX) {
        c.report.push(format!("invalid port: {}", c.opts.port));
    }
}

fn check_auth_params(c: &mut Checked<'_>) {
    match c.opts.digest.parse::<DigestAlgorithm>() {
        Ok(digest) => c.digest = Some(digest),
        Err(e) => c.report.push(e.to_string()),
    }

    if c.opts.secret.is_empty() {
        c.report.push("no secret specified");
    }

    if c.opts.sign_header.is_empty() {
        c.report.push("no signature header specified");
    } else {
        match HeaderName::from_bytes(c.opts.sign_header.as_bytes()) {
            Ok(name) => c.sign_header = Some(name),
            Err(_) => c
                .report
                .push(format!("invalid header name: {}", c.opts.sign_header)),
        }
    }

    let opts = c.opts;
    for name in opts.covered_headers() {
        match HeaderName::from_bytes(name.as_bytes()) {
            Ok(header) => c.headers.push(header),
            Err(_) => c.report.push(format!("invalid header name: {}", name)),
        }
    }
}

fn check_upstream(c: &mut Checked<'_>) {
    let Some(raw) = c.opts.upstream() else {
        return;
    };

    match Url::parse(raw) {
        Ok(url) => {
            let scheme = url.scheme();
            if scheme != "http" && scheme != "https" {
                c.report.push(format!("invalid upstream scheme: {}", scheme));
            }
            if url.host_str().map_or(true, str::is_empty) {
                c.report.push("upstream host not specified");
            }
            let path = request_uri(&url);
            if path != "/" {
                c.report
                    .push(format!("upstream path must be \"/\", not {}", path));
            }
            c.upstream = Some(url);
        }
        Err(ParseError::RelativeUrlWithoutBase) => {
            c.report.push("upstream scheme not specified");
            c.report.push("upstream host not specified");
            let path = raw.split('#').next().unwrap_or_default();
            if !path.is_empty() && path != "/" {
                c.report
                    .push(format!("upstream path must be \"/\", not {}", path));
            }
        }
        Err(ParseError::EmptyHost) => c.report.push("upstream host not specified"),
        Err(e) => c
            .report
            .push(format!("upstream URL failed to parse: {}", e)),
    }
}

/// Path plus query, with an empty path read as "/".
fn request_uri(url: &Url) -> String {
    let mut uri = match url.path() {
        "" => "/".to_string(),
        path => path.to_string(),
    };
    if let Some(query) = url.query() {
        uri.push('?');
        uri.push_str(query);
    }
    uri
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Dir,
    File,
}

fn check_existence_and_permission(
    report: &mut ValidationReport,
    path: &Path,
    option: &str,
    expect: Expect,
) {
    let shown = path.display();
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            report.push(io_problem(option, path, &e));
            return;
        }
    };

    let readable = match expect {
        Expect::Dir if !metadata.is_dir() => {
            report.push(format!("{} is not a directory: {}", option, shown));
            return;
        }
        Expect::File if !metadata.is_file() => {
            report.push(format!("{} is not a regular file: {}", option, shown));
            return;
        }
        Expect::Dir => fs::read_dir(path).map(|_| ()),
        Expect::File => fs::File::open(path).map(|_| ()),
    };

    if let Err(e) = readable {
        report.push(io_problem(option, path, &e));
    }
}

/// Message for a path that could not be inspected or opened.
fn io_problem(option: &str, path: &Path, e: &std::io::Error) -> String {
    let shown = path.display();
    match e.kind() {
        ErrorKind::NotFound => format!("{} does not exist: {}", option, shown),
        ErrorKind::PermissionDenied => format!("{} permission is denied: {}", option, shown),
        _ => format!("{} cannot be inspected: {}: {}", option, shown, e),
    }
}

fn check_file_root(c: &mut Checked<'_>) {
    if let Some(root) = c.opts.file_root() {
        check_existence_and_permission(&mut c.report, root, "file-root", Expect::Dir);
    }
}

fn check_tls(c: &mut Checked<'_>) {
    let cert: Option<&PathBuf> = c.opts.ssl_cert();
    let key: Option<&PathBuf> = c.opts.ssl_key();

    match (cert, key) {
        (None, None) => return,
        (Some(_), Some(_)) => {}
        _ => c
            .report
            .push("ssl-cert and ssl-key must both be specified, or neither must be"),
    }

    if let Some(cert) = cert {
        check_existence_and_permission(&mut c.report, cert, "ssl-cert", Expect::File);
    }
    if let Some(key) = key {
        check_existence_and_permission(&mut c.report, key, "ssl-key", Expect::File);
    }
}
