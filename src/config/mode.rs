//! Operating mode derivation.

use std::fmt;

/// The request-handling behavior selected by a configuration.
///
/// Never set directly: it is derived once during validation from the auth
/// flag and which of upstream/file-root were supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Sign every request, then proxy it upstream.
    SignAndForward,
    /// Authenticate every request, then proxy it upstream.
    AuthenticateAndForward,
    /// Authenticate every request, then serve it from the local file root.
    AuthenticateForFiles,
    /// Authenticate every request and answer 202 or 401.
    AuthenticateOnly,
}

impl Mode {
    /// Derive the mode from the three inputs that decide it.
    pub fn derive(require_auth: bool, upstream_set: bool, file_root_set: bool) -> Self {
        if !require_auth {
            Mode::SignAndForward
        } else if upstream_set {
            Mode::AuthenticateAndForward
        } else if file_root_set {
            Mode::AuthenticateForFiles
        } else {
            Mode::AuthenticateOnly
        }
    }

    /// Short label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::SignAndForward => "sign_and_forward",
            Mode::AuthenticateAndForward => "auth_and_forward",
            Mode::AuthenticateForFiles => "auth_for_files",
            Mode::AuthenticateOnly => "auth_only",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
