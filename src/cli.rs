//! Command-line interface.
//!
//! Flags mirror [`ProxyOptions`]. When `--config` names a TOML file its values
//! are loaded first and any flag given on the command line overrides them.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

use crate::config::{load_options, ConfigError, ProxyOptions};

#[derive(Debug, Parser)]
#[command(name = "hmac-proxy")]
#[command(about = "Signs outgoing or authenticates incoming HTTP requests with an HMAC", long_about = None)]
pub struct Cli {
    /// TOML file with default option values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Port on which to listen for requests
    #[arg(long, allow_negative_numbers = true)]
    pub port: Option<i64>,

    /// Authenticate requests rather than signing them
    #[arg(long)]
    pub auth: bool,

    /// Hash algorithm to use when signing requests [default: sha1]
    #[arg(long)]
    pub digest: Option<String>,

    /// Secret key
    #[arg(long)]
    pub secret: Option<String>,

    /// Header containing request signature
    #[arg(long)]
    pub sign_header: Option<String>,

    /// Headers to factor into the signature, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub headers: Option<Vec<String>>,

    /// Signed/authenticated requests are proxied to this server
    #[arg(long)]
    pub upstream: Option<String>,

    /// Root of file system from which to serve documents
    #[arg(long)]
    pub file_root: Option<PathBuf>,

    /// Path to the server's SSL certificate
    #[arg(long)]
    pub ssl_cert: Option<PathBuf>,

    /// Path to the key for --ssl-cert
    #[arg(long)]
    pub ssl_key: Option<PathBuf>,

    /// Interface to listen on [default: 127.0.0.1]
    #[arg(long)]
    pub bind_address: Option<IpAddr>,

    /// Log level when RUST_LOG is unset [default: info]
    #[arg(long)]
    pub log_level: Option<String>,

    /// Upstream connect timeout in seconds [default: 10]
    #[arg(long)]
    pub connect_timeout_secs: Option<u64>,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    pub metrics_address: Option<SocketAddr>,
}

impl Cli {
    /// Resolve the final options: config file (if any), then flags.
    pub fn into_options(self) -> Result<ProxyOptions, ConfigError> {
        let base = match &self.config {
            Some(path) => load_options(path)?,
            None => ProxyOptions::default(),
        };
        Ok(self.apply(base))
    }

    /// Overlay the flags that were given onto `opts`.
    pub fn apply(self, mut opts: ProxyOptions) -> ProxyOptions {
        if let Some(port) = self.port {
            opts.port = port;
        }
        if self.auth {
            opts.auth = true;
        }
        if let Some(digest) = self.digest {
            opts.digest = digest;
        }
        if let Some(secret) = self.secret {
            opts.secret = secret;
        }
        if let Some(sign_header) = self.sign_header {
            opts.sign_header = sign_header;
        }
        if let Some(headers) = self.headers {
            opts.headers = headers;
        }
        if self.upstream.is_some() {
            opts.upstream = self.upstream;
        }
        if self.file_root.is_some() {
            opts.file_root = self.file_root;
        }
        if self.ssl_cert.is_some() {
            opts.ssl_cert = self.ssl_cert;
        }
        if self.ssl_key.is_some() {
            opts.ssl_key = self.ssl_key;
        }
        if let Some(addr) = self.bind_address {
            opts.bind_address = addr;
        }
        if let Some(level) = self.log_level {
            opts.log_level = level;
        }
        if let Some(secs) = self.connect_timeout_secs {
            opts.connect_timeout_secs = secs;
        }
        if self.metrics_address.is_some() {
            opts.metrics_address = self.metrics_address;
        }
        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;

    fn parse(args: &[&str]) -> ProxyOptions {
        let argv = std::iter::once("hmac-proxy").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap().into_options().unwrap()
    }

    #[test]
    fn test_defaults() {
        let opts = parse(&[
            "--secret=foobar",
            "--sign-header=Test-Signature",
            "--upstream=https://localhost:8080/",
        ]);
        assert_eq!(opts.digest, "sha1");
        assert!(!opts.auth);
        let config = opts.validate().unwrap_err();
        // port is required
        assert_eq!(config.messages(), ["port must be specified and greater than zero"]);
    }

    #[test]
    fn test_overrides() {
        let opts = parse(&[
            "--secret=foobar",
            "--sign-header=Test-Signature",
            "--auth",
            "--port=8080",
            "--digest=md5",
            "--headers=Content-Type,Date,Gap-Auth",
        ]);
        assert_eq!(opts.port, 8080);
        assert_eq!(opts.digest, "md5");
        assert_eq!(opts.headers, ["Content-Type", "Date", "Gap-Auth"]);
        assert_eq!(opts.validate().unwrap().mode, Mode::AuthenticateOnly);
    }

    #[test]
    fn test_negative_port_is_reported_not_rejected() {
        let opts = parse(&["--port", "-1", "--auth", "--secret=s", "--sign-header=h"]);
        assert_eq!(opts.port, -1);
        assert_eq!(
            opts.validate().unwrap_err().messages(),
            ["port must be specified and greater than zero"]
        );
    }

    #[test]
    fn test_flags_override_file_values() {
        let base = ProxyOptions {
            port: 9000,
            secret: "from-file".into(),
            headers: vec!["Date".into()],
            ..ProxyOptions::default()
        };
        let cli = Cli::try_parse_from(["hmac-proxy", "--secret", "from-flag"]).unwrap();
        let opts = cli.apply(base);
        assert_eq!(opts.port, 9000);
        assert_eq!(opts.secret, "from-flag");
        assert_eq!(opts.headers, ["Date"]);
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(Cli::try_parse_from(["hmac-proxy", "--bogus"]).is_err());
    }
}
