//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use hmac_proxy::config::ProxyOptions;
use hmac_proxy::http::HttpServer;
use tokio::net::TcpListener;

/// Options with the given flags applied.
///
/// The command line requires a positive port, but test servers bind
/// ephemeral ports, so a placeholder port is filled in.
#[allow(dead_code)]
pub fn options(args: &[&str]) -> ProxyOptions {
    use clap::Parser;
    let argv = std::iter::once("hmac-proxy").chain(args.iter().copied());
    let cli = hmac_proxy::cli::Cli::try_parse_from(argv).expect("invalid test flags");
    let mut opts = cli.into_options().expect("options");
    opts.port = 1;
    opts
}

/// Start a gateway for `args` on an ephemeral port.
///
/// Returns its base URL and description.
#[allow(dead_code)]
pub async fn start_gateway(args: &[&str]) -> (String, String) {
    let config = options(args).validate().expect("valid test config");
    let server = HttpServer::new(&config).expect("server");
    let description = server.description().to_string();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.run(listener, std::future::pending()).await;
    });

    (format!("http://{}", addr), description)
}

/// Start a plain backend serving `app` on an ephemeral port.
#[allow(dead_code)]
pub async fn start_backend(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

/// Client that never goes through a system proxy.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}
