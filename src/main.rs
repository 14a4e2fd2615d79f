//! HMAC gateway (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!   flags / TOML ──▶ ProxyOptions ──▶ validation ──▶ ProxyConfig (+ Mode)
//!                                         │
//!                                         ▼ (any problem: print report, exit 1)
//!                                    dispatcher
//!                                         │
//!            ┌──────────────┬─────────────┼──────────────┬───────────────┐
//!            ▼              ▼             ▼              ▼               │
//!      sign + proxy   auth + proxy   auth + files    auth only          │
//!            │              │             │          202 / 401          │
//!            ▼              ▼             ▼                             │
//!        upstream       upstream     file root                          │
//! ```

use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use hmac_proxy::cli::Cli;
use hmac_proxy::http::HttpServer;
use hmac_proxy::lifecycle::shutdown_signal;
use hmac_proxy::net::tls::load_tls_config;
use hmac_proxy::observability::{logging, metrics};

#[tokio::main]
async fn main() -> ExitCode {
    let options = match Cli::parse().into_options() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init(&options.log_level);

    let config = match options.validate() {
        Ok(config) => config,
        Err(report) => {
            tracing::error!(problems = report.len(), "Invalid configuration");
            eprintln!("{}", report);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        mode = %config.mode,
        digest = %config.digest,
        sign_header = %config.sign_header,
        covered_headers = config.headers.len(),
        "Configuration loaded"
    );

    if let Some(addr) = config.metrics_address {
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(metrics_address = %addr, error = %e, "Failed to start metrics exporter");
        }
    }

    let server = match HttpServer::new(&config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build request handler");
            return ExitCode::FAILURE;
        }
    };

    let result = match &config.tls {
        Some(tls) => {
            let tls_config = match load_tls_config(&tls.cert, &tls.key).await {
                Ok(tls_config) => tls_config,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to load TLS configuration");
                    return ExitCode::FAILURE;
                }
            };
            let address = config.socket_addr();
            println!("{}: {}", address, server.description());
            server.run_tls(address, tls_config, shutdown_signal()).await
        }
        None => {
            let listener = match TcpListener::bind(config.socket_addr()).await {
                Ok(listener) => listener,
                Err(e) => {
                    tracing::error!(address = %config.socket_addr(), error = %e, "Listening failed");
                    return ExitCode::FAILURE;
                }
            };
            match listener.local_addr() {
                Ok(address) => println!("{}: {}", address, server.description()),
                Err(e) => tracing::warn!(error = %e, "Could not read local address"),
            }
            server.run(listener, shutdown_signal()).await
        }
    };

    match result {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}
