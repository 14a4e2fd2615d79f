//! Process-level checks of the `hmac-proxy` binary.

use std::process::Command;

fn run(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_hmac-proxy"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("binary runs")
}

#[test]
fn no_flags_reports_every_problem_and_fails() {
    let output = run(&[]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid options:"));
    assert!(stderr.contains("  port must be specified and greater than zero"));
    assert!(stderr.contains("  no secret specified"));
    assert!(stderr.contains("  no signature header specified"));
    assert!(stderr.contains("  neither upstream, file-root, nor auth specified"));
}

#[test]
fn unreadable_config_file_fails() {
    let output = run(&["--config", "/nonexistent/hmac-proxy.toml"]);
    assert!(!output.status.success());
    assert!(!output.stderr.is_empty());
}

#[test]
fn conflicting_tls_flags_fail_before_listening() {
    let output = run(&[
        "--port=8080",
        "--auth",
        "--secret=foobar",
        "--sign-header=Test-Signature",
        "--ssl-cert=/nonexistent/cert.pem",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid options:"));
}
