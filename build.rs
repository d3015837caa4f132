//! Build script stamping the monitor binary with version and commit.
//!
//! Environment variables (fall back to defaults when unset):
//! - KNOBS_VERSION: version string (defaults to CARGO_PKG_VERSION)
//! - KNOBS_GIT_SHA: short commit SHA (defaults to `git rev-parse --short HEAD`)

use std::process::Command;

fn main() {
    let version = std::env::var("KNOBS_VERSION").unwrap_or_else(|_| {
        std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "unknown".into())
    });
    println!("cargo:rustc-env=KNOBS_VERSION={}", version);

    let git_sha = std::env::var("KNOBS_GIT_SHA").unwrap_or_else(|_| git_short_sha());
    println!("cargo:rustc-env=KNOBS_GIT_SHA={}", git_sha);

    println!("cargo:rerun-if-env-changed=KNOBS_VERSION");
    println!("cargo:rerun-if-env-changed=KNOBS_GIT_SHA");
}

fn git_short_sha() -> String {
    Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".into())
}
