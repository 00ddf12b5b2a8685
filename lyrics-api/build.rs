//! Stamps the lyrics-api binary with GIT_HASH, BUILD_TIMESTAMP and
//! BUILD_PROFILE for `/build_info` and the startup log line.
//!
//! No rerun-if-changed directives: the script runs on every build so the
//! stamp never goes stale.

use std::process::Command;

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_string())
}

fn stamp(key: &str, value: &str) {
    println!("cargo:rustc-env={}={}", key, value);
}

fn main() {
    stamp("GIT_HASH", git_short_hash().as_deref().unwrap_or("unknown"));
    stamp(
        "BUILD_TIMESTAMP",
        &chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false),
    );
    stamp(
        "BUILD_PROFILE",
        &std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string()),
    );
}
