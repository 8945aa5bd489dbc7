//! Stamps the binary with `GIT_HASH`, `BUILD_TIMESTAMP` and `BUILD_PROFILE`
//!
//! `SOURCE_DATE_EPOCH` pins the timestamp for reproducible builds. The script
//! reruns when the checked-out commit moves.

use chrono::{DateTime, SecondsFormat, Utc};
use std::path::Path;
use std::process::Command;

fn main() {
    emit("GIT_HASH", &git_revision().unwrap_or_else(|| "unknown".to_string()));
    emit("BUILD_TIMESTAMP", &build_time().to_rfc3339_opts(SecondsFormat::Secs, true));
    emit("BUILD_PROFILE", &std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string()));

    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    for tracked in ["../.git/HEAD", "../.git/index"] {
        if Path::new(tracked).exists() {
            println!("cargo:rerun-if-changed={}", tracked);
        }
    }
}

fn emit(key: &str, value: &str) {
    println!("cargo:rustc-env={}={}", key, value);
}

/// Short commit id with a `-dirty` suffix for uncommitted changes
fn git_revision() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty", "--abbrev=8", "--exclude=*"])
        .output()
        .ok()
        .filter(|o| o.status.success())?;

    let revision = String::from_utf8(output.stdout).ok()?;
    let revision = revision.trim();
    (!revision.is_empty()).then(|| revision.to_string())
}

fn build_time() -> DateTime<Utc> {
    std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|secs| secs.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now)
}
