//! Shared helpers for campaign integration tests

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lexfuzz_core::campaign::CampaignConfig;

/// Write an executable shell script acting as the subject under test
///
/// # Example
/// ```ignore
/// let subject = write_subject(dir.path(), "ok", "exit 0");
/// ```
pub fn write_subject(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Subject that accepts every input
pub fn accepting_subject(dir: &Path) -> PathBuf {
    write_subject(dir, "accept.sh", "exit 0")
}

/// Subject that prints diagnostics and exits with `code`
pub fn rejecting_subject(dir: &Path, code: i32) -> PathBuf {
    write_subject(
        dir,
        "reject.sh",
        &format!("echo \"scanning $1\"\necho \"unterminated string\" >&2\nexit {}", code),
    )
}

/// Subject that never finishes on its own
pub fn hanging_subject(dir: &Path) -> PathBuf {
    write_subject(dir, "hang.sh", "exec sleep 30")
}

/// Campaign configuration writing into `dir/out` with a short timeout
pub fn config_for(subject: PathBuf, dir: &Path, num_tests: usize) -> CampaignConfig {
    CampaignConfig {
        subject,
        output_dir: dir.join("out"),
        num_tests,
        max_length: 200,
        timeout: Duration::from_millis(500),
        seed: Some(1234),
        ..Default::default()
    }
}

/// Lines of the campaign log that record a finished test
pub fn test_lines(log: &str) -> Vec<String> {
    log.lines()
        .filter(|l| l.starts_with("Test ") && l.contains("(Size: "))
        .map(str::to_string)
        .collect()
}
