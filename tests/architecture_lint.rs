//! Architecture enforcement tests.
//!
//! Each external collaborator has exactly one doorway module. These tests
//! read the source tree and fail when a crate-level dependency leaks past
//! its doorway.
//!
//! # Doorways
//!
//! - `git2`: `src/git/`
//! - `reqwest`: `src/forge/`
//! - `aws_sdk_ssm` / `aws_config`: `src/accounts/`
//! - `anyhow`: `src/cli/` and `src/main.rs`
//! - `std::process`: `src/engine/init.rs` (and `src/main.rs` for the exit code)

use std::fs;
use std::path::{Path, PathBuf};

/// Every `.rs` file under `dir`, recursively.
fn rust_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(entries) = fs::read_dir(dir) else {
        return files;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            files.extend(rust_files(&path));
        } else if path.extension().is_some_and(|e| e == "rs") {
            files.push(path);
        }
    }
    files.sort();
    files
}

fn src_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src")
}

/// Source without `#[cfg(test)]` modules, which may use anything.
fn production_source(path: &Path) -> String {
    let content = fs::read_to_string(path).unwrap();
    match content.find("#[cfg(test)]") {
        Some(idx) => content[..idx].to_string(),
        None => content,
    }
}

/// Files outside `allowed` that mention `needle`.
fn violations(needle: &str, allowed: &[&str]) -> Vec<String> {
    let root = src_root();
    rust_files(&root)
        .into_iter()
        .filter_map(|path| {
            let relative = path
                .strip_prefix(&root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            if allowed.iter().any(|a| relative.starts_with(a)) {
                return None;
            }
            production_source(&path)
                .contains(needle)
                .then_some(relative)
        })
        .collect()
}

#[test]
fn git2_stays_in_git_module() {
    let found = violations("git2::", &["git/"]);
    assert!(found.is_empty(), "git2 used outside src/git: {:?}", found);
}

#[test]
fn http_client_stays_in_forge() {
    let found = violations("reqwest", &["forge/"]);
    assert!(found.is_empty(), "reqwest used outside src/forge: {:?}", found);
}

#[test]
fn parameter_store_stays_in_accounts() {
    let mut found = violations("aws_sdk_ssm", &["accounts/"]);
    found.extend(violations("aws_config", &["accounts/"]));
    assert!(found.is_empty(), "AWS SDK used outside src/accounts: {:?}", found);
}

#[test]
fn anyhow_only_at_binary_boundary() {
    let found = violations("anyhow", &["cli/", "main.rs"]);
    assert!(found.is_empty(), "anyhow used below the CLI: {:?}", found);
}

#[test]
fn only_init_spawns_processes() {
    let found = violations("std::process", &["engine/init.rs", "main.rs"]);
    assert!(found.is_empty(), "process spawned outside init: {:?}", found);
}

#[test]
fn lint_sees_the_tree() {
    let files = rust_files(&src_root());
    assert!(files.iter().any(|p| p.ends_with("engine/runner.rs")));
    assert!(files.iter().any(|p| p.ends_with("git/interface.rs")));
}
