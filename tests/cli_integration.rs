//! Integration tests for the tfi binary.
//!
//! Every case here fails or finishes before any network call is made.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A command for running tfi in `dir` with no user config or tokens.
fn tfi(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tfi").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("TFI_CONFIG")
        .env_remove("GITLAB_TOKEN")
        .env_remove("CI_JOB_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

mod flags {
    use super::*;

    #[test]
    fn help_lists_options() {
        let dir = TempDir::new().unwrap();
        tfi(dir.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--no-init"))
            .stdout(predicate::str::contains("--backend-mode"));
    }

    #[test]
    fn version_flag_works() {
        let dir = TempDir::new().unwrap();
        tfi(dir.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("tfi"));
    }

    #[test]
    fn missing_name_is_reported_with_marker() {
        let dir = TempDir::new().unwrap();
        tfi(dir.path())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("ERROR: missing required arg: NAME"));
    }

    #[test]
    fn unknown_backend_mode_is_rejected() {
        let dir = TempDir::new().unwrap();
        tfi(dir.path())
            .args(["prod", "--backend-mode", "inline"])
            .assert()
            .failure();
    }

    #[test]
    fn invalid_region_is_reported() {
        let dir = TempDir::new().unwrap();
        tfi(dir.path())
            .args(["prod", "-r", "Not A Region"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("invalid region 'Not A Region'"));
    }
}

mod config {
    use super::*;

    #[test]
    fn unknown_repo_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".tfi.toml"), "colour = \"blue\"\n").unwrap();

        tfi(dir.path())
            .arg("prod")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("ERROR:"))
            .stderr(predicate::str::contains(".tfi.toml"));
    }

    #[test]
    fn cwd_flag_selects_module() {
        let module = TempDir::new().unwrap();
        fs::write(module.path().join("broken.tf"), "variable \"x\" {\n").unwrap();
        let elsewhere = TempDir::new().unwrap();

        tfi(elsewhere.path())
            .arg("prod")
            .arg("--cwd")
            .arg(module.path())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("broken.tf"));
    }
}

mod failures {
    use super::*;

    #[test]
    fn malformed_module_file_names_the_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("variables.tf"), "variable \"x\" {\n").unwrap();

        tfi(dir.path())
            .args(["prod", "-n"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("ERROR:"))
            .stderr(predicate::str::contains("variables.tf"));
        assert!(!dir.path().join("tfi.auto.tfvars").exists());
    }

    #[test]
    fn malformed_var_file_after_progress_line() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("tfvars")).unwrap();
        fs::write(dir.path().join("tfvars/prod.tfvars"), "db = \n").unwrap();

        tfi(dir.path())
            .args(["prod", "-n"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Loading tfvars:"))
            .stderr(predicate::str::contains("prod.tfvars"));
    }

    #[test]
    fn quiet_hides_progress() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("tfvars")).unwrap();
        fs::write(dir.path().join("tfvars/prod.tfvars"), "db = \n").unwrap();

        tfi(dir.path())
            .args(["prod", "-n", "-q"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Loading tfvars:").not())
            .stderr(predicate::str::contains("ERROR:"));
    }

    #[test]
    fn remote_vars_without_token_is_reported() {
        let dir = TempDir::new().unwrap();

        tfi(dir.path())
            .args(["prod", "-n", "--project-path", "team/infra"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("GITLAB_TOKEN"));
        assert!(!dir.path().join("tfi.auto.tfvars").exists());
    }
}
