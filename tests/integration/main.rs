//! Integration tests for shellcache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    // Nothing listens here, so any network attempt fails fast
    const ORIGIN: &str = "http://127.0.0.1:9";

    const BUNDLE: &str = r#"{
        "resources": {
            "/": "5151c849",
            "index.html": "5151c849",
            "main.dart.js": "f791ccaa"
        },
        "core": []
    }"#;

    fn shellcache() -> Command {
        cargo_bin_cmd!("shellcache")
    }

    /// Command isolated in a temp dir with its own config, bundle and store
    fn isolated(dir: &Path) -> Command {
        let bundle = dir.join("shell-bundle.json");
        if !bundle.exists() {
            std::fs::write(&bundle, BUNDLE).unwrap();
        }

        let mut cmd = shellcache();
        cmd.env("SHELLCACHE_CONFIG", dir.join("config.toml"))
            .arg("--origin")
            .arg(ORIGIN)
            .arg("--bundle")
            .arg(&bundle)
            .arg("--store")
            .arg(dir.join("caches"));
        cmd
    }

    #[test]
    fn help_displays() {
        shellcache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Offline cache synchronizer"));
    }

    #[test]
    fn version_displays() {
        shellcache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("shellcache"));
    }

    #[test]
    fn config_path_follows_flag() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        shellcache()
            .arg("--config")
            .arg(&path)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("custom.toml"));
    }

    #[test]
    fn config_show_includes_overrides() {
        let temp = TempDir::new().unwrap();
        isolated(temp.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[storage]"))
            .stdout(predicate::str::contains(ORIGIN));
    }

    #[test]
    fn config_init_writes_file_once() {
        let temp = TempDir::new().unwrap();
        isolated(temp.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));
        assert!(temp.path().join("config.toml").exists());

        isolated(temp.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn missing_bundle_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        shellcache()
            .env("SHELLCACHE_CONFIG", temp.path().join("config.toml"))
            .arg("--bundle")
            .arg(temp.path().join("absent.json"))
            .arg("--store")
            .arg(temp.path().join("caches"))
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("--bundle"));
    }

    #[test]
    fn invalid_origin_flag_is_rejected() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("shell-bundle.json"), BUNDLE).unwrap();
        shellcache()
            .env("SHELLCACHE_CONFIG", temp.path().join("config.toml"))
            .arg("--bundle")
            .arg(temp.path().join("shell-bundle.json"))
            .args(["--origin", "not a url", "status"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn status_before_first_activation() {
        let temp = TempDir::new().unwrap();
        isolated(temp.path())
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Listed resources"))
            .stdout(predicate::str::contains("first install"));
    }

    #[test]
    fn status_json_lists_missing_keys() {
        let temp = TempDir::new().unwrap();
        isolated(temp.path())
            .args(["status", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"missing\""))
            .stdout(predicate::str::contains("main.dart.js"))
            .stdout(predicate::str::contains("\"stored_manifest\": null"));
    }

    #[test]
    fn update_with_empty_core_needs_no_network() {
        let temp = TempDir::new().unwrap();
        isolated(temp.path())
            .arg("update")
            .assert()
            .success()
            .stdout(predicate::str::contains("Staged 0 core resources"))
            .stdout(predicate::str::contains("Fresh install"));

        isolated(temp.path())
            .args(["status", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"stored_manifest\": 3"));
    }

    #[test]
    fn second_activation_is_an_upgrade() {
        let temp = TempDir::new().unwrap();
        isolated(temp.path()).arg("activate").assert().success();
        isolated(temp.path())
            .arg("activate")
            .assert()
            .success()
            .stdout(predicate::str::contains("Upgraded"));
    }

    #[test]
    fn unlisted_fetch_passes_through() {
        let temp = TempDir::new().unwrap();
        isolated(temp.path())
            .args(["fetch", "api/scores"])
            .assert()
            .success()
            .stderr(predicate::str::contains("not intercepted"));
    }

    #[test]
    fn non_get_fetch_passes_through() {
        let temp = TempDir::new().unwrap();
        isolated(temp.path())
            .args(["fetch", "-X", "POST", "main.dart.js"])
            .assert()
            .success()
            .stderr(predicate::str::contains("not intercepted"));
    }

    #[test]
    fn offline_cache_miss_fails() {
        let temp = TempDir::new().unwrap();
        isolated(temp.path())
            .args(["fetch", "main.dart.js"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn skip_waiting_message() {
        let temp = TempDir::new().unwrap();
        isolated(temp.path())
            .args(["message", "skip-waiting"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Skip-waiting requested"));
    }

    #[test]
    fn reset_with_yes_deletes_caches() {
        let temp = TempDir::new().unwrap();
        isolated(temp.path()).arg("activate").assert().success();
        assert!(temp.path().join("caches").join("shell-app-manifest").exists());

        isolated(temp.path())
            .args(["reset", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("All offline caches deleted"));
        assert!(!temp.path().join("caches").join("shell-app-manifest").exists());
    }
}
