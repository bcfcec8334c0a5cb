//! CLI arg parsing tests for agentdeck
use std::process::Command;

fn run(args: &[&str], cfg: &std::path::Path) -> (bool, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_agentdeck"))
        .args(args)
        .env("XDG_CONFIG_HOME", cfg)
        .env("XDG_STATE_HOME", cfg)
        .output()
        .expect("run agentdeck");
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    (output.status.success(), text)
}

#[test]
fn test_help_mentions_short_and_long_flags() {
    let td = tempfile::tempdir().unwrap();
    let (ok, text) = run(&["--help"], td.path());
    assert!(ok);
    assert!(
        text.contains("--file")
            && text.contains("-f")
            && text.contains("--profile")
            && text.contains("-P")
            && text.contains("--refresh"),
        "help text missing expected flags\n{text}"
    );
}

#[test]
fn test_flags_accepted_with_help() {
    let td = tempfile::tempdir().unwrap();
    for args in [
        &["--file", "/tmp/fleet.json", "--help"][..],
        &["-f", "/tmp/fleet.json", "--help"][..],
        &["--profile", "dev", "--help"][..],
        &["-r", "5", "--help"][..],
    ] {
        let (ok, text) = run(args, td.path());
        assert!(ok, "{args:?} did not succeed");
        assert!(text.contains("Usage:"), "{args:?}: {text}");
    }
}

#[test]
fn test_bad_refresh_reports_usage() {
    let td = tempfile::tempdir().unwrap();
    let (ok, text) = run(&["--refresh", "soon"], td.path());
    assert!(ok);
    assert!(text.contains("Invalid refresh interval"), "{text}");
}

#[test]
fn test_demo_dry_run_resolves_without_profiles() {
    let td = tempfile::tempdir().unwrap();
    let (ok, text) = run(&["--demo", "--dry-run"], td.path());
    assert!(ok);
    assert!(text.contains("source: demo"), "{text}");
    assert!(!td.path().join("agentdeck").join("profiles.json").exists());
}

#[test]
fn test_no_source_and_no_profiles_exits_cleanly() {
    let td = tempfile::tempdir().unwrap();
    let (ok, text) = run(&["--dry-run"], td.path());
    assert!(ok);
    assert!(text.contains("no profiles"), "{text}");
}

#[test]
fn test_help_exits_zero() {
    let td = tempfile::tempdir().unwrap();
    assert_cmd::Command::cargo_bin("agentdeck")
        .unwrap()
        .arg("--help")
        .env("XDG_CONFIG_HOME", td.path())
        .assert()
        .success();
}
