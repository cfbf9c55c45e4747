use clap::Parser;
use fdedup::cli::Cli;
use fdedup::error::ExitCode;
use fdedup::run_app;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use crate::{clear_env, ENV_MUTEX};

fn run(dir: &Path, extra: &[&str]) -> anyhow::Result<ExitCode> {
    let config = dir.join("fdedup.toml");
    if !config.exists() {
        fs::write(&config, "").unwrap();
    }
    let root = dir.join("data");
    let mut args = vec![
        "fdedup".to_string(),
        "-q".to_string(),
        "--config".to_string(),
        config.display().to_string(),
        "--min-size".to_string(),
        "1".to_string(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));
    args.push(root.display().to_string());
    run_app(Cli::try_parse_from(args).unwrap())
}

fn setup() -> tempfile::TempDir {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("data")).unwrap();
    dir
}

#[test]
fn test_no_duplicates_exit_code() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = setup();
    fs::write(dir.path().join("data/a"), b"one").unwrap();
    fs::write(dir.path().join("data/b"), b"two!").unwrap();

    assert_eq!(run(dir.path(), &[]).unwrap(), ExitCode::Success);
}

#[test]
fn test_report_exit_code() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = setup();
    fs::write(dir.path().join("data/a"), b"same").unwrap();
    fs::write(dir.path().join("data/b"), b"same").unwrap();

    assert_eq!(run(dir.path(), &["-a", "report"]).unwrap(), ExitCode::Success);
    // Report changes nothing
    assert_eq!(run(dir.path(), &[]).unwrap(), ExitCode::Success);
}

#[test]
fn test_repeated_merge_succeeds() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = setup();
    fs::write(dir.path().join("data/a"), b"same").unwrap();
    fs::write(dir.path().join("data/b"), b"same").unwrap();

    assert_eq!(run(dir.path(), &["-a", "merge"]).unwrap(), ExitCode::Success);
    // Nothing left to merge is still a clean run
    assert_eq!(run(dir.path(), &["-a", "merge"]).unwrap(), ExitCode::Success);
}

#[test]
fn test_merge_conflict_is_partial_success() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = setup();
    fs::write(dir.path().join("data/a"), b"same").unwrap();
    fs::write(dir.path().join("data/b"), b"same").unwrap();
    // Different size from a/b so it is not part of their group
    fs::write(dir.path().join("data/b.fdup-bak"), b"squatter").unwrap();

    assert_eq!(
        run(dir.path(), &["-a", "merge"]).unwrap(),
        ExitCode::PartialSuccess
    );
}

#[test]
fn test_invalid_range_fails_before_scan() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = setup();

    let err = run(dir.path(), &["--max-size", "0"]).unwrap_err();
    assert!(err.to_string().contains("minimum size 1 is greater than maximum size 0"));
}

#[test]
fn test_missing_root_fails() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();

    let err = run(dir.path(), &[]).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to scan"));
}
