use clap::Parser;
use fdedup::cli::{ApplyMode, Cli};
use fdedup::config::{Config, ConfigError};
use std::fs;
use tempfile::tempdir;

use crate::{clear_env, ENV_MUTEX};

#[test]
fn test_config_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
min_size = 1
max_size = 2048
apply = "merge"
io_threads = 2
progress = false
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();

    assert_eq!(config.min_size, 1);
    assert_eq!(config.max_size, 2048);
    assert_eq!(config.apply, ApplyMode::Merge);
    assert_eq!(config.io_threads, 2);
    assert!(!config.progress);
}

#[test]
fn test_config_partial_toml_keeps_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "apply = \"print\"\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();

    assert_eq!(config.apply, ApplyMode::Report);
    assert_eq!(config.min_size, Config::default().min_size);
    assert_eq!(config.max_size, Config::default().max_size);
}

#[test]
fn test_env_overrides_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "min_size = 100\nio_threads = 2\n").unwrap();

    std::env::set_var("FDEDUP_MIN_SIZE", "5");
    std::env::set_var("FDEDUP_APPLY", "plan");
    let config = Config::load(Some(&path));
    clear_env();
    let config = config.unwrap();

    assert_eq!(config.min_size, 5);
    assert_eq!(config.io_threads, 2);
    assert_eq!(config.apply, ApplyMode::Plan);
}

#[test]
fn test_cli_overrides_env_and_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "max_size = 100\napply = \"merge\"\n").unwrap();
    std::env::set_var("FDEDUP_IO_THREADS", "8");

    let cli = Cli::try_parse_from([
        "fdedup",
        "--max-size",
        "1KiB",
        "--io-threads",
        "3",
        "--apply",
        "report",
        "--no-progress",
    ])
    .unwrap();
    let config = Config::load(Some(&path));
    clear_env();
    let mut config = config.unwrap();
    config.apply_cli(&cli);

    assert_eq!(config.max_size, 1024);
    assert_eq!(config.io_threads, 3);
    assert_eq!(config.apply, ApplyMode::Report);
    assert!(!config.progress);
}

#[test]
fn test_invalid_toml_is_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "min_size = \"lots\"\n").unwrap();

    assert!(matches!(Config::load(Some(&path)), Err(ConfigError::Load(_))));
}

#[test]
fn test_unknown_apply_mode_in_env_is_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "").unwrap();

    std::env::set_var("FDEDUP_APPLY", "shred");
    let result = Config::load(Some(&path));
    clear_env();

    assert!(result.is_err());
}

#[test]
fn test_validation_after_layering() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "min_size = 4096\n").unwrap();

    let cli = Cli::try_parse_from(["fdedup", "-M", "10"]).unwrap();
    let mut config = Config::load(Some(&path)).unwrap();
    config.apply_cli(&cli);

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidSizeRange { min: 4096, max: 10 })
    ));

    let cli = Cli::try_parse_from(["fdedup", "--io-threads", "0"]).unwrap();
    let mut config = Config::default();
    config.apply_cli(&cli);
    assert!(matches!(config.validate(), Err(ConfigError::InvalidThreads)));
}
