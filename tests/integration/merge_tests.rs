use fdedup::actions::{backup_path, merge_groups, MergeError};
use fdedup::duplicates::{DuplicateFinder, FinderConfig};
use fdedup::output::{ReportOutput, ScriptOutput, ScriptType};
use fdedup::scanner::FilesystemAccessor;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn finder() -> DuplicateFinder {
    DuplicateFinder::new(FinderConfig::default().with_size_range(1, u64::MAX))
}

#[cfg(unix)]
fn same_inode(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    let (ma, mb) = (fs::metadata(a).unwrap(), fs::metadata(b).unwrap());
    ma.dev() == mb.dev() && ma.ino() == mb.ino()
}

#[test]
fn test_merge_then_rescan_finds_nothing() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(dir.path().join("a"), b"first content").unwrap();
    fs::write(sub.join("a-copy"), b"first content").unwrap();
    fs::write(sub.join("a-copy2"), b"first content").unwrap();
    fs::write(dir.path().join("b"), b"second").unwrap();
    fs::write(sub.join("b-copy"), b"second").unwrap();
    fs::write(dir.path().join("unique"), b"only one").unwrap();

    let accessor = FilesystemAccessor::new(dir.path());
    let (groups, stat) = finder().find_duplicates(&accessor).unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(stat.duplicate_amount, 3);

    let mut out = Vec::new();
    let summary = merge_groups(&groups, &mut out, &mut Vec::new()).unwrap();
    assert_eq!(summary.merged, 3);
    assert_eq!(summary.merged_size, stat.duplicate_size);
    assert!(!summary.has_conflicts());

    let (groups, stat) = finder().find_duplicates(&accessor).unwrap();
    assert!(groups.is_empty());
    assert_eq!(stat.duplicate_amount, 0);
    assert_eq!(stat.processed_amount, 6);

    // No backup files left behind
    for entry in walkdir::WalkDir::new(dir.path()) {
        let entry = entry.unwrap();
        assert!(!entry.file_name().to_string_lossy().ends_with(".fdup-bak"));
    }
    assert_eq!(fs::read(sub.join("a-copy2")).unwrap(), b"first content");

    #[cfg(unix)]
    {
        assert!(same_inode(&dir.path().join("a"), &sub.join("a-copy")));
        assert!(same_inode(&dir.path().join("b"), &sub.join("b-copy")));
    }
}

#[test]
fn test_merge_conflict_is_reported_and_skipped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"payload").unwrap();
    fs::write(dir.path().join("b"), b"payload").unwrap();

    let accessor = FilesystemAccessor::new(dir.path());
    let (groups, _) = finder().find_duplicates(&accessor).unwrap();
    assert_eq!(groups.len(), 1);

    let squatter = backup_path(&dir.path().join("b"));
    fs::write(&squatter, b"do not touch").unwrap();

    let mut diagnostics = Vec::new();
    let summary = merge_groups(&groups, &mut Vec::new(), &mut diagnostics).unwrap();

    assert_eq!(summary.merged, 0);
    assert!(String::from_utf8(diagnostics)
        .unwrap()
        .starts_with("Can't create temporary file for "));
    assert_eq!(summary.conflicts, vec![dir.path().join("b")]);
    assert_eq!(fs::read(&squatter).unwrap(), b"do not touch");
    assert_eq!(fs::read(dir.path().join("b")).unwrap(), b"payload");
}

#[test]
fn test_merge_rolls_back_when_main_file_vanishes() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"payload").unwrap();
    fs::write(dir.path().join("b"), b"payload").unwrap();

    let accessor = FilesystemAccessor::new(dir.path());
    let (groups, _) = finder().find_duplicates(&accessor).unwrap();
    fs::remove_file(&groups[0].main_file).unwrap();

    let err = merge_groups(&groups, &mut Vec::new(), &mut Vec::new()).unwrap_err();

    assert!(matches!(err, MergeError::Link { .. }));
    assert_eq!(fs::read(dir.path().join("b")).unwrap(), b"payload");
    assert!(!backup_path(&dir.path().join("b")).exists());
}

#[test]
fn test_report_lists_groups() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    fs::write(dir.path().join("b"), b"same").unwrap();

    let accessor = FilesystemAccessor::new(dir.path());
    let (groups, _) = finder().find_duplicates(&accessor).unwrap();

    let mut out = Vec::new();
    ReportOutput::new(&groups).write_to(&mut out).unwrap();

    let expected = format!(
        "{}\n{}\n\n\n",
        dir.path().join("a").display(),
        dir.path().join("b").display()
    );
    assert_eq!(String::from_utf8(out).unwrap(), expected);
}

#[test]
fn test_plan_does_not_modify_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    fs::write(dir.path().join("b"), b"same").unwrap();

    let accessor = FilesystemAccessor::new(dir.path());
    let (groups, stat) = finder().find_duplicates(&accessor).unwrap();

    let mut out = Vec::new();
    ScriptOutput::new(&groups, &stat, ScriptType::Posix)
        .write_to(&mut out)
        .unwrap();
    let script = String::from_utf8(out).unwrap();

    assert!(script.contains("# Total duplicates found: 1"));
    assert!(script.contains(&format!("# LINK:   '{}'", dir.path().join("b").display())));

    // Plan only: a rescan still sees the duplicate
    let (groups, _) = finder().find_duplicates(&accessor).unwrap();
    assert_eq!(groups.len(), 1);
}
