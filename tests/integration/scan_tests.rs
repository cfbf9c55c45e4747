use fdedup::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use fdedup::scanner::hasher::Hasher;
use fdedup::scanner::{AccessError, FilesystemAccessor};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn finder() -> DuplicateFinder {
    DuplicateFinder::new(FinderConfig::default().with_size_range(0, u64::MAX))
}

fn write(path: &Path, content: &[u8]) {
    File::create(path).unwrap().write_all(content).unwrap();
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let accessor = FilesystemAccessor::new(dir.path());

    let (groups, stat) = finder().find_duplicates(&accessor).unwrap();

    assert!(groups.is_empty());
    assert_eq!(stat.processed_amount, 0);
    assert_eq!(stat.skipped_amount, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"content a");
    write(&dir.path().join("b.txt"), b"content b");
    write(&dir.path().join("c.txt"), b"content c");

    let accessor = FilesystemAccessor::new(dir.path());
    let (groups, stat) = finder().find_duplicates(&accessor).unwrap();

    assert!(groups.is_empty());
    assert_eq!(stat.processed_amount, 3);
    assert_eq!(stat.duplicate_amount, 0);
}

#[test]
fn test_scan_duplicate_files() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"duplicate");
    write(&dir.path().join("b.txt"), b"duplicate");
    write(&dir.path().join("c.txt"), b"unique!!!");

    let accessor = FilesystemAccessor::new(dir.path());
    let (groups, stat) = finder().find_duplicates(&accessor).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].main_file, dir.path().join("a.txt"));
    assert_eq!(groups[0].duplicates, vec![dir.path().join("b.txt")]);
    assert_eq!(groups[0].size, 9);
    assert_eq!(stat.processed_amount, 3);
    assert_eq!(stat.duplicate_amount, 1);
    assert_eq!(stat.duplicate_size, 9);
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("subdir").join("deeper");
    fs::create_dir_all(&sub).unwrap();

    write(&dir.path().join("top.bin"), b"nested content");
    write(&sub.join("bottom.bin"), b"nested content");

    let accessor = FilesystemAccessor::new(dir.path());
    let (groups, _) = finder().find_duplicates(&accessor).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 1);
}

#[test]
fn test_scan_existing_hard_links_are_not_duplicates() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original");
    write(&original, b"linked content");
    fs::hard_link(&original, dir.path().join("link")).unwrap();

    let accessor = FilesystemAccessor::new(dir.path());
    let (groups, stat) = finder().find_duplicates(&accessor).unwrap();

    assert!(groups.is_empty());
    assert_eq!(stat.processed_amount, 2);
    assert_eq!(stat.duplicate_amount, 0);
}

#[test]
fn test_scan_hard_link_group_becomes_canonical() {
    let dir = tempdir().unwrap();
    // "z" sorts last but has two links, so it wins over "a"
    write(&dir.path().join("a"), b"shared");
    write(&dir.path().join("z"), b"shared");
    fs::hard_link(dir.path().join("z"), dir.path().join("z2")).unwrap();

    let accessor = FilesystemAccessor::new(dir.path());
    let (groups, stat) = finder().find_duplicates(&accessor).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].main_file, dir.path().join("z"));
    assert_eq!(groups[0].duplicates, vec![dir.path().join("a")]);
    assert_eq!(stat.duplicate_amount, 1);
}

#[cfg(unix)]
#[test]
fn test_scan_skips_symlinks() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("target");
    write(&target, b"symlinked");
    std::os::unix::fs::symlink(&target, dir.path().join("alias")).unwrap();

    let accessor = FilesystemAccessor::new(dir.path());
    let (groups, stat) = finder().find_duplicates(&accessor).unwrap();

    assert!(groups.is_empty());
    assert_eq!(stat.processed_amount, 1);
}

#[test]
fn test_scan_empty_files_are_duplicates() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("empty1"), b"");
    write(&dir.path().join("empty2"), b"");

    let accessor = FilesystemAccessor::new(dir.path());
    let (groups, stat) = finder().find_duplicates(&accessor).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 0);
    assert_eq!(stat.duplicate_size, 0);
}

#[test]
fn test_scan_size_window() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("small1"), b"ab");
    write(&dir.path().join("small2"), b"ab");
    write(&dir.path().join("mid1"), b"abcd");
    write(&dir.path().join("mid2"), b"abcd");
    write(&dir.path().join("big1"), b"abcdefgh");
    write(&dir.path().join("big2"), b"abcdefgh");

    let finder = DuplicateFinder::new(FinderConfig::default().with_size_range(3, 4));
    let accessor = FilesystemAccessor::new(dir.path());
    let (groups, stat) = finder.find_duplicates(&accessor).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 4);
    assert_eq!(stat.processed_amount, 2);
    assert_eq!(stat.processed_size, 8);
    assert_eq!(stat.skipped_amount, 4);
    assert_eq!(stat.skipped_size, 20);
}

#[test]
fn test_scan_default_window_skips_small_files() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"tiny");
    write(&dir.path().join("b"), b"tiny");

    let accessor = FilesystemAccessor::new(dir.path());
    let (groups, stat) = DuplicateFinder::with_defaults()
        .find_duplicates(&accessor)
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(stat.skipped_amount, 2);
    assert_eq!(stat.processed_amount, 0);
}

#[test]
fn test_scan_large_files_through_mmap() {
    let dir = tempdir().unwrap();
    let mut content = vec![7u8; 16 * 1024];
    write(&dir.path().join("big1"), &content);
    write(&dir.path().join("big2"), &content);
    // Same size, differs in the last byte only
    *content.last_mut().unwrap() = 8;
    write(&dir.path().join("big3"), &content);

    let mapped = FilesystemAccessor::new(dir.path())
        .with_hasher(Hasher::new().with_mmap_threshold(1024));
    let buffered = FilesystemAccessor::new(dir.path())
        .with_hasher(Hasher::new().with_mmap_threshold(u64::MAX));

    let (groups, stat) = finder().find_duplicates(&mapped).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].main_file, dir.path().join("big1"));
    assert_eq!(groups[0].duplicates, vec![dir.path().join("big2")]);
    assert_eq!(stat.duplicate_amount, 1);
    assert_eq!(finder().find_duplicates(&buffered).unwrap(), (groups, stat));
}

#[test]
fn test_scan_parallel_matches_sequential() {
    let dir = tempdir().unwrap();
    for i in 0..20u8 {
        let content = vec![i % 5; 100 + (i % 3) as usize];
        write(&dir.path().join(format!("f{:02}", i)), &content);
    }
    let accessor = FilesystemAccessor::new(dir.path());

    let sequential = finder().find_duplicates(&accessor).unwrap();
    let parallel = DuplicateFinder::new(
        FinderConfig::default()
            .with_size_range(0, u64::MAX)
            .with_io_threads(4),
    )
    .find_duplicates(&accessor)
    .unwrap();

    assert_eq!(sequential, parallel);
}

#[test]
fn test_scan_missing_root_fails() {
    let dir = tempdir().unwrap();
    let accessor = FilesystemAccessor::new(&dir.path().join("nope"));

    let result = finder().find_duplicates(&accessor);

    assert!(matches!(
        result,
        Err(FinderError::Access(AccessError::NotFound(_)))
    ));
}
