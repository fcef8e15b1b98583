use super::*;
use std::fs::File;
use tempfile::tempdir;

#[test]
fn test_read_write_file() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("test.txt");

    let provider = LocalFileProvider::new();

    provider.write_file(&file_path, "Hello, World!").unwrap();
    assert!(provider.exists(&file_path));

    let content = provider.read_file(&file_path).unwrap();
    assert_eq!(content, "Hello, World!");
}

#[test]
fn test_write_creates_parent_dirs() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("a").join("b").join("c.txt");

    let provider = LocalFileProvider::new();
    provider.write_file(&file_path, "nested").unwrap();
    assert_eq!(provider.read_file(&file_path).unwrap(), "nested");
}

#[test]
fn test_read_dir() {
    let dir = tempdir().unwrap();

    fs::create_dir(dir.path().join("subdir")).unwrap();
    File::create(dir.path().join("file1.txt")).unwrap();
    File::create(dir.path().join("File2.txt")).unwrap();

    let provider = LocalFileProvider::new();
    let entries = provider.read_dir(dir.path()).unwrap();

    assert_eq!(entries.len(), 3);
    assert!(entries[0].is_dir);
    assert_eq!(entries[0].name, "subdir");
    assert_eq!(entries[1].name, "file1.txt");
    assert_eq!(entries[2].name, "File2.txt");
}

#[test]
fn test_create_dir_all() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("x").join("y");

    let provider = LocalFileProvider::new();
    provider.create_dir_all(&nested).unwrap();
    assert!(nested.is_dir());
    provider.create_dir_all(&nested).unwrap();
}

#[test]
fn test_create_dir_over_file_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("taken");
    File::create(&path).unwrap();

    let provider = LocalFileProvider::new();
    assert!(matches!(
        provider.create_dir_all(&path),
        Err(FileError::AlreadyExists(_))
    ));
}

#[test]
fn test_not_found_error() {
    let provider = LocalFileProvider::new();
    let result = provider.read_file(Path::new("/nonexistent/file.txt"));
    assert!(matches!(result, Err(FileError::NotFound(_))));
}

#[test]
fn test_read_directory_as_file_fails() {
    let dir = tempdir().unwrap();
    let provider = LocalFileProvider::new();
    assert!(matches!(
        provider.read_file(dir.path()),
        Err(FileError::NotAFile(_))
    ));
    assert!(matches!(
        provider.read_dir(&dir.path().join("nope")),
        Err(FileError::NotFound(_))
    ));
}
