/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::path::Path;
use jpe_translator::file_utils::FileManager;
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "present.jpe", "[Traits]\nend\n")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::dir_exists(&test_file));

    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.jpe"));
}

/// Test that ensure_dir creates nested directories
#[test]
fn test_ensure_dir_withNestedPath_shouldCreateAll() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("build").join("abc").join("xml");

    FileManager::ensure_dir(&nested)?;
    FileManager::ensure_dir(&nested)?;

    assert!(FileManager::dir_exists(&nested));
    Ok(())
}

/// Test that find_files matches extensions recursively and sorts the result
#[test]
fn test_find_files_withMixedFiles_shouldReturnSortedMatches() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "b.jpe", "")?;
    common::create_test_file(temp_dir.path(), "nested/a.JPE", "")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "")?;
    common::create_test_file(temp_dir.path(), "data.json", "")?;

    let found = FileManager::find_files(temp_dir.path(), &["jpe"])?;
    let both = FileManager::find_files(temp_dir.path(), &[".jpe", "json"])?;

    assert_eq!(found.len(), 2);
    assert_eq!(found[0], temp_dir.path().join("b.jpe"));
    assert_eq!(found[1], temp_dir.path().join("nested").join("a.JPE"));
    assert_eq!(both.len(), 3);
    Ok(())
}

/// Test that write_to_file creates parent directories
#[test]
fn test_write_to_file_withMissingParent_shouldCreateAndWrite() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("reports").join("build_x.json");

    FileManager::write_to_file(&path, "{}")?;

    assert_eq!(FileManager::read_to_string(&path)?, "{}");
    Ok(())
}

/// Test that read_to_string reports missing files as errors
#[test]
fn test_read_to_string_withMissingFile_shouldFail() {
    let result = FileManager::read_to_string("definitely_missing_12345.jpe");
    assert!(result.is_err());
}

/// Test the SHA-256 digest of a known input
#[test]
fn test_sha256_hex_withKnownInput_shouldMatchDigest() {
    assert_eq!(
        FileManager::sha256_hex(b"abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

/// Test that relative_to strips the base or keeps foreign paths
#[test]
fn test_relative_to_shouldStripBaseWhenPossible() {
    let base = Path::new("/project");

    assert_eq!(FileManager::relative_to("/project/src/a.jpe", base), Path::new("src/a.jpe"));
    assert_eq!(FileManager::relative_to("/elsewhere/a.jpe", base), Path::new("/elsewhere/a.jpe"));
}
