use super::*;
use std::path::Path;

#[test]
fn accepts_plain_ids() {
    assert!(validate_id("cell-1").is_ok());
    assert!(validate_id("a").is_ok());
    assert!(validate_id("worker_2").is_ok());
}

#[test]
fn rejects_leading_punctuation() {
    assert_eq!(
        validate_id("-cell"),
        Err(ValidationError::InvalidId("-cell".to_string()))
    );
}

#[test]
fn rejects_empty_id() {
    assert_eq!(validate_id(""), Err(ValidationError::EmptyId(String::new())));
}

#[test]
fn rejects_over_64_chars() {
    let long = "a".repeat(65);
    assert!(matches!(validate_id(&long), Err(ValidationError::IdTooLong(_))));
}

#[test]
fn rejects_absolute_path() {
    assert!(matches!(
        validate_relative_path("/etc/passwd"),
        Err(ValidationError::AbsolutePath(_))
    ));
}

#[test]
fn rejects_parent_traversal() {
    assert!(matches!(
        validate_relative_path("../secrets.txt"),
        Err(ValidationError::PathTraversal(_))
    ));
    assert!(matches!(
        validate_relative_path("a/../../b"),
        Err(ValidationError::PathTraversal(_))
    ));
}

#[test]
fn rejects_null_byte() {
    assert!(matches!(
        validate_relative_path("a\0b"),
        Err(ValidationError::NullByte(_))
    ));
}

#[test]
fn accepts_glob_output() {
    assert!(validate_relative_path("dist/*").is_ok());
}

#[test]
fn resolve_under_base_stays_inside() {
    let base = Path::new("/project/worktree");
    let resolved = resolve_under_base(base, Path::new("src/lib.rs")).unwrap();
    assert_eq!(resolved, Path::new("/project/worktree/src/lib.rs"));
}
