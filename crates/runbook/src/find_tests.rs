use super::*;
use std::fs;

fn write_def(dir: &std::path::Path, filename: &str, id: &str) {
    let content = format!(
        r#"
        id = "{id}"
        name = "test"
        auth_id = "acct"

        step "s1" {{
          type = "maintenance"
        }}
        "#
    );
    fs::write(dir.join(filename), content).unwrap();
}

#[test]
fn finds_hcl_files_sorted_and_skips_other_extensions() {
    let dir = tempfile::tempdir().unwrap();
    write_def(dir.path(), "b.hcl", "b");
    write_def(dir.path(), "a.hcl", "a");
    fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

    let files = find_definition_files(dir.path()).unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["a.hcl".to_string(), "b.hcl".to_string()]);
}

#[test]
fn loads_and_parses_every_definition_in_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_def(dir.path(), "a.hcl", "def-a");
    write_def(dir.path(), "b.hcl", "def-b");

    let defs = load_definitions(dir.path()).unwrap();
    let ids: Vec<_> = defs.iter().map(|d| d.id.as_str().to_string()).collect();
    assert_eq!(ids, vec!["def-a".to_string(), "def-b".to_string()]);
}

#[test]
fn propagates_parse_error_with_file_path() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.hcl"), "not valid hcl {{{").unwrap();

    let err = load_definitions(dir.path()).unwrap_err();
    assert!(matches!(err, FindError::Parse { .. }));
}
