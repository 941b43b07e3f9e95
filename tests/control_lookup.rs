use std::fs;

use evidence_core::control::{ControlError, ControlId, ControlSource, DirectoryControls};
use tempfile::tempdir;

fn id(s: &str) -> ControlId {
    ControlId::parse(s).unwrap()
}

#[test]
fn load_matches_exact_id_not_longer_prefix() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("5.2 Information security roles.md"),
        "Roles shall be defined.\r\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("5.20 Addressing security within supplier agreements.md"),
        "Suppliers.",
    )
    .unwrap();

    let controls = DirectoryControls::new(dir.path());
    let control = controls.load(&id("5.2")).unwrap();

    assert_eq!(control.id.as_str(), "5.2");
    assert_eq!(control.title, "Information security roles");
    assert_eq!(control.requirement, "Roles shall be defined.");
    assert_eq!(control.display_name(), "5.2 Information security roles");
}

#[test]
fn bare_id_file_is_accepted() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("8.15.md"), "Logging.").unwrap();

    let control = DirectoryControls::new(dir.path()).load(&id("8.15")).unwrap();
    assert_eq!(control.title, "");
    assert_eq!(control.requirement, "Logging.");
}

#[test]
fn missing_control_is_not_found() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("5.1 Policies.md"), "x").unwrap();

    let err = DirectoryControls::new(dir.path()).load(&id("5.18")).unwrap_err();
    assert!(matches!(err, ControlError::NotFound { .. }));
}

#[test]
fn missing_directory_is_not_found() {
    let dir = tempdir().unwrap();
    let err = DirectoryControls::new(dir.path().join("nope"))
        .load(&id("5.1"))
        .unwrap_err();
    assert!(matches!(err, ControlError::NotFound { .. }));
}

#[test]
fn two_matching_files_are_ambiguous() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("5.1 Policies.md"), "x").unwrap();
    fs::write(dir.path().join("5.1 Policies (old).md"), "y").unwrap();

    let err = DirectoryControls::new(dir.path()).load(&id("5.1")).unwrap_err();
    match err {
        ControlError::Ambiguous { matches, .. } => assert_eq!(matches.len(), 2),
        other => panic!("expected ambiguity, got {other:?}"),
    }
}

#[test]
fn edited_whitespace_does_not_change_requirement() {
    let dir_a = tempdir().unwrap();
    let dir_b = tempdir().unwrap();
    fs::write(dir_a.path().join("5.18 Access rights.md"), "Access rights\n\nshall be reviewed.").unwrap();
    fs::write(
        dir_b.path().join("5.18 Access rights.md"),
        "Access rights  \r\n\r\n\r\nshall be reviewed.\r\n\r\n",
    )
    .unwrap();

    let a = DirectoryControls::new(dir_a.path()).load(&id("5.18")).unwrap();
    let b = DirectoryControls::new(dir_b.path()).load(&id("5.18")).unwrap();
    assert_eq!(a, b);
}
